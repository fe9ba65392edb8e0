//! crates/lp_io/src/hasher.rs
//!
//! SHA-256 over canonical JSON, and the ids derived from it.
//!
//! The combination fingerprint covers `(pool_id, draw_date, sorted numbers,
//! bonus)`, which is exactly the duplicate identity of a ticket. Two drafts
//! that differ only in number order, multiplier or entry method therefore get
//! the same fingerprint and the same ticket id.

use chrono::NaiveDate;
use serde::Serialize;
use sha2::{Digest, Sha256};

use lp_core::{CombinationKey, PoolId, TicketId};

use crate::canonical_json::to_canonical_bytes;
use crate::IoError;

/// SHA-256 over raw bytes, lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over the **canonical JSON** of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> Result<String, IoError> {
    Ok(sha256_hex(&to_canonical_bytes(value)?))
}

#[derive(Serialize)]
struct FingerprintInput<'a> {
    pool_id: &'a PoolId,
    draw_date: NaiveDate,
    numbers: &'a [u8],
    bonus: u8,
}

/// 64-hex fingerprint of a combination within a pool and draw.
pub fn combination_fingerprint(pool_id: &PoolId, draw_date: NaiveDate, key: &CombinationKey) -> Result<String, IoError> {
    sha256_canonical(&FingerprintInput {
        pool_id,
        draw_date,
        numbers: key.numbers(),
        bonus: key.bonus(),
    })
}

/// `TKT:` + first 32 hex chars of the combination fingerprint.
pub fn ticket_id_for(pool_id: &PoolId, draw_date: NaiveDate, key: &CombinationKey) -> Result<TicketId, IoError> {
    let fp = combination_fingerprint(pool_id, draw_date, key)?;
    TicketId::from_fingerprint(&fp).map_err(|e| IoError::Invalid(format!("ticket id: {e}")))
}
