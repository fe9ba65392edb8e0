//! crates/lp_core/src/ids.rs
//! Identifier newtypes: ticket ids (hash-derived) and pool/user tokens.
//! ASCII-only, strict shapes; no I/O.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors returned when validating or parsing IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    NonAscii,
    TooLong,
    BadShape,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::NonAscii => f.write_str("id must be ASCII without NUL"),
            IdError::TooLong => f.write_str("id too long"),
            IdError::BadShape => f.write_str("id has an invalid shape"),
        }
    }
}

impl std::error::Error for IdError {}

const MAX_ID_LEN: usize = 256;
const TOKEN_MAX_LEN: usize = 64;

/// Hex length of the ticket id suffix (128 bits of the combination fingerprint).
pub const TICKET_HEX_LEN: usize = 32;

#[inline]
fn is_ascii_no_nul(s: &str) -> bool {
    !s.as_bytes().iter().any(|&b| b == 0 || b > 0x7F)
}

#[inline]
fn is_lower_hex_len(s: &str, n: usize) -> bool {
    s.len() == n && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Token for PoolId/UserId: ^[A-Za-z0-9_.:-]{1,64}$ (ASCII only)
#[inline]
pub fn is_valid_token(s: &str) -> bool {
    let len = s.len();
    if len == 0 || len > TOKEN_MAX_LEN || !is_ascii_no_nul(s) {
        return false;
    }
    s.bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b':' | b'-'))
}

macro_rules! simple_string_newtype {
    ($(#[$m:meta])* $name:ident) => {
        $(#[$m])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            #[inline] pub fn as_str(&self) -> &str { &self.0 }
        }

        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl TryFrom<&str> for $name {
            type Error = IdError;
            #[inline]
            fn try_from(value: &str) -> Result<Self, Self::Error> { value.parse() }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;
            #[inline]
            fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
        }

        impl From<$name> for String {
            #[inline]
            fn from(v: $name) -> String { v.0 }
        }
    }
}

// === Token IDs: PoolId, UserId (no prefixes) ===

simple_string_newtype!(
    /// Pool token: ^[A-Za-z0-9_.:-]{1,64}$
    PoolId
);
simple_string_newtype!(
    /// User token (who entered the ticket): ^[A-Za-z0-9_.:-]{1,64}$
    UserId
);

fn parse_token(s: &str) -> Result<String, IdError> {
    if !is_ascii_no_nul(s) { return Err(IdError::NonAscii); }
    if s.len() > MAX_ID_LEN { return Err(IdError::TooLong); }
    if !is_valid_token(s) { return Err(IdError::BadShape); }
    Ok(s.to_owned())
}

impl FromStr for PoolId {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_token(s).map(PoolId)
    }
}

impl FromStr for UserId {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_token(s).map(UserId)
    }
}

// === Prefixed ticket id: TKT ===

simple_string_newtype!(
    /// "TKT:" + 32 lowercase hex (prefix of the combination fingerprint)
    TicketId
);

impl FromStr for TicketId {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_ascii_no_nul(s) { return Err(IdError::NonAscii); }
        if s.len() > MAX_ID_LEN { return Err(IdError::TooLong); }
        let rest = s.strip_prefix("TKT:").ok_or(IdError::BadShape)?;
        if !is_lower_hex_len(rest, TICKET_HEX_LEN) { return Err(IdError::BadShape); }
        Ok(TicketId(s.to_owned()))
    }
}

impl TicketId {
    /// Build from a lowercase 64-hex fingerprint (takes the leading 32 chars).
    pub fn from_fingerprint(hex64: &str) -> Result<Self, IdError> {
        let head = hex64.get(..TICKET_HEX_LEN).ok_or(IdError::BadShape)?;
        format!("TKT:{head}").parse()
    }

    #[inline] pub fn as_hex(&self) -> &str { &self.0[4..] }
}

// === Tests ===
