// crates/lp_algo/src/dedup.rs
//
// Duplicate-by-value: two tickets in the same pool and draw collide when their
// sorted main numbers and bonus are equal. Entry method and multiplier do not
// take part.

use lp_core::{CombinationKey, Ticket};

/// `true` when `candidate` repeats a combination among `existing`, which the
/// caller has already narrowed to the same pool and draw date.
pub fn is_duplicate<'a, I>(candidate: &CombinationKey, existing: I) -> bool
where
    I: IntoIterator<Item = &'a Ticket>,
{
    find_duplicate(candidate, existing).is_some()
}

/// The first existing ticket with the same combination, if any.
pub fn find_duplicate<'a, I>(candidate: &CombinationKey, existing: I) -> Option<&'a Ticket>
where
    I: IntoIterator<Item = &'a Ticket>,
{
    existing.into_iter().find(|t| t.combination() == *candidate)
}
