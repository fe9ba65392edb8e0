// crates/lp_algo/src/classify.rs
//
// Prize classification. Same (ticket, draw, rules) always yields the same
// answer; reconciliation relies on that to re-apply outcomes idempotently.

use chrono::NaiveDate;
use lp_core::{Cents, DrawResult, GameRules, GameType, PrizeTable, PrizeTier, Ticket, TicketError, TicketId};
use thiserror::Error;

/// A positive classification: the ticket won `tier`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub tier: PrizeTier,
    pub main_matches: u8,
    pub bonus_matched: bool,
    pub prize_amount: Cents,
}

/// The ticket (or its pairing with the draw) cannot be classified. Only
/// inconsistent stored data gets here; callers skip the ticket.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("ticket {ticket} is for {ticket_game}, draw is for {draw_game}")]
    GameMismatch { ticket: TicketId, ticket_game: GameType, draw_game: GameType },

    #[error("ticket {ticket} is for {ticket_date}, draw is for {draw_date}")]
    DateMismatch { ticket: TicketId, ticket_date: NaiveDate, draw_date: NaiveDate },

    #[error("ticket {ticket} does not fit its game: {reason}")]
    MalformedTicket { ticket: TicketId, #[source] reason: TicketError },
}

/// `(|numbers ∩ winning|, bonus == winning_bonus)`. `numbers` must be distinct.
pub fn match_counts(numbers: &[u8], bonus: u8, draw: &DrawResult) -> (u8, bool) {
    let main = numbers
        .iter()
        .filter(|n| draw.winning_numbers.contains(n))
        .count();
    // At most main_number_count (a u8) after validation.
    let main = u8::try_from(main).unwrap_or(u8::MAX);
    (main, bonus == draw.winning_bonus)
}

/// Exact-tuple table lookup plus amount resolution. `None` means no win.
pub fn classify_numbers(numbers: &[u8], bonus: u8, draw: &DrawResult, table: &PrizeTable) -> Option<Classification> {
    let (main_matches, bonus_matched) = match_counts(numbers, bonus, draw);
    let rule = table.lookup(main_matches, bonus_matched)?;
    let prize_amount = match rule.tier {
        PrizeTier::Jackpot => draw.jackpot_amount,
        _ => rule.base_amount,
    };
    Some(Classification { tier: rule.tier, main_matches, bonus_matched, prize_amount })
}

/// Classify a stored ticket against the draw for its game and date.
pub fn classify(ticket: &Ticket, draw: &DrawResult, rules: &GameRules) -> Result<Option<Classification>, ClassifyError> {
    if ticket.game != draw.game || ticket.game != rules.game {
        return Err(ClassifyError::GameMismatch {
            ticket: ticket.id.clone(),
            ticket_game: ticket.game,
            draw_game: draw.game,
        });
    }
    if ticket.draw_date != draw.draw_date {
        return Err(ClassifyError::DateMismatch {
            ticket: ticket.id.clone(),
            ticket_date: ticket.draw_date,
            draw_date: draw.draw_date,
        });
    }
    ticket
        .validate(rules)
        .map_err(|reason| ClassifyError::MalformedTicket { ticket: ticket.id.clone(), reason })?;
    Ok(classify_numbers(&ticket.numbers, ticket.bonus, draw, &rules.prize_table))
}
