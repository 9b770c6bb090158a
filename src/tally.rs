//! Vote arithmetic and wording used by the poll pages.

use crate::repository::Choice;

/// Sum of the votes cast across `choices`.
pub fn total_votes(choices: &[Choice]) -> i64 {
    choices.iter().map(|c| c.votes as i64).sum()
}

/// `100 * votes / total`, or 0 when no votes were cast at all.
pub fn percentage(votes: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * votes as f64 / total as f64
}

/// Whole-number percentage, rounded half away from zero. Rounded shares of a
/// poll are not guaranteed to add up to exactly 100.
pub fn rounded_percentage(votes: i64, total: i64) -> i64 {
    percentage(votes, total).round() as i64
}

/// "1 vote", "2 votes", "0 votes".
pub fn pluralize_votes(count: i64) -> String {
    if count == 1 {
        "1 vote".to_owned()
    } else {
        format!("{} votes", count)
    }
}
