//! Fallback numeric trigger.
//!
//! When no rule fires, the first bare positive integer on the line becomes a
//! balloon count.

/// First whitespace-delimited token made only of ASCII digits whose value
/// is at least 1, capped at `max`. Later numbers on the line are ignored.
pub fn first_bare_number(text: &str, max: u32) -> Option<u32> {
    text.split_whitespace()
        .filter(|token| token.bytes().all(|b| b.is_ascii_digit()))
        .map(parse_saturating)
        .find(|&n| n >= 1)
        .map(|n| n.min(u64::from(max)) as u32)
}

fn parse_saturating(digits: &str) -> u64 {
    digits.bytes().fold(0u64, |acc, b| {
        acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
    })
}
