use crate::models::Proposal;
use std::fmt;

// Colour of the vote countdown bar
pub const COUNTDOWN_COLOR: Rgb = Rgb { r: 0xeb, g: 0x95, b: 0x00 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Sum of all vote counts, floored at 1 so percentages never divide by zero.
pub fn total_votes(proposals: &[Proposal]) -> u64 {
    proposals
        .iter()
        .map(|proposal| u64::from(proposal.vote))
        .sum::<u64>()
        .max(1)
}

pub fn percentage(count: f64, total: f64) -> f64 {
    if total > 0.0 { count / total * 100.0 } else { 0.0 }
}

/// Red at 0%, green at 100%, the two channels interpolated independently.
pub fn progress_color(percentage: f64) -> Rgb {
    // NaN falls back to 0%
    let p = if percentage.is_nan() { 0.0 } else { percentage.clamp(0.0, 100.0) };
    let channel = |value: f64| value.round().clamp(0.0, 255.0) as u8;
    Rgb {
        r: channel(255.0 * (100.0 - p) / 100.0),
        g: channel(255.0 * p / 100.0),
        b: 0,
    }
}

// Highest vote first; `sort_by` is stable so ties keep arrival order
pub fn sort_by_votes(proposals: &mut [Proposal]) {
    proposals.sort_by(|a, b| b.vote.cmp(&a.vote));
}
