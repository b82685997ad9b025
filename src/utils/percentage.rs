use std::fmt::Display;

/// Share of a whole, in the 0..=100 range for well-formed inputs.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}%", self.0)
    }
}

impl Percentage {
    /// Renders the share as a fixed-width bar of `width` cells, one filled cell per
    /// `100 / width` percent.
    pub fn bar(&self, width: usize) -> String {
        let cell = 100. / width.max(1) as f64;
        let filled = ((self.0 / cell) as usize).min(width);
        format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
    }
}

/// Share of `value` in `whole`. An empty whole is 0%.
pub fn count_percentage(value: usize, whole: usize) -> Percentage {
    if whole == 0 {
        return Percentage(0.);
    }
    Percentage(value as f64 / whole as f64 * 100.)
}
