use serde::Serialize;

/// Composite trading verdict for the latest bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Buy,
    Sell,
    Hold,
}

/// Result of the vote tally across indicator sources.
///
/// Confidence is the fraction of agreeing simple votes (0-100), not a
/// statistical measure. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct SignalResult {
    pub verdict: Verdict,
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub buy_votes: u32,
    pub sell_votes: u32,
}

impl SignalResult {
    pub fn hold_empty() -> Self {
        Self {
            verdict: Verdict::Hold,
            confidence: 0.0,
            reasons: Vec::new(),
            buy_votes: 0,
            sell_votes: 0,
        }
    }
}
