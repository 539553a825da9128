//! Moving-average crossover detection.
//!
//! Both detectors return the first (earliest) index where the crossing
//! condition holds, scanning forward from index 1. Callers that only care
//! about recent crosses apply their own window on top of this result.

/// Index of the first golden cross: short MA closes at or below the long
/// MA on the previous bar and strictly above it on the current bar.
///
/// Returns `None` if either series has fewer than 2 elements or no
/// qualifying transition exists. A transition only qualifies when all
/// four inspected values are defined.
pub fn golden_cross(short: &[Option<f64>], long: &[Option<f64>]) -> Option<usize> {
    detect(short, long, |ps, pl, cs, cl| ps <= pl && cs > cl)
}

/// Index of the first death cross: the symmetric condition with the
/// inequality directions reversed.
pub fn death_cross(short: &[Option<f64>], long: &[Option<f64>]) -> Option<usize> {
    detect(short, long, |ps, pl, cs, cl| ps >= pl && cs < cl)
}

fn detect<F>(short: &[Option<f64>], long: &[Option<f64>], condition: F) -> Option<usize>
where
    F: Fn(f64, f64, f64, f64) -> bool,
{
    if short.len() < 2 || long.len() < 2 {
        return None;
    }

    let len = short.len().min(long.len());
    for i in 1..len {
        if let (Some(ps), Some(pl), Some(cs), Some(cl)) =
            (short[i - 1], long[i - 1], short[i], long[i])
        {
            if condition(ps, pl, cs, cl) {
                return Some(i);
            }
        }
    }

    None
}
