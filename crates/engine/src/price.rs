//! Price calculation: current price + percentage -> target price.

/// Percentage applied when a ledger row has no user-set value and the
/// configuration does not override it.
pub const DEFAULT_CHANGE_PERCENT: f64 = 10.0;

/// Lowest price the engine will ever propose, minor units.
pub const MIN_PRICE_MINOR: i64 = 1;

/// Outcome of one price computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Computed {
    pub target_minor: i64,
    /// Raised to the user's floor price.
    pub floored: bool,
    /// Clamped up to [`MIN_PRICE_MINOR`]; a non-positive target is an
    /// anomaly worth a warning, never a silent output.
    pub clamped: bool,
}

/// `target = current * (1 + percent / 100)`, rounded half-up to minor
/// units. The percentage must already be resolved (unset ⇒ default) by
/// the caller; a zero percent yields target == current, which the
/// reconciler treats as an explicit no-op.
pub fn compute(current_minor: i64, change_percent: f64, floor_minor: Option<i64>) -> Computed {
    let raw = current_minor as f64 * (1.0 + change_percent / 100.0);
    // Round half-up. Cent-scale magnitudes are exact in f64.
    let mut target = (raw + 0.5).floor() as i64;

    let mut floored = false;
    if let Some(floor) = floor_minor {
        if target < floor {
            target = floor;
            floored = true;
        }
    }

    let mut clamped = false;
    if target < MIN_PRICE_MINOR {
        target = MIN_PRICE_MINOR;
        clamped = true;
    }

    Computed { target_minor: target, floored, clamped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_ten_percent() {
        assert_eq!(compute(5000, 10.0, None).target_minor, 5500);
    }

    #[test]
    fn minus_fifteen_percent() {
        assert_eq!(compute(5000, -15.0, None).target_minor, 4250);
    }

    #[test]
    fn zero_percent_is_identity() {
        assert_eq!(compute(5000, 0.0, None).target_minor, 5000);
    }

    #[test]
    fn rounds_half_up() {
        // 10.05 * 1.10 = 11.055 -> 11.06
        assert_eq!(compute(1005, 10.0, None).target_minor, 1106);
        // 10.01 * 0.5% = 10.06005 -> 10.06
        assert_eq!(compute(1001, 0.5, None).target_minor, 1006);
    }

    #[test]
    fn fractional_percent() {
        // 50.00 * 1.025 = 51.25
        assert_eq!(compute(5000, 2.5, None).target_minor, 5125);
    }

    #[test]
    fn floor_price_wins() {
        let c = compute(5000, -50.0, Some(3000));
        assert_eq!(c.target_minor, 3000);
        assert!(c.floored);
        assert!(!c.clamped);
    }

    #[test]
    fn floor_below_target_is_inert() {
        let c = compute(5000, 10.0, Some(3000));
        assert_eq!(c.target_minor, 5500);
        assert!(!c.floored);
    }

    #[test]
    fn non_positive_target_clamps_to_one_cent() {
        let c = compute(100, -100.0, None);
        assert_eq!(c.target_minor, MIN_PRICE_MINOR);
        assert!(c.clamped);

        let c = compute(50, -150.0, None);
        assert_eq!(c.target_minor, MIN_PRICE_MINOR);
        assert!(c.clamped);
    }
}
