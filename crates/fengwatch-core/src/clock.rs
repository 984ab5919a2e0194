//! Clock-consistency checks over the three hardware timer subsystems.
//!
//! Two-stage policy, order load-bearing:
//! 1. All three timers must agree pairwise within [`MUTUAL_TOLERANCE_MS`].
//! 2. Only if they do, the reference timer (index 0, DTS) is compared
//!    against wall-clock time within [`WALL_CLOCK_TOLERANCE_S`].
//!
//! Timers that disagree among themselves are never `time_correct`, no
//! matter how close any one of them sits to wall clock.

/// Tick rate of the hardware timer counters.
pub const TIMER_TICK_HZ: f64 = 256_000_000.0;

/// Maximum pairwise timer disagreement before the set is inconsistent.
pub const MUTUAL_TOLERANCE_MS: f64 = 100.0;

/// Maximum reference-timer offset from wall clock.
pub const WALL_CLOCK_TOLERANCE_S: f64 = 1.0;

/// Convert raw timer ticks to milliseconds.
pub fn ticks_to_ms(ticks: u64) -> f64 {
    ticks as f64 / TIMER_TICK_HZ * 1000.0
}

/// Outcome of the two-stage clock check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockCheck {
    /// The three timer readings converted to milliseconds, query order.
    pub timers_ms: [f64; 3],
    /// Stage 1: every pairwise difference within tolerance.
    pub mutually_consistent: bool,
    /// Stage 2: reference timer within tolerance of wall clock. Always
    /// false when the timers are not mutually consistent.
    pub time_correct: bool,
}

/// Check three raw tick counts against each other and against wall clock.
pub fn check_timers(ticks: [u64; 3], wall_clock_unix_s: f64) -> ClockCheck {
    check_timers_ms(ticks.map(ticks_to_ms), wall_clock_unix_s)
}

/// Same check with the readings already in milliseconds.
pub fn check_timers_ms(timers_ms: [f64; 3], wall_clock_unix_s: f64) -> ClockCheck {
    let [a, b, c] = timers_ms;
    let mutually_consistent = (a - b).abs() <= MUTUAL_TOLERANCE_MS
        && (a - c).abs() <= MUTUAL_TOLERANCE_MS
        && (b - c).abs() <= MUTUAL_TOLERANCE_MS;

    let time_correct = mutually_consistent
        && (a / 1000.0 - wall_clock_unix_s).abs() <= WALL_CLOCK_TOLERANCE_S;

    ClockCheck {
        timers_ms,
        mutually_consistent,
        time_correct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Tick conversion tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_ticks_to_ms_zero() {
        assert_eq!(ticks_to_ms(0), 0.0);
    }

    #[test]
    fn test_ticks_to_ms_one_second() {
        let ms = ticks_to_ms(256_000_000);
        assert!((ms - 1000.0).abs() < 1e-9);
    }

    // -----------------------------------------------------------------------
    // Stage 1: mutual consistency
    // -----------------------------------------------------------------------

    #[test]
    fn test_identical_timers_are_consistent() {
        let check = check_timers_ms([1000.0, 1000.0, 1000.0], 1.0);
        assert!(check.mutually_consistent);
    }

    #[test]
    fn test_tolerance_boundary_is_inclusive() {
        // Exactly 100 ms apart still counts as agreeing.
        let check = check_timers_ms([1000.0, 1100.0, 1050.0], 1.0);
        assert!(check.mutually_consistent);
    }

    #[test]
    fn test_one_divergent_timer_breaks_consistency() {
        let check = check_timers_ms([1000.0, 1000.0, 1150.0], 1.0);
        assert!(!check.mutually_consistent);
        assert!(!check.time_correct);
    }

    // -----------------------------------------------------------------------
    // Stage 2: wall-clock agreement gated on stage 1
    // -----------------------------------------------------------------------

    #[test]
    fn test_wall_clock_match_ignored_when_inconsistent() {
        // Wall clock matches two of the timers exactly, but the third is
        // 500 ms out — the set disagrees, so time can never be correct.
        let check = check_timers_ms([0.0, 0.0, 500.0], 0.0);
        assert!(!check.mutually_consistent);
        assert!(!check.time_correct);
    }

    #[test]
    fn test_consistent_and_near_wall_clock() {
        // All pairwise diffs <= 100 ms, reference at 1.0 s, wall at 1.5 s.
        let check = check_timers_ms([1000.0, 1050.0, 1080.0], 1.5);
        assert!(check.mutually_consistent);
        assert!(check.time_correct);
    }

    #[test]
    fn test_consistent_but_far_from_wall_clock() {
        let check = check_timers_ms([1000.0, 1050.0, 1080.0], 6.0);
        assert!(check.mutually_consistent);
        assert!(!check.time_correct);
    }

    #[test]
    fn test_wall_clock_tolerance_boundary() {
        // Exactly 1 s away is still correct.
        let check = check_timers_ms([1000.0, 1000.0, 1000.0], 2.0);
        assert!(check.time_correct);
        let check = check_timers_ms([1000.0, 1000.0, 1000.0], 2.001);
        assert!(!check.time_correct);
    }

    #[test]
    fn test_check_timers_from_ticks() {
        // One second of ticks on all three timers, wall clock at 1.2 s.
        let ticks = [256_000_000u64; 3];
        let check = check_timers(ticks, 1.2);
        assert!(check.mutually_consistent);
        assert!(check.time_correct);
        assert!((check.timers_ms[0] - 1000.0).abs() < 1e-9);
    }
}
