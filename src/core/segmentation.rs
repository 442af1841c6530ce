//! Longest-sleep-session search over a sequence of window classifications.
//!
//! A single left-to-right scan drives a two-state machine. While a session is
//! open, runs of awake windows up to the gap tolerance are absorbed into it;
//! one more awake window closes it. The session with the largest index span
//! wins, and on a tie the earliest one is kept.

use crate::core::classifier::WindowClassification;
use serde::{Deserialize, Serialize};

/// Default wake tolerance inside a session, in seconds.
pub const DEFAULT_WAKE_TOLERANCE_SECS: u64 = 3600;

/// A contiguous run of sleep, as indices into the classification sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SleepSession {
    pub start_index: usize,
    pub end_index: usize,
    /// Windows classified asleep within `[start_index, end_index]`
    pub sleep_count: usize,
}

impl SleepSession {
    /// The "no session found" value.
    pub const NONE: SleepSession = SleepSession {
        start_index: 0,
        end_index: 0,
        sleep_count: 0,
    };

    pub fn span(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_found(&self) -> bool {
        *self != Self::NONE
    }
}

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Idle,
    Open { session: SleepSession, gap: usize },
}

/// Finds the best sleep session in a classification sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSegmenter {
    max_gap: usize,
}

impl SessionSegmenter {
    /// `step_secs` is the time between classifications; the tolerated wake
    /// gap is `wake_tolerance_secs / step_secs` consecutive awake windows.
    pub fn new(step_secs: u64, wake_tolerance_secs: u64) -> Self {
        let max_gap = if step_secs == 0 {
            0
        } else {
            (wake_tolerance_secs / step_secs) as usize
        };
        Self { max_gap }
    }

    /// Segmenter with the default one-hour wake tolerance.
    pub fn with_step(step_secs: u64) -> Self {
        Self::new(step_secs, DEFAULT_WAKE_TOLERANCE_SECS)
    }

    pub fn max_gap(&self) -> usize {
        self.max_gap
    }

    /// Scan `classifications` and return the best session, or
    /// [`SleepSession::NONE`].
    pub fn find_best(&self, classifications: &[WindowClassification]) -> SleepSession {
        let mut best = SleepSession::NONE;
        let mut state = ScanState::Idle;

        for (index, window) in classifications.iter().enumerate() {
            state = match (state, window.is_asleep) {
                (ScanState::Idle, true) => ScanState::Open {
                    session: SleepSession {
                        start_index: index,
                        end_index: index,
                        sleep_count: 1,
                    },
                    gap: 0,
                },
                (ScanState::Idle, false) => ScanState::Idle,
                (ScanState::Open { session, .. }, true) => ScanState::Open {
                    session: SleepSession {
                        end_index: index,
                        sleep_count: session.sleep_count + 1,
                        ..session
                    },
                    gap: 0,
                },
                (ScanState::Open { session, gap }, false) => {
                    let gap = gap + 1;
                    if gap > self.max_gap {
                        keep_longer(&mut best, session);
                        ScanState::Idle
                    } else {
                        ScanState::Open { session, gap }
                    }
                }
            };
        }

        if let ScanState::Open { session, .. } = state {
            keep_longer(&mut best, session);
        }

        best
    }
}

/// Replace `best` only when `candidate` spans strictly more windows.
fn keep_longer(best: &mut SleepSession, candidate: SleepSession) {
    if candidate.span() > best.span() {
        *best = candidate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn classify(pattern: &[(bool, usize)]) -> Vec<WindowClassification> {
        let start = Utc::now();
        pattern
            .iter()
            .flat_map(|&(asleep, n)| std::iter::repeat(asleep).take(n))
            .enumerate()
            .map(|(i, is_asleep)| WindowClassification {
                timestamp: start + Duration::minutes(i as i64),
                is_asleep,
            })
            .collect()
    }

    #[test]
    fn test_max_gap_from_step() {
        assert_eq!(SessionSegmenter::with_step(60).max_gap(), 60);
        assert_eq!(SessionSegmenter::with_step(30).max_gap(), 120);
        assert_eq!(SessionSegmenter::new(60, 600).max_gap(), 10);
    }

    #[test]
    fn test_no_session() {
        let segmenter = SessionSegmenter::with_step(60);
        assert_eq!(segmenter.find_best(&[]), SleepSession::NONE);
        assert_eq!(
            segmenter.find_best(&classify(&[(false, 100)])),
            SleepSession::NONE
        );
        assert!(!SleepSession::NONE.is_found());
    }

    #[test]
    fn test_gap_within_tolerance_merges() {
        let windows = classify(&[(true, 20), (false, 50), (true, 20), (false, 1)]);
        let best = SessionSegmenter::with_step(60).find_best(&windows);

        assert_eq!(best.start_index, 0);
        assert_eq!(best.end_index, 89);
        assert_eq!(best.sleep_count, 40);
    }

    #[test]
    fn test_gap_beyond_tolerance_splits() {
        // 61 awake windows exceed a 60-window tolerance.
        let windows = classify(&[(true, 20), (false, 61), (true, 30)]);
        let best = SessionSegmenter::with_step(60).find_best(&windows);

        assert_eq!(best.start_index, 81);
        assert_eq!(best.end_index, 110);
        assert_eq!(best.sleep_count, 30);
    }

    #[test]
    fn test_gap_exactly_at_tolerance_keeps_session() {
        let windows = classify(&[(true, 5), (false, 60), (true, 5)]);
        let best = SessionSegmenter::with_step(60).find_best(&windows);

        assert_eq!(best.start_index, 0);
        assert_eq!(best.end_index, 69);
        assert_eq!(best.sleep_count, 10);
    }

    #[test]
    fn test_tie_keeps_earliest() {
        let windows = classify(&[(true, 10), (false, 5), (true, 10)]);
        let best = SessionSegmenter::new(60, 120).find_best(&windows);

        assert_eq!(best.start_index, 0);
        assert_eq!(best.end_index, 9);
    }

    #[test]
    fn test_open_session_at_end_can_win() {
        let windows = classify(&[(true, 5), (false, 5), (true, 20)]);
        let best = SessionSegmenter::new(60, 120).find_best(&windows);

        assert_eq!(best.start_index, 10);
        assert_eq!(best.end_index, 29);
        assert_eq!(best.sleep_count, 20);
    }

    #[test]
    fn test_single_window_session_never_wins() {
        let windows = classify(&[(false, 3), (true, 1), (false, 3)]);
        let best = SessionSegmenter::new(60, 60).find_best(&windows);
        assert_eq!(best, SleepSession::NONE);
    }

    #[test]
    fn test_deterministic() {
        let windows = classify(&[(true, 7), (false, 3), (true, 12), (false, 80), (true, 9)]);
        let segmenter = SessionSegmenter::with_step(60);
        let first = segmenter.find_best(&windows);
        for _ in 0..10 {
            assert_eq!(segmenter.find_best(&windows), first);
        }
    }
}
