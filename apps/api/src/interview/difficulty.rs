//! Difficulty calibration — pure arithmetic over candidate attributes and
//! the rolling score window. Every function here is deterministic and keeps
//! difficulty inside [`MIN_DIFFICULTY`, `MAX_DIFFICULTY`].

use serde::{Deserialize, Serialize};

use crate::models::candidate::{Candidate, CandidateLevel};

pub const MIN_DIFFICULTY: f64 = 0.5;
pub const MAX_DIFFICULTY: f64 = 2.5;

/// Experience saturates at 3 years: min(years / 2, 1.5).
const EXPERIENCE_CAP: f64 = 1.5;
/// A historical average of 50 is neutral; above grows difficulty, below shrinks it.
const NEUTRAL_HISTORY_SCORE: f64 = 50.0;
/// Number of most recent scores considered when adjusting difficulty.
const ADJUSTMENT_WINDOW: usize = 3;
/// Recent mean above this raises difficulty by 20%.
const RAISE_THRESHOLD: f64 = 85.0;
/// Recent mean below this lowers difficulty by 20%.
const LOWER_THRESHOLD: f64 = 60.0;

/// Named difficulty range used to phrase question-generation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyBand {
    Basic,
    Intermediate,
    Advanced,
    Expert,
}

impl DifficultyBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyBand::Basic => "basic",
            DifficultyBand::Intermediate => "intermediate",
            DifficultyBand::Advanced => "advanced",
            DifficultyBand::Expert => "expert",
        }
    }
}

/// Computes the starting difficulty for a candidate.
///
/// base(level) × min(years/2, 1.5) × mean(past)/50 (history factor skipped
/// when there is no history), clamped to [0.5, 2.5]. Note the experience
/// factor is 0 for zero-experience candidates, so the clamp floor kicks in.
pub fn initial_difficulty(candidate: &Candidate) -> f64 {
    let base = match candidate.level {
        CandidateLevel::Junior => 1.0,
        CandidateLevel::Intermediate => 1.5,
        CandidateLevel::Senior => 2.0,
    };

    let experience_factor = (candidate.years_experience / 2.0).min(EXPERIENCE_CAP);
    let mut difficulty = base * experience_factor;

    if !candidate.past_scores.is_empty() {
        difficulty *= mean(&candidate.past_scores) / NEUTRAL_HISTORY_SCORE;
    }

    difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Adjusts difficulty after one answer.
///
/// Considers the mean of the last 3 scores including `new_score`: above 85 the
/// difficulty grows 20%, below 60 it shrinks 20%, the band in between is
/// neutral so borderline performance does not oscillate. Pure: callers own the
/// history append, so calling twice with identical inputs cannot double-adjust.
pub fn adjust_difficulty(current: f64, history: &[f64], new_score: f64) -> f64 {
    let window_start = (history.len() + 1).saturating_sub(ADJUSTMENT_WINDOW);
    let mut window: Vec<f64> = history[window_start.min(history.len())..].to_vec();
    window.push(new_score);
    let recent_mean = mean(&window);

    let adjusted = if recent_mean > RAISE_THRESHOLD {
        current * 1.2
    } else if recent_mean < LOWER_THRESHOLD {
        current * 0.8
    } else {
        current
    };

    adjusted.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Maps a difficulty value to its band. Bands are contiguous with closed
/// upper bounds: exactly 1.0 is basic, exactly 1.5 intermediate, exactly 2.0
/// advanced. First match wins.
pub fn difficulty_band(difficulty: f64) -> DifficultyBand {
    if difficulty <= 1.0 {
        DifficultyBand::Basic
    } else if difficulty <= 1.5 {
        DifficultyBand::Intermediate
    } else if difficulty <= 2.0 {
        DifficultyBand::Advanced
    } else {
        DifficultyBand::Expert
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn make_candidate(level: CandidateLevel, years: f64, past_scores: Vec<f64>) -> Candidate {
        Candidate {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            years_experience: years,
            skills: BTreeMap::new(),
            education: String::new(),
            level,
            past_scores,
        }
    }

    #[test]
    fn test_zero_experience_junior_hits_clamp_floor() {
        // base 1.0 × min(0/2, 1.5) = 0 before the clamp
        let candidate = make_candidate(CandidateLevel::Junior, 0.0, vec![]);
        assert_eq!(initial_difficulty(&candidate), 0.5);
    }

    #[test]
    fn test_experienced_senior_hits_clamp_ceiling() {
        // 2.0 × min(5, 1.5) = 3.0 → clamped to 2.5
        let candidate = make_candidate(CandidateLevel::Senior, 10.0, vec![]);
        assert_eq!(initial_difficulty(&candidate), 2.5);
    }

    #[test]
    fn test_neutral_history_leaves_difficulty_unchanged() {
        let with_history = make_candidate(CandidateLevel::Intermediate, 2.0, vec![50.0, 50.0]);
        let without = make_candidate(CandidateLevel::Intermediate, 2.0, vec![]);
        assert_eq!(
            initial_difficulty(&with_history),
            initial_difficulty(&without)
        );
    }

    #[test]
    fn test_weak_history_shrinks_difficulty() {
        // 1.5 × 1.0 × (30/50) = 0.9
        let candidate = make_candidate(CandidateLevel::Intermediate, 2.0, vec![30.0]);
        assert!((initial_difficulty(&candidate) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_empty_history_skips_history_factor() {
        // 1.5 × min(3/2, 1.5) = 2.25, no history factor applied
        let candidate = make_candidate(CandidateLevel::Intermediate, 3.0, vec![]);
        assert!((initial_difficulty(&candidate) - 2.25).abs() < 1e-9);
    }

    #[test]
    fn test_adjust_raises_above_85() {
        let result = adjust_difficulty(1.0, &[90.0, 88.0], 92.0);
        assert!((result - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_adjust_lowers_below_60() {
        let result = adjust_difficulty(1.0, &[40.0, 50.0], 45.0);
        assert!((result - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_adjust_neutral_band_is_inert() {
        // Means of exactly 60 and exactly 85 sit inside the neutral band.
        assert_eq!(adjust_difficulty(1.3, &[60.0, 60.0], 60.0), 1.3);
        assert_eq!(adjust_difficulty(1.3, &[85.0, 85.0], 85.0), 1.3);
        assert_eq!(adjust_difficulty(1.3, &[70.0, 75.0], 72.0), 1.3);
    }

    #[test]
    fn test_adjust_uses_only_last_three_scores() {
        // Old low scores must not drag the window down.
        let result = adjust_difficulty(1.0, &[10.0, 10.0, 90.0, 90.0], 90.0);
        assert!((result - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_adjust_with_short_history() {
        let result = adjust_difficulty(1.0, &[], 95.0);
        assert!((result - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_adjust_respects_cap_and_floor() {
        assert_eq!(adjust_difficulty(2.4, &[], 95.0), 2.5);
        assert_eq!(adjust_difficulty(0.55, &[], 10.0), 0.5);
    }

    #[test]
    fn test_adjust_is_pure() {
        let history = vec![88.0, 91.0];
        let first = adjust_difficulty(1.0, &history, 90.0);
        let second = adjust_difficulty(1.0, &history, 90.0);
        assert_eq!(first, second);
        assert_eq!(history, vec![88.0, 91.0]);
    }

    #[test]
    fn test_monotonic_across_thresholds() {
        let history = vec![70.0, 70.0];
        let low = adjust_difficulty(1.0, &history, 20.0); // window mean < 60
        let mid = adjust_difficulty(1.0, &history, 70.0); // neutral
        let high = adjust_difficulty(1.0, &history, 100.0); // window mean stays neutral here
        assert!(low <= mid);
        assert!(mid <= high);
    }

    #[test]
    fn test_band_boundaries_are_closed_upper() {
        assert_eq!(difficulty_band(0.5), DifficultyBand::Basic);
        assert_eq!(difficulty_band(1.0), DifficultyBand::Basic);
        assert_eq!(difficulty_band(1.2), DifficultyBand::Intermediate);
        assert_eq!(difficulty_band(1.5), DifficultyBand::Intermediate);
        assert_eq!(difficulty_band(2.0), DifficultyBand::Advanced);
        assert_eq!(difficulty_band(2.1), DifficultyBand::Expert);
        assert_eq!(difficulty_band(2.5), DifficultyBand::Expert);
    }

    proptest! {
        /// Difficulty stays inside [0.5, 2.5] under any sequence of adjustments.
        #[test]
        fn prop_difficulty_always_bounded(
            years in 0.0_f64..40.0,
            past in proptest::collection::vec(0.0_f64..=100.0, 0..10),
            scores in proptest::collection::vec(0.0_f64..=100.0, 0..30),
        ) {
            let candidate = make_candidate(CandidateLevel::Senior, years, past);
            let mut difficulty = initial_difficulty(&candidate);
            prop_assert!((MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty));

            let mut history: Vec<f64> = Vec::new();
            for score in scores {
                difficulty = adjust_difficulty(difficulty, &history, score);
                history.push(score);
                prop_assert!((MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty));
            }
        }

        /// Higher new scores never produce lower difficulty for a fixed history.
        #[test]
        fn prop_adjustment_monotonic_in_new_score(
            current in 0.5_f64..=2.5,
            history in proptest::collection::vec(0.0_f64..=100.0, 0..6),
            a in 0.0_f64..=100.0,
            b in 0.0_f64..=100.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let low = adjust_difficulty(current, &history, lo);
            let high = adjust_difficulty(current, &history, hi);
            prop_assert!(low <= high);
        }
    }
}
