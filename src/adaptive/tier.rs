use serde::{Deserialize, Serialize};

const STEP_UP_MIN_ACCURACY: f64 = 80.0;
const STEP_UP_MAX_AVG_TIME: f64 = 15.0;
const STEP_UP_MIN_STREAK: u32 = 3;
const STEP_DOWN_MAX_ACCURACY: f64 = 40.0;
const STEP_DOWN_MIN_AVG_TIME: f64 = 45.0;

/// Categorical difficulty applied to a whole quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl DifficultyTier {
    const ORDER: [DifficultyTier; 4] = [
        DifficultyTier::Easy,
        DifficultyTier::Medium,
        DifficultyTier::Hard,
        DifficultyTier::Expert,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn harder(self) -> Self {
        Self::ORDER
            .get(self.index() + 1)
            .copied()
            .unwrap_or(self)
    }

    pub fn easier(self) -> Self {
        self.index()
            .checked_sub(1)
            .map(|i| Self::ORDER[i])
            .unwrap_or(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPerformance {
    /// Percentage, 0-100.
    pub accuracy: f64,
    /// Seconds per question.
    pub average_time: f64,
    #[serde(default)]
    pub streak: u32,
}

pub fn next_tier(current: DifficultyTier, performance: &SessionPerformance) -> DifficultyTier {
    let excelling = performance.accuracy > STEP_UP_MIN_ACCURACY
        && performance.average_time < STEP_UP_MAX_AVG_TIME
        && performance.streak > STEP_UP_MIN_STREAK;
    if excelling {
        return current.harder();
    }

    let struggling = performance.accuracy < STEP_DOWN_MAX_ACCURACY
        || performance.average_time > STEP_DOWN_MIN_AVG_TIME;
    if struggling {
        return current.easier();
    }

    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perf(accuracy: f64, average_time: f64, streak: u32) -> SessionPerformance {
        SessionPerformance {
            accuracy,
            average_time,
            streak,
        }
    }

    #[test]
    fn steps_up_when_fast_accurate_and_streaking() {
        let strong = perf(90.0, 10.0, 4);
        assert_eq!(next_tier(DifficultyTier::Easy, &strong), DifficultyTier::Medium);
        assert_eq!(next_tier(DifficultyTier::Hard, &strong), DifficultyTier::Expert);
        assert_eq!(next_tier(DifficultyTier::Expert, &strong), DifficultyTier::Expert);
    }

    #[test]
    fn step_up_needs_all_three_signals() {
        assert_eq!(next_tier(DifficultyTier::Medium, &perf(80.0, 10.0, 5)), DifficultyTier::Medium);
        assert_eq!(next_tier(DifficultyTier::Medium, &perf(90.0, 15.0, 5)), DifficultyTier::Medium);
        assert_eq!(next_tier(DifficultyTier::Medium, &perf(90.0, 10.0, 3)), DifficultyTier::Medium);
    }

    #[test]
    fn steps_down_on_low_accuracy_or_slow_answers() {
        assert_eq!(next_tier(DifficultyTier::Hard, &perf(30.0, 10.0, 0)), DifficultyTier::Medium);
        assert_eq!(next_tier(DifficultyTier::Hard, &perf(70.0, 50.0, 0)), DifficultyTier::Medium);
        assert_eq!(next_tier(DifficultyTier::Easy, &perf(10.0, 60.0, 0)), DifficultyTier::Easy);
    }

    #[test]
    fn parses_lowercase_labels() {
        let tier: DifficultyTier = serde_json::from_str("\"expert\"").unwrap();
        assert_eq!(tier, DifficultyTier::Expert);
        assert!(serde_json::from_str::<DifficultyTier>("\"mixed\"").is_err());
    }
}
