use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const RECENT_WINDOW: usize = 10;
pub const DEFAULT_DIFFICULTY_LEVEL: f64 = 0.5;

const MIN_ANSWERS_FOR_ADJUSTMENT: usize = 3;
const MIN_ANSWERS_FOR_TREND: usize = 5;
const RAISE_THRESHOLD: f64 = 0.8;
const LOWER_THRESHOLD: f64 = 0.4;
const DIFFICULTY_STEP: f64 = 0.1;
const TREND_MARGIN: f64 = 0.1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    #[serde(default)]
    pub question_id: Option<String>,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub time_taken: Option<f64>,
    #[serde(default)]
    pub difficulty: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: Option<String>,
    pub is_correct: bool,
    pub time_taken: Option<f64>,
    pub difficulty: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Stable,
    Improving,
    Declining,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceInsights {
    pub accuracy: u32,
    pub total_questions: u64,
    pub difficulty_level: f64,
    pub recent_trend: Trend,
}

/// Per-user answer history driving adaptive difficulty.
///
/// Lifetime counters feed `average_accuracy`; the bounded
/// `recent_performance` window feeds difficulty adjustment and trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceProfile {
    pub user_id: String,
    pub total_questions_answered: u64,
    pub total_correct_answers: u64,
    pub average_accuracy: f64,
    pub current_difficulty_level: f64,
    pub recent_performance: VecDeque<AnswerRecord>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl PerformanceProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            total_questions_answered: 0,
            total_correct_answers: 0,
            average_accuracy: 0.0,
            current_difficulty_level: DEFAULT_DIFFICULTY_LEVEL,
            recent_performance: VecDeque::with_capacity(RECENT_WINDOW + 1),
            updated_at: Utc::now(),
            version: 0,
        }
    }

    pub fn record_answer(&mut self, outcome: AnswerOutcome, now: DateTime<Utc>) {
        self.total_questions_answered += 1;
        if outcome.is_correct {
            self.total_correct_answers += 1;
        }
        self.average_accuracy =
            self.total_correct_answers as f64 / self.total_questions_answered as f64 * 100.0;

        self.recent_performance.push_back(AnswerRecord {
            question_id: outcome.question_id,
            is_correct: outcome.is_correct,
            time_taken: outcome.time_taken,
            difficulty: outcome.difficulty,
            timestamp: now,
        });
        while self.recent_performance.len() > RECENT_WINDOW {
            self.recent_performance.pop_front();
        }

        self.adjust_difficulty();
        self.updated_at = now;
    }

    fn adjust_difficulty(&mut self) {
        if self.recent_performance.len() < MIN_ANSWERS_FOR_ADJUSTMENT {
            return;
        }

        let recent_accuracy = correct_ratio(self.recent_performance.iter());
        if recent_accuracy >= RAISE_THRESHOLD {
            self.current_difficulty_level =
                (self.current_difficulty_level + DIFFICULTY_STEP).min(1.0);
        } else if recent_accuracy <= LOWER_THRESHOLD {
            self.current_difficulty_level =
                (self.current_difficulty_level - DIFFICULTY_STEP).max(0.0);
        }
    }

    pub fn trend(&self) -> Trend {
        let len = self.recent_performance.len();
        if len < MIN_ANSWERS_FOR_TREND {
            return Trend::Stable;
        }

        let mid = len / 2;
        let first = correct_ratio(self.recent_performance.iter().take(mid));
        let second = correct_ratio(self.recent_performance.iter().skip(mid));

        if second > first + TREND_MARGIN {
            Trend::Improving
        } else if second < first - TREND_MARGIN {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }

    pub fn insights(&self) -> PerformanceInsights {
        PerformanceInsights {
            accuracy: self.average_accuracy.round() as u32,
            total_questions: self.total_questions_answered,
            difficulty_level: self.current_difficulty_level,
            recent_trend: self.trend(),
        }
    }

    pub fn has_recently_seen(&self, question_id: &str) -> bool {
        self.recent_performance
            .iter()
            .any(|record| record.question_id.as_deref() == Some(question_id))
    }
}

fn correct_ratio<'a>(records: impl Iterator<Item = &'a AnswerRecord>) -> f64 {
    let (correct, total) = records.fold((0usize, 0usize), |(correct, total), record| {
        (correct + usize::from(record.is_correct), total + 1)
    });
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64
}
