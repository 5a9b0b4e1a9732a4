pub mod profile;
pub mod selector;
pub mod tier;

pub use profile::{AnswerOutcome, AnswerRecord, PerformanceInsights, PerformanceProfile, Trend};
pub use selector::{AdaptiveCandidate, QuestionDifficulty};
pub use tier::{DifficultyTier, SessionPerformance};
