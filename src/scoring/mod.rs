pub mod patterns;
pub mod urgency;
pub mod fallback;
pub mod relevance;

pub use fallback::FallbackScorer;
pub use relevance::{RelevanceScorer, RelevanceWeights, ScoreBreakdown};
pub use urgency::{UrgencyClassifier, UrgencyPredicate, UrgencyRule};
