//! Analysis engine: commit classification, release aggregation and the
//! per-scope version analysis built on top of them

pub mod aggregator;
pub mod classifier;
pub mod version_analyzer;

pub use aggregator::aggregate;
pub use classifier::{classify, AnalyzedCommit, Summary};
pub use version_analyzer::{next_rc_sequence, Analyzer};
