pub mod label;
pub mod prediction;

pub use label::{FormalityLabel, LabeledExample, PolitenessLabel};
pub use prediction::Verdict;
