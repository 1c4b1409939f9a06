pub mod heuristic;

pub use heuristic::{HeuristicLabeler, LabelRule, MatchScope};
