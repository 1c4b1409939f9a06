pub mod blocks;
pub mod clean;

pub use blocks::BlockExtractor;
pub use clean::TextCleaner;
