pub mod converter;
pub mod source;
pub mod table;
pub mod types;

pub use converter::{fallback_rank, fallback_score, ScoreRankConverter};
pub use source::{DistributionSource, FileSource, HttpSource};
pub use table::{DistributionTable, TableError};
pub use types::{Choice, Conversion, DistributionEntry, RawEntry, ScoreLabel, TableKey};
