pub mod formatter;

pub use formatter::{
    format_datasets, format_range_table, format_rank_result, format_score, format_score_result,
    format_user, should_use_colors,
};
