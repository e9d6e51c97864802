pub mod analyzer;
pub mod processor;
pub mod stats;
pub mod types;
pub mod utils;

pub use analyzer::{classify_value, infer_column_type};
pub use processor::{process_rows, ExcelProcessor};
pub use stats::compute_statistics;
pub use types::*;
pub use utils::{clean_column_name, parse_date, sanitize_column_name};
