pub mod export;
pub mod projector;

pub use export::{export_to_file, write_csv, DEFAULT_EXPORT_FILE, EXPORT_HEADER};
pub use projector::{
    classify, to_distribution, to_table_rows, Classification, DistributionEntry, TableRow,
    DATA_ERROR_CODE, UNKNOWN_CODE,
};
