pub mod mapper;
pub mod upload;

pub use mapper::{map_meta, map_row, RawRecord};
pub use upload::{load_rows, parse_rows, select_payload};
