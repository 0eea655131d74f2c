pub mod clock;
pub mod data;
pub mod error;
pub mod types;

pub use clock::Clock;
pub use data::TableData;
pub use error::{CellarError, ErrorKind};
pub use types::{
    normalize_table_name, require_identifier, CellRecord, ColumnHistory, FamilyData, InsertBatch,
    RowData, RowView, ScanView, TableMetadata, Timestamp, TruncateReport, UpdateBatch,
};
