pub mod batch;
pub mod cells;
pub mod database;

pub use batch::BatchExecutor;
pub use cells::CellEngine;
pub use database::Database;
