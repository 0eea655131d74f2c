pub mod catalog;
pub mod encryption;
pub mod locks;
pub mod table;
pub mod unit;

pub use catalog::{Catalog, DropAllReport, StoreOptions};
pub use table::{AlterTable, TableStore};
pub use unit::{TableUnit, UnitFiles};

#[cfg(test)]
mod tests;
