//! Database access: schema lifecycle and occurrence reads

pub mod init;
pub mod migrations;
pub mod occurrences;
pub mod schema_sync;
pub mod table_schemas;

pub use init::*;
pub use occurrences::*;
pub use table_schemas::{relevance_column, FEATURE_COLUMNS};
