mod audit;
mod backup;
mod csv;

pub use audit::AuditCommands;
pub use backup::{BackupCommands, RestoreMode};
pub use csv::CsvCommands;
