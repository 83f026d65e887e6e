pub mod audit;
pub mod backup;
pub mod csv;
pub mod delete;
pub mod dispatch;
pub mod schema;
pub mod shared;
