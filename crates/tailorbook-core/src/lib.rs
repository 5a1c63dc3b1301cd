// Library root for the tailoring shop's data layer: configuration, the
// reference catalog, domain types, and the SQLite store.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod model;

pub use db::Database;
pub use error::{StoreError, StoreResult};
