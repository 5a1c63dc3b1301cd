// Library root: re-exports all modules so integration tests and the binary
// share the crate's public API.

pub mod error;
pub mod http;
pub mod protocol;
pub mod startup;
