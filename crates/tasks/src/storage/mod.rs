//! Storage layer for task persistence.

mod file;
mod traits;

pub use file::{FileStorage, REPORT_FILE_NAME};
pub use traits::Storage;
