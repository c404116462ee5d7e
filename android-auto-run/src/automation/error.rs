// Errors surfaced by wait loops and navigation
use crate::adb::AdbError;
use std::time::Duration;
use thiserror::Error;

pub type AutomationResult<T> = Result<T, AutomationError>;

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("Timeout after {timeout:?} waiting for [{templates}]")]
    Timeout { timeout: Duration, templates: String },

    #[error("None of [{templates}] is on screen")]
    Assertion { templates: String },

    #[error("Device action failed: {0}")]
    Device(#[from] AdbError),

    #[error("Cell ({column}, {row}) is outside the {table_width}x{table_height} table")]
    CellOutOfRange {
        column: u32,
        row: u32,
        table_width: u32,
        table_height: u32,
    },
}
