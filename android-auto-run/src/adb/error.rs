use thiserror::Error;

/// A specialized `Result` type for ADB operations.
pub type AdbResult<T> = Result<T, AdbError>;

/// The error type for all ADB-related operations.
#[derive(Debug, Error)]
pub enum AdbError {
    #[error("'adb' binary not available: {description}. Install Android Platform Tools or run with --impl=rust.")]
    AdbNotAvailable { description: String },

    #[error("Failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        source: std::io::Error,
    },

    #[error("Command '{command}' exited with failure: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("ADB server request '{command}' failed: {source}")]
    ServerCommandFailed {
        command: String,
        source: adb_client::RustADBError,
    },

    #[error("No devices found")]
    NoDevices,

    #[error("Device '{name}' not found")]
    DeviceNotFound { name: String },

    #[error("Operation timed out after {duration:?}: {description}")]
    Timeout {
        duration: std::time::Duration,
        description: String,
    },

    #[error("Task failed to complete: {source}")]
    JoinError {
        #[from]
        source: tokio::task::JoinError,
    },

    #[error("Could not parse screen size from 'wm size' output.")]
    ScreenSizeParseFailed,

    #[error("Tap coordinates are out of bounds: x={x}, y={y}")]
    TapOutOfBounds { x: u32, y: u32 },
}

impl AdbError {
    /// Errors after which the connection should be re-established.
    pub fn is_disconnect(&self) -> bool {
        match self {
            AdbError::Timeout { .. } => true,
            AdbError::CommandFailed { stderr, .. } => is_disconnect_message(stderr),
            AdbError::ServerCommandFailed { source, .. } => {
                is_disconnect_message(&source.to_string())
            }
            _ => false,
        }
    }
}

pub(crate) fn is_disconnect_message(message: &str) -> bool {
    let message = message.to_lowercase();
    ["device offline", "not found", "no devices", "disconnected", "closed"]
        .iter()
        .any(|needle| message.contains(needle))
}
