// ADB module - Android Debug Bridge device transport
// Screen capture and input injection through either the `adb` binary
// or the ADB server protocol (pure Rust).

pub mod backend;
pub mod error;
pub mod rust_impl;
pub mod shell;
pub mod types;


// Re-export the main types and functions for easy access
pub use backend::AdbBackend;
pub use error::{AdbError, AdbResult};
pub use rust_impl::RustAdb;
pub use shell::AdbShell;
pub use types::{AdbClient, DRAG_DURATION_MS, Device, ImageCapture};
