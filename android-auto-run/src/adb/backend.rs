use super::error::{AdbError, AdbResult};
use super::rust_impl::RustAdb;
use super::shell::AdbShell;
use super::types::{AdbClient, Device};

pub enum AdbBackend {
    Shell(AdbShell),
    Rust(RustAdb),
}

impl AdbBackend {
    pub async fn list_devices(use_rust: bool) -> AdbResult<Vec<Device>> {
        if use_rust {
            RustAdb::list_devices().await
        } else {
            AdbShell::list_devices().await
        }
    }

    pub async fn connect_first(use_rust: bool) -> AdbResult<Self> {
        let devices = Self::list_devices(use_rust).await?;
        let first = devices.into_iter().next().ok_or(AdbError::NoDevices)?;
        Self::new_with_device(&first.name, use_rust).await
    }

    pub async fn new_with_device(name: &str, use_rust: bool) -> AdbResult<Self> {
        if use_rust {
            Ok(AdbBackend::Rust(RustAdb::new_with_device(name).await?))
        } else {
            Ok(AdbBackend::Shell(AdbShell::new_with_device(name).await?))
        }
    }

    pub fn impl_str(&self) -> &'static str {
        match self {
            AdbBackend::Shell(_) => "shell",
            AdbBackend::Rust(_) => "rust",
        }
    }
}

impl AdbClient for AdbBackend {
    async fn screen_capture_bytes(&self) -> AdbResult<Vec<u8>> {
        match self {
            AdbBackend::Shell(s) => s.screen_capture_bytes().await,
            AdbBackend::Rust(r) => r.screen_capture_bytes().await,
        }
    }

    async fn tap(&self, x: u32, y: u32) -> AdbResult<()> {
        match self {
            AdbBackend::Shell(s) => s.tap(x, y).await,
            AdbBackend::Rust(r) => r.tap(x, y).await,
        }
    }

    async fn swipe(
        &self,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        duration: Option<u32>,
    ) -> AdbResult<()> {
        match self {
            AdbBackend::Shell(s) => s.swipe(x1, y1, x2, y2, duration).await,
            AdbBackend::Rust(r) => r.swipe(x1, y1, x2, y2, duration).await,
        }
    }

    fn screen_dimensions(&self) -> (u32, u32) {
        match self {
            AdbBackend::Shell(s) => s.screen_dimensions(),
            AdbBackend::Rust(r) => r.screen_dimensions(),
        }
    }

    fn device_name(&self) -> &str {
        match self {
            AdbBackend::Shell(s) => s.device_name(),
            AdbBackend::Rust(r) => r.device_name(),
        }
    }
}
