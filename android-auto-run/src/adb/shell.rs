use super::error::{AdbError, AdbResult};
use super::types::{AdbClient, Device, clamp_to_screen, parse_devices, parse_screen_size};
use std::time::Duration;
use tokio::process::Command;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Device backend driving the `adb` command line tool.
pub struct AdbShell {
    pub device: Device,
    pub screen_x: u32,
    pub screen_y: u32,
}

impl AdbShell {
    fn ensure_adb_available() -> AdbResult<()> {
        match std::process::Command::new("adb").arg("version").output() {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => Err(AdbError::AdbNotAvailable {
                description: format!("'adb version' returned {}", out.status),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AdbError::AdbNotAvailable {
                description: "'adb' binary not found in PATH".to_string(),
            }),
            Err(e) => Err(AdbError::AdbNotAvailable {
                description: e.to_string(),
            }),
        }
    }

    /// Run `adb <args>` and return stdout, failing on a non-zero exit.
    async fn run(args: &[&str]) -> AdbResult<Vec<u8>> {
        let command = format!("adb {}", args.join(" "));
        let output = tokio::time::timeout(COMMAND_TIMEOUT, Command::new("adb").args(args).output())
            .await
            .map_err(|_| AdbError::Timeout {
                duration: COMMAND_TIMEOUT,
                description: command.clone(),
            })?
            .map_err(|source| AdbError::SpawnFailed {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(AdbError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    /// Run a command against this device only.
    async fn run_on_device(&self, args: &[&str]) -> AdbResult<Vec<u8>> {
        let mut full = vec!["-s", self.device.name.as_str()];
        full.extend_from_slice(args);
        Self::run(&full).await
    }

    pub async fn list_devices() -> AdbResult<Vec<Device>> {
        Self::ensure_adb_available()?;
        let stdout = Self::run(&["devices", "-l"]).await?;
        Ok(parse_devices(&String::from_utf8_lossy(&stdout)))
    }

    pub async fn new_with_device(device_name: &str) -> AdbResult<Self> {
        let mut devices = Self::list_devices().await?;
        if !devices.iter().any(|d| d.name == device_name) && device_name.contains(':') {
            // Network device: try to connect first (adb tcpip 5555 on the phone)
            let out = Self::run(&["connect", device_name]).await?;
            let out = String::from_utf8_lossy(&out);
            if out.contains("refused") || out.contains("failed") {
                return Err(AdbError::CommandFailed {
                    command: format!("adb connect {device_name}"),
                    stderr: out.trim().to_string(),
                });
            }
            devices = Self::list_devices().await?;
        }
        let device = devices
            .into_iter()
            .find(|d| d.name == device_name)
            .ok_or_else(|| AdbError::DeviceNotFound {
                name: device_name.to_string(),
            })?;
        let mut shell = Self {
            device,
            screen_x: 0,
            screen_y: 0,
        };
        let stdout = shell.run_on_device(&["shell", "wm", "size"]).await?;
        let (screen_x, screen_y) = parse_screen_size(&String::from_utf8_lossy(&stdout))
            .ok_or(AdbError::ScreenSizeParseFailed)?;
        shell.screen_x = screen_x;
        shell.screen_y = screen_y;
        log::info!(
            "AdbShell: connected to {} ({}x{})",
            shell.device.name,
            screen_x,
            screen_y
        );
        Ok(shell)
    }
}

impl AdbClient for AdbShell {
    async fn screen_capture_bytes(&self) -> AdbResult<Vec<u8>> {
        self.run_on_device(&["exec-out", "screencap", "-p"]).await
    }

    async fn tap(&self, x: u32, y: u32) -> AdbResult<()> {
        if x >= self.screen_x || y >= self.screen_y {
            return Err(AdbError::TapOutOfBounds { x, y });
        }
        let (xs, ys) = (x.to_string(), y.to_string());
        self.run_on_device(&["shell", "input", "tap", &xs, &ys])
            .await
            .map(drop)
    }

    async fn swipe(
        &self,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        duration: Option<u32>,
    ) -> AdbResult<()> {
        let screen = self.screen_dimensions();
        let (x1, y1) = clamp_to_screen(x1, y1, screen);
        let (x2, y2) = clamp_to_screen(x2, y2, screen);
        let mut parts: Vec<String> = ["shell", "input", "swipe"]
            .iter()
            .map(|s| s.to_string())
            .chain([x1, y1, x2, y2].iter().map(u32::to_string))
            .collect();
        if let Some(d) = duration {
            parts.push(d.to_string());
        }
        let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
        self.run_on_device(&refs).await.map(drop)
    }

    fn screen_dimensions(&self) -> (u32, u32) {
        (self.screen_x, self.screen_y)
    }

    fn device_name(&self) -> &str {
        &self.device.name
    }
}
