// https://crates.io/crates/adb_client
use super::error::{AdbError, AdbResult};
use super::types::{AdbClient, Device, clamp_to_screen, parse_screen_size};
use adb_client::{ADBDeviceExt, ADBServer, ADBServerDevice};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const INPUT_TIMEOUT: Duration = Duration::from_secs(5);
const CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);

/// Device backend talking to the ADB server through `adb_client`.
pub struct RustAdb {
    device: Device,
    server_device: Arc<Mutex<ADBServerDevice>>,
    screen_x: u32,
    screen_y: u32,
}

impl RustAdb {
    /// Run a shell command on the device in a blocking task, bounded by `timeout`.
    async fn shell(&self, args: Vec<String>, timeout: Duration) -> AdbResult<Vec<u8>> {
        let server_device = Arc::clone(&self.server_device);
        let command = args.join(" ");
        let task = tokio::task::spawn_blocking(move || -> AdbResult<Vec<u8>> {
            let mut out: Vec<u8> = Vec::new();
            let mut dev = server_device.blocking_lock();
            let refs: Vec<&str> = args.iter().map(String::as_str).collect();
            dev.shell_command(&refs, &mut out)
                .map_err(|source| AdbError::ServerCommandFailed {
                    command: refs.join(" "),
                    source,
                })?;
            Ok(out)
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined?,
            Err(_) => Err(AdbError::Timeout {
                duration: timeout,
                description: format!("RustAdb: '{command}' (device may be disconnected)"),
            }),
        }
    }

    pub async fn list_devices() -> AdbResult<Vec<Device>> {
        let mut server = ADBServer::default();
        let device_list = tokio::task::spawn_blocking(move || server.devices())
            .await?
            .map_err(|source| AdbError::ServerCommandFailed {
                command: "devices".to_string(),
                source,
            })?;
        Ok(device_list
            .into_iter()
            .map(|d| Device {
                name: d.identifier,
                transport_id: None,
            })
            .collect())
    }

    pub async fn new_with_device(device_name: &str) -> AdbResult<Self> {
        let mut server = ADBServer::default();
        let name = device_name.to_string();
        let server_device = tokio::task::spawn_blocking(move || {
            if name.is_empty() {
                server.get_device()
            } else {
                server.get_device_by_name(&name)
            }
        })
        .await?
        .map_err(|source| AdbError::ServerCommandFailed {
            command: format!("open device '{device_name}'"),
            source,
        })?;

        let mut adb = RustAdb {
            device: Device {
                name: device_name.to_string(),
                transport_id: None,
            },
            server_device: Arc::new(Mutex::new(server_device)),
            screen_x: 0,
            screen_y: 0,
        };
        let out = adb
            .shell(vec!["wm".into(), "size".into()], INPUT_TIMEOUT)
            .await?;
        let (screen_x, screen_y) =
            parse_screen_size(&String::from_utf8_lossy(&out)).ok_or(AdbError::ScreenSizeParseFailed)?;
        adb.screen_x = screen_x;
        adb.screen_y = screen_y;
        log::info!(
            "RustAdb: connected to '{}' ({}x{})",
            device_name,
            screen_x,
            screen_y
        );
        Ok(adb)
    }
}

impl AdbClient for RustAdb {
    async fn screen_capture_bytes(&self) -> AdbResult<Vec<u8>> {
        self.shell(vec!["screencap".into(), "-p".into()], CAPTURE_TIMEOUT)
            .await
    }

    async fn tap(&self, x: u32, y: u32) -> AdbResult<()> {
        if x >= self.screen_x || y >= self.screen_y {
            return Err(AdbError::TapOutOfBounds { x, y });
        }
        let args = vec!["input".into(), "tap".into(), x.to_string(), y.to_string()];
        self.shell(args, INPUT_TIMEOUT).await.map(drop)
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
        let mut args: Vec<String> = vec![
            "input".into(),
            "swipe".into(),
            x1.to_string(),
            y1.to_string(),
            x2.to_string(),
            y2.to_string(),
        ];
        // The gesture itself takes `duration`; leave room for it on top of the usual budget
        let mut timeout = INPUT_TIMEOUT;
        if let Some(d) = duration {
            args.push(d.to_string());
            timeout += Duration::from_millis(d as u64);
        }
        self.shell(args, timeout).await.map(drop)
    }

    fn screen_dimensions(&self) -> (u32, u32) {
        (self.screen_x, self.screen_y)
    }

    fn device_name(&self) -> &str {
        &self.device.name
    }
}
