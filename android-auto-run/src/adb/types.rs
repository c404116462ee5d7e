// Core ADB types and traits
use super::error::AdbResult;
use serde::Serialize;

/// Duration of the slow swipe used to emulate a drag, in milliseconds.
/// Long enough that the list under the finger stops with it instead of flinging.
pub const DRAG_DURATION_MS: u32 = 1500;

#[derive(Debug, Clone, Serialize)]
pub struct ImageCapture {
    pub bytes: Vec<u8>,
    pub duration_ms: u128,
}

// Capabilities the automation layer needs from a device (shell, rust or test doubles)
#[allow(async_fn_in_trait)]
pub trait AdbClient {
    // Raw backend-specific capture (PNG bytes, may be empty)
    async fn screen_capture_bytes(&self) -> AdbResult<Vec<u8>>;

    // Default high-level capture with timing
    async fn screen_capture(&self) -> AdbResult<ImageCapture> {
        let start = std::time::Instant::now();
        let bytes = self.screen_capture_bytes().await?;
        Ok(ImageCapture {
            bytes,
            duration_ms: start.elapsed().as_millis(),
        })
    }

    async fn tap(&self, x: u32, y: u32) -> AdbResult<()>;

    async fn swipe(
        &self,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        duration: Option<u32>,
    ) -> AdbResult<()>;

    // A drag is a swipe slow enough to leave no momentum behind
    async fn drag(&self, x1: u32, y1: u32, x2: u32, y2: u32) -> AdbResult<()> {
        self.swipe(x1, y1, x2, y2, Some(DRAG_DURATION_MS)).await
    }

    fn screen_dimensions(&self) -> (u32, u32);
    fn device_name(&self) -> &str;
}

#[derive(Debug, PartialEq, Serialize, Clone)]
pub struct Device {
    pub name: String,
    pub transport_id: Option<String>,
}

/// Parse `adb devices -l` output into the list of ready devices.
pub fn parse_devices(output: &str) -> Vec<Device> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 2 && parts[1] == "device" {
                let name = parts[0].to_string();
                let transport_id = parts
                    .iter()
                    .find_map(|part| part.strip_prefix("transport_id:").map(str::to_string));
                Some(Device { name, transport_id })
            } else {
                None
            }
        })
        .collect()
}

/// Parse `wm size` output. An override size wins over the physical one
/// because input coordinates follow the override.
pub fn parse_screen_size(stdout: &str) -> Option<(u32, u32)> {
    let parse = |size_str: &str| {
        let (x, y) = size_str.trim().split_once('x')?;
        Some((x.parse::<u32>().ok()?, y.parse::<u32>().ok()?))
    };
    let mut physical = None;
    for line in stdout.lines() {
        if let Some(size_str) = line.strip_prefix("Override size: ") {
            return parse(size_str);
        }
        if let Some(size_str) = line.strip_prefix("Physical size: ") {
            physical = parse(size_str);
        }
    }
    physical
}

/// Clamp a point to the screen so out-of-range gesture endpoints still inject.
pub fn clamp_to_screen(x: u32, y: u32, screen: (u32, u32)) -> (u32, u32) {
    (
        x.min(screen.0.saturating_sub(1)),
        y.min(screen.1.saturating_sub(1)),
    )
}
