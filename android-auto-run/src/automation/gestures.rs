// Screen gestures in screen-space points with relative movement
use crate::adb::{AdbClient, AdbResult};
use crate::geometry::Point;
use std::time::Duration;

/// Swipe that snaps a scrolled view against its first or last edge
pub const EDGE_SWIPE: Duration = Duration::from_secs(1);
/// Long swipe that scrolls a table back to its start
pub const RESET_SWIPE: Duration = Duration::from_secs(3);

const NAP: Duration = Duration::from_secs(1);
const PAUSE: Duration = Duration::from_secs(2);

pub async fn tap<D: AdbClient>(device: &D, at: Point) -> AdbResult<()> {
    let (x, y) = at.to_device();
    log::debug!("{}: tap {at}", device.device_name());
    device.tap(x, y).await
}

/// Slow swipe by `(dx, dy)` that leaves no momentum.
pub async fn drag<D: AdbClient>(device: &D, from: Point, dx: i32, dy: i32) -> AdbResult<()> {
    let (x1, y1) = from.to_device();
    let (x2, y2) = from.offset(dx, dy).to_device();
    log::debug!("{}: drag {from} by ({dx}, {dy})", device.device_name());
    device.drag(x1, y1, x2, y2).await
}

pub async fn swipe<D: AdbClient>(
    device: &D,
    from: Point,
    dx: i32,
    dy: i32,
    duration: Duration,
) -> AdbResult<()> {
    let (x1, y1) = from.to_device();
    let (x2, y2) = from.offset(dx, dy).to_device();
    let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
    log::debug!("{}: swipe {from} by ({dx}, {dy}) over {millis}ms", device.device_name());
    device.swipe(x1, y1, x2, y2, Some(millis)).await
}

/// Short settle delay between actions.
pub async fn nap() {
    tokio::time::sleep(NAP).await;
}

/// Longer delay, e.g. after opening a screen.
pub async fn pause() {
    tokio::time::sleep(PAUSE).await;
}
