// Tapping entries of a single-column list that scrolls vertically
use super::error::AutomationResult;
use super::gestures;
use crate::adb::AdbClient;
use crate::geometry::Point;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListGeometry {
    /// Center of the first visible entry
    pub origin: Point,
    /// Number of entries visible at once
    pub visible_len: u32,
    /// Upward drag distance that scrolls the list by one entry
    pub drag_dy: i32,
    /// Distance between neighbouring entries
    pub tap_dy: i32,
}

/// Tap entry `index` of a list that starts scrolled to the top. Entries past
/// the visible ones are scrolled into the last visible slot, one drag each.
/// Naps after the tap so the next step sees the settled screen.
pub async fn tap_list_item<D: AdbClient>(
    device: &D,
    list: &ListGeometry,
    index: u32,
) -> AutomationResult<()> {
    let visible = list.visible_len.max(1);
    if index < visible {
        gestures::tap(device, list.origin.offset(0, index as i32 * list.tap_dy)).await?;
        gestures::nap().await;
        return Ok(());
    }

    for _ in 0..index - (visible - 1) {
        gestures::drag(device, list.origin, 0, -list.drag_dy).await?;
    }
    let last_slot = (visible - 1) as i32 * list.tap_dy;
    gestures::tap(device, list.origin.offset(0, last_slot)).await?;
    gestures::nap().await;
    Ok(())
}
