pub mod adb;
pub mod automation;
pub mod geometry;
pub mod match_image;

pub use adb::{AdbBackend, AdbClient};
pub use automation::{DeviceSession, TableSelector};
pub use geometry::{Point, Rect, Size};
pub use match_image::{Bitmap, MatchEngine, Template};
