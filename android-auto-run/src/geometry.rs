//! Screen-space geometry shared by matching and navigation.

use serde::Serialize;
use std::fmt;

/// A pixel position on the device screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Device coordinates; negative components are clamped to the screen edge.
    pub fn to_device(self) -> (u32, u32) {
        (self.x.max(0) as u32, self.y.max(0) as u32)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub const fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2,
            self.origin.y + self.size.height / 2,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_center() {
        // 50x50 box at (100, 150) -> (125, 175)
        assert_eq!(Rect::new(100, 150, 50, 50).center(), Point::new(125, 175));
        // Odd sizes round toward the origin
        assert_eq!(Rect::new(0, 0, 5, 3).center(), Point::new(2, 1));
    }

    #[test]
    fn test_point_to_device_clamps_negative() {
        assert_eq!(Point::new(-40, 12).to_device(), (0, 12));
        assert_eq!(Point::new(7, -1).to_device(), (7, 0));
    }
}
