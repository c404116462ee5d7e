// Tapping cells of a scrollable grid that is larger than the screen
//
// The selector tracks which part of the table is visible (the viewport
// offset) and keeps it in step with every drag it performs, so cells
// can be addressed by table coordinates across calls.

use super::error::{AutomationError, AutomationResult};
use super::gestures::{self, EDGE_SWIPE, RESET_SWIPE};
use crate::adb::AdbClient;
use crate::geometry::{Point, Size};
use serde::Serialize;

/// Fill order of sequence numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    /// Rows are filled left to right, then top to bottom
    Horizontal,
    /// Columns are filled top to bottom, then left to right
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Cell {
    pub column: u32,
    pub row: u32,
}

impl Cell {
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }
}

/// Cell holding the `seq`-th item of a table filled along `axis`.
pub fn index_to_cell(seq: u32, axis: Axis, table_width: u32, table_height: u32) -> Cell {
    match axis {
        Axis::Horizontal => {
            let width = table_width.max(1);
            Cell::new(seq % width, seq / width)
        }
        Axis::Vertical => {
            let height = table_height.max(1);
            Cell::new(seq / height, seq % height)
        }
    }
}

/// Fixed on-screen geometry of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableLayout {
    /// Center of the top-left visible cell
    pub origin: Point,
    /// Center of the bottom-right cell when the view is scrolled to the end
    pub finale: Point,
    /// Distance between neighbouring cell centers
    pub item_interval: Size,
    /// Drag distance that scrolls the table by exactly one cell
    pub drag_interval: Size,
    pub view_width: u32,
    pub view_height: u32,
    pub table_width: u32,
    pub table_height: u32,
    pub axis: Axis,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Columns,
    Rows,
}

#[derive(Debug, Clone)]
pub struct TableSelector {
    layout: TableLayout,
    stride: u32,
    view_x: u32,
    view_y: u32,
}

impl TableSelector {
    /// Viewport dimensions are clamped into `1..=table` dimensions.
    pub fn new(mut layout: TableLayout) -> Self {
        layout.table_width = layout.table_width.max(1);
        layout.table_height = layout.table_height.max(1);
        layout.view_width = layout.view_width.clamp(1, layout.table_width);
        layout.view_height = layout.view_height.clamp(1, layout.table_height);
        let stride = match layout.axis {
            Axis::Horizontal => layout.table_width,
            Axis::Vertical => layout.table_height,
        };
        Self {
            layout,
            stride,
            view_x: 0,
            view_y: 0,
        }
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// Current viewport offset `(view_x, view_y)`
    pub fn view(&self) -> (u32, u32) {
        (self.view_x, self.view_y)
    }

    pub fn cell_at(&self, seq: u32) -> Cell {
        match self.layout.axis {
            Axis::Horizontal => Cell::new(seq % self.stride, seq / self.stride),
            Axis::Vertical => Cell::new(seq / self.stride, seq % self.stride),
        }
    }

    pub async fn tap_index<D: AdbClient>(&mut self, device: &D, seq: u32) -> AutomationResult<()> {
        let cell = self.cell_at(seq);
        self.tap_item(device, cell).await
    }

    /// Scroll `cell` into view if needed and tap it.
    pub async fn tap_item<D: AdbClient>(&mut self, device: &D, cell: Cell) -> AutomationResult<()> {
        let TableLayout {
            table_width,
            table_height,
            ..
        } = self.layout;
        if cell.column >= table_width || cell.row >= table_height {
            return Err(AutomationError::CellOutOfRange {
                column: cell.column,
                row: cell.row,
                table_width,
                table_height,
            });
        }

        self.scroll_into_view(device, Direction::Columns, cell.column).await?;
        self.scroll_into_view(device, Direction::Rows, cell.row).await?;

        let at = Point::new(
            self.tap_coordinate(Direction::Columns, cell.column),
            self.tap_coordinate(Direction::Rows, cell.row),
        );
        log::debug!("Tapping cell ({}, {}) at {at}", cell.column, cell.row);
        gestures::tap(device, at).await?;
        Ok(())
    }

    /// Swipe far enough toward the start to show the top-left corner.
    /// The tracked viewport is left alone; see [`reset_view`](Self::reset_view).
    pub async fn reset_table<D: AdbClient>(&self, device: &D) -> AutomationResult<()> {
        let TableLayout {
            origin,
            drag_interval,
            table_width,
            table_height,
            ..
        } = self.layout;
        gestures::swipe(
            device,
            origin,
            drag_interval.width * table_width as i32,
            drag_interval.height * table_height as i32,
            RESET_SWIPE,
        )
        .await?;
        Ok(())
    }

    pub fn reset_view(&mut self) {
        self.view_x = 0;
        self.view_y = 0;
    }

    /// `(view length, table length, drag step)` along one direction
    fn extent(&self, direction: Direction) -> (u32, u32, i32) {
        let l = &self.layout;
        match direction {
            Direction::Columns => (l.view_width, l.table_width, l.drag_interval.width),
            Direction::Rows => (l.view_height, l.table_height, l.drag_interval.height),
        }
    }

    fn offset(&self, direction: Direction) -> u32 {
        match direction {
            Direction::Columns => self.view_x,
            Direction::Rows => self.view_y,
        }
    }

    fn offset_mut(&mut self, direction: Direction) -> &mut u32 {
        match direction {
            Direction::Columns => &mut self.view_x,
            Direction::Rows => &mut self.view_y,
        }
    }

    async fn scroll_into_view<D: AdbClient>(
        &mut self,
        device: &D,
        direction: Direction,
        target: u32,
    ) -> AutomationResult<()> {
        let (view_len, table_len, step) = self.extent(direction);
        let origin = self.layout.origin;
        let delta = |amount: i32| match direction {
            Direction::Columns => (amount, 0),
            Direction::Rows => (0, amount),
        };

        let mut dragged = false;
        while target >= self.offset(direction) + view_len {
            let (dx, dy) = delta(-step);
            gestures::drag(device, origin, dx, dy).await?;
            *self.offset_mut(direction) += 1;
            dragged = true;
        }
        if dragged {
            if self.offset(direction) + view_len == table_len {
                let (dx, dy) = delta(-step);
                gestures::swipe(device, origin, dx, dy, EDGE_SWIPE).await?;
            }
            return Ok(());
        }

        while target < self.offset(direction) {
            let (dx, dy) = delta(step);
            gestures::drag(device, origin, dx, dy).await?;
            *self.offset_mut(direction) -= 1;
            dragged = true;
        }
        if dragged && self.offset(direction) == 0 {
            let (dx, dy) = delta(step);
            gestures::swipe(device, origin, dx, dy, EDGE_SWIPE).await?;
        }
        Ok(())
    }

    fn tap_coordinate(&self, direction: Direction, target: u32) -> i32 {
        let (view_len, table_len, _) = self.extent(direction);
        let offset = self.offset(direction);
        let slot = target - offset;
        let l = &self.layout;
        let (origin, finale, interval) = match direction {
            Direction::Columns => (l.origin.x, l.finale.x, l.item_interval.width),
            Direction::Rows => (l.origin.y, l.finale.y, l.item_interval.height),
        };
        if offset + view_len == table_len && slot == view_len - 1 {
            finale
        } else {
            origin + slot as i32 * interval
        }
    }
}
