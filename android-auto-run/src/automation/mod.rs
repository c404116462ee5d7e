// Automation module - visual waits and navigation on a device
// Polling loops that react to what is on screen, plus helpers for
// tapping through scrollable tables and lists.

pub mod config;
pub mod error;
pub mod frequency;
pub mod gestures;
pub mod list;
pub mod session;
pub mod table;


pub use config::WaitConfig;
pub use error::{AutomationError, AutomationResult};
pub use frequency::FrequencyLimiter;
pub use gestures::{nap, pause};
pub use list::{ListGeometry, tap_list_item};
pub use session::DeviceSession;
pub use table::{Axis, Cell, TableLayout, TableSelector, index_to_cell};
