//! Hourly dispatch simulator: battery state, merit-order loop, trace export.

pub mod battery;
pub mod dispatch;
pub mod export;

pub use battery::BatteryState;
pub use dispatch::{DispatchResult, simulate};
