//! Core systems for Arbor.
//!
//! This crate provides the small runtime pieces shared by the Arbor
//! workspace:
//!
//! - **Signal/Slot System**: Type-safe, synchronous change notification
//! - **Logging**: `tracing` targets and span names, scoped perf spans
//! - **Tree Debugging**: A formatter for dumping any hierarchy
//!
//! # Signal/Slot Example
//!
//! ```
//! use arbor_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```

pub mod logging;
pub mod signal;

pub use logging::{PerfSpan, TreeDebug, TreeDebugSource, TreeFormatOptions, TreeStyle};
pub use signal::{ConnectionId, Signal};
