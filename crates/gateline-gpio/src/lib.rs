//! Line registry: a bounded table of general-purpose signal lines exposed as
//! independently addressable, interrupt-capable resources.
//!
//! The crate has four layers:
//! - [`chip`]: the simulated line controller holding physical pin levels.
//! - [`registry`]: export/unexport of lines into a fixed-capacity table and
//!   the consumer [`handle`] bound to one exported resource.
//! - [`bridge`]: conversion of rising edges into best-effort, payload-free
//!   notifications delivered to every subscriber of a resource.
//! - [`sysfs`]: the textual control surface (`export`/`unexport` class
//!   writes, per-line byte endpoints and `value`/`direction` attributes).
//!
//! Consumers never own hardware state: a [`LineHandle`] resolves through the
//! registry on every call, so operations racing an unexport fail cleanly with
//! `NotFound` instead of touching a freed resource.

mod bridge;
mod line;

pub mod chip;
pub mod handle;
pub mod registry;
pub mod sysfs;

pub use chip::{SimChip, SimLine};
pub use handle::{LineCommand, LineHandle};
pub use line::SubscriberId;
pub use registry::LineRegistry;
pub use sysfs::ControlOp;
