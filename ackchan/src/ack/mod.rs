//! Ack correlation: id allocation and one-shot reply slots.
//!
//! - **AckRegistry**: per-channel id counter plus the id → slot map
//! - **AckWaiter**: caller side of a slot, resolves when the reply arrives
//!
//! The inbound dispatch path resolves slots through
//! [`AckRegistry::fulfill`]; this crate never parses the reply frames itself.

mod registry;

pub use registry::{AckRegistry, AckWaiter};
pub(crate) use registry::WaiterGuard;
