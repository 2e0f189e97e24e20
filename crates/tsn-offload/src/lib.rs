//! TSN hardware offload engine for the i225/i226 Ethernet controller family.
//!
//! This crate provides:
//! - [`Adapter`] holding the requested TSN configuration of one device
//! - [`RegisterAccess`] trait abstracting MMIO, with [`SimulatedRegisters`]
//! - Feature flag aggregation ([`Adapter::new_flags`])
//! - Offload disable and enable ([`Adapter::disable_offload`], [`Adapter::enable_offload`])
//! - [`cbs`] module with credit-based shaper encodings
//! - [`sync`] module with base-time synchronization against the device clock
//! - Reset orchestration ([`Adapter::reset`]) and the [`TsnOffload`] dispatcher
//!   with its deferred [`ResetWorker`]

pub mod access;
pub mod adapter;
pub mod aggregate;
pub mod apply;
pub mod cbs;
pub mod disable;
pub mod enable;
pub mod regs;
pub mod reset;
pub mod sync;

pub use access::*;
pub use adapter::*;
pub use apply::*;
pub use enable::{min_frag_multiplier, queue_control, CBS_QUEUES};
pub use sync::*;
