//! # Ringtune Channels
//!
//! Channel-level access to the accelerator control system.
//!
//! ## Description
//! Defines the `ChannelBus` contract for reading and writing named
//! hardware channels, issuing device commands and fetching attribute
//! history, plus the `HardwareContext` that bundles the bus with the
//! blocking capabilities (sleep, operator confirmation) the tuning
//! procedures need.
//!
//! ## Retry Policy
//! Every recoverable channel failure gets exactly one retry after a
//! fixed back-off. A second failure always propagates to the caller;
//! nothing in this crate retries in a loop.
//!
//! ## Execution Model
//! Single-threaded, synchronous, blocking. Every read, write and sleep
//! suspends the calling thread; there is no concurrent execution and no
//! cancellation mechanism other than an error propagating out.

pub mod bus;
pub mod catalog;
pub mod context;
pub mod error;
pub mod mock;

pub use bus::{ChannelBus, ChannelValue, DeviceCommand, DeviceState, Sample};
pub use context::{
    HardwareContext, OperatorPrompt, Sleeper, StdinPrompt, ThreadSleeper, DEFAULT_RW_BACKOFF,
};
pub use error::ChannelError;
