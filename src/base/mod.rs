//! Base types and error handling.
//!
//! Provides foundational types mirroring Chromium's `net/base/`:
//! - [`NetError`]: Fetch errors with Chromium-style codes and an [`ErrorKind`]
//! - [`FetchState`]: Pipeline states, after `load_states_list.h`

pub mod context;
pub mod loadstate;
pub mod neterror;

pub use loadstate::{FetchState, Progress};
pub use neterror::{ErrorKind, NetError};

#[cfg(test)]
mod tests;
