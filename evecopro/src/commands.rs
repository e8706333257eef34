//! Access to the EVE coprocessor through its command ring buffer.
//!
//! The [`Coprocessor`](Coprocessor) type takes care of appending commands to
//! the ring: it knows how each generation of chip exposes the ring, waits for
//! space using a [`Waiter`](waiter::Waiter), and resets the coprocessor if the
//! host and chip stop agreeing about the ring's state.

mod command_word;
pub mod coprocessor;
pub mod options;
pub mod waiter;

pub use coprocessor::{Coprocessor, Result};
