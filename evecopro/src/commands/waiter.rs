//! Helpers for waiting until the coprocessor has freed enough ring buffer
//! space for a forthcoming command.
//!
//! [`Waiter`](Waiter) is a trait implemented by types that are able to block
//! until there's either a particular amount of buffer space available or
//! until it becomes clear that there won't be.
//!
//! [`PollingWaiter`](PollingWaiter) is a simple built-in implementation of
//! `Waiter` which busy-polls the coprocessor registers until either there's
//! enough space or its timeout elapses.
//!
//! If you are working with this library on a platform where you are able to
//! listen for and respond to interrupt signals from the EVE chip then you
//! could improve power consumption by implementing a new `Waiter` which can
//! put the host processor to sleep while waiting for a signal that there is
//! more buffer space.

use crate::clock::Clock;
use crate::interface::Interface;
use crate::low_level::LowLevel;
use crate::models::Model;

/// Knows how to block until the coprocessor ring buffer is at least empty
/// enough to receive a forthcoming message.
///
/// This is a trait in order to allow for implementations that are able to
/// respond to the EVE's interrupt signal for the buffer to be ready, although
/// the only implementation available directly in this crate is one that
/// busy-polls the registers that track the buffer usage, because interaction
/// with interrupts is always system-specific.
pub trait Waiter<M: Model, I: Interface> {
    type Error;

    /// Blocks until at least `need` bytes are free, returning the free space
    /// that was observed. `cursor` is the host's current write cursor, which
    /// older models need in order to work out the free space.
    ///
    /// Implementations must return
    /// [`WaiterError::Unaligned`](WaiterError::Unaligned) as soon as they
    /// observe a free space that isn't a multiple of four.
    fn wait_for_space(
        &mut self,
        ll: &mut LowLevel<M, I>,
        cursor: u16,
        need: u16,
    ) -> core::result::Result<u16, WaiterError<Self::Error>>;
}

/// Error type returned by a waiter.
#[derive(Debug, PartialEq, Eq)]
pub enum WaiterError<E: Sized> {
    /// Communication with the chip failed.
    Comm(E),

    /// The waiter gave up before enough space became available.
    Timeout,

    /// The chip reported an amount of free space that isn't a multiple of
    /// four, which means the host's view of the ring is no longer valid.
    Unaligned(u16),
}

fn waiter_comm_result<R, E: Sized>(
    result: core::result::Result<R, E>,
) -> core::result::Result<R, WaiterError<E>> {
    match result {
        Ok(v) => Ok(v),
        Err(err) => Err(WaiterError::Comm(err)),
    }
}

/// The default [`Waiter`](Waiter) implementation, which polls the coprocessor
/// registers in a busy loop until there's enough available space, giving up
/// once a configured time has passed.
pub struct PollingWaiter<C: Clock> {
    clock: C,
    timeout_ms: u64,
}

impl<C: Clock> PollingWaiter<C> {
    pub fn new(clock: C, timeout_ms: u64) -> Self {
        Self {
            clock: clock,
            timeout_ms: timeout_ms,
        }
    }

    pub fn clock(&mut self) -> &mut C {
        &mut self.clock
    }
}

impl<M: Model, I: Interface, C: Clock> Waiter<M, I> for PollingWaiter<C> {
    type Error = I::Error;

    fn wait_for_space(
        &mut self,
        ll: &mut LowLevel<M, I>,
        cursor: u16,
        need: u16,
    ) -> core::result::Result<u16, WaiterError<Self::Error>> {
        let start = self.clock.now_ms();
        loop {
            let space = waiter_comm_result(M::read_free_space(ll, cursor))?;
            if (space % 4) != 0 {
                return Err(WaiterError::Unaligned(space));
            }
            if space >= need {
                return Ok(space);
            }
            if self.clock.now_ms().saturating_sub(start) >= self.timeout_ms {
                return Err(WaiterError::Timeout);
            }
        }
    }
}
