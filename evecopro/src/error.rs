//! Error types returned by the command-stream engine, and the callback
//! through which asynchronous device failures are reported.

/// Error type for coprocessor operations.
///
/// This distinguishes between errors from the underlying interface to the
/// hardware, errors returned by the "waiter" while waiting for more buffer
/// space, and the various ways the EVE chip itself can get into trouble.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error<IErr, WErr> {
    /// Errors encountered when sending or recieving data from the EVE chip.
    ///
    /// The wrapped error type for this variant is the error type for whichever
    /// [`Interface`](crate::interface::Interface) implementation you are using.
    Interface(IErr),

    /// Errors encountered while waiting for more space in the ring buffer.
    ///
    /// The wrapped error type for this variant is the error type for whichever
    /// [`Waiter`](crate::commands::waiter::Waiter) implementation you are
    /// using. If you are using the default polling waiter then the error will
    /// be of the error type associated with your chosen
    /// [`Interface`](crate::interface::Interface).
    Waiter(WErr),

    /// The coprocessor didn't free enough ring buffer space in time.
    ///
    /// Anything already written into the ring stays there and will still be
    /// executed once the coprocessor catches up, but the operation that
    /// returned this error was not written. Retry the whole display list
    /// session, or call [`reset`](crate::commands::Coprocessor::reset) if
    /// the coprocessor seems to be stuck.
    Timeout,

    /// Host and chip disagreed about the state of the command ring, so the
    /// coprocessor was reset.
    ///
    /// Everything written since the start of the current display list session
    /// is lost and the session must be started again from the beginning.
    DeviceReset,

    /// The chip did not come back after a coprocessor reset.
    ///
    /// The [`Device`](crate::Device) stops driving the chip after this error
    /// until it is re-armed.
    ReinitFailed,

    /// Indicates that the coprocessor itself reported a fault.
    ///
    /// The coprocessor typically runs asynchronously from the host processor,
    /// and so a fault error may be returned from some later method call than
    /// the one which caused the fault. This error variant therefore indicates
    /// only that the coprocessor is blocked by being the fault state, not that
    /// the most recent method call put it in that state.
    Fault,

    /// Indicates that the requested operation isn't supported for the
    /// current model.
    Unsupported,

    /// An argument was out of range for the operation, such as a font
    /// handle outside of the range reserved for RAM fonts.
    InvalidArgument,

    /// The data given for an asset doesn't fit in the chip's memory.
    OutOfMemory,

    /// The device was halted after an earlier [`ReinitFailed`](Error::ReinitFailed)
    /// and must be re-armed before use.
    Halted,
}

/// Identifies the kind of failure reported through
/// [`ErrorHandler::on_device_error`](ErrorHandler::on_device_error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceErrorCode {
    /// The host detected that its view of the command ring no longer matches
    /// the chip's, and reset the coprocessor.
    Desync,

    /// The coprocessor reported a fault. The message, if any, is the one the
    /// chip provided.
    CoprocessorFault,

    /// The chip didn't respond as expected after a reset. The device stops
    /// being driven until it is re-armed.
    ReinitFailed,
}

/// Receives reports about device failures that happen outside of the
/// call that would naturally return them, such as a coprocessor fault
/// noticed while servicing interrupts.
pub trait ErrorHandler {
    fn on_device_error(&mut self, code: DeviceErrorCode, message: &str);
}

/// The default [`ErrorHandler`](ErrorHandler), which does nothing beyond the
/// error log entry the engine always writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrors;

impl ErrorHandler for LogErrors {
    fn on_device_error(&mut self, _code: DeviceErrorCode, _message: &str) {}
}

impl<F: FnMut(DeviceErrorCode, &str)> ErrorHandler for F {
    fn on_device_error(&mut self, code: DeviceErrorCode, message: &str) {
        self(code, message)
    }
}
