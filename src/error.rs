//! Errors the core can report.
//!
//! Nothing here unwinds or panics; see the crate's error-handling design.
//! Every fallible operation a caller doesn't want to handle explicitly
//! degrades to a blink pattern instead (see [`crate::leds`]).

/// A recoverable fault raised by the core.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoreError {
    /// A macro recording already holds `MCR_LEN` entries; further
    /// keystrokes are dropped instead of overflowing the buffer.
    MacroBufferFull,
    /// A macro id requested for play or commit is outside `0..MCR_MAX`.
    MacroIdOutOfRange,
    /// The non-volatile store rejected a read or write (out-of-range
    /// address, or a mocked fault injected by a test).
    NvStoreFault,
    /// The swap editor's second chord didn't match the kind of the
    /// first; the in-progress swap was cancelled.
    SwapRejected,
}
