//! Unified error type for badge-usb.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! `Display` renders the message the console prints back to the caller;
//! `defmt::Format` is derived for on-target logging.

use core::fmt;

/// Top-level error type used across the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Scripting surface
    /// A binding was called with malformed arguments.
    Arg(ArgError),

    /// No module of that name is registered.
    NoSuchModule,

    /// The module has no function of that name.
    NoSuchFunction,

    // Console
    /// A console line could not be tokenised.
    Syntax,

    // File service
    /// A file-service frame was malformed.
    Frame(FrameError),

    /// The volume refused the operation.
    Volume,

    // Generic
    /// Buffer too small for the requested operation.
    BufferOverflow,
}

/// Argument errors raised by the scripting bindings before any USB access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArgError {
    /// Wrong number of positional arguments.
    Count { expected: u8, given: u8 },
    /// `hid.mouse` needs exactly its five fields.
    MouseFields,
    /// The argument does not expose a byte buffer.
    NotBuffer,
    /// The argument's buffer is read-only but the call writes into it.
    ReadOnlyBuffer,
    /// The argument is not an integer.
    NotInt,
    /// The integer does not fit a 32-bit machine word.
    Overflow,
}

/// Framing errors of the WebUSB file service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// The header's check word was not `0xADDE`.
    BadCheck,
    /// The header announced a payload the command cannot buffer.
    TooLarge,
}

// Convenience conversions

impl From<ArgError> for Error {
    fn from(e: ArgError) -> Self {
        Error::Arg(e)
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Error::Frame(e)
    }
}

impl fmt::Display for ArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgError::Count { expected, given } => write!(
                f,
                "TypeError: function takes {} positional arguments but {} were given",
                expected, given
            ),
            ArgError::MouseFields => {
                f.write_str("TypeError: Needs args button, x, y, horizontal, vertical")
            }
            ArgError::NotBuffer => f.write_str("TypeError: object with buffer protocol required"),
            ArgError::ReadOnlyBuffer => f.write_str("TypeError: buffer is read-only"),
            ArgError::NotInt => f.write_str("TypeError: can't convert to int"),
            ArgError::Overflow => {
                f.write_str("OverflowError: overflow converting long int to machine word")
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Arg(e) => e.fmt(f),
            Error::NoSuchModule => f.write_str("ImportError: no module named that"),
            Error::NoSuchFunction => f.write_str("AttributeError: module has no such attribute"),
            Error::Syntax => f.write_str("SyntaxError: invalid syntax"),
            Error::Frame(FrameError::BadCheck) => f.write_str("FrameError: bad check word"),
            Error::Frame(FrameError::TooLarge) => f.write_str("FrameError: payload too large"),
            Error::Volume => f.write_str("OSError: volume operation failed"),
            Error::BufferOverflow => f.write_str("MemoryError: buffer too small"),
        }
    }
}
