use thiserror::Error;

use crate::core::types::Address;
use crate::policy::PolicyError;

/// Fatal engine errors. Recoverable conditions (a failed discovery cycle,
/// an unsupported optional query) never surface here; they degrade to an
/// empty or sentinel result instead.
#[derive(Debug, Clone, Error)]
pub enum OverlayError {
    /// An address range whose start lies beyond its end.
    #[error("invalid address range: start {start:#x} is past end {end:#x}")]
    InvalidRange { start: Address, end: Address },

    /// Function-boundary lookup could not resolve a multi-group primary.
    #[error("unable to compute function bounds for {addr:#x}")]
    UnknownFunctionBounds { addr: Address },

    /// A multi-group primary that is not the start of its function.
    #[error(
        "multi-group address {addr:#x} is not the start of a function \
         (function starts at {start:#x})"
    )]
    NotFunctionStart { addr: Address, start: Address },

    /// A multi-group whose topology listed no member addresses.
    #[error("multi-group {index} reported no member addresses")]
    EmptyMultiGroup { index: i64 },

    /// A mandatory policy call failed.
    #[error("overlay policy failure: {0}")]
    Policy(#[from] PolicyError),
}
