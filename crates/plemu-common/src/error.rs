use thiserror::Error;

/// Emulator error types covering configuration, operator I/O, and run lifecycle failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmuError {
    /// A ramp cannot be divided into zero steps.
    #[error("configuration error: ramp steps must be non-zero")]
    ZeroRampSteps,

    /// A zero start or end period would disarm the output mid-run.
    #[error("configuration error: start and end periods must be non-zero")]
    ZeroPeriod,

    /// Operator selected a waveform profile index outside the known set.
    #[error("unknown waveform profile {0} (expected 0-3)")]
    UnknownProfile(i64),

    /// Operator input stream closed while a value was expected.
    #[error("operator input closed")]
    InputClosed,

    /// I/O operation error.
    #[error("I/O error: {0}")]
    IoError(String),

    /// A scheduler operation requires an active run.
    #[error("no workload is running")]
    NotRunning,

    /// Invalid state transition attempted.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Source state.
        from: String,
        /// Attempted target state.
        to: String,
    },
}

/// Convenience type alias for emulator operations.
pub type EmuResult<T> = Result<T, EmuError>;
