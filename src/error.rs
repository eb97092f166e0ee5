use thiserror::Error;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by the engine. Only construction and seeding can fail; ticks and
/// interactions are infallible.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// Arena, radius, broad-phase or seed values that would leave the engine in a
    /// broken state.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
