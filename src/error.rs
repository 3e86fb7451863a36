//! Error handling for the sdrhub library
//!
//! Every failure category except [`Error::Range`] is fatal for the whole
//! device set: the registry closes all open connections before the error is
//! returned, and callers must treat it as a stop signal for the pipeline.
//! The one exception is the `get_device` query, which reports an
//! already-closed device without repeating teardown.

use thiserror::Error;

/// A specialized Result type for sdrhub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sdrhub operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// Device discovery / list fetch failed; no devices are available
    #[error("enumeration error: {0}")]
    Enumeration(String),

    /// Opening a device connection failed
    #[error("connect error: {0}")]
    Connect(String),

    /// Source and sink blocks disagree on shared-device configuration
    #[error("consistency error: {0}")]
    Consistency(String),

    /// A configuration parameter is outside the hardware-supported range.
    /// Rejected before any hardware call; does not tear down open devices.
    #[error("range error: {0}")]
    Range(String),

    /// The underlying hardware call reported failure
    #[error("driver error: {0}")]
    Driver(String),
}

impl Error {
    /// Create an enumeration error with a custom message
    pub fn enumeration<S: Into<String>>(msg: S) -> Self {
        Error::Enumeration(msg.into())
    }

    /// Create a connect error with a custom message
    pub fn connect<S: Into<String>>(msg: S) -> Self {
        Error::Connect(msg.into())
    }

    /// Create a consistency error with a custom message
    pub fn consistency<S: Into<String>>(msg: S) -> Self {
        Error::Consistency(msg.into())
    }

    /// Create a range error with a custom message
    pub fn range<S: Into<String>>(msg: S) -> Self {
        Error::Range(msg.into())
    }

    /// Create a driver error with a custom message
    pub fn driver<S: Into<String>>(msg: S) -> Self {
        Error::Driver(msg.into())
    }

    /// Whether this failure requires closing every open device before it
    /// surfaces. Range violations never reached the hardware.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Range(_))
    }
}
