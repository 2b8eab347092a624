//! Recoverable failures of the collaborator subsystems (IO, transport,
//! memory, configuration). Programmer errors at setup time are not
//! represented here; they abort through `assert!`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LatticeError>;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    Io,
    Network,
    Memory,
    Logic,
    Config,
}

#[derive(Error, Debug)]
pub enum LatticeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Communication error: {0}")]
    Network(String),

    #[error("Out of memory: {0}")]
    Memory(String),

    #[error("Logic error: {0}")]
    Logic(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl LatticeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LatticeError::Io(_) => ErrorKind::Io,
            LatticeError::Network(_) => ErrorKind::Network,
            LatticeError::Memory(_) => ErrorKind::Memory,
            LatticeError::Logic(_) => ErrorKind::Logic,
            LatticeError::Config(_) => ErrorKind::Config,
        }
    }

    /// Log the error to the diagnostics sink and hand it back, so it can
    /// be propagated with `?` right after.
    pub fn report(self) -> Self {
        tracing::error!(kind = ?self.kind(), "{}", self);
        self
    }
}

impl From<serde_json::Error> for LatticeError {
    fn from(e: serde_json::Error) -> Self {
        LatticeError::Config(e.to_string())
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn kind_test() {
        assert_eq!(LatticeError::Logic("x".into()).kind(), ErrorKind::Logic);
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: LatticeError = io.into();
        assert_eq!(e.kind(), ErrorKind::Io);
        assert!(e.report().to_string().contains("missing"));
    }
}
