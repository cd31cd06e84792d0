use thiserror::Error;

/// Alias over the crate's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by flowctl primitives.
#[derive(Debug, Error)]
pub enum Error {
    /// A `Prop` holding a value was assigned again.
    #[error("Props cannot be reassigned")]
    InvalidState,

    /// A limiter was configured without a positive slot count.
    #[error("Expected concurrency to be a positive integer: {0}")]
    InvalidConcurrency(usize),

    /// A lazily resolved value turned out to be absent; the payload
    /// names the operation that needed it.
    #[error("undefined value in {0}")]
    UndefinedValue(&'static str),

    /// An enqueue was attempted on a pipe that has already ended.
    #[error("pipe is closed")]
    StreamClosed,

    /// Several concurrently dispatched branches failed.  All of them
    /// are reported, not just the first observed.
    #[error("{} concurrent failures", .0.len())]
    Failures(Vec<Error>),

    /// A failure raised by caller-supplied code.
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an arbitrary failure raised by caller-supplied code.
    pub fn other<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
        Error::Other(Box::new(err))
    }

    /// Collapses the failures gathered from one concurrent dispatch: no
    /// failures pass through, a lone failure propagates untouched, and
    /// several are reported together.
    pub fn gather(mut errs: Vec<Error>) -> Result<()> {
        match errs.len() {
            0 => Ok(()),
            1 => Err(errs.remove(0)),
            _ => Err(Error::Failures(errs)),
        }
    }
}

#[cfg(test)]
mod error_test {
    use super::*;

    #[test]
    fn test_gather() {
        assert!(Error::gather(vec![]).is_ok());
        let one = Error::gather(vec![Error::InvalidState]).unwrap_err();
        assert!(matches!(one, Error::InvalidState));
        let several = Error::gather(vec![Error::InvalidState, Error::StreamClosed]).unwrap_err();
        assert!(matches!(several, Error::Failures(ref errs) if errs.len() == 2));
    }

    #[test]
    fn test_messages() {
        assert_eq!(Error::InvalidState.to_string(), "Props cannot be reassigned");
        assert_eq!(
            Error::InvalidConcurrency(0).to_string(),
            "Expected concurrency to be a positive integer: 0"
        );
    }
}
