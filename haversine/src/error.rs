use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::point::Side;

#[derive(Clone, Debug, PartialEq)]
pub enum InvalidInput {
    /// A raw row did not hold exactly a latitude and a longitude.
    Arity {
        side: Side,
        index: usize,
        len: usize,
    },
    /// A coordinate was NaN or infinite.
    NonFinite {
        side: Side,
        index: usize,
    },
    /// The radius must be positive and finite.
    Radius(f64),
    /// Blocks must hold at least one pair.
    ChunkSize,
    /// Caller-provided storage does not match `|left| * |right|`.
    OutputLength {
        expected: usize,
        actual: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum EvaluateError {
    InvalidInput(InvalidInput),
    /// `rows * cols` values of `element_bytes` each cannot be held, either
    /// because the size overflows, exceeds `limit`, or the allocator refused.
    ResourceExhausted {
        rows: usize,
        cols: usize,
        element_bytes: usize,
        limit: Option<usize>,
    },
}

/// Failure of a streaming evaluation: either the evaluation itself or the
/// consumer of a block.
#[derive(Debug)]
pub enum BlockError<E> {
    Evaluate(EvaluateError),
    Consumer(E),
}

impl From<InvalidInput> for EvaluateError {
    fn from(value: InvalidInput) -> Self {
        EvaluateError::InvalidInput(value)
    }
}

impl<E> From<EvaluateError> for BlockError<E> {
    fn from(value: EvaluateError) -> Self {
        BlockError::Evaluate(value)
    }
}

impl Display for InvalidInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidInput::Arity { side, index, len } => write!(
                f,
                "{side} point {index} has {len} components, expected latitude and longitude"
            ),
            InvalidInput::NonFinite { side, index } => {
                write!(f, "{side} point {index} has a non-finite coordinate")
            }
            InvalidInput::Radius(r) => write!(f, "radius must be positive and finite, got {r}"),
            InvalidInput::ChunkSize => f.write_str("chunk size must be at least one pair"),
            InvalidInput::OutputLength { expected, actual } => write!(
                f,
                "output buffer holds {actual} distances, expected {expected}"
            ),
        }
    }
}

impl Display for EvaluateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluateError::InvalidInput(e) => write!(f, "invalid input: {e}"),
            EvaluateError::ResourceExhausted {
                rows,
                cols,
                element_bytes,
                limit: Some(limit),
            } => write!(
                f,
                "{rows}x{cols} distances of {element_bytes} bytes exceed the memory limit of {limit} bytes"
            ),
            EvaluateError::ResourceExhausted {
                rows,
                cols,
                element_bytes,
                limit: None,
            } => write!(
                f,
                "cannot allocate {rows}x{cols} distances of {element_bytes} bytes"
            ),
        }
    }
}

impl<E> Display for BlockError<E>
where
    E: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockError::Evaluate(e) => Display::fmt(e, f),
            BlockError::Consumer(e) => write!(f, "block consumer failed: {e}"),
        }
    }
}

impl Error for InvalidInput {}

impl Error for EvaluateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EvaluateError::InvalidInput(e) => Some(e),
            EvaluateError::ResourceExhausted { .. } => None,
        }
    }
}

impl<E> Error for BlockError<E>
where
    E: Error + 'static,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BlockError::Evaluate(e) => Some(e),
            BlockError::Consumer(e) => Some(e),
        }
    }
}
