//! Pairwise great-circle distances between two ordered point sets.
//!
//! The entry points are [`evaluate`], [`evaluate_into`] and [`for_each_block`].
//! All three compute the same row-major pairing: entry `k` of the flat output
//! is the distance from `left[k / right.len()]` to `right[k % right.len()]`.
//!
//! ```rust
//! use haversine::{evaluate, Options, Point};
//!
//! let left = [Point::new(1.01, 1.01)];
//! let right = [Point::new(2.01, 2.01)];
//! let result = evaluate::<f32>(&left, &right, &Options::default()).unwrap();
//! let metres = result.as_slice()[0];
//! assert!((metres - 157_294.0).abs() < 1_573.0);
//! ```

pub mod distance;
pub mod earth;
pub mod error;
pub mod evaluate;
pub mod haversine;
pub mod options;
pub mod point;
pub mod real;
pub mod result;

pub use error::{BlockError, EvaluateError, InvalidInput};
pub use evaluate::{evaluate, evaluate_into, for_each_block};
pub use options::{Backend, Options};
pub use point::{Point, Side};
pub use real::Real;
pub use result::{Block, DistanceMatrix, DistanceResult};
