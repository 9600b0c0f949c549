use std::fmt::{Display, Formatter};
use std::str::FromStr;

use arbitrary::Arbitrary;

use crate::earth;

/// Products with fewer pairs than this are evaluated on one thread when the
/// backend is [`Backend::Auto`].
pub const PARALLEL_THRESHOLD: usize = 1 << 16;

/// Default number of pairs per block: 16 MiB of `f32`.
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 22;

/// Where the pairwise kernel runs.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Arbitrary)]
pub enum Backend {
    /// Pick `Parallel` for large products when more than one worker thread is
    /// available, `Cpu` otherwise.
    #[default]
    Auto,
    Cpu,
    /// Rows of each block are spread over the rayon thread pool.
    Parallel,
}

impl Backend {
    /// Settles `Auto` for a product of `pairs` distances. Never returns `Auto`.
    #[must_use]
    pub fn resolve(self, pairs: usize) -> Backend {
        match self {
            Backend::Auto => {
                if pairs >= PARALLEL_THRESHOLD && rayon::current_num_threads() > 1 {
                    Backend::Parallel
                } else {
                    Backend::Cpu
                }
            }
            other => other,
        }
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Cpu => f.write_str("cpu"),
            Self::Parallel => f.write_str("parallel"),
        }
    }
}

impl FromStr for Backend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Backend::Auto),
            "cpu" => Ok(Backend::Cpu),
            "parallel" | "accelerated" => Ok(Backend::Parallel),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    /// Return a `|left| x |right|` matrix rather than the flat product.
    pub as_matrix: bool,
    /// Sphere radius; distances come out in its units.
    pub radius: f64,
    pub backend: Backend,
    /// Upper bound on the pairs computed per block. A block always holds at
    /// least one full row, so a row longer than this forms its own block.
    pub chunk_size: usize,
    /// Refuse outputs (or, when streaming, block buffers) larger than this
    /// many bytes.
    pub memory_limit: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            as_matrix: true,
            radius: earth::RADIUS,
            backend: Backend::Auto,
            chunk_size: DEFAULT_CHUNK_SIZE,
            memory_limit: None,
        }
    }
}

impl Options {
    #[must_use]
    pub fn with_matrix(mut self, as_matrix: bool) -> Self {
        self.as_matrix = as_matrix;
        self
    }

    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn with_memory_limit(mut self, limit: Option<usize>) -> Self {
        self.memory_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_earth_matrix_call() {
        let options = Options::default();
        assert!(options.as_matrix);
        assert_eq!(options.radius, 6_371_000.0);
        assert_eq!(options.backend, Backend::Auto);
        assert_eq!(options.memory_limit, None);
    }

    #[test]
    fn resolve_never_returns_auto() {
        for pairs in [0, 1, PARALLEL_THRESHOLD - 1, PARALLEL_THRESHOLD, usize::MAX] {
            assert_ne!(Backend::Auto.resolve(pairs), Backend::Auto);
        }
        assert_eq!(Backend::Auto.resolve(1), Backend::Cpu);
        assert_eq!(Backend::Cpu.resolve(usize::MAX), Backend::Cpu);
        assert_eq!(Backend::Parallel.resolve(1), Backend::Parallel);
    }

    #[test]
    fn backend_names_round_trip() {
        for backend in [Backend::Auto, Backend::Cpu, Backend::Parallel] {
            assert_eq!(backend.to_string().parse::<Backend>(), Ok(backend));
        }
        assert_eq!("Accelerated".parse::<Backend>(), Ok(Backend::Parallel));
        assert_eq!("gpu".parse::<Backend>(), Err(()));
    }
}
