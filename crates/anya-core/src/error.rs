use std::io;

/// Errors raised while building points, grids or reading map files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed map or scenario file. `line` is 1-based.
    #[error("format error at line {line}: {reason}")]
    Format { line: usize, reason: String },

    #[error("grid dimensions must be positive (height {height}, width {width})")]
    EmptyGrid { height: usize, width: usize },

    #[error("expected {expected} tile rows, found {found}")]
    RowCount { expected: usize, found: usize },

    #[error("tile row {row}: expected {expected} columns, found {found}")]
    ColumnCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("latitude {0} outside [-90, 90]")]
    Latitude(f64),

    #[error("longitude {0} outside [-180, 180]")]
    Longitude(f64),

    /// A cartesian vector too short to name a direction on the sphere.
    #[error("cannot project vector of magnitude {0} onto the sphere")]
    DegenerateVector(f64),

    #[error("invalid bounds: {0}")]
    Bounds(String),

    /// A broken internal invariant. Seeing this means a bug, not bad input.
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn format(line: usize, reason: impl Into<String>) -> Self {
        Self::Format {
            line,
            reason: reason.into(),
        }
    }
}
