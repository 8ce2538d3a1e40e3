use std::fmt;
use std::io;

/// Every failure mode the codec can surface, from config validation through
/// serialization and reconstruction.
#[derive(Debug)]
pub enum CodecError {
    /// A configuration knob was out of its valid range.
    ConfigInvalid(String),

    /// The input mesh violated a precondition (bad indices, mismatched
    /// array lengths, non-triangular faces).
    InputIllFormed(String),

    /// A geometric degeneracy that the algorithm cannot proceed past, such
    /// as a zero-length edge or a patch whose extent collapses to a point.
    DegenerateGeometry(String),

    /// The requested atom count exceeds the rank available from the SVD.
    /// Carried for callers that want to detect the clamp; the codec itself
    /// recovers from this silently (with a log line) rather than failing.
    RankCollapse { requested: usize, available: usize },

    /// Reading or writing the serialized stream failed: this covers both
    /// the literal open/write case and every read-side failure spec §7
    /// groups under the same kind — a truncated stream, a malformed
    /// number, or a face that references a `(patch, grid)` pair no patch
    /// ever produced.
    IoFailure(io::Error),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CodecError::*;
        match self {
            ConfigInvalid(msg) => write!(f, "invalid configuration: {msg}"),
            InputIllFormed(msg) => write!(f, "ill-formed input mesh: {msg}"),
            DegenerateGeometry(msg) => write!(f, "degenerate geometry: {msg}"),
            RankCollapse {
                requested,
                available,
            } => write!(
                f,
                "requested {requested} atoms but only {available} are available from the SVD"
            ),
            IoFailure(err) => write!(f, "i/o failure: {err}"),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::IoFailure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        CodecError::IoFailure(err)
    }
}

impl CodecError {
    /// Build the read-side flavor of `IoFailure` for a stream that parsed
    /// incorrectly rather than one that failed to open.
    pub fn malformed_stream(msg: impl Into<String>) -> Self {
        CodecError::IoFailure(io::Error::new(io::ErrorKind::InvalidData, msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
