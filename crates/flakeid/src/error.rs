use core::num::ParseIntError;

/// A result type whose error defaults to [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors a generator can be constructed with.
///
/// Generation itself is infallible: running out of sequence space within a
/// millisecond blocks until the clock advances instead of failing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The node id does not fit the layout's node field.
    #[error("node id {node} is out of range, must be between 0 and {max}")]
    InvalidNodeId {
        /// The rejected node id.
        node: i64,
        /// The largest node id the layout can encode.
        max: i64,
    },
}

/// Returned when a string cannot be parsed back into a [`crate::FlakeId`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid base-{radix} id {input:?}: {source}")]
pub struct ParseIdError {
    pub(crate) input: String,
    pub(crate) radix: u32,
    #[source]
    pub(crate) source: ParseIntError,
}

impl ParseIdError {
    /// The string that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The radix the input was parsed with (2, 10 or 36).
    pub fn radix(&self) -> u32 {
        self.radix
    }
}
