use crate::FlakeId;

/// Outcome of a non-blocking generation attempt.
///
/// - [`Poll::Ready`] carries a freshly generated ID.
/// - [`Poll::Pending`] means the sequence for the current millisecond is
///   exhausted; retry once `yield_for` milliseconds have passed.
///
/// # Example
///
/// ```
/// use flakeid::{FlakeConfig, Poll, SnowflakeGenerator, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> i64 {
///         1_700_000_000_000
///     }
/// }
///
/// let config = FlakeConfig::default().with_step_bits(0);
/// let generator = SnowflakeGenerator::with_clock(0, config, FixedTime).unwrap();
///
/// assert!(matches!(generator.poll_id(), Poll::Ready { .. }));
/// assert_eq!(generator.poll_id(), Poll::Pending { yield_for: 1 });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: FlakeId,
    },
    /// No ID could be generated without waiting for the clock.
    Pending {
        /// Milliseconds to wait before trying again.
        yield_for: i64,
    },
}
