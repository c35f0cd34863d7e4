use core::cmp::Ordering;

use parking_lot::Mutex;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    FlakeConfig, FlakeId, Layout, Poll,
    error::{Error, Result},
    time::{SystemClock, TimeSource},
};

#[derive(Debug, Default)]
struct State {
    last_timestamp_ms: i64,
    sequence: i64,
}

/// A lock-based Snowflake ID generator, safe to share across threads.
///
/// All mutable state sits behind a single [`Mutex`], so concurrent callers of
/// [`Self::next_id`] are serialized. When a millisecond's sequence space runs
/// out, the caller spins on the clock *while holding the lock*; every other
/// caller on this instance waits with it.
///
/// Two generators share nothing. IDs stay unique across generators as long as
/// their node ids differ and they use the same [`FlakeConfig`].
///
/// # Clock regression
///
/// The generator reads wall-clock time. If the clock moves backward, the
/// sequence resets and the earlier timestamp is accepted, so an ID issued
/// after the jump can be numerically smaller than one issued before it.
///
/// # Example
///
/// ```
/// use flakeid::SnowflakeGenerator;
///
/// let generator = SnowflakeGenerator::new(1).unwrap();
/// let a = generator.next_id();
/// let b = generator.next_id();
/// assert!(a < b);
/// ```
#[derive(Debug)]
pub struct SnowflakeGenerator<T = SystemClock>
where
    T: TimeSource,
{
    state: Mutex<State>,
    node: i64,
    layout: Layout,
    time: T,
}

impl SnowflakeGenerator<SystemClock> {
    /// Creates a generator for `node` with the default [`FlakeConfig`] and the
    /// system clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeId`] if `node` is outside `0..=1023`.
    pub fn new(node: i64) -> Result<Self> {
        Self::with_config(node, FlakeConfig::default())
    }

    /// Creates a generator for `node` with a custom configuration and the
    /// system clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeId`] if `node` does not fit the
    /// configuration's node field.
    ///
    /// # Panics
    ///
    /// Panics if the configuration's fields exceed 63 bits; see
    /// [`FlakeConfig::layout`].
    pub fn with_config(node: i64, config: FlakeConfig) -> Result<Self> {
        Self::with_clock(node, config, SystemClock)
    }
}

impl<T> SnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator reading time from `time`.
    ///
    /// The layout is derived from `config` here and never changes afterwards.
    /// The generator starts with `last_timestamp = 0` and `sequence = 0`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeId`] if `node` does not fit the
    /// configuration's node field.
    ///
    /// # Panics
    ///
    /// Panics if the configuration's fields exceed 63 bits; see
    /// [`FlakeConfig::layout`].
    pub fn with_clock(node: i64, config: FlakeConfig, time: T) -> Result<Self> {
        let layout = config.layout();
        if !layout.contains_node(node) {
            return Err(Error::InvalidNodeId {
                node,
                max: layout.node_max(),
            });
        }

        Ok(Self {
            state: Mutex::new(State::default()),
            node,
            layout,
            time,
        })
    }

    pub fn node(&self) -> i64 {
        self.node
    }

    /// The layout every ID from this generator is packed with.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Generates the next ID, blocking if the current millisecond is used up.
    ///
    /// When the sequence wraps, this spins until the clock moves strictly past
    /// the last issued millisecond. There is no timeout: a clock that never
    /// advances blocks the caller (and every other caller) indefinitely.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self), fields(node = self.node))
    )]
    pub fn next_id(&self) -> FlakeId {
        let mut state = self.state.lock();
        let mut now = self.time.current_millis();

        if now == state.last_timestamp_ms {
            state.sequence = (state.sequence + 1) & self.layout.step_mask();
            if state.sequence == 0 {
                now = self.cold_wait_past(state.last_timestamp_ms);
            }
        } else {
            if now < state.last_timestamp_ms {
                Self::cold_clock_behind(now, state.last_timestamp_ms);
            }
            state.sequence = 0;
        }

        state.last_timestamp_ms = now;
        self.layout.compose(now, self.node, state.sequence)
    }

    /// Generates the next ID, calling `f` with a back-off duration (in
    /// milliseconds) instead of spinning under the lock.
    ///
    /// The lock is released while `f` runs, so other callers make progress.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use flakeid::SnowflakeGenerator;
    ///
    /// let generator = SnowflakeGenerator::new(0).unwrap();
    /// let id = generator.next_id_with(|ms| {
    ///     std::thread::sleep(Duration::from_millis(ms.unsigned_abs()))
    /// });
    /// assert_eq!(id.node(generator.layout()), 0);
    /// ```
    pub fn next_id_with(&self, mut f: impl FnMut(i64)) -> FlakeId {
        loop {
            match self.poll_id() {
                Poll::Ready { id } => break id,
                Poll::Pending { yield_for } => f(yield_for),
            }
        }
    }

    /// Attempts to generate the next ID without blocking.
    ///
    /// Returns [`Poll::Pending`] when the sequence for the current millisecond
    /// is exhausted; generator state is left untouched in that case.
    /// Otherwise behaves exactly like [`Self::next_id`].
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self), fields(node = self.node))
    )]
    pub fn poll_id(&self) -> Poll {
        let mut state = self.state.lock();
        let now = self.time.current_millis();

        match now.cmp(&state.last_timestamp_ms) {
            Ordering::Equal => {
                if state.sequence == self.layout.step_mask() {
                    return Poll::Pending { yield_for: 1 };
                }
                state.sequence += 1;
            }
            Ordering::Greater => state.sequence = 0,
            Ordering::Less => {
                Self::cold_clock_behind(now, state.last_timestamp_ms);
                state.sequence = 0;
            }
        }

        state.last_timestamp_ms = now;
        Poll::Ready {
            id: self.layout.compose(now, self.node, state.sequence),
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_wait_past(&self, last_ms: i64) -> i64 {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            node = self.node,
            timestamp_ms = last_ms,
            "sequence exhausted, waiting for the next millisecond"
        );

        loop {
            let now = self.time.current_millis();
            if now > last_ms {
                break now;
            }
            core::hint::spin_loop();
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(_now: i64, _last_ms: i64) {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            now_ms = _now,
            last_ms = _last_ms,
            behind_ms = _last_ms.wrapping_sub(_now),
            "clock moved backwards, accepting earlier timestamp"
        );
    }
}
