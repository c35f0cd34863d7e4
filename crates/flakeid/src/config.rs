use crate::{FlakeId, time::TWITTER_EPOCH_MS};

/// Default number of bits reserved for the node id (1024 nodes).
pub const DEFAULT_NODE_BITS: u8 = 10;

/// Default number of bits reserved for the sequence (4096 IDs per
/// millisecond per node).
pub const DEFAULT_STEP_BITS: u8 = 12;

/// Widths of the node and sequence fields, plus the epoch timestamps are
/// measured from.
///
/// A configuration is fixed when a generator is built from it. The bits left
/// over after `node_bits + step_bits` (out of 63) hold the timestamp.
///
/// # Example
///
/// ```
/// use flakeid::FlakeConfig;
///
/// let config = FlakeConfig::default().with_node_bits(5).with_step_bits(8);
/// let layout = config.layout();
/// assert_eq!(layout.node_max(), 31);
/// assert_eq!(layout.step_mask(), 255);
/// assert_eq!(layout.time_shift(), 13);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FlakeConfig {
    /// Reference instant in milliseconds since the UNIX epoch.
    pub epoch_ms: i64,
    /// Bits allocated to the node id.
    pub node_bits: u8,
    /// Bits allocated to the per-millisecond sequence.
    pub step_bits: u8,
}

impl Default for FlakeConfig {
    /// Twitter epoch with 10 node bits and 12 sequence bits.
    fn default() -> Self {
        Self {
            epoch_ms: TWITTER_EPOCH_MS,
            node_bits: DEFAULT_NODE_BITS,
            step_bits: DEFAULT_STEP_BITS,
        }
    }
}

impl FlakeConfig {
    /// Largest combined node and sequence width. The top bit is the sign.
    pub const MAX_FIELD_BITS: u8 = 63;

    pub const fn new(epoch_ms: i64, node_bits: u8, step_bits: u8) -> Self {
        Self {
            epoch_ms,
            node_bits,
            step_bits,
        }
    }

    #[must_use]
    pub const fn with_epoch_ms(mut self, epoch_ms: i64) -> Self {
        self.epoch_ms = epoch_ms;
        self
    }

    #[must_use]
    pub const fn with_node_bits(mut self, node_bits: u8) -> Self {
        self.node_bits = node_bits;
        self
    }

    #[must_use]
    pub const fn with_step_bits(mut self, step_bits: u8) -> Self {
        self.step_bits = step_bits;
        self
    }

    /// Returns `true` if the node and sequence fields fit in 63 bits.
    pub const fn is_valid(&self) -> bool {
        (self.node_bits as u16 + self.step_bits as u16) <= Self::MAX_FIELD_BITS as u16
    }

    /// Derives the shifts and masks for this configuration.
    ///
    /// # Panics
    ///
    /// Panics if `node_bits + step_bits` exceeds 63. Such a configuration is
    /// a programming error and cannot describe any identifier.
    pub fn layout(&self) -> Layout {
        assert!(
            self.is_valid(),
            "node_bits ({}) + step_bits ({}) exceeds {} bits",
            self.node_bits,
            self.step_bits,
            Self::MAX_FIELD_BITS
        );

        let node_bits = u32::from(self.node_bits);
        let step_bits = u32::from(self.step_bits);
        let node_max = !(-1_i64 << node_bits);
        let step_mask = !(-1_i64 << step_bits);

        Layout {
            epoch_ms: self.epoch_ms,
            node_max,
            node_mask: node_max << step_bits,
            step_mask,
            time_shift: node_bits + step_bits,
            node_shift: step_bits,
        }
    }
}

/// Shifts and masks derived from a [`FlakeConfig`].
///
/// All field extraction and packing goes through a layout, so IDs must be
/// decoded with the layout of the generator that produced them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    epoch_ms: i64,
    node_max: i64,
    node_mask: i64,
    step_mask: i64,
    time_shift: u32,
    node_shift: u32,
}

impl Default for Layout {
    fn default() -> Self {
        FlakeConfig::default().layout()
    }
}

impl Layout {
    pub const fn epoch_ms(&self) -> i64 {
        self.epoch_ms
    }

    /// Largest node id this layout can encode.
    pub const fn node_max(&self) -> i64 {
        self.node_max
    }

    /// Mask selecting the node field in place.
    pub const fn node_mask(&self) -> i64 {
        self.node_mask
    }

    /// Mask selecting the sequence field; also the largest sequence value.
    pub const fn step_mask(&self) -> i64 {
        self.step_mask
    }

    pub const fn time_shift(&self) -> u32 {
        self.time_shift
    }

    pub const fn node_shift(&self) -> u32 {
        self.node_shift
    }

    /// Returns `true` if `node` fits the node field.
    pub const fn contains_node(&self, node: i64) -> bool {
        node >= 0 && node <= self.node_max
    }

    /// Packs an absolute timestamp (ms since the UNIX epoch), a node id and a
    /// sequence into an identifier.
    ///
    /// Node and sequence are not range-checked here; out-of-range values
    /// bleed into neighbouring fields. The epoch offset wraps on overflow.
    pub const fn compose(&self, timestamp_ms: i64, node: i64, sequence: i64) -> FlakeId {
        FlakeId::from_raw(
            (timestamp_ms.wrapping_sub(self.epoch_ms) << self.time_shift)
                | (node << self.node_shift)
                | sequence,
        )
    }
}
