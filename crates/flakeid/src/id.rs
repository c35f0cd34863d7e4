use core::{fmt, str::FromStr};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use md5::{Digest, Md5};

use crate::{Layout, ParseIdError};

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A 64-bit Snowflake-style identifier.
///
/// The raw value is bit-packed as `[ time | node | sequence ]`. The field
/// widths are not stored in the ID, so the accessors take the [`Layout`] the
/// ID was generated with.
///
/// # Example
///
/// ```
/// use flakeid::{FlakeId, Layout};
///
/// let layout = Layout::default();
/// let id = layout.compose(layout.epoch_ms() + 1, 5, 3);
///
/// assert_eq!(id.timestamp(&layout), layout.epoch_ms() + 1);
/// assert_eq!(id.node(&layout), 5);
/// assert_eq!(id.sequence(&layout), 3);
/// assert_eq!(id.to_string(), "4214787");
/// assert_eq!(id.to_base36(), "2ic5f");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FlakeId(i64);

/// The three fields of a [`FlakeId`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Parts {
    /// Milliseconds since the UNIX epoch.
    pub timestamp_ms: i64,
    pub node: i64,
    pub sequence: i64,
}

impl FlakeId {
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn to_raw(&self) -> i64 {
        self.0
    }

    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Origin timestamp in milliseconds since the UNIX epoch.
    ///
    /// Wraps on overflow, so any epoch decodes without panicking.
    pub const fn timestamp(&self, layout: &Layout) -> i64 {
        (self.0 >> layout.time_shift()).wrapping_add(layout.epoch_ms())
    }

    pub const fn node(&self, layout: &Layout) -> i64 {
        (self.0 & layout.node_mask()) >> layout.node_shift()
    }

    pub const fn sequence(&self, layout: &Layout) -> i64 {
        self.0 & layout.step_mask()
    }

    /// Splits the ID into its fields.
    pub const fn decode(&self, layout: &Layout) -> Parts {
        Parts {
            timestamp_ms: self.timestamp(layout),
            node: self.node(layout),
            sequence: self.sequence(layout),
        }
    }

    /// Binary rendering, with a leading `-` for negative values.
    pub fn to_base2(&self) -> String {
        format_radix(self.0, 2)
    }

    /// Lowercase base-36 rendering, with a leading `-` for negative values.
    pub fn to_base36(&self) -> String {
        format_radix(self.0, 36)
    }

    /// UTF-8 bytes of the decimal rendering.
    ///
    /// This is the form handed to hashing or encoding utilities.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Standard (padded) base64 of [`Self::to_bytes`].
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Lowercase hex MD5 digest of [`Self::to_bytes`].
    pub fn to_md5(&self) -> String {
        hex::encode(Md5::digest(self.to_bytes()))
    }

    /// Parses a binary rendering produced by [`Self::to_base2`].
    ///
    /// # Errors
    ///
    /// Returns [`ParseIdError`] if `s` is not a base-2 `i64`.
    pub fn from_base2(s: &str) -> Result<Self, ParseIdError> {
        parse_radix(s, 2)
    }

    /// Parses a base-36 rendering produced by [`Self::to_base36`]. Digits are
    /// accepted in either case.
    ///
    /// # Errors
    ///
    /// Returns [`ParseIdError`] if `s` is not a base-36 `i64`.
    pub fn from_base36(s: &str) -> Result<Self, ParseIdError> {
        parse_radix(s, 36)
    }
}

impl Parts {
    /// Packs the fields back into an identifier.
    pub const fn compose(&self, layout: &Layout) -> FlakeId {
        layout.compose(self.timestamp_ms, self.node, self.sequence)
    }
}

impl fmt::Display for FlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for FlakeId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_radix(s, 10)
    }
}

impl From<i64> for FlakeId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl From<FlakeId> for i64 {
    fn from(id: FlakeId) -> Self {
        id.0
    }
}

fn format_radix(value: i64, radix: u32) -> String {
    debug_assert!((2..=36).contains(&radix));

    let mut n = value.unsigned_abs();
    if n == 0 {
        return "0".to_owned();
    }

    // 64 binary digits plus a sign
    let mut buf = [0_u8; 65];
    let mut pos = buf.len();
    let radix = u64::from(radix);
    while n > 0 {
        pos -= 1;
        buf[pos] = DIGITS[(n % radix) as usize];
        n /= radix;
    }
    if value < 0 {
        pos -= 1;
        buf[pos] = b'-';
    }

    buf[pos..].iter().map(|&b| char::from(b)).collect()
}

fn parse_radix(s: &str, radix: u32) -> Result<FlakeId, ParseIdError> {
    i64::from_str_radix(s, radix)
        .map(FlakeId)
        .map_err(|source| ParseIdError {
            input: s.to_owned(),
            radix,
            source,
        })
}
