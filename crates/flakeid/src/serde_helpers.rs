//! String encodings for [`FlakeId`] in serde formats.
//!
//! [`FlakeId`] serializes as its native `i64` by default. These modules are
//! meant for `#[serde(with = "...")]` when a consumer cannot hold 64-bit
//! integers losslessly (for example JavaScript).
//!
//! ```
//! use flakeid::FlakeId;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Row {
//!     #[serde(with = "flakeid::serde_helpers::as_decimal_str")]
//!     id: FlakeId,
//! }
//!
//! let row = Row { id: FlakeId::from_raw(42) };
//! assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"id":"42"}"#);
//! ```

use core::{fmt, marker::PhantomData};

use serde::{Deserializer, Serializer, de};

use crate::{FlakeId, ParseIdError};

struct StrVisitor<F> {
    expecting: &'static str,
    parse: F,
    _marker: PhantomData<fn() -> FlakeId>,
}

impl<F> de::Visitor<'_> for StrVisitor<F>
where
    F: Fn(&str) -> Result<FlakeId, ParseIdError>,
{
    type Value = FlakeId;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(self.expecting)
    }

    #[inline]
    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        (self.parse)(v).map_err(de::Error::custom)
    }
}

pub mod as_decimal_str {
    use super::{Deserializer, FlakeId, PhantomData, Serializer, StrVisitor};

    /// Serialize an ID as a decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &FlakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_str(id)
    }

    /// Deserialize an ID from a decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails or the string is
    /// not a decimal `i64`.
    pub fn deserialize<'de, D>(d: D) -> Result<FlakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_str(StrVisitor {
            expecting: "a decimal id string",
            parse: |s: &str| s.parse::<FlakeId>(),
            _marker: PhantomData,
        })
    }
}

pub mod as_base36_str {
    use super::{Deserializer, FlakeId, PhantomData, Serializer, StrVisitor};

    /// Serialize an ID as a lowercase base-36 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &FlakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&id.to_base36())
    }

    /// Deserialize an ID from a base-36 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails or the string is
    /// not a base-36 `i64`.
    pub fn deserialize<'de, D>(d: D) -> Result<FlakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_str(StrVisitor {
            expecting: "a base-36 id string",
            parse: FlakeId::from_base36,
            _marker: PhantomData,
        })
    }
}
