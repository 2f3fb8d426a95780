use crate::codec;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A generated identifier.
///
/// Packs `timestamp | shard | sequence` from the high bits down. Ids are never
/// negative, and because the timestamp sits in the high bits, numeric order
/// follows mint time across shards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(i64);

impl Id {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Returns the base 62 form, e.g. `"AzL8n0Y58m7"`.
    ///
    /// # Panics
    ///
    /// Panics if the id is negative.
    pub fn short_string(self) -> String {
        codec::encode_short(self.0)
    }

    /// Returns a case-insensitive form that avoids `0`/`O` lookalikes.
    ///
    /// # Panics
    ///
    /// Panics if the id is negative.
    pub fn pretty_string(self) -> String {
        codec::encode_pretty(self.0)
    }

    pub fn parse_short(s: &str) -> Result<Self> {
        codec::decode_short(s).map(Self)
    }

    pub fn parse_pretty(s: &str) -> Result<Self> {
        codec::decode_pretty(s).map(Self)
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Id> for i64 {
    fn from(id: Id) -> Self {
        id.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
