//! Records exchanged with the platform: ids, groups, containers and resources.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::permissions::Overwrite;

/// Platform-wide numeric identifier.
///
/// The remote API transports ids as decimal strings, so that is the serde
/// representation. Plain integers are accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Snowflake(pub u64);

impl Snowflake {
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Snowflake {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Snowflake)
    }
}

impl From<u64> for Snowflake {
    fn from(value: u64) -> Self {
        Snowflake(value)
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

struct SnowflakeVisitor;

impl Visitor<'_> for SnowflakeVisitor {
    type Value = Snowflake;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a snowflake id as a decimal string or integer")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Snowflake, E> {
        Ok(Snowflake(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Snowflake, E> {
        u64::try_from(value)
            .map(Snowflake)
            .map_err(|_| E::custom(format!("negative snowflake: {value}")))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Snowflake, E> {
        value
            .parse()
            .map_err(|_| E::custom(format!("invalid snowflake: {value:?}")))
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

/// An access-control group (a guild role on the remote service).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Snowflake,
    pub label: String,
    pub color: u32,
    pub mentionable: bool,
    pub hoisted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub label: String,
    pub color: u32,
    pub mentionable: bool,
    pub hoisted: bool,
}

/// A grouping container (a category on the remote service).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: Snowflake,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Text,
    Voice,
}

/// A text or voice resource as currently known to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Snowflake,
    pub kind: ResourceKind,
    pub container_id: Option<Snowflake>,
    pub label: String,
    pub metadata_tag: Option<String>,
}

impl Resource {
    pub fn is_text(&self) -> bool {
        self.kind == ResourceKind::Text
    }

    pub fn is_voice(&self) -> bool {
        self.kind == ResourceKind::Voice
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResourceSpec {
    pub label: String,
    pub container_id: Snowflake,
    pub metadata_tag: String,
    pub access: Vec<Overwrite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceResourceSpec {
    pub label: String,
    pub container_id: Snowflake,
    pub access: Vec<Overwrite>,
}
