use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! key_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

key_newtype!(PointsKey);
key_newtype!(TxId);

impl TxId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// World-state value stored under a [`PointsKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsRecord {
    #[serde(rename = "schemeid")]
    pub scheme_id: String,
    pub timestamp: String,
    pub location: String,
    pub holder: String,
}

/// One row of a range query, shaped the way the ledger has always
/// returned it (`{"Key": .., "Record": ..}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(rename = "Key")]
    pub key: PointsKey,
    #[serde(rename = "Record")]
    pub record: PointsRecord,
}

/// Joins a coordinate pair the way records carry it: `"<longitude>, <latitude>"`.
pub fn format_location(longitude: impl fmt::Display, latitude: impl fmt::Display) -> String {
    format!("{longitude}, {latitude}")
}
