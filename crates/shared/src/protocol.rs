use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{format_location, PointsKey, TxId};

// Legacy GET surface. Writes ride on GET here; the v1 routes below are the
// structured replacement.
pub const GET_POINTS_ROUTE: &str = "/get_points/:id";
pub const ADD_POINTS_ROUTE: &str = "/add_points/:points";
pub const GET_ALL_POINTS_ROUTE: &str = "/get_all_points";
pub const CHANGE_HOLDER_ROUTE: &str = "/change_holder/:holder";

pub const V1_POINTS_ROUTE: &str = "/api/v1/points";
pub const V1_POINTS_BY_ID_ROUTE: &str = "/api/v1/points/:id";
pub const V1_HOLDER_ROUTE: &str = "/api/v1/points/:id/holder";

/// Body the legacy `get_points` handler answers with when the key is absent.
pub const POINTS_NOT_FOUND_SENTINEL: &str = "Could not locate points";
/// Body the legacy `change_holder` handler answers with when the key is absent.
pub const HOLDER_NOT_FOUND_SENTINEL: &str = "Error: no points transactions found";

pub fn get_points_path(id: &str) -> String {
    format!("/get_points/{id}")
}

pub fn add_points_path(segment: &PointsSegment) -> String {
    format!("/add_points/{}", segment.encode())
}

/// The UI has always requested the collection with a trailing slash.
pub fn get_all_points_path() -> &'static str {
    "/get_all_points/"
}

pub fn change_holder_path(segment: &HolderSegment) -> String {
    format!("/change_holder/{}", segment.encode())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("points segment '{0}' does not have id-location-timestamp-holder-schemeid fields")]
    MalformedPoints(String),
    #[error("holder segment '{0}' does not have id-name fields")]
    MalformedHolder(String),
}

/// Hyphen-joined `id-location-timestamp-holder-schemeid` path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsSegment {
    pub id: String,
    pub location: String,
    pub timestamp: String,
    pub holder: String,
    pub scheme_id: String,
}

impl PointsSegment {
    pub fn encode(&self) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            self.id, self.location, self.timestamp, self.holder, self.scheme_id
        )
    }

    /// The id ends at the first hyphen and the last three fields are taken
    /// from the right, so whatever sits in between (including signed
    /// coordinates) is the location.
    pub fn decode(raw: &str) -> Result<Self, SegmentError> {
        let malformed = || SegmentError::MalformedPoints(raw.to_string());
        let (id, rest) = raw.split_once('-').ok_or_else(malformed)?;
        let mut fields = rest.rsplitn(4, '-');
        let scheme_id = fields.next().ok_or_else(malformed)?;
        let holder = fields.next().ok_or_else(malformed)?;
        let timestamp = fields.next().ok_or_else(malformed)?;
        let location = fields.next().ok_or_else(malformed)?;
        Ok(Self {
            id: id.to_string(),
            location: location.to_string(),
            timestamp: timestamp.to_string(),
            holder: holder.to_string(),
            scheme_id: scheme_id.to_string(),
        })
    }
}

/// Hyphen-joined `id-name` path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderSegment {
    pub id: String,
    pub name: String,
}

impl HolderSegment {
    pub fn encode(&self) -> String {
        format!("{}-{}", self.id, self.name)
    }

    pub fn decode(raw: &str) -> Result<Self, SegmentError> {
        let (id, name) = raw
            .split_once('-')
            .ok_or_else(|| SegmentError::MalformedHolder(raw.to_string()))?;
        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPointsRequest {
    pub id: PointsKey,
    pub longitude: f64,
    pub latitude: f64,
    pub timestamp: String,
    pub holder: String,
    pub scheme_id: String,
}

impl RecordPointsRequest {
    pub fn location(&self) -> String {
        format_location(self.longitude, self.latitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeHolderRequest {
    pub holder: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_id: TxId,
    pub key: PointsKey,
    pub committed_at: DateTime<Utc>,
}
