use serde::{Deserialize, Serialize};
use shared::{
    domain::format_location,
    protocol::{add_points_path, change_holder_path, HolderSegment, PointsSegment},
};

/// Fields of the "record points" form, kept as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsForm {
    pub id: String,
    pub longitude: String,
    pub latitude: String,
    pub timestamp: String,
    pub holder: String,
    #[serde(rename = "schemeid")]
    pub scheme_id: String,
}

impl PointsForm {
    pub fn location(&self) -> String {
        format_location(&self.longitude, &self.latitude)
    }

    pub fn to_segment(&self) -> PointsSegment {
        PointsSegment {
            id: self.id.clone(),
            location: self.location(),
            timestamp: self.timestamp.clone(),
            holder: self.holder.clone(),
            scheme_id: self.scheme_id.clone(),
        }
    }

    /// Unencoded request path, e.g. `/add_points/1-10, 20-T-H-S`.
    pub fn request_path(&self) -> String {
        add_points_path(&self.to_segment())
    }
}

/// Fields of the "change holder" form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderForm {
    pub id: String,
    pub name: String,
}

impl HolderForm {
    pub fn to_segment(&self) -> HolderSegment {
        HolderSegment {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    pub fn request_path(&self) -> String {
        change_holder_path(&self.to_segment())
    }
}
