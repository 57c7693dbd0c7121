use crate::classification::wire_enum;
use crate::ids::{MissionId, OrganizationId, PersonId, TeamId, UserId};
use hereiam_geo::GeoJsonPoint;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

wire_enum!(Role {
    Lema => "lema",
    Occ => "occ",
    LemaApprover => "lemaApprover",
    Coordination => "coordination",
    Logistics => "logistics",
    Safety => "safety",
    Communications => "communications",
    TeamLeader => "teamLeader",
    Medic => "medic",
    DogHandler => "dogHandler",
    TeamMember => "teamMember",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "missionReadyStatus", default)]
    pub mission_ready_status: bool,
    #[serde(default)]
    pub role: BTreeSet<Role>,
    #[serde(rename = "geoJSON", default)]
    pub geo_json: Option<GeoJsonPoint>,
}

impl Person {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role.contains(&role)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePersonArgs {
    #[serde(rename = "_id")]
    pub id: PersonId,
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub identifier: String,
    #[serde(rename = "managingOrganization")]
    pub managing_organization: OrganizationId,
    pub team: TeamId,
    pub role: BTreeSet<Role>,
    pub missions: Vec<MissionId>,
    #[serde(rename = "deployedToMission")]
    pub deployed_to_mission: Option<MissionId>,
    #[serde(rename = "allowTracking")]
    pub allow_tracking: bool,
    #[serde(rename = "geoJSON")]
    pub geo_json: GeoJsonPoint,
}

/// Profile fields attached to an identity by the remote platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomData {
    #[serde(rename = "firstName", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CustomData {
    pub fn display_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if name.trim().is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCustomDataArgs {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn roles_outside_the_enumeration_are_rejected() {
        let raw = json!({
            "firstName": "Ada",
            "lastName": "Berg",
            "missionReadyStatus": true,
            "role": ["medic", "pilot"]
        });
        assert!(serde_json::from_value::<Person>(raw).is_err());
    }

    #[test]
    fn role_set_collapses_duplicates() {
        let raw = json!({
            "firstName": "Ada",
            "lastName": "Berg",
            "role": ["medic", "dogHandler", "medic"],
            "geoJSON": {"type": "Point", "coordinates": [13.52, 52.45]}
        });
        let person: Person = serde_json::from_value(raw).unwrap();
        assert_eq!(person.role.len(), 2);
        assert!(person.has_role(Role::DogHandler));
        assert!(!person.mission_ready_status);
        assert_eq!(person.display_name(), "Ada Berg");
    }

    #[test]
    fn custom_data_keeps_unknown_fields() {
        let raw = json!({"firstName": "Ada", "organisation": "THW"});
        let data: CustomData = serde_json::from_value(raw).unwrap();
        assert_eq!(data.display_name().as_deref(), Some("Ada"));
        assert_eq!(data.extra.get("organisation"), Some(&json!("THW")));
    }

    #[test]
    fn update_args_use_document_field_names() {
        let args = UpdateCustomDataArgs {
            first_name: "Ada".to_string(),
            last_name: "Berg".to_string(),
        };
        assert_eq!(
            serde_json::to_value(args).unwrap(),
            json!({"firstName": "Ada", "lastName": "Berg"})
        );
    }
}
