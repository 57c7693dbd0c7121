use crate::classification::{
    ConditionsCategory, DisasterType, RiskLevel, SecurityCategory, SecurityLevel,
};
use crate::error::{HereIamError, HereIamResult};
use crate::ids::{MissionId, PersonId, TeamId};
use hereiam_geo::{GeoJsonPolygon, LatLng};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A mission document as stored remotely. Most fields are optional in
/// practice, so absent keys fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    #[serde(rename = "_id")]
    pub id: MissionId,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub identifier: String,
    #[serde(rename = "estimatedPopulation", default)]
    pub estimated_population: u64,
    #[serde(default)]
    pub nuts: String,
    #[serde(default)]
    pub mission_leader: Option<PersonId>,
    #[serde(default)]
    pub start_of_mission: String,
    #[serde(default)]
    pub end_of_mission: String,
    #[serde(default)]
    pub participants: Vec<PersonId>,
    #[serde(default)]
    pub operating_teams: Vec<TeamId>,
    #[serde(rename = "geoJSON", default)]
    pub geo_json: Option<GeoJsonPolygon>,
    #[serde(rename = "disasterType", default)]
    pub disaster_type: Vec<DisasterType>,
    #[serde(rename = "roleAndMandates", default)]
    pub role_and_mandates: Vec<String>,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(rename = "nationalAssetsDeployed", default)]
    pub national_assets_deployed: bool,
    #[serde(rename = "internationalAssetsDeployed", default)]
    pub international_assets_deployed: bool,
    #[serde(rename = "CIMICDeployed", default)]
    pub cimic_deployed: bool,
    #[serde(rename = "threatsAndRisks", default)]
    pub threats_and_risks: Vec<String>,
    #[serde(rename = "riskLevel", default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(rename = "securityLevel", default)]
    pub security_level: Option<SecurityLevel>,
    #[serde(rename = "securityReport", default)]
    pub security_report: Option<SecurityReport>,
    #[serde(rename = "weatherReport", default)]
    pub weather_report: Option<WeatherReport>,
    #[serde(rename = "evacuationRoute", default)]
    pub evacuation_route: String,
    #[serde(rename = "additionalEvacuationSignal", default)]
    pub additional_evacuation_signal: String,
    #[serde(rename = "safeHaven", default)]
    pub safe_haven: String,
    #[serde(rename = "nextHospital", default)]
    pub next_hospital: String,
    #[serde(rename = "nextVeterinary", default)]
    pub next_veterinary: String,
}

impl Mission {
    /// Interprets the reply of the current-mission function. A null reply or
    /// a document without `_id` means the caller has no current mission.
    pub fn from_function_response(value: Value) -> HereIamResult<Option<Self>> {
        match &value {
            Value::Null => Ok(None),
            Value::Object(map) => match map.get("_id") {
                None | Some(Value::Null) => Ok(None),
                Some(_) => serde_json::from_value(value)
                    .map(Some)
                    .map_err(|err| {
                        HereIamError::invalid_input(format!("malformed mission document: {err}"))
                    }),
            },
            other => Err(HereIamError::invalid_input(format!(
                "expected a mission document, got {other}"
            ))),
        }
    }

    pub fn display_name(&self) -> &str {
        if self.identifier.trim().is_empty() {
            "Unnamed mission"
        } else {
            &self.identifier
        }
    }

    pub fn covers(&self, point: LatLng) -> bool {
        self.geo_json
            .as_ref()
            .is_some_and(|area| area.contains(point))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ReportedFromEntry {
    reported_from: PersonId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SituationEntry {
    situation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SecurityCategoryEntry {
    #[serde(rename = "securityCategory")]
    security_category: SecurityCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ConditionsEntry {
    conditions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ConditionsCategoryEntry {
    #[serde(rename = "conditionsCategory")]
    conditions_category: ConditionsCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TimestampEntry {
    timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SecurityReportWire(
    ReportedFromEntry,
    SituationEntry,
    SecurityCategoryEntry,
    TimestampEntry,
);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WeatherReportWire(
    ReportedFromEntry,
    ConditionsEntry,
    ConditionsCategoryEntry,
    TimestampEntry,
);

/// Stored as a four element array of single-key objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SecurityReportWire", into = "SecurityReportWire")]
pub struct SecurityReport {
    pub reported_from: PersonId,
    pub situation: String,
    pub category: SecurityCategory,
    pub timestamp: String,
}

impl From<SecurityReportWire> for SecurityReport {
    fn from(wire: SecurityReportWire) -> Self {
        let SecurityReportWire(from, situation, category, timestamp) = wire;
        Self {
            reported_from: from.reported_from,
            situation: situation.situation,
            category: category.security_category,
            timestamp: timestamp.timestamp,
        }
    }
}

impl From<SecurityReport> for SecurityReportWire {
    fn from(report: SecurityReport) -> Self {
        Self(
            ReportedFromEntry {
                reported_from: report.reported_from,
            },
            SituationEntry {
                situation: report.situation,
            },
            SecurityCategoryEntry {
                security_category: report.category,
            },
            TimestampEntry {
                timestamp: report.timestamp,
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WeatherReportWire", into = "WeatherReportWire")]
pub struct WeatherReport {
    pub reported_from: PersonId,
    pub conditions: String,
    pub category: ConditionsCategory,
    pub timestamp: String,
}

impl From<WeatherReportWire> for WeatherReport {
    fn from(wire: WeatherReportWire) -> Self {
        let WeatherReportWire(from, conditions, category, timestamp) = wire;
        Self {
            reported_from: from.reported_from,
            conditions: conditions.conditions,
            category: category.conditions_category,
            timestamp: timestamp.timestamp,
        }
    }
}

impl From<WeatherReport> for WeatherReportWire {
    fn from(report: WeatherReport) -> Self {
        Self(
            ReportedFromEntry {
                reported_from: report.reported_from,
            },
            ConditionsEntry {
                conditions: report.conditions,
            },
            ConditionsCategoryEntry {
                conditions_category: report.category,
            },
            TimestampEntry {
                timestamp: report.timestamp,
            },
        )
    }
}

/// Arguments of the mission creation function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMissionArgs {
    pub identifier: String,
    #[serde(rename = "estimatedPopulation")]
    pub estimated_population: u64,
    pub mission_leader: Option<PersonId>,
    pub start_of_mission: String,
    pub end_of_mission: String,
    pub participants: Vec<PersonId>,
    #[serde(rename = "geoJSON")]
    pub geo_json: GeoJsonPolygon,
    #[serde(rename = "disasterType")]
    pub disaster_type: Vec<DisasterType>,
    pub objectives: Vec<String>,
    #[serde(rename = "riskLevel")]
    pub risk_level: RiskLevel,
    #[serde(rename = "securityLevel")]
    pub security_level: SecurityLevel,
}

impl CreateMissionArgs {
    pub fn validate(&self) -> HereIamResult<()> {
        if self.identifier.trim().is_empty() {
            return Err(HereIamError::invalid_input("mission identifier is required"));
        }
        if self.disaster_type.is_empty() {
            return Err(HereIamError::invalid_input(
                "at least one disaster type is required",
            ));
        }
        self.geo_json.validate()?;
        if let (Some(start), Some(end)) = (
            crate::time::parse_timestamp(&self.start_of_mission),
            crate::time::parse_timestamp(&self.end_of_mission),
        ) {
            if end < start {
                return Err(HereIamError::invalid_input(
                    "mission cannot end before it starts",
                ));
            }
        }
        Ok(())
    }

    /// Builds the document the remote store would persist for these args.
    pub fn into_mission(self, id: MissionId, timestamp: String) -> Mission {
        Mission {
            id,
            timestamp,
            identifier: self.identifier,
            estimated_population: self.estimated_population,
            nuts: String::new(),
            mission_leader: self.mission_leader,
            start_of_mission: self.start_of_mission,
            end_of_mission: self.end_of_mission,
            participants: self.participants,
            operating_teams: Vec::new(),
            geo_json: Some(self.geo_json),
            disaster_type: self.disaster_type,
            role_and_mandates: Vec::new(),
            objectives: self.objectives,
            national_assets_deployed: false,
            international_assets_deployed: false,
            cimic_deployed: false,
            threats_and_risks: Vec::new(),
            risk_level: Some(self.risk_level),
            security_level: Some(self.security_level),
            security_report: None,
            weather_report: None,
            evacuation_route: String::new(),
            additional_evacuation_signal: String::new(),
            safe_haven: String::new(),
            next_hospital: String::new(),
            next_veterinary: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn area() -> GeoJsonPolygon {
        GeoJsonPolygon::from_rings(vec![vec![
            [13.4, 52.4],
            [13.6, 52.4],
            [13.6, 52.5],
            [13.4, 52.5],
            [13.4, 52.4],
        ]])
        .unwrap()
    }

    #[test]
    fn empty_reply_means_no_current_mission() {
        assert!(Mission::from_function_response(json!({})).unwrap().is_none());
        assert!(Mission::from_function_response(Value::Null).unwrap().is_none());
        assert!(Mission::from_function_response(json!({"_id": null})).unwrap().is_none());
        assert!(Mission::from_function_response(json!("nope")).is_err());
    }

    #[test]
    fn reply_with_id_parses_document() {
        let reply = json!({
            "_id": {"$oid": "64b7f0c2a1b2c3d4e5f60718"},
            "identifier": "Flood Spree 2024",
            "estimatedPopulation": 12000,
            "riskLevel": "3-Moderate",
            "securityLevel": "1-Monitoring",
            "disasterType": ["flood"],
            "CIMICDeployed": true,
            "securityReport": [
                {"reported_from": {"$oid": "64b7f0c2a1b2c3d4e5f60719"}},
                {"situation": "Roads blocked north of the river"},
                {"securityCategory": "Natural hazards"},
                {"timestamp": "2024-05-02T10:00:00.000Z"}
            ]
        });
        let mission = Mission::from_function_response(reply).unwrap().unwrap();
        assert_eq!(mission.identifier, "Flood Spree 2024");
        assert_eq!(mission.risk_level, Some(RiskLevel::Moderate));
        assert!(mission.cimic_deployed);
        let report = mission.security_report.unwrap();
        assert_eq!(report.category, SecurityCategory::NaturalHazards);
        assert_eq!(report.situation, "Roads blocked north of the river");
    }

    #[test]
    fn malformed_document_is_an_error() {
        let reply = json!({"_id": {"$oid": "64b7f0c2a1b2c3d4e5f60718"}, "riskLevel": "9-Extreme"});
        assert!(Mission::from_function_response(reply).is_err());
    }

    #[test]
    fn report_with_wrong_arity_is_rejected() {
        let raw = json!([
            {"reported_from": {"$oid": "64b7f0c2a1b2c3d4e5f60719"}},
            {"conditions": "Gusts"},
            {"conditionsCategory": "Wind"}
        ]);
        assert!(serde_json::from_value::<WeatherReport>(raw).is_err());
    }

    #[test]
    fn weather_report_serialises_as_tuple() {
        let report = WeatherReport {
            reported_from: PersonId::parse_str("64b7f0c2a1b2c3d4e5f60719").unwrap(),
            conditions: "Heavy rain".to_string(),
            category: ConditionsCategory::Rainfall,
            timestamp: "2024-05-02T10:00:00.000Z".to_string(),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(4));
        assert_eq!(value[2], json!({"conditionsCategory": "Rainfall"}));
    }

    #[test]
    fn create_args_validate_and_build_mission() {
        let args = CreateMissionArgs {
            identifier: "Spree flood".to_string(),
            estimated_population: 500,
            mission_leader: None,
            start_of_mission: "2024-05-02T10:00:00Z".to_string(),
            end_of_mission: "2024-05-01T10:00:00Z".to_string(),
            participants: vec![],
            geo_json: area(),
            disaster_type: vec![DisasterType::Flood],
            objectives: vec![],
            risk_level: RiskLevel::Low,
            security_level: SecurityLevel::Work,
        };
        assert!(args.validate().is_err());

        let args = CreateMissionArgs {
            end_of_mission: "2024-05-09T10:00:00Z".to_string(),
            ..args
        };
        args.validate().unwrap();
        let mission = args.into_mission(MissionId::new(), "2024-05-02T10:00:00Z".to_string());
        assert!(mission.covers(LatLng::new(52.45, 13.5)));
        assert!(!mission.covers(LatLng::new(48.0, 11.0)));
    }
}
