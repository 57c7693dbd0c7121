use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares an enum whose serde form is the exact label stored in the
/// remote documents.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let value = value.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str().eq_ignore_ascii_case(value))
                    .ok_or(())
            }
        }
    };
}

pub(crate) use wire_enum;

wire_enum!(RiskLevel {
    Minimal => "1-Minimal",
    Low => "2-Low",
    Moderate => "3-Moderate",
    Substantial => "4-Substantial",
    High => "5-High",
});

wire_enum!(SecurityLevel {
    Work => "0-Work",
    Monitoring => "1-Monitoring",
    Hibernation => "2-Hibernation",
    Relocation => "3-Relocation",
    Evacuation => "4-Evacuation",
});

wire_enum!(SecurityCategory {
    General => "General",
    Incident => "Incident",
    ArmedGroups => "Armed groups",
    Sensitivities => "Sensitivities",
    NaturalHazards => "Natural hazards",
    Crime => "Crime",
    Hazmat => "Hazmat",
    Personnel => "Personnel",
    Other => "Other",
});

wire_enum!(ConditionsCategory {
    Temperature => "Temperature",
    Wind => "Wind",
    Rainfall => "Rainfall",
    Extreme => "Extreme",
    Alert => "Alert",
});

wire_enum!(DisasterType {
    Earthquake => "earthquake",
    Flood => "flood",
    Wildfire => "wildfire",
    Storm => "storm",
    Landslide => "landslide",
    Tsunami => "tsunami",
    Volcano => "volcano",
    Drought => "drought",
    Epidemic => "epidemic",
    Industrial => "industrial",
    Other => "other",
});

impl Default for RiskLevel {
    fn default() -> Self {
        Self::Minimal
    }
}

impl Default for SecurityLevel {
    fn default() -> Self {
        Self::Work
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_use_document_labels() {
        assert_eq!(
            serde_json::to_string(&RiskLevel::Substantial).unwrap(),
            "\"4-Substantial\""
        );
        let level: SecurityLevel = serde_json::from_str("\"4-Evacuation\"").unwrap();
        assert_eq!(level, SecurityLevel::Evacuation);
    }

    #[test]
    fn from_str_matches_labels_case_insensitively() {
        assert_eq!(
            SecurityCategory::from_str("armed groups"),
            Ok(SecurityCategory::ArmedGroups)
        );
        assert_eq!(DisasterType::from_str("blizzard"), Err(()));
    }

    #[test]
    fn levels_order_by_severity() {
        assert!(RiskLevel::High > RiskLevel::Low);
        assert!(SecurityLevel::Evacuation > SecurityLevel::Monitoring);
    }
}
