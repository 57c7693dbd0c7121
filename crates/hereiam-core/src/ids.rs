use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{HereIamError, HereIamResult};
use crate::time::now_epoch_millis;

/// Twelve-byte document id: big-endian creation seconds followed by eight
/// random bytes. Serialised in extended JSON form, `{"$oid": "<hex>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub fn new() -> Self {
        let seconds = (now_epoch_millis() / 1000) as u32;
        let random = Uuid::new_v4();
        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..].copy_from_slice(&random.as_bytes()[..8]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn parse_str(value: &str) -> HereIamResult<Self> {
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(value.trim(), &mut bytes)
            .map_err(|_| HereIamError::invalid_input(format!("invalid object id: {value}")))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn timestamp_secs(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = HereIamError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse_str(value)
    }
}

#[derive(Serialize)]
struct ExtendedOid<'a> {
    #[serde(rename = "$oid")]
    oid: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OidRepr {
    Bare(String),
    Extended {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let hex = self.to_hex();
        ExtendedOid { oid: &hex }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = match OidRepr::deserialize(deserializer)? {
            OidRepr::Bare(value) => value,
            OidRepr::Extended { oid } => oid,
        };
        Self::parse_str(&raw).map_err(|err| de::Error::custom(err.message))
    }
}

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(ObjectId);

        impl $name {
            pub fn new() -> Self {
                Self(ObjectId::new())
            }

            pub fn from_object_id(value: ObjectId) -> Self {
                Self(value)
            }

            pub fn as_object_id(&self) -> ObjectId {
                self.0
            }

            pub fn parse_str(value: &str) -> HereIamResult<Self> {
                ObjectId::parse_str(value).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = HereIamError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::parse_str(value)
            }
        }
    };
}

id_type!(MissionId);
id_type!(PersonId);
id_type!(UserId);
id_type!(TeamId);
id_type!(OrganizationId);

/// Ties together the log lines of one form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_round_trips_through_hex() {
        let id = ObjectId::parse_str("64b7f0c2a1b2c3d4e5f60718").unwrap();
        assert_eq!(id.to_hex(), "64b7f0c2a1b2c3d4e5f60718");
        assert_eq!(id.timestamp_secs(), 0x64b7f0c2);
    }

    #[test]
    fn object_id_rejects_bad_text() {
        assert!(ObjectId::parse_str("not-an-id").is_err());
        assert!(ObjectId::parse_str("64b7f0c2a1b2c3d4e5f607").is_err());
    }

    #[test]
    fn mission_id_accepts_both_wire_forms() {
        let extended: MissionId =
            serde_json::from_str(r#"{"$oid":"64b7f0c2a1b2c3d4e5f60718"}"#).unwrap();
        let bare: MissionId = serde_json::from_str(r#""64b7f0c2a1b2c3d4e5f60718""#).unwrap();
        assert_eq!(extended, bare);
        assert_eq!(
            serde_json::to_string(&bare).unwrap(),
            r#"{"$oid":"64b7f0c2a1b2c3d4e5f60718"}"#
        );
    }

    #[test]
    fn new_ids_carry_creation_time() {
        let id = ObjectId::new();
        let now = (now_epoch_millis() / 1000) as u32;
        assert!(now - id.timestamp_secs() <= 1);
        assert_ne!(ObjectId::new(), id);
    }
}
