pub mod classification;
pub mod domain;
pub mod error;
pub mod ids;
pub mod person;
pub mod time;

pub use classification::{
    ConditionsCategory, DisasterType, RiskLevel, SecurityCategory, SecurityLevel,
};
pub use domain::{CreateMissionArgs, Mission, SecurityReport, WeatherReport};
pub use error::{ErrorCode, HereIamError, HereIamResult};
pub use ids::{CorrelationId, MissionId, ObjectId, OrganizationId, PersonId, TeamId, UserId};
pub use person::{CustomData, Person, Role, UpdateCustomDataArgs, UpdatePersonArgs};
pub use time::{now_epoch_millis, now_timestamp, parse_timestamp, EpochMillis};
