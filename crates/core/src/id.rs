//! Strongly-typed identifiers used across the booking contract.
//!
//! The backend hands out identifiers as JSON strings or integers depending on
//! the resource; both are accepted and kept as opaque text.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Wire form of an identifier before validation.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

macro_rules! impl_id_newtype {
    ($t:ident, $name:literal) => {
        #[doc = concat!("Identifier of a ", $name, " record.")]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(#[serde(deserialize_with = "deserialize_raw")] String);

        impl $t {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty", $name)));
                }
                if trimmed.contains('/') {
                    return Err(DomainError::invalid_id(format!(
                        "{}: '{}' contains a path separator",
                        $name, trimmed
                    )));
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl From<u64> for $t {
            fn from(value: u64) -> Self {
                Self(value.to_string())
            }
        }
    };
}

fn deserialize_raw<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match RawId::deserialize(deserializer)? {
        RawId::Text(s) if s.trim().is_empty() => {
            Err(serde::de::Error::custom("identifier must not be empty"))
        }
        RawId::Text(s) => Ok(s),
        RawId::Number(n) => Ok(n.to_string()),
    }
}

impl_id_newtype!(UserId, "user");
impl_id_newtype!(DriverId, "driver");
impl_id_newtype!(VehicleId, "vehicle");
impl_id_newtype!(RouteId, "route");
impl_id_newtype!(RideId, "ride");
impl_id_newtype!(ScheduleId, "schedule");
impl_id_newtype!(BookingId, "booking");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_numeric_and_text_ids() {
        let a: RideId = serde_json::from_str("42").unwrap();
        let b: RideId = serde_json::from_str("\"r-42\"").unwrap();
        assert_eq!(a.as_str(), "42");
        assert_eq!(b.to_string(), "r-42");
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"42\"");
    }

    #[test]
    fn rejects_empty_and_path_like_ids() {
        assert!(serde_json::from_str::<UserId>("\"  \"").is_err());
        assert!("".parse::<UserId>().is_err());
        assert!("1/../admin".parse::<BookingId>().is_err());
        assert_eq!("  7 ".parse::<BookingId>().unwrap().as_str(), "7");
    }
}
