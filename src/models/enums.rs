use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde uses the same string form, so the persisted JSON matches `as_str`.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Role {
    Admin => "Admin",
    Patient => "Patient",
});

str_enum!(NotificationKind {
    Appointment => "appointment",
    Update => "update",
    Reminder => "reminder",
    System => "system",
    Cancellation => "cancellation",
});

str_enum!(NotificationPriority {
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(IncidentStatus {
    Scheduled => "Scheduled",
    InProgress => "In Progress",
    Completed => "Completed",
    Cancelled => "Cancelled",
});

str_enum!(Theme {
    Light => "light",
    Dark => "dark",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!(Role::from_str(Role::Admin.as_str()).unwrap(), Role::Admin);
        assert_eq!(Role::from_str("Patient").unwrap(), Role::Patient);
    }

    #[test]
    fn invalid_enum_value_is_rejected() {
        let err = NotificationKind::from_str("emergency").unwrap_err();
        assert!(matches!(err, ModelError::InvalidEnum { .. }));
    }

    #[test]
    fn incident_status_serializes_with_space() {
        let json = serde_json::to_string(&IncidentStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
    }

    #[test]
    fn notification_kind_serializes_lowercase() {
        let json = serde_json::to_string(&NotificationKind::System).unwrap();
        assert_eq!(json, "\"system\"");
        let back: NotificationKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NotificationKind::System);
    }
}
