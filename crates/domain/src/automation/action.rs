//! Action: the effect performed when an automation fires.

use serde::{Deserialize, Serialize};

use crate::device::{DeviceCommand, StateValue, command};
use crate::error::ValidationError;
use crate::id::DeviceId;

/// Severity of a notification action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    #[default]
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// An operation to execute when the automation's trigger fires and
/// all conditions are satisfied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    /// Send `{command: value}` to a device.
    Device {
        device_id: DeviceId,
        command: String,
        #[serde(default)]
        value: StateValue,
    },
    /// Activate a scene. Reserved: no scene subsystem exists yet.
    Scene { scene_name: String },
    /// Emit a leveled message.
    Notification {
        message: String,
        #[serde(default)]
        level: NotificationLevel,
    },
}

impl Action {
    /// The device command payload for a `Device` action.
    #[must_use]
    pub fn device_command(&self) -> Option<(&DeviceId, DeviceCommand)> {
        match self {
            Self::Device {
                device_id,
                command: name,
                value,
            } => Some((device_id, command(name.clone(), value.clone()))),
            Self::Scene { .. } | Self::Notification { .. } => None,
        }
    }

    /// Check the fields an action of this kind requires.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let (field, value) = match self {
            Self::Device {
                device_id,
                command,
                ..
            } => {
                if device_id.is_empty() {
                    return Err(ValidationError::EmptyField { field: "deviceId" });
                }
                ("command", command)
            }
            Self::Scene { scene_name } => ("sceneName", scene_name),
            Self::Notification { message, .. } => ("message", message),
        };
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyField { field });
        }
        Ok(())
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device {
                device_id,
                command,
                value,
            } => write!(f, "device({device_id}, {command}={value})"),
            Self::Scene { scene_name } => write!(f, "scene({scene_name})"),
            Self::Notification { level, .. } => write!(f, "notification({level})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_device_command_from_action() {
        let action = Action::Device {
            device_id: DeviceId::new("lamp1"),
            command: "brightness".to_string(),
            value: StateValue::from(80),
        };
        let (device, cmd) = action.device_command().unwrap();
        assert_eq!(device.as_str(), "lamp1");
        assert_eq!(cmd.get("brightness"), Some(&StateValue::from(80)));
    }

    #[test]
    fn should_default_notification_level_to_info() {
        let json = serde_json::json!({"type": "notification", "message": "hello"});
        let action: Action = serde_json::from_value(json).unwrap();
        assert!(matches!(
            action,
            Action::Notification {
                level: NotificationLevel::Info,
                ..
            }
        ));
    }

    #[test]
    fn should_deserialize_scene_action() {
        let json = serde_json::json!({"type": "scene", "sceneName": "movie night"});
        let action: Action = serde_json::from_value(json).unwrap();
        assert_eq!(
            action,
            Action::Scene {
                scene_name: "movie night".to_string()
            }
        );
    }

    #[test]
    fn should_reject_device_action_without_command() {
        let action = Action::Device {
            device_id: DeviceId::new("lamp1"),
            command: " ".to_string(),
            value: StateValue::Null,
        };
        assert_eq!(
            action.validate(),
            Err(ValidationError::EmptyField { field: "command" })
        );
    }

    #[test]
    fn should_reject_empty_notification_message() {
        let action = Action::Notification {
            message: String::new(),
            level: NotificationLevel::Warning,
        };
        assert_eq!(
            action.validate(),
            Err(ValidationError::EmptyField { field: "message" })
        );
    }

    #[test]
    fn should_display_action_variants() {
        let action = Action::Device {
            device_id: DeviceId::new("lamp1"),
            command: "state".to_string(),
            value: StateValue::from("ON"),
        };
        assert_eq!(action.to_string(), "device(lamp1, state=ON)");
        let notify = Action::Notification {
            message: "hi".to_string(),
            level: NotificationLevel::Error,
        };
        assert_eq!(notify.to_string(), "notification(error)");
    }
}
