//! Automation: trigger → condition → action rules.
//!
//! Automations allow the system to react to device state changes and the
//! wall clock without manual intervention. Each automation has one or more
//! [`Trigger`]s that determine when it activates, optional [`Condition`]s
//! that must hold, and the [`Action`]s to execute.

mod action;
mod condition;
mod trigger;

pub use action::{Action, NotificationLevel};
pub use condition::{Condition, Operator};
pub use trigger::Trigger;

use serde::{Deserialize, Serialize};

use crate::error::{DobbyError, ValidationError};
use crate::id::AutomationId;

/// A rule that reacts to events by executing actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Automation {
    pub id: AutomationId,
    pub name: String,
    pub enabled: bool,
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// An automation as submitted by a client, before the engine assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationDefinition {
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

fn enabled_by_default() -> bool {
    true
}

fn validate_rule(
    name: &str,
    triggers: &[Trigger],
    conditions: &[Condition],
    actions: &[Action],
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    triggers.iter().try_for_each(Trigger::validate)?;
    conditions.iter().try_for_each(Condition::validate)?;
    actions.iter().try_for_each(Action::validate)
}

impl AutomationDefinition {
    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when `name` is blank, or the
    /// first error reported by a trigger, condition or action.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_rule(&self.name, &self.triggers, &self.conditions, &self.actions)
    }

    /// Attach an identifier.
    #[must_use]
    pub fn with_id(self, id: AutomationId) -> Automation {
        Automation {
            id,
            name: self.name,
            enabled: self.enabled,
            triggers: self.triggers,
            conditions: self.conditions,
            actions: self.actions,
        }
    }
}

impl Automation {
    /// Create a builder for constructing an [`Automation`].
    #[must_use]
    pub fn builder() -> AutomationBuilder {
        AutomationBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// See [`AutomationDefinition::validate`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_rule(&self.name, &self.triggers, &self.conditions, &self.actions)
    }

    /// Drop the identifier.
    #[must_use]
    pub fn into_definition(self) -> AutomationDefinition {
        AutomationDefinition {
            name: self.name,
            enabled: self.enabled,
            triggers: self.triggers,
            conditions: self.conditions,
            actions: self.actions,
        }
    }

    /// Time triggers of this automation.
    pub fn time_triggers(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers
            .iter()
            .filter(|trigger| matches!(trigger, Trigger::Time { .. }))
    }
}

/// Step-by-step builder for [`Automation`].
#[derive(Debug, Default)]
pub struct AutomationBuilder {
    id: Option<AutomationId>,
    name: Option<String>,
    enabled: Option<bool>,
    triggers: Vec<Trigger>,
    conditions: Vec<Condition>,
    actions: Vec<Action>,
}

impl AutomationBuilder {
    #[must_use]
    pub fn id(mut self, id: AutomationId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Consume the builder, validate, and return an [`Automation`].
    ///
    /// # Errors
    ///
    /// Returns [`DobbyError::Validation`] if required fields are missing or empty.
    pub fn build(self) -> Result<Automation, DobbyError> {
        let automation = self.build_definition().with_id(self.id.unwrap_or_default());
        automation.validate()?;
        Ok(automation)
    }

    /// Consume the builder into an id-less [`AutomationDefinition`] without validating.
    #[must_use]
    pub fn definition(self) -> AutomationDefinition {
        self.build_definition()
    }

    fn build_definition(&self) -> AutomationDefinition {
        AutomationDefinition {
            name: self.name.clone().unwrap_or_default(),
            enabled: self.enabled.unwrap_or(true),
            triggers: self.triggers.clone(),
            conditions: self.conditions.clone(),
            actions: self.actions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::StateValue;
    use crate::id::DeviceId;
    use crate::time::TimeOfDay;

    fn lamp_action() -> Action {
        Action::Device {
            device_id: DeviceId::new("lamp1"),
            command: "state".to_string(),
            value: StateValue::from("ON"),
        }
    }

    fn valid_automation() -> Automation {
        Automation::builder()
            .name("Lamp at dusk")
            .trigger(Trigger::Time {
                time: TimeOfDay::new(18, 30),
                days: None,
            })
            .action(lamp_action())
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_valid_automation_when_required_fields_provided() {
        let auto = valid_automation();
        assert_eq!(auto.name, "Lamp at dusk");
        assert!(auto.enabled);
        assert!(auto.conditions.is_empty());
        assert_eq!(auto.triggers.len(), 1);
        assert_eq!(auto.actions.len(), 1);
    }

    #[test]
    fn should_build_disabled_automation_when_enabled_is_false() {
        let auto = Automation::builder()
            .name("Disabled rule")
            .enabled(false)
            .action(lamp_action())
            .build()
            .unwrap();
        assert!(!auto.enabled);
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Automation::builder().action(lamp_action()).build();
        assert!(matches!(
            result,
            Err(DobbyError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_surface_nested_trigger_validation_errors() {
        let result = Automation::builder()
            .name("Bad time")
            .trigger(Trigger::Time {
                time: TimeOfDay::new(7, 99),
                days: None,
            })
            .build();
        assert!(matches!(
            result,
            Err(DobbyError::Validation(ValidationError::InvalidTimeOfDay { .. }))
        ));
    }

    #[test]
    fn should_validate_definition_and_automation_alike() {
        let mut auto = valid_automation();
        auto.triggers.push(Trigger::Time {
            time: TimeOfDay::new(25, 0),
            days: None,
        });
        let def = auto.clone().into_definition();
        assert!(matches!(
            auto.validate(),
            Err(ValidationError::InvalidTimeOfDay { .. })
        ));
        assert_eq!(auto.validate(), def.validate());

        auto.name = "   ".to_string();
        let def = auto.clone().into_definition();
        assert_eq!(auto.validate(), Err(ValidationError::EmptyName));
        assert_eq!(def.validate(), Err(ValidationError::EmptyName));
    }

    #[test]
    fn should_set_custom_id_via_builder() {
        let id = AutomationId::new();
        let auto = Automation::builder()
            .id(id)
            .name("Custom ID")
            .build()
            .unwrap();
        assert_eq!(auto.id, id);
    }

    #[test]
    fn should_only_yield_time_triggers() {
        let auto = Automation::builder()
            .name("Mixed")
            .trigger(Trigger::Device {
                device_id: DeviceId::new("lamp1"),
                property: "state".to_string(),
                value: StateValue::from("ON"),
            })
            .trigger(Trigger::Time {
                time: TimeOfDay::new(7, 0),
                days: None,
            })
            .build()
            .unwrap();
        assert_eq!(auto.time_triggers().count(), 1);
    }

    #[test]
    fn should_default_definition_to_enabled_when_field_missing() {
        let json = serde_json::json!({"name": "Bare", "triggers": [], "actions": []});
        let def: AutomationDefinition = serde_json::from_value(json).unwrap();
        assert!(def.enabled);
        assert!(def.conditions.is_empty());
    }

    #[test]
    fn should_keep_fields_when_attaching_id() {
        let def = valid_automation().into_definition();
        let id = AutomationId::new();
        let auto = def.clone().with_id(id);
        assert_eq!(auto.id, id);
        assert_eq!(auto.clone().into_definition(), def);
    }

    #[test]
    fn should_roundtrip_automation_through_serde_json() {
        let auto = valid_automation();
        let json = serde_json::to_string(&auto).unwrap();
        let parsed: Automation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, auto);
    }
}
