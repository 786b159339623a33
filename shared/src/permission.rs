//! Permission matrix types
//!
//! The backend resolves role permissions and per-user overrides into one
//! matrix keyed by resource name. These types decode that matrix and
//! answer "may the user perform `action` on `resource`?".
//!
//! Decoding is deliberately lenient: anything that is not literally
//! `true` counts as denied, and a malformed entry never fails the whole
//! matrix.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Action kind a permission is checked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Add,
    Edit,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Add, Action::Edit, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Add => "add",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }

    /// Key of this action's flag in a matrix entry (`can_view`, ...).
    pub fn flag_key(&self) -> &'static str {
        match self {
            Action::View => "can_view",
            Action::Add => "can_add",
            Action::Edit => "can_edit",
            Action::Delete => "can_delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown permission action: {0}")]
pub struct ParseActionError(pub String);

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Action::View),
            "add" => Ok(Action::Add),
            "edit" => Ok(Action::Edit),
            "delete" => Ok(Action::Delete),
            other => Err(ParseActionError(other.to_string())),
        }
    }
}

/// Allowed actions on a single resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionSet {
    pub can_view: bool,
    pub can_add: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl ActionSet {
    /// Nothing allowed.
    pub const NONE: ActionSet = ActionSet {
        can_view: false,
        can_add: false,
        can_edit: false,
        can_delete: false,
    };

    /// Everything allowed.
    pub const ALL: ActionSet = ActionSet {
        can_view: true,
        can_add: true,
        can_edit: true,
        can_delete: true,
    };

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.can_view,
            Action::Add => self.can_add,
            Action::Edit => self.can_edit,
            Action::Delete => self.can_delete,
        }
    }

    /// Decode an entry, counting a flag only when it is the JSON boolean `true`.
    pub fn from_value(value: &Value) -> Self {
        let flag = |action: Action| matches!(value.get(action.flag_key()), Some(Value::Bool(true)));
        Self {
            can_view: flag(Action::View),
            can_add: flag(Action::Add),
            can_edit: flag(Action::Edit),
            can_delete: flag(Action::Delete),
        }
    }
}

impl<'de> Deserialize<'de> for ActionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// Resolved permission matrix: resource name → allowed actions.
///
/// Resources that are not listed allow nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EffectivePermissions(HashMap<String, ActionSet>);

impl EffectivePermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a matrix response body. `null` and non-object bodies yield an empty matrix.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(entries) => Self(
                entries
                    .iter()
                    .map(|(resource, entry)| (resource.clone(), ActionSet::from_value(entry)))
                    .collect(),
            ),
            _ => Self::default(),
        }
    }

    pub fn get(&self, resource: &str) -> Option<&ActionSet> {
        self.0.get(resource)
    }

    pub fn allows(&self, resource: &str, action: Action) -> bool {
        self.0.get(resource).is_some_and(|set| set.allows(action))
    }

    pub fn insert(&mut self, resource: impl Into<String>, actions: ActionSet) -> Option<ActionSet> {
        self.0.insert(resource.into(), actions)
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.0.contains_key(resource)
    }

    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for EffectivePermissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl<S: Into<String>> FromIterator<(S, ActionSet)> for EffectivePermissions {
    fn from_iter<I: IntoIterator<Item = (S, ActionSet)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
