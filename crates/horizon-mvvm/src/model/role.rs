//! Data roles for session items.
//!
//! Besides its named properties, every item carries a small fixed set of
//! presentation data, addressed by [`ItemDataRole`]. Roles are what views
//! display in the label column and what they consult for editability.

use std::fmt;

use super::variant::Variant;
use crate::error::{MvvmError, Result};

/// Presentation data attached to every item.
///
/// # Example
///
/// ```ignore
/// use horizon_mvvm::model::ItemDataRole;
///
/// item.set_data(ItemDataRole::DisplayName, "X axis".into())?;
/// assert_eq!(item.data(ItemDataRole::DisplayName)?, "X axis".into());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemDataRole {
    /// Label shown in views. Holds a string.
    DisplayName,
    /// Hover text. Holds a string.
    ToolTip,
    /// Whether views may edit the item. Holds a bool.
    Editable,
    /// Whether the item is enabled. Holds a bool.
    Enabled,
}

impl ItemDataRole {
    /// Stable name of the role, used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            ItemDataRole::DisplayName => "displayName",
            ItemDataRole::ToolTip => "toolTip",
            ItemDataRole::Editable => "editable",
            ItemDataRole::Enabled => "enabled",
        }
    }

    fn expected_type(self) -> &'static str {
        match self {
            ItemDataRole::DisplayName | ItemDataRole::ToolTip => "string",
            ItemDataRole::Editable | ItemDataRole::Enabled => "bool",
        }
    }
}

impl fmt::Display for ItemDataRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Storage for the values of every [`ItemDataRole`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ItemRoles {
    pub(crate) display_name: String,
    pub(crate) tooltip: String,
    pub(crate) editable: bool,
    pub(crate) enabled: bool,
}

impl ItemRoles {
    pub(crate) fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            tooltip: String::new(),
            editable: true,
            enabled: true,
        }
    }

    pub(crate) fn get(&self, role: ItemDataRole) -> Variant {
        match role {
            ItemDataRole::DisplayName => Variant::String(self.display_name.clone()),
            ItemDataRole::ToolTip => Variant::String(self.tooltip.clone()),
            ItemDataRole::Editable => Variant::Bool(self.editable),
            ItemDataRole::Enabled => Variant::Bool(self.enabled),
        }
    }

    /// Stores `value` under `role`. Returns `Ok(false)` when nothing changed.
    pub(crate) fn set(&mut self, role: ItemDataRole, value: Variant) -> Result<bool> {
        let mismatch = |value: &Variant| MvvmError::PropertyType {
            name: role.name().to_string(),
            expected: role.expected_type(),
            found: value.type_name(),
        };
        let changed = match (role, value) {
            (ItemDataRole::DisplayName, Variant::String(s)) => replace(&mut self.display_name, s),
            (ItemDataRole::ToolTip, Variant::String(s)) => replace(&mut self.tooltip, s),
            (ItemDataRole::Editable, Variant::Bool(b)) => replace(&mut self.editable, b),
            (ItemDataRole::Enabled, Variant::Bool(b)) => replace(&mut self.enabled, b),
            (_, other) => return Err(mismatch(&other)),
        };
        Ok(changed)
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
