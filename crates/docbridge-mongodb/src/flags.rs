//! Update and delete mode flags
//!
//! Flags that arrive as dynamic values (BSON or JSON) are interpreted
//! strictly: only a boolean `true` enables a mode. `1`, `"true"` and any other
//! truthy value leave the mode disabled.

use bson::Bson;
use serde_json::Value as JsonValue;

/// A value that can be read as a strict on/off flag
pub trait StrictFlag {
    /// Returns true only for a literal boolean `true`
    fn is_strictly_true(&self) -> bool;
}

impl StrictFlag for bool {
    fn is_strictly_true(&self) -> bool {
        *self
    }
}

impl StrictFlag for Bson {
    fn is_strictly_true(&self) -> bool {
        matches!(self, Bson::Boolean(true))
    }
}

impl StrictFlag for JsonValue {
    fn is_strictly_true(&self) -> bool {
        matches!(self, JsonValue::Bool(true))
    }
}

impl<T: StrictFlag> StrictFlag for Option<T> {
    fn is_strictly_true(&self) -> bool {
        self.as_ref().is_some_and(|value| value.is_strictly_true())
    }
}

impl<T: StrictFlag + ?Sized> StrictFlag for &T {
    fn is_strictly_true(&self) -> bool {
        (**self).is_strictly_true()
    }
}

/// How an update is applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateMode {
    /// Apply to every matching document instead of the first one
    pub multi: bool,
    /// Replace the whole document instead of merging fields with `$set`
    pub replace: bool,
}

impl UpdateMode {
    /// Single-target merge update
    pub const MERGE_ONE: UpdateMode = UpdateMode {
        multi: false,
        replace: false,
    };

    pub fn new(multi: bool, replace: bool) -> Self {
        Self { multi, replace }
    }

    /// Build a mode from dynamic flag values
    pub fn from_flags(multi: impl StrictFlag, replace: impl StrictFlag) -> Self {
        Self {
            multi: multi.is_strictly_true(),
            replace: replace.is_strictly_true(),
        }
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }
}
