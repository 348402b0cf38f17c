//! # Capability Levels
//!
//! Four ordered access tiers attached to every slot:
//!
//! ```text
//! Secret < ReadOnly < Protected < Unrestricted
//!   get:     no        yes         yes          yes
//!   set:     no        no          yes          yes
//!   delete:  no        no          no           yes
//! ```
//!
//! The facets are derived from the level, so they are monotonic by
//! construction: anything that may be deleted may be set, anything that
//! may be set may be read.

use std::fmt;

use crate::error::{ClassError, ClassResult};
use crate::value::Value;

/// Access capability of a slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Capability {
    /// No read, write or delete access. The slot still exists and its type
    /// is still visible.
    Secret = 0,
    /// Read access only.
    ReadOnly = 1,
    /// Read and write access, no delete.
    Protected = 2,
    /// Full access. Deleting clears the stored value.
    #[default]
    Unrestricted = 3,
}

impl Capability {
    /// All levels in ascending order.
    pub const ALL: [Self; 4] = [
        Self::Secret,
        Self::ReadOnly,
        Self::Protected,
        Self::Unrestricted,
    ];

    /// Returns the level with the given numeric value.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::OutOfRange`] for values outside 0..=3.
    pub fn from_value(value: i64) -> ClassResult<Self> {
        match value {
            0 => Ok(Self::Secret),
            1 => Ok(Self::ReadOnly),
            2 => Ok(Self::Protected),
            3 => Ok(Self::Unrestricted),
            other => Err(ClassError::OutOfRange(other)),
        }
    }

    /// Returns the lowest level granting the named access.
    ///
    /// `none`, `getter`, `setter` and `delete` map to the four levels in
    /// order. Unrecognized names degrade to [`Capability::Secret`] instead
    /// of failing.
    #[must_use]
    pub fn from_access_name(name: &str) -> Self {
        match name {
            "none" => Self::Secret,
            "getter" => Self::ReadOnly,
            "setter" => Self::Protected,
            "delete" => Self::Unrestricted,
            other => {
                tracing::debug!("Unknown access name '{}', using secret capability", other);
                Self::Secret
            }
        }
    }

    /// Numeric value of the level.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Access name of the level, the inverse of [`Capability::from_access_name`].
    #[must_use]
    pub const fn access_name(self) -> &'static str {
        match self {
            Self::Secret => "none",
            Self::ReadOnly => "getter",
            Self::Protected => "setter",
            Self::Unrestricted => "delete",
        }
    }

    /// Whether the level permits reading.
    #[inline]
    #[must_use]
    pub const fn can_get(self) -> bool {
        self.value() > Self::Secret.value()
    }

    /// Whether the level permits writing.
    #[inline]
    #[must_use]
    pub const fn can_set(self) -> bool {
        self.value() > Self::ReadOnly.value()
    }

    /// Whether the level permits deleting.
    #[inline]
    #[must_use]
    pub const fn can_delete(self) -> bool {
        self.value() > Self::Protected.value()
    }

    /// Human readable description of the level.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Secret => {
                "No access to read the content of the slot. The slot is still \
                 declared and its type is still visible, but no accessor is available."
            }
            Self::ReadOnly => "Access to read the value, but not to set or delete it.",
            Self::Protected => "Access to read and edit the value, but not to delete it.",
            Self::Unrestricted => {
                "Unrestricted access. Deleting clears the stored value, the slot stays declared."
            }
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

impl TryFrom<&Value> for Capability {
    type Error = ClassError;

    /// Accepts a capability, an integer 0..=3 or an access name.
    fn try_from(value: &Value) -> ClassResult<Self> {
        match value {
            Value::Capability(level) => Ok(*level),
            Value::Int(raw) => Self::from_value(*raw),
            Value::Text(name) => Ok(Self::from_access_name(name)),
            other => Err(ClassError::type_mismatch(
                "capability, int or access name",
                other.type_tag(),
                "capability",
            )),
        }
    }
}

impl From<Capability> for Value {
    fn from(level: Capability) -> Self {
        Self::Capability(level)
    }
}
