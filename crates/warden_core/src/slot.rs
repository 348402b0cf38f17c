//! # Slots
//!
//! A [`Slot`] is a typed, capability-gated storage cell exposed as a class
//! attribute. It is a *class-level* cell: the handle is cheap to clone and
//! every clone, and therefore every instance of the owning class, reads
//! and writes the same value.
//!
//! ## Facets
//!
//! ```text
//! name        write-once, assigned by the owning namespace
//! type        write-once, explicit or inferred from the first value
//! capability  readable; changeable only with the slot's root token
//! value       governed by the capability (get / set / delete)
//! ```
//!
//! Deleting the name, type or capability facet is always refused.
//!
//! ## Thread Safety
//!
//! Each cell sits behind a `parking_lot` mutex, so the type check and the
//! write in [`Slot::set`] happen under one lock.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::args::Arguments;
use crate::capability::Capability;
use crate::error::{Access, ClassError, ClassResult};
use crate::value::{TypeTag, Value};

/// Keyword aliases for the slot type.
const TYPE_KEYS: &[&str] = &["type", "type_", "fieldType"];
/// Keyword aliases for the slot name.
const NAME_KEYS: &[&str] = &["name", "varName"];
/// Keyword aliases for the capability specification.
const CAPABILITY_KEYS: &[&str] = &["capability", "permission", "permLevel"];
/// Keyword aliases for the default value.
const DEFAULT_KEYS: &[&str] = &["default", "value", "defVal"];

static NEXT_ROOT_ID: AtomicU64 = AtomicU64::new(1);

/// Token granting a slot the right to change its capability at runtime.
///
/// The token is handed to the slot at construction and must be presented
/// again to [`Slot::set_capability`]. Tokens are unique and not `Clone`.
#[derive(Debug, PartialEq, Eq)]
pub struct RootToken {
    id: u64,
}

impl RootToken {
    /// Issues a fresh token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_ROOT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Unique identifier of the token.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl Default for RootToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Flavor of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// A regular slot with any capability.
    Field,
    /// A read-only slot whose capability can never change.
    Constant,
}

/// A structural or data facet of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Facet {
    /// The stored value.
    Value,
    /// The attribute name.
    Name,
    /// The declared type.
    Type,
    /// The capability level.
    Capability,
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => f.write_str("value"),
            Self::Name => f.write_str("name"),
            Self::Type => f.write_str("type"),
            Self::Capability => f.write_str("capability"),
        }
    }
}

/// State of a slot cell.
struct SlotCell {
    name: Option<String>,
    declared_type: Option<TypeTag>,
    value: Option<Value>,
    capability: Capability,
    root: Option<u64>,
    kind: SlotKind,
    /// Whether an explicit set has happened. Defaults and synthesized
    /// bases do not count.
    assigned: bool,
}

impl SlotCell {
    fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| Facet::Value.to_string())
    }

    fn check_root(&self, root: &RootToken) -> ClassResult<()> {
        match self.root {
            None => Err(ClassError::PermissionDenied(format!(
                "unauthorized attempt at changing the capability of slot '{}'",
                self.label()
            ))),
            Some(id) if id != root.id() => Err(ClassError::PermissionDenied(format!(
                "root token {} does not belong to slot '{}'",
                root.id(),
                self.label()
            ))),
            Some(_) => Ok(()),
        }
    }
}

/// A typed, capability-gated, class-level storage cell.
#[derive(Clone)]
pub struct Slot {
    cell: Arc<Mutex<SlotCell>>,
}

impl Slot {
    /// Starts building a regular slot.
    #[must_use]
    pub fn builder() -> SlotBuilder {
        SlotBuilder::new(SlotKind::Field)
    }

    /// Starts building a constant slot.
    #[must_use]
    pub fn constant() -> SlotBuilder {
        SlotBuilder::new(SlotKind::Constant)
    }

    /// Builds a regular slot from flexible arguments.
    ///
    /// Recognized, in any order:
    /// - type: a `Value::Type` or keyword `type` / `type_` / `fieldType`
    /// - name: the first text positional or keyword `name` / `varName`
    /// - capability: a `Value::Capability` or keyword `capability` /
    ///   `permission` / `permLevel` (level, integer or access name)
    /// - default: keyword `default` / `value` / `defVal`, else the first
    ///   positional of the declared type, else a single leftover positional
    ///   whose type is then inferred
    ///
    /// # Errors
    ///
    /// Fails on malformed capability specifications and on a default that
    /// does not match an explicit type.
    pub fn from_args(args: Arguments, root: Option<&RootToken>) -> ClassResult<Self> {
        let mut builder = SlotBuilder::from_args(SlotKind::Field, args)?;
        if let Some(root) = root {
            builder = builder.root(root);
        }
        builder.build()
    }

    /// Builds a constant slot from flexible arguments.
    ///
    /// Same rules as [`Slot::from_args`]; any capability given is replaced
    /// by read-only.
    ///
    /// # Errors
    ///
    /// Same as [`Slot::from_args`].
    pub fn constant_from_args(args: Arguments) -> ClassResult<Self> {
        SlotBuilder::from_args(SlotKind::Constant, args)?.build()
    }

    /// Returns true if both handles point at the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// The slot's flavor.
    #[must_use]
    pub fn kind(&self) -> SlotKind {
        self.cell.lock().kind
    }

    /// The attribute name, once assigned.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.cell.lock().name.clone()
    }

    /// Assigns the attribute name. Names are write-once.
    ///
    /// # Errors
    ///
    /// Returns a read-only [`ClassError::AccessDenied`] if a name is
    /// already set, whatever the new name.
    pub fn set_name(&self, name: impl Into<String>) -> ClassResult<()> {
        let mut cell = self.cell.lock();
        if cell.name.is_some() {
            return Err(ClassError::access_denied(Access::Set, Facet::Name.to_string()));
        }
        cell.name = Some(name.into());
        Ok(())
    }

    /// The declared or inferred type, once established.
    #[must_use]
    pub fn declared_type(&self) -> Option<TypeTag> {
        self.cell.lock().declared_type.clone()
    }

    /// Establishes the type. Types are write-once.
    ///
    /// # Errors
    ///
    /// Returns a read-only [`ClassError::AccessDenied`] if a type is already
    /// established, or a type mismatch if a stored value disagrees.
    pub fn set_type(&self, tag: TypeTag) -> ClassResult<()> {
        let mut cell = self.cell.lock();
        if cell.declared_type.is_some() {
            return Err(ClassError::access_denied(Access::Set, Facet::Type.to_string()));
        }
        if let Some(value) = &cell.value {
            if !tag.matches(value) {
                return Err(ClassError::type_mismatch(&tag, value.type_tag(), cell.label()));
            }
        }
        cell.declared_type = Some(tag);
        Ok(())
    }

    /// The current capability.
    #[must_use]
    pub fn capability(&self) -> Capability {
        self.cell.lock().capability
    }

    /// Whether the slot was created with a root token.
    #[must_use]
    pub fn is_rooted(&self) -> bool {
        self.cell.lock().root.is_some()
    }

    /// Changes the capability.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::PermissionDenied`] unless `root` is the token
    /// the slot was created with.
    pub fn set_capability(&self, root: &RootToken, level: Capability) -> ClassResult<()> {
        let mut cell = self.cell.lock();
        cell.check_root(root)?;
        tracing::debug!(
            "Slot '{}' capability changed: {:?} -> {:?}",
            cell.label(),
            cell.capability,
            level
        );
        cell.capability = level;
        Ok(())
    }

    /// Changes the capability from loosely typed arguments.
    ///
    /// The first capability value wins, then the first integer, then the
    /// first access name.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::PermissionDenied`] for a missing or foreign
    /// root token before looking at the arguments, then a type mismatch if
    /// none of the arguments specifies a capability.
    pub fn set_capability_from(&self, root: &RootToken, args: &[Value]) -> ClassResult<()> {
        self.cell.lock().check_root(root)?;
        let level = if let Some(level) = args.iter().find_map(|v| match v {
            Value::Capability(level) => Some(*level),
            _ => None,
        }) {
            level
        } else if let Some(raw) = args.iter().find_map(Value::as_int) {
            Capability::from_value(raw)?
        } else if let Some(name) = args.iter().find_map(Value::as_text) {
            Capability::from_access_name(name)
        } else {
            return Err(ClassError::type_mismatch(
                "capability, int or access name",
                format!("{} argument(s) of other types", args.len()),
                "capability",
            ));
        };
        self.set_capability(root, level)
    }

    /// Reads the value.
    ///
    /// An empty slot with a known type synthesizes, caches and returns the
    /// canonical base instance of that type.
    ///
    /// # Errors
    ///
    /// - secret [`ClassError::AccessDenied`] if the capability forbids reads
    /// - [`ClassError::State`] if neither value nor type is known
    /// - a type mismatch if the type has no canonical base
    pub fn get(&self) -> ClassResult<Value> {
        let mut cell = self.cell.lock();
        if !cell.capability.can_get() {
            return Err(ClassError::access_denied(Access::Get, cell.label()));
        }
        if let Some(value) = &cell.value {
            return Ok(value.clone());
        }
        let base = match &cell.declared_type {
            Some(tag) => tag.base_instance()?,
            None => {
                return Err(ClassError::State(format!(
                    "slot '{}' has neither a value nor a type",
                    cell.label()
                )))
            }
        };
        cell.value = Some(base.clone());
        Ok(base)
    }

    /// Writes the value.
    ///
    /// Slots without write capability accept exactly one explicit write
    /// while they hold a value set by a caller. Defaults of regular slots
    /// do not count; a constant's declared value does. Deleting the value
    /// frees the write again. The first write on an untyped slot fixes its
    /// type.
    ///
    /// # Errors
    ///
    /// - read-only [`ClassError::AccessDenied`] if the capability forbids
    ///   writes and the slot was already written
    /// - a type mismatch against the established type
    pub fn set(&self, value: impl Into<Value>) -> ClassResult<()> {
        let value = value.into();
        let mut cell = self.cell.lock();
        if !cell.capability.can_set() && cell.assigned {
            return Err(ClassError::access_denied(Access::Set, cell.label()));
        }
        match cell.declared_type.clone() {
            Some(tag) if !tag.matches(&value) => {
                return Err(ClassError::type_mismatch(tag, value.type_tag(), cell.label()));
            }
            Some(_) => {}
            None => cell.declared_type = Some(value.type_tag()),
        }
        cell.value = Some(value);
        cell.assigned = true;
        Ok(())
    }

    /// Clears the value. The slot stays declared with its type and an
    /// empty slot accepts a write again.
    ///
    /// # Errors
    ///
    /// Returns a protected [`ClassError::AccessDenied`] if the capability
    /// forbids deletes.
    pub fn delete(&self) -> ClassResult<()> {
        let mut cell = self.cell.lock();
        if !cell.capability.can_delete() {
            return Err(ClassError::access_denied(Access::Delete, cell.label()));
        }
        cell.value = None;
        cell.assigned = false;
        Ok(())
    }

    /// Deletes a facet. Only the value facet can ever be deleted.
    ///
    /// # Errors
    ///
    /// Always fails for the name, type and capability facets.
    pub fn delete_facet(&self, facet: Facet) -> ClassResult<()> {
        match facet {
            Facet::Value => self.delete(),
            Facet::Name | Facet::Type | Facet::Capability => {
                Err(ClassError::access_denied(Access::Delete, facet.to_string()))
            }
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The value is left out, it may be secret
        let cell = self.cell.lock();
        f.debug_struct("Slot")
            .field("name", &cell.name)
            .field("type", &cell.declared_type)
            .field("capability", &cell.capability)
            .field("kind", &cell.kind)
            .field("rooted", &cell.root.is_some())
            .finish()
    }
}

/// Builder for [`Slot`]s.
#[derive(Debug)]
pub struct SlotBuilder {
    kind: SlotKind,
    name: Option<String>,
    declared_type: Option<TypeTag>,
    default: Option<Value>,
    capability: Option<Capability>,
    root: Option<u64>,
}

impl SlotBuilder {
    const fn new(kind: SlotKind) -> Self {
        Self {
            kind,
            name: None,
            declared_type: None,
            default: None,
            capability: None,
            root: None,
        }
    }

    fn from_args(kind: SlotKind, args: Arguments) -> ClassResult<Self> {
        let mut builder = Self::new(kind);

        let (tag, args) = args.take(&TypeTag::Type, TYPE_KEYS);
        if let Some(Value::Type(tag)) = tag {
            builder.declared_type = Some(tag);
        }

        let (level, args) = match args.take_any(CAPABILITY_KEYS) {
            (Some(spec), rest) => (Some(Capability::try_from(&spec)?), rest),
            (None, rest) => match rest.take(&TypeTag::Capability, &[]) {
                (Some(Value::Capability(level)), rest) => (Some(level), rest),
                (_, rest) => (None, rest),
            },
        };
        builder.capability = level;

        let (name, args) = args.take(&TypeTag::Text, NAME_KEYS);
        if let Some(Value::Text(name)) = name {
            builder.name = Some(name);
        }

        let (default, args) = match args.take_any(DEFAULT_KEYS) {
            (Some(value), rest) => (Some(value), rest),
            (None, rest) => match &builder.declared_type {
                Some(tag) => rest.take(tag, &[]),
                None if rest.positional.len() == 1 && rest.named.is_empty() => {
                    let mut rest = rest;
                    (rest.positional.pop(), rest)
                }
                None => (None, rest),
            },
        };
        builder.default = default;

        if !args.is_empty() {
            tracing::warn!(
                "Ignoring {} unrecognized slot argument(s): {:?}",
                args.len(),
                args
            );
        }
        Ok(builder)
    }

    /// Sets the declared type.
    #[must_use]
    pub fn ty(mut self, tag: TypeTag) -> Self {
        self.declared_type = Some(tag);
        self
    }

    /// Sets the attribute name up front instead of leaving it to the
    /// namespace.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the capability. Ignored for constant slots.
    #[must_use]
    pub fn capability(mut self, level: Capability) -> Self {
        self.capability = Some(level);
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Grants the slot the right to change its capability with `root`.
    #[must_use]
    pub fn root(mut self, root: &RootToken) -> Self {
        self.root = Some(root.id());
        self
    }

    /// Builds the slot.
    ///
    /// # Errors
    ///
    /// - [`ClassError::PermissionDenied`] for a rooted constant slot
    /// - a type mismatch if the default disagrees with the declared type
    pub fn build(self) -> ClassResult<Slot> {
        let capability = match self.kind {
            SlotKind::Constant if self.root.is_some() => {
                return Err(ClassError::PermissionDenied(
                    "constant slots cannot be created with a root token".to_string(),
                ));
            }
            SlotKind::Constant => Capability::ReadOnly,
            SlotKind::Field => self.capability.unwrap_or_default(),
        };

        let declared_type = match (self.declared_type, &self.default) {
            (Some(tag), Some(value)) if !tag.matches(value) => {
                let context = self.name.clone().unwrap_or_else(|| "default".to_string());
                return Err(ClassError::type_mismatch(tag, value.type_tag(), context));
            }
            (Some(tag), _) => Some(tag),
            (None, Some(value)) => Some(value.type_tag()),
            (None, None) => None,
        };

        // A constant declared with its value has already had its one write
        let assigned = self.kind == SlotKind::Constant && self.default.is_some();

        if self.root.is_some() {
            tracing::warn!(
                "Created rooted slot '{}'. It may change its capability at runtime.",
                self.name.as_deref().unwrap_or("<unnamed>")
            );
        }

        Ok(Slot {
            cell: Arc::new(Mutex::new(SlotCell {
                name: self.name,
                declared_type,
                value: self.default,
                capability,
                root: self.root,
                kind: self.kind,
                assigned,
            })),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(level: Capability) -> Slot {
        Slot::builder()
            .ty(TypeTag::Int)
            .capability(level)
            .build()
            .unwrap()
    }

    #[test]
    fn test_secret_slot_refuses_every_get() {
        let secret = slot(Capability::Secret);
        for _ in 0..3 {
            assert!(matches!(
                secret.get(),
                Err(ClassError::AccessDenied { access: Access::Get, .. })
            ));
        }
    }

    #[test]
    fn test_read_only_slot_is_write_once() {
        let read_only = slot(Capability::ReadOnly);
        assert_eq!(read_only.get(), Ok(Value::Int(0)));
        assert!(read_only.set(5).is_ok());
        assert!(matches!(
            read_only.set(6),
            Err(ClassError::AccessDenied { access: Access::Set, .. })
        ));
        assert_eq!(read_only.get(), Ok(Value::Int(5)));
    }

    #[test]
    fn test_default_does_not_consume_the_write() {
        let read_only = Slot::builder()
            .capability(Capability::ReadOnly)
            .default(0)
            .build()
            .unwrap();
        assert_eq!(read_only.declared_type(), Some(TypeTag::Int));
        assert!(read_only.set(9).is_ok());
        assert!(read_only.set(10).is_err());
    }

    #[test]
    fn test_set_checks_type() {
        let field = slot(Capability::Unrestricted);
        let err = field.set("five").unwrap_err();
        assert!(matches!(err, ClassError::TypeMismatch { .. }));
    }

    #[test]
    fn test_first_set_infers_type() {
        let field = Slot::builder().build().unwrap();
        assert!(matches!(field.get(), Err(ClassError::State(_))));
        field.set(2.5).unwrap();
        assert_eq!(field.declared_type(), Some(TypeTag::Float));
        assert!(field.set(1).is_err());
    }

    #[test]
    fn test_delete_clears_value_and_get_rebuilds_base() {
        let field = slot(Capability::Unrestricted);
        field.set(42).unwrap();
        field.delete().unwrap();
        assert_eq!(field.get(), Ok(Value::Int(0)));

        let protected = slot(Capability::Protected);
        assert!(matches!(
            protected.delete(),
            Err(ClassError::AccessDenied { access: Access::Delete, .. })
        ));
    }

    #[test]
    fn test_name_is_write_once() {
        let field = slot(Capability::Unrestricted);
        field.set_name("speed").unwrap();
        for attempt in ["speed", "velocity"] {
            assert!(matches!(
                field.set_name(attempt),
                Err(ClassError::AccessDenied { access: Access::Set, .. })
            ));
        }
        assert_eq!(field.name().as_deref(), Some("speed"));
    }

    #[test]
    fn test_type_is_write_once() {
        let field = Slot::builder().build().unwrap();
        field.set_type(TypeTag::Text).unwrap();
        assert!(field.set_type(TypeTag::Int).is_err());
    }

    #[test]
    fn test_structural_facets_cannot_be_deleted() {
        let field = slot(Capability::Unrestricted);
        for facet in [Facet::Name, Facet::Type, Facet::Capability] {
            assert!(matches!(
                field.delete_facet(facet),
                Err(ClassError::AccessDenied { access: Access::Delete, .. })
            ));
        }
        assert!(field.delete_facet(Facet::Value).is_ok());
    }

    #[test]
    fn test_capability_change_requires_root() {
        let plain = slot(Capability::ReadOnly);
        let stranger = RootToken::new();
        assert!(matches!(
            plain.set_capability(&stranger, Capability::Unrestricted),
            Err(ClassError::PermissionDenied(_))
        ));
        // Blocked before the arguments are even inspected
        assert!(matches!(
            plain.set_capability_from(&stranger, &[Value::Float(1.0)]),
            Err(ClassError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_rooted_capability_change() {
        let root = RootToken::new();
        let rooted = Slot::builder()
            .ty(TypeTag::Int)
            .capability(Capability::ReadOnly)
            .root(&root)
            .build()
            .unwrap();
        assert!(rooted.is_rooted());

        rooted
            .set_capability_from(&root, &[Value::from("setter")])
            .unwrap();
        assert_eq!(rooted.capability(), Capability::Protected);
        assert!(rooted.set(1).is_ok());
        assert!(rooted.set(2).is_ok());
        assert!(rooted.delete().is_err());

        let other = RootToken::new();
        assert!(rooted.set_capability(&other, Capability::Secret).is_err());
    }

    #[test]
    fn test_capability_argument_precedence() {
        let root = RootToken::new();
        let rooted = Slot::builder().root(&root).build().unwrap();
        rooted
            .set_capability_from(
                &root,
                &[Value::from("delete"), Value::Int(0), Value::Capability(Capability::ReadOnly)],
            )
            .unwrap();
        assert_eq!(rooted.capability(), Capability::ReadOnly);

        rooted
            .set_capability_from(&root, &[Value::from("delete"), Value::Int(2)])
            .unwrap();
        assert_eq!(rooted.capability(), Capability::Protected);

        assert!(matches!(
            rooted.set_capability_from(&root, &[Value::Float(3.0)]),
            Err(ClassError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_constant_slots() {
        let constant = Slot::constant()
            .capability(Capability::Unrestricted)
            .default("fixed")
            .build()
            .unwrap();
        assert_eq!(constant.kind(), SlotKind::Constant);
        assert_eq!(constant.capability(), Capability::ReadOnly);

        let root = RootToken::new();
        assert!(matches!(
            Slot::constant().root(&root).build(),
            Err(ClassError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_constant_keeps_declared_value() {
        let kind = Slot::constant().default("main").build().unwrap();
        assert!(matches!(
            kind.set("other"),
            Err(ClassError::AccessDenied { access: Access::Set, .. })
        ));
        assert_eq!(kind.get(), Ok(Value::from("main")));

        // Without a declared value the single write is still available
        let late = Slot::constant().ty(TypeTag::Int).build().unwrap();
        late.set(4).unwrap();
        assert!(late.set(5).is_err());
        assert_eq!(late.get(), Ok(Value::Int(4)));
    }

    #[test]
    fn test_delete_frees_the_single_write() {
        let root = RootToken::new();
        let rooted = Slot::builder()
            .ty(TypeTag::Int)
            .capability(Capability::ReadOnly)
            .root(&root)
            .build()
            .unwrap();
        rooted.set(1).unwrap();
        assert!(rooted.set(2).is_err());

        rooted.set_capability(&root, Capability::Unrestricted).unwrap();
        rooted.delete().unwrap();
        rooted.set_capability(&root, Capability::ReadOnly).unwrap();

        rooted.set(3).unwrap();
        assert!(rooted.set(4).is_err());
        assert_eq!(rooted.get(), Ok(Value::Int(3)));
    }

    #[test]
    fn test_clones_share_the_cell() {
        let a = slot(Capability::Unrestricted);
        let b = a.clone();
        a.set(7).unwrap();
        assert_eq!(b.get(), Ok(Value::Int(7)));
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_from_args_in_any_order() {
        let args = Arguments::new()
            .arg(Capability::ReadOnly)
            .arg(3)
            .arg("lives")
            .arg(TypeTag::Int);
        let lives = Slot::from_args(args, None).unwrap();
        assert_eq!(lives.name().as_deref(), Some("lives"));
        assert_eq!(lives.declared_type(), Some(TypeTag::Int));
        assert_eq!(lives.capability(), Capability::ReadOnly);
        assert_eq!(lives.get(), Ok(Value::Int(3)));
    }

    #[test]
    fn test_from_args_keywords_and_inference() {
        let args = Arguments::new()
            .kwarg("permission", "setter")
            .kwarg("default", 1.5);
        let ratio = Slot::from_args(args, None).unwrap();
        assert_eq!(ratio.capability(), Capability::Protected);
        assert_eq!(ratio.declared_type(), Some(TypeTag::Float));

        let single = Slot::from_args(Arguments::new().arg(true), None).unwrap();
        assert_eq!(single.declared_type(), Some(TypeTag::Bool));
    }

    #[test]
    fn test_from_args_rejects_mismatched_default() {
        let args = Arguments::new().arg(TypeTag::Int).kwarg("default", "zero");
        assert!(matches!(
            Slot::from_args(args, None),
            Err(ClassError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_constant_from_args_is_read_only() {
        let args = Arguments::new().arg(TypeTag::Text).kwarg("permission", 3);
        let title = Slot::constant_from_args(args).unwrap();
        assert_eq!(title.capability(), Capability::ReadOnly);
        assert!(!title.is_rooted());
    }
}
