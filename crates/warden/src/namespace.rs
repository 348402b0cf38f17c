//! # Declaration Namespaces
//!
//! A [`DeclarationNamespace`] captures a class body before the class
//! exists. It is an ordered mapping from name to the *history* of
//! declarations made under that name:
//!
//! ```text
//! "speed"  -> [Slot(int, protected)]        claimed: never rebindable
//! "title"  -> [Value("a"), Value("b")]      plain values: write-many
//! "init"   -> [Method]
//! "gone"   -> []                            deleted: key stays, history empty
//! ```
//!
//! Reads return the most recent declaration. A name with an empty history
//! reads as not found, and `contains` answers by history, not presence.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use warden_core::{Access, Arguments, ClassError, ClassResult, Slot, TypeTag, Value};

use crate::class::{ClassRef, Method};
use crate::registry::ClassRegistry;

/// Keyword aliases for the class name.
const CLASS_NAME_KEYS: &[&str] = &["name", "className"];
/// Keyword aliases for the owner name.
const OWNER_NAME_KEYS: &[&str] = &["ownerName", "owner"];

/// One entry of a class body.
#[derive(Clone)]
pub enum Declaration {
    /// An ordinary class attribute.
    Value(Value),
    /// A capability-gated slot.
    Slot(Slot),
    /// A method, including the lifecycle hooks.
    Method(Method),
}

impl Declaration {
    /// Wraps a closure as a method declaration.
    pub fn method<F>(f: F) -> Self
    where
        F: Fn(&crate::Instance, &Arguments) -> ClassResult<Option<Value>> + Send + Sync + 'static,
    {
        Self::Method(Arc::new(f))
    }

    /// Short name of the declaration kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::Slot(_) => "slot",
            Self::Method(_) => "method",
        }
    }

    /// Returns the slot, if this declares one.
    #[must_use]
    pub const fn as_slot(&self) -> Option<&Slot> {
        match self {
            Self::Slot(slot) => Some(slot),
            _ => None,
        }
    }

    /// Returns the value, if this declares one.
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl PartialEq for Declaration {
    /// Values compare by content, slots and methods by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a == b,
            (Self::Slot(a), Self::Slot(b)) => a.ptr_eq(b),
            (Self::Method(a), Self::Method(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Slot(slot) => f.debug_tuple("Slot").field(slot).finish(),
            Self::Method(_) => f.write_str("Method(..)"),
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Slot(slot) => match slot.declared_type() {
                Some(tag) => write!(f, "<slot {tag} {:?}>", slot.capability()),
                None => write!(f, "<slot {:?}>", slot.capability()),
            },
            Self::Method(_) => f.write_str("<method>"),
        }
    }
}

impl From<Value> for Declaration {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Slot> for Declaration {
    fn from(slot: Slot) -> Self {
        Self::Slot(slot)
    }
}

impl From<Method> for Declaration {
    fn from(method: Method) -> Self {
        Self::Method(method)
    }
}

/// The mapping contract the class factory relies on.
///
/// The factory exercises every operation once before trusting an
/// implementation. `contains_key` has no default behaviour: an
/// implementation that does not provide it fails the probe.
pub trait NamespaceMapping {
    /// Reads the current declaration at `key`.
    ///
    /// Must fail with [`ClassError::NotFound`] for unassigned keys.
    fn lookup(&self, key: &str) -> ClassResult<Declaration>;

    /// Assigns a declaration at `key`.
    fn assign(&mut self, key: &str, value: Declaration) -> ClassResult<()>;

    /// Whether `key` currently holds a declaration.
    fn contains_key(&self, key: &str) -> ClassResult<bool> {
        Err(ClassError::Unsupported(format!("contains_key('{key}')")))
    }
}

/// Metadata captured when a namespace is opened.
#[derive(Clone, Debug, Default)]
pub struct ClassDescriptor {
    class_name: String,
    bases: Vec<ClassRef>,
    owner_name: Option<String>,
    owner: Option<ClassRef>,
}

impl ClassDescriptor {
    /// Describes a class with the given name and no bases.
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    /// Adds a base class. Bases are searched in the order added.
    #[must_use]
    pub fn with_base(mut self, base: ClassRef) -> Self {
        self.bases.push(base);
        self
    }

    /// Sets the owner name used for lazy owner resolution.
    #[must_use]
    pub fn with_owner_name(mut self, owner_name: impl Into<String>) -> Self {
        self.owner_name = Some(owner_name.into());
        self
    }

    /// Provides the owner class directly.
    #[must_use]
    pub fn with_owner(mut self, owner: ClassRef) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Name of the class under construction.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Base classes.
    #[must_use]
    pub fn bases(&self) -> &[ClassRef] {
        &self.bases
    }

    /// Owner name, if any.
    #[must_use]
    pub fn owner_name(&self) -> Option<&str> {
        self.owner_name.as_deref()
    }

    /// Sets the owner name. Write-once.
    ///
    /// # Errors
    ///
    /// Returns a read-only [`ClassError::AccessDenied`] if already set.
    pub fn set_owner_name(&mut self, owner_name: impl Into<String>) -> ClassResult<()> {
        if self.owner_name.is_some() {
            return Err(ClassError::access_denied(Access::Set, "ownerName"));
        }
        self.owner_name = Some(owner_name.into());
        Ok(())
    }

    /// Sets the owner class. Write-once.
    ///
    /// # Errors
    ///
    /// Returns a read-only [`ClassError::AccessDenied`] if already set.
    pub fn set_owner(&mut self, owner: ClassRef) -> ClassResult<()> {
        if self.owner.is_some() {
            return Err(ClassError::access_denied(Access::Set, "owner"));
        }
        self.owner = Some(owner);
        Ok(())
    }

    /// Resolves the owner class.
    ///
    /// Priority: the provided owner, then `global` by owner name, then
    /// `local` by owner name.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::NotFound`] when no source yields a class.
    pub fn resolve_owner(
        &self,
        global: &ClassRegistry,
        local: Option<&ClassRegistry>,
    ) -> ClassResult<ClassRef> {
        if let Some(owner) = &self.owner {
            return Ok(Arc::clone(owner));
        }
        let Some(owner_name) = self.owner_name.as_deref() else {
            return Err(ClassError::NotFound(format!(
                "owner of '{}' (no owner name)",
                self.class_name
            )));
        };
        global
            .get(owner_name)
            .or_else(|| local.and_then(|registry| registry.get(owner_name)))
            .ok_or_else(|| ClassError::NotFound(format!("owner class '{owner_name}'")))
    }
}

/// Ordered, history-keeping mapping that captures a class body.
pub struct DeclarationNamespace {
    descriptor: ClassDescriptor,
    entries: Vec<(String, Vec<Declaration>)>,
    index: HashMap<String, usize>,
    field_names: Vec<String>,
    fields: Vec<Slot>,
}

impl DeclarationNamespace {
    /// Opens an empty namespace for the described class.
    #[must_use]
    pub fn new(descriptor: ClassDescriptor) -> Self {
        Self {
            descriptor,
            entries: Vec::new(),
            index: HashMap::new(),
            field_names: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Seeds the namespace with initial bindings, in order.
    ///
    /// # Errors
    ///
    /// Same as [`DeclarationNamespace::set`].
    pub fn with_entries<I, K, D>(mut self, entries: I) -> ClassResult<Self>
    where
        I: IntoIterator<Item = (K, D)>,
        K: AsRef<str>,
        D: Into<Declaration>,
    {
        for (key, value) in entries {
            self.set(key.as_ref(), value)?;
        }
        Ok(self)
    }

    /// Opens a namespace from flexible arguments.
    ///
    /// The class name is the first text positional or keyword `name` /
    /// `className`; the owner name the next text or keyword `ownerName` /
    /// `owner`. Remaining keyword arguments become seed entries.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::MissingArgument`] without a class name.
    pub fn from_args(args: Arguments) -> ClassResult<Self> {
        let (class_name, args) = args.require(&TypeTag::Text, CLASS_NAME_KEYS)?;
        let (owner_name, args) = args.take(&TypeTag::Text, OWNER_NAME_KEYS);

        let mut descriptor = ClassDescriptor::new(class_name.as_text().unwrap_or_default());
        if let Some(Value::Text(owner_name)) = owner_name {
            descriptor.set_owner_name(owner_name)?;
        }
        if !args.positional.is_empty() {
            tracing::warn!(
                "Ignoring {} positional namespace argument(s) for class '{}'",
                args.positional.len(),
                descriptor.class_name()
            );
        }
        Self::new(descriptor).with_entries(args.named)
    }

    /// The class descriptor captured at opening.
    #[must_use]
    pub fn descriptor(&self) -> &ClassDescriptor {
        &self.descriptor
    }

    /// Mutable access to the descriptor, for write-once owner updates.
    pub fn descriptor_mut(&mut self) -> &mut ClassDescriptor {
        &mut self.descriptor
    }

    /// Returns the most recent declaration at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::NotFound`] if the key was never assigned or
    /// its history was cleared.
    pub fn get(&self, key: &str) -> ClassResult<&Declaration> {
        match self.history(key).and_then(<[Declaration]>::last) {
            Some(value) => Ok(value),
            None => Err(Self::missing(key)),
        }
    }

    /// Assigns a declaration at `key`.
    ///
    /// A slot is named after `key` and registered as a field; its key can
    /// never be assigned again.
    ///
    /// # Errors
    ///
    /// - [`ClassError::NamingConflict`] if `key` already holds a slot
    /// - a read-only [`ClassError::AccessDenied`] if the slot already
    ///   carries a different name
    pub fn set(&mut self, key: &str, value: impl Into<Declaration>) -> ClassResult<()> {
        if self.field_names.iter().any(|name| name == key) {
            return Err(ClassError::NamingConflict(key.to_owned()));
        }
        let value = value.into();
        if let Declaration::Slot(slot) = &value {
            if slot.name().as_deref() != Some(key) {
                slot.set_name(key)?;
            }
            self.field_names.push(key.to_owned());
            self.fields.push(slot.clone());
        }
        tracing::debug!(
            "Namespace '{}': {} <- {}",
            self.descriptor.class_name,
            key,
            value.kind()
        );
        let index = self.index_or_insert(key);
        self.entries[index].1.push(value);
        Ok(())
    }

    /// Clears the history at `key`. The key stays enumerable.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::NotFound`] for keys never seen.
    pub fn delete(&mut self, key: &str) -> ClassResult<()> {
        match self.index.get(key) {
            Some(&index) => {
                self.entries[index].1.clear();
                Ok(())
            }
            None => Err(Self::missing(key)),
        }
    }

    /// Whether `key` holds at least one declaration.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.history(key).is_some_and(|history| !history.is_empty())
    }

    /// Every declaration ever made at `key`, oldest first.
    #[must_use]
    pub fn history(&self, key: &str) -> Option<&[Declaration]> {
        self.index
            .get(key)
            .map(|&index| self.entries[index].1.as_slice())
    }

    /// Iterates over keys in first-seen order, including cleared keys.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Snapshot of the keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.iter().map(str::to_owned).collect()
    }

    /// Snapshot of the histories.
    #[must_use]
    pub fn values(&self) -> Vec<Vec<Declaration>> {
        self.entries.iter().map(|(_, history)| history.clone()).collect()
    }

    /// Snapshot of keys with their histories.
    #[must_use]
    pub fn items(&self) -> Vec<(String, Vec<Declaration>)> {
        self.entries.clone()
    }

    /// Names bound to slots, in first-seen order.
    #[must_use]
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// The slots themselves, in first-seen order.
    #[must_use]
    pub fn fields(&self) -> &[Slot] {
        &self.fields
    }

    /// Number of keys, including cleared keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key was ever seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Splits the namespace into its descriptor and final declarations,
    /// skipping cleared keys.
    pub(crate) fn finalize(self) -> (ClassDescriptor, Vec<(String, Declaration)>) {
        let declarations = self
            .entries
            .into_iter()
            .filter_map(|(key, mut history)| history.pop().map(|last| (key, last)))
            .collect();
        (self.descriptor, declarations)
    }

    /// Not-found handler for reads of unassigned keys.
    fn missing(key: &str) -> ClassError {
        ClassError::NotFound(key.to_owned())
    }

    fn index_or_insert(&mut self, key: &str) -> usize {
        if let Some(&index) = self.index.get(key) {
            return index;
        }
        let index = self.entries.len();
        self.entries.push((key.to_owned(), Vec::new()));
        self.index.insert(key.to_owned(), index);
        index
    }
}

impl NamespaceMapping for DeclarationNamespace {
    fn lookup(&self, key: &str) -> ClassResult<Declaration> {
        self.get(key).cloned()
    }

    fn assign(&mut self, key: &str, value: Declaration) -> ClassResult<()> {
        self.set(key, value)
    }

    fn contains_key(&self, key: &str) -> ClassResult<bool> {
        Ok(self.contains(key))
    }
}

impl fmt::Debug for DeclarationNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeclarationNamespace")
            .field("class_name", &self.descriptor.class_name)
            .field("entries", &self.entries)
            .field("field_names", &self.field_names)
            .finish()
    }
}

impl fmt::Display for DeclarationNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Namespace of class '{}':", self.descriptor.class_name)?;
        for (key, history) in &self.entries {
            write!(f, "  {key}: [")?;
            for (i, value) in history.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{value}")?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}
