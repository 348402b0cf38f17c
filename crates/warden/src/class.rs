//! # Classes and Instances
//!
//! A [`Class`] is built once from a finished declaration namespace and is
//! shared behind an [`Arc`]. Its attribute table holds the final
//! declaration of every key; slots in that table are class-level cells,
//! so every instance reads and writes the same storage.
//!
//! ## Lifecycle
//!
//! ```text
//! instantiate(args)
//!   allocate -> pre_init -> init -> post_init
//! ```
//!
//! A failing step aborts construction and no instance is returned.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use warden_core::{Arguments, ClassError, ClassResult, Slot, Value};

use crate::namespace::{ClassDescriptor, Declaration};
use crate::registry::ClassRegistry;

/// Shared handle to a built class.
pub type ClassRef = Arc<Class>;

/// A method body. Receives the instance and the call arguments.
pub type Method = Arc<dyn Fn(&Instance, &Arguments) -> ClassResult<Option<Value>> + Send + Sync>;

/// Hook run after allocation, before `init`.
pub const PRE_INIT: &str = "pre_init";
/// The initializer.
pub const INIT: &str = "init";
/// Hook run after `init`.
pub const POST_INIT: &str = "post_init";

static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// A class built by the factory.
pub struct Class {
    id: u64,
    name: String,
    descriptor: ClassDescriptor,
    attributes: RwLock<Vec<(String, Declaration)>>,
}

impl Class {
    /// Builds a class from a descriptor and its final declarations.
    pub(crate) fn new(descriptor: ClassDescriptor, declarations: Vec<(String, Declaration)>) -> Self {
        Self {
            id: NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed),
            name: descriptor.class_name().to_owned(),
            descriptor,
            attributes: RwLock::new(declarations),
        }
    }

    /// Process-unique class id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owner name recorded at declaration time.
    #[must_use]
    pub fn owner_name(&self) -> Option<&str> {
        self.descriptor.owner_name()
    }

    /// Resolves the owner class: the owner given at declaration, then
    /// `global` by owner name, then `local` by owner name.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::NotFound`] when no source yields a class.
    pub fn resolve_owner(
        &self,
        global: &ClassRegistry,
        local: Option<&ClassRegistry>,
    ) -> ClassResult<ClassRef> {
        self.descriptor.resolve_owner(global, local)
    }

    /// Direct base classes, in lookup order.
    #[must_use]
    pub fn bases(&self) -> &[ClassRef] {
        self.descriptor.bases()
    }

    /// Whether `self` is `other` or derives from it.
    #[must_use]
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        self.id == other.id || self.bases().iter().any(|base| base.is_subclass_of(other))
    }

    /// Names declared directly on this class, in declaration order.
    #[must_use]
    pub fn attribute_names(&self) -> Vec<String> {
        self.attributes
            .read()
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Slots declared directly on this class, in declaration order.
    #[must_use]
    pub fn slots(&self) -> Vec<(String, Slot)> {
        self.attributes
            .read()
            .iter()
            .filter_map(|(key, decl)| decl.as_slot().map(|slot| (key.clone(), slot.clone())))
            .collect()
    }

    /// Finds a declaration on this class, then on its bases depth-first.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<Declaration> {
        self.own_attribute(key).or_else(|| {
            self.bases()
                .iter()
                .find_map(|base| base.attribute(key))
        })
    }

    /// Finds the slot declared at `key`, if any.
    #[must_use]
    pub fn slot(&self, key: &str) -> Option<Slot> {
        match self.attribute(key) {
            Some(Declaration::Slot(slot)) => Some(slot),
            _ => None,
        }
    }

    /// Reads a class attribute. Slots are read through their capability.
    ///
    /// # Errors
    ///
    /// - [`ClassError::NotFound`] if no class in the hierarchy declares `key`
    /// - [`ClassError::TypeMismatch`] if `key` is a method
    /// - any slot read error
    pub fn get(&self, key: &str) -> ClassResult<Value> {
        match self.attribute(key) {
            Some(Declaration::Slot(slot)) => slot.get(),
            Some(Declaration::Value(value)) => Ok(value),
            Some(Declaration::Method(_)) => Err(ClassError::type_mismatch(
                "value",
                "method",
                format!("{}.{key}", self.name),
            )),
            None => Err(ClassError::NotFound(format!("{}.{key}", self.name))),
        }
    }

    /// Writes a class attribute.
    ///
    /// Slots anywhere in the hierarchy are written through their
    /// capability; plain values are rebound on this class. Methods are
    /// only replaced through [`Class::enhance_method`].
    ///
    /// # Errors
    ///
    /// - any slot write error
    /// - [`ClassError::TypeMismatch`] if `key` is a method
    pub fn set(&self, key: &str, value: impl Into<Value>) -> ClassResult<()> {
        match self.attribute(key) {
            Some(Declaration::Slot(slot)) => slot.set(value),
            Some(Declaration::Method(_)) => Err(ClassError::type_mismatch(
                "method",
                "value",
                format!("{}.{key}", self.name),
            )),
            _ => {
                self.bind(key, Declaration::Value(value.into()));
                Ok(())
            }
        }
    }

    /// Deletes a class attribute.
    ///
    /// Slots clear their value through their capability; plain values are
    /// removed from this class. Methods cannot be deleted.
    ///
    /// # Errors
    ///
    /// - any slot delete error
    /// - [`ClassError::TypeMismatch`] if `key` is a method
    /// - [`ClassError::NotFound`] if this class does not declare `key`
    pub fn delete(&self, key: &str) -> ClassResult<()> {
        match self.attribute(key) {
            Some(Declaration::Slot(slot)) => return slot.delete(),
            Some(Declaration::Method(_)) => {
                return Err(ClassError::type_mismatch(
                    "value",
                    "method",
                    format!("{}.{key}", self.name),
                ))
            }
            _ => {}
        }
        let mut attributes = self.attributes.write();
        match attributes.iter().position(|(name, _)| name == key) {
            Some(index) => {
                attributes.remove(index);
                Ok(())
            }
            None => Err(ClassError::NotFound(format!("{}.{key}", self.name))),
        }
    }

    /// Replaces the method at `key` with `enhance(existing)`.
    ///
    /// An inherited method is enhanced onto this class, leaving the base
    /// untouched.
    ///
    /// # Errors
    ///
    /// - [`ClassError::NotFound`] if no method exists at `key`
    /// - [`ClassError::TypeMismatch`] if `key` is not a method
    pub fn enhance_method<F>(&self, key: &str, enhance: F) -> ClassResult<()>
    where
        F: FnOnce(Method) -> Method,
    {
        let existing = match self.attribute(key) {
            Some(Declaration::Method(method)) => method,
            Some(other) => {
                return Err(ClassError::type_mismatch(
                    "method",
                    other.kind(),
                    format!("{}.{key}", self.name),
                ))
            }
            None => return Err(ClassError::NotFound(format!("{}.{key}", self.name))),
        };
        self.bind(key, Declaration::Method(enhance(existing)));
        tracing::debug!("Enhanced method {}.{}", self.name, key);
        Ok(())
    }

    /// Calls the method at `key` on `instance`.
    ///
    /// # Errors
    ///
    /// - [`ClassError::NotFound`] if no method exists at `key`
    /// - [`ClassError::TypeMismatch`] if `key` is not a method
    /// - whatever the method returns
    pub fn call(&self, instance: &Instance, key: &str, args: &Arguments) -> ClassResult<Option<Value>> {
        match self.attribute(key) {
            Some(Declaration::Method(method)) => method(instance, args),
            Some(other) => Err(ClassError::type_mismatch(
                "method",
                other.kind(),
                format!("{}.{key}", self.name),
            )),
            None => Err(ClassError::NotFound(format!("{}.{key}", self.name))),
        }
    }

    /// Creates an instance: allocate, `pre_init`, `init`, `post_init`.
    ///
    /// A missing `init` is skipped.
    ///
    /// # Errors
    ///
    /// The first error raised by a lifecycle step.
    pub fn instantiate(self: &Arc<Self>, args: &Arguments) -> ClassResult<Instance> {
        let instance = Instance::allocate(Arc::clone(self));
        tracing::trace!("Allocated {}#{}", self.name, instance.id);

        for hook in [PRE_INIT, INIT, POST_INIT] {
            if self.attribute(hook).is_some() {
                tracing::trace!("Running {}.{} on #{}", self.name, hook, instance.id);
                self.call(&instance, hook, args)?;
            }
        }
        Ok(instance)
    }

    /// Binds `method` at `key` unless the hierarchy already provides one.
    pub(crate) fn attach_default(&self, key: &str, method: Method) {
        if self.attribute(key).is_none() {
            self.bind(key, Declaration::Method(method));
        }
    }

    fn own_attribute(&self, key: &str) -> Option<Declaration> {
        self.attributes
            .read()
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, decl)| decl.clone())
    }

    fn bind(&self, key: &str, decl: Declaration) {
        let mut attributes = self.attributes.write();
        match attributes.iter_mut().find(|(name, _)| name == key) {
            Some((_, existing)) => *existing = decl,
            None => attributes.push((key.to_owned(), decl)),
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("bases", &self.bases().iter().map(|b| b.name()).collect::<Vec<_>>())
            .field("attributes", &self.attribute_names())
            .finish()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class '{}'>", self.name)
    }
}

/// An instance of a [`Class`].
///
/// Slot attributes resolve to the class-level slot; everything else is
/// stored on the instance and shadows plain class values.
pub struct Instance {
    id: u64,
    class: ClassRef,
    attributes: Mutex<HashMap<String, Value>>,
}

impl Instance {
    fn allocate(class: ClassRef) -> Self {
        Self {
            id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            class,
            attributes: Mutex::new(HashMap::new()),
        }
    }

    /// Process-unique instance id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The class this instance was created from.
    #[must_use]
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Whether this instance's class is `class` or derives from it.
    #[must_use]
    pub fn is_instance_of(&self, class: &Class) -> bool {
        self.class.is_subclass_of(class)
    }

    /// Reads an attribute: slot, then instance value, then class value.
    ///
    /// # Errors
    ///
    /// Same as [`Class::get`].
    pub fn get(&self, key: &str) -> ClassResult<Value> {
        if let Some(slot) = self.class.slot(key) {
            return slot.get();
        }
        if let Some(value) = self.attributes.lock().get(key) {
            return Ok(value.clone());
        }
        self.class.get(key)
    }

    /// Writes an attribute. Slots go through their capability.
    ///
    /// # Errors
    ///
    /// Any slot write error.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> ClassResult<()> {
        if let Some(slot) = self.class.slot(key) {
            return slot.set(value);
        }
        self.attributes.lock().insert(key.to_owned(), value.into());
        Ok(())
    }

    /// Deletes an attribute. Slots go through their capability.
    ///
    /// # Errors
    ///
    /// - any slot delete error
    /// - [`ClassError::NotFound`] if the instance holds no value at `key`
    pub fn delete(&self, key: &str) -> ClassResult<()> {
        if let Some(slot) = self.class.slot(key) {
            return slot.delete();
        }
        match self.attributes.lock().remove(key) {
            Some(_) => Ok(()),
            None => Err(ClassError::NotFound(format!("{}#{}.{key}", self.class.name, self.id))),
        }
    }

    /// Calls a method of this instance's class.
    ///
    /// # Errors
    ///
    /// Same as [`Class::call`].
    pub fn call(&self, key: &str, args: &Arguments) -> ClassResult<Option<Value>> {
        self.class.call(self, key, args)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("class", &self.class.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::{Capability, TypeTag};

    fn build(name: &str, declarations: Vec<(&str, Declaration)>) -> ClassRef {
        build_with(ClassDescriptor::new(name), declarations)
    }

    fn build_with(descriptor: ClassDescriptor, declarations: Vec<(&str, Declaration)>) -> ClassRef {
        let declarations = declarations
            .into_iter()
            .map(|(key, decl)| (key.to_owned(), decl))
            .collect();
        Arc::new(Class::new(descriptor, declarations))
    }

    fn int_slot(level: Capability) -> Declaration {
        Slot::builder()
            .ty(TypeTag::Int)
            .capability(level)
            .build()
            .unwrap()
            .into()
    }

    #[test]
    fn test_slot_storage_is_shared_across_instances() {
        let class = build("Counter", vec![("count", int_slot(Capability::Unrestricted))]);
        let a = class.instantiate(&Arguments::new()).unwrap();
        let b = class.instantiate(&Arguments::new()).unwrap();
        a.set("count", 5).unwrap();
        assert_eq!(b.get("count").unwrap(), Value::Int(5));
        assert_eq!(class.get("count").unwrap(), Value::Int(5));
    }

    #[test]
    fn test_instance_values_are_local() {
        let class = build("Plain", vec![("title", Declaration::Value("class".into()))]);
        let a = class.instantiate(&Arguments::new()).unwrap();
        let b = class.instantiate(&Arguments::new()).unwrap();
        a.set("title", "mine").unwrap();
        assert_eq!(a.get("title").unwrap(), Value::from("mine"));
        assert_eq!(b.get("title").unwrap(), Value::from("class"));
        a.delete("title").unwrap();
        assert!(a.delete("title").unwrap_err().is_not_found());
    }

    #[test]
    fn test_lifecycle_order() {
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::default();
        let hook = |step: &'static str| {
            let log = Arc::clone(&log);
            Declaration::method(move |_, _| {
                log.lock().push(step);
                Ok(None)
            })
        };
        let class = build(
            "Ordered",
            vec![
                (POST_INIT, hook("post")),
                (INIT, hook("init")),
                (PRE_INIT, hook("pre")),
            ],
        );
        class.instantiate(&Arguments::new()).unwrap();
        assert_eq!(*log.lock(), vec!["pre", "init", "post"]);
    }

    #[test]
    fn test_failing_init_aborts_construction() {
        let class = build(
            "Broken",
            vec![(
                INIT,
                Declaration::method(|_, _| Err(ClassError::State("refused".into()))),
            )],
        );
        assert!(matches!(
            class.instantiate(&Arguments::new()),
            Err(ClassError::State(_))
        ));
    }

    #[test]
    fn test_base_lookup_and_subclassing() {
        let base = build("Base", vec![("greeting", Declaration::Value("hi".into()))]);
        let child = build_with(ClassDescriptor::new("Child").with_base(Arc::clone(&base)), vec![]);
        assert_eq!(child.get("greeting").unwrap(), Value::from("hi"));
        assert!(child.is_subclass_of(&base));
        assert!(!base.is_subclass_of(&child));

        child.set("greeting", "hey").unwrap();
        assert_eq!(child.get("greeting").unwrap(), Value::from("hey"));
        assert_eq!(base.get("greeting").unwrap(), Value::from("hi"));
    }

    #[test]
    fn test_enhance_method() {
        let class = build(
            "Greeter",
            vec![
                ("greet", Declaration::method(|_, _| Ok(Some(Value::from("hello"))))),
                ("name", Declaration::Value("x".into())),
            ],
        );
        class
            .enhance_method("greet", |inner| {
                let wrapped: Method = Arc::new(
                    move |instance: &Instance, args: &Arguments| -> ClassResult<Option<Value>> {
                        let out = inner(instance, args)?;
                        Ok(out.and_then(|v| v.as_text().map(|text| Value::from(format!("{text}!")))))
                    },
                );
                wrapped
            })
            .unwrap();
        let instance = class.instantiate(&Arguments::new()).unwrap();
        assert_eq!(
            instance.call("greet", &Arguments::new()).unwrap(),
            Some(Value::from("hello!"))
        );
        assert!(class.enhance_method("missing", |m| m).unwrap_err().is_not_found());
        assert!(matches!(
            class.enhance_method("name", |m| m),
            Err(ClassError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_hooks_cannot_be_overwritten_or_removed() {
        let class = build(
            "Hooked",
            vec![(PRE_INIT, Declaration::method(|_, _| Ok(None)))],
        );
        assert!(matches!(
            class.set(PRE_INIT, 1),
            Err(ClassError::TypeMismatch { .. })
        ));
        assert!(matches!(
            class.delete(PRE_INIT),
            Err(ClassError::TypeMismatch { .. })
        ));
        assert!(matches!(class.attribute(PRE_INIT), Some(Declaration::Method(_))));
        assert!(class.instantiate(&Arguments::new()).is_ok());
    }

    #[test]
    fn test_inherited_hook_is_not_rebound_on_subclass() {
        let base = build("Base", vec![(POST_INIT, Declaration::method(|_, _| Ok(None)))]);
        let child = build_with(ClassDescriptor::new("Child").with_base(Arc::clone(&base)), vec![]);
        assert!(child.set(POST_INIT, "gone").is_err());
        assert!(child.attribute_names().is_empty());
    }

    #[test]
    fn test_class_resolves_its_owner_after_build() {
        let global = ClassRegistry::new();
        let local = ClassRegistry::new();
        let application = build("Application", vec![]);
        local.register(&application);

        let window = build_with(ClassDescriptor::new("Window").with_owner_name("Application"), vec![]);
        assert!(window.resolve_owner(&global, None).unwrap_err().is_not_found());
        assert_eq!(
            window.resolve_owner(&global, Some(&local)).unwrap().id(),
            application.id()
        );

        // A class registered later is found without rebuilding
        let shadow = build("Application", vec![]);
        global.register(&shadow);
        assert_eq!(
            window.resolve_owner(&global, Some(&local)).unwrap().id(),
            shadow.id()
        );
    }

    #[test]
    fn test_provided_owner_beats_registries() {
        let provided = build("Application", vec![]);
        let global = ClassRegistry::new();
        global.register(&build("Application", vec![]));

        let dialog = build_with(
            ClassDescriptor::new("Dialog")
                .with_owner_name("Application")
                .with_owner(Arc::clone(&provided)),
            vec![],
        );
        assert_eq!(dialog.resolve_owner(&global, None).unwrap().id(), provided.id());
    }

    #[test]
    fn test_methods_are_not_values() {
        let class = build("M", vec![("run", Declaration::method(|_, _| Ok(None)))]);
        assert!(matches!(class.get("run"), Err(ClassError::TypeMismatch { .. })));
        let instance = class.instantiate(&Arguments::new()).unwrap();
        assert!(instance.call("nothing", &Arguments::new()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_slot_capability_applies_through_instances() {
        let class = build("Vault", vec![("code", int_slot(Capability::Secret))]);
        let instance = class.instantiate(&Arguments::new()).unwrap();
        assert!(matches!(
            instance.get("code"),
            Err(ClassError::AccessDenied { .. })
        ));
        assert!(instance.is_instance_of(&class));
    }
}
