//! Name-indexed class registry used for owner resolution.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use warden_core::{ClassError, ClassResult};

use crate::class::ClassRef;

/// Thread-safe map from class name to class.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: RwLock<HashMap<String, ClassRef>>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `class` under its name, returning any class it replaces.
    pub fn register(&self, class: &ClassRef) -> Option<ClassRef> {
        let replaced = self
            .classes
            .write()
            .insert(class.name().to_owned(), Arc::clone(class));
        if replaced.is_some() {
            tracing::debug!("Class '{}' re-registered", class.name());
        }
        replaced
    }

    /// Looks a class up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ClassRef> {
        self.classes.read().get(name).cloned()
    }

    /// Like [`ClassRegistry::get`], but absence is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::NotFound`] for unknown names.
    pub fn resolve(&self, name: &str) -> ClassResult<ClassRef> {
        self.get(name)
            .ok_or_else(|| ClassError::NotFound(format!("class '{name}'")))
    }

    /// Removes a class by name.
    pub fn unregister(&self, name: &str) -> Option<ClassRef> {
        self.classes.write().remove(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::Class;
    use crate::namespace::ClassDescriptor;

    fn class(name: &str) -> ClassRef {
        Arc::new(Class::new(ClassDescriptor::new(name), Vec::new()))
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = ClassRegistry::new();
        assert!(registry.is_empty());
        registry.register(&class("Window"));
        registry.register(&class("Button"));
        assert_eq!(registry.names(), vec!["Button", "Window"]);
        assert_eq!(registry.resolve("Window").unwrap().name(), "Window");
        assert!(registry.resolve("Dialog").unwrap_err().is_not_found());
    }

    #[test]
    fn test_reregister_replaces() {
        let registry = ClassRegistry::new();
        let first = class("Window");
        assert!(registry.register(&first).is_none());
        let replaced = registry.register(&class("Window")).unwrap();
        assert_eq!(replaced.id(), first.id());
        assert_eq!(registry.len(), 1);
        assert!(registry.unregister("Window").is_some());
    }
}
