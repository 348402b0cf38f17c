//! # Class Factory
//!
//! Two-phase class construction:
//!
//! ```text
//! prepare(descriptor)          probe a throwaway namespace, hand out a fresh one
//!   body(&mut namespace)       declarations, in order
//! build(namespace)             class + default hooks + registration
//! ```
//!
//! The probe exercises the [`NamespaceMapping`] contract once. A namespace
//! that fails it never sees a class body.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use warden_core::{Arguments, ClassError, ClassResult, Slot, TypeTag, Value};

use crate::class::{Class, ClassRef, Instance, Method, POST_INIT, PRE_INIT};
use crate::config::{value_from_toml, ClassSchema, FactoryConfig};
use crate::namespace::{ClassDescriptor, Declaration, DeclarationNamespace, NamespaceMapping};
use crate::registry::ClassRegistry;

/// Why a namespace failed the probe. Each cause has a stable code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProbeFailure {
    /// A mapping operation is not supported.
    MissingOperation = 1,
    /// The probe key read back a different value.
    ValueMismatch = 2,
    /// The probe key read back as not found.
    ProbeKeyLost = 3,
    /// The probe key is not reported as contained.
    MembershipMissing = 4,
    /// An operation failed for another reason.
    UnexpectedError = 5,
    /// Reading an absent key succeeded.
    MissingKeyFound = 6,
}

impl ProbeFailure {
    /// Stable numeric code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable cause.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::MissingOperation => "namespace does not support a required mapping operation",
            Self::ValueMismatch => "namespace returned a different value for the probe key",
            Self::ProbeKeyLost => "namespace lost the probe key",
            Self::MembershipMissing => "namespace does not report the probe key as contained",
            Self::UnexpectedError => "namespace raised an unexpected error",
            Self::MissingKeyFound => "namespace returned a value for an absent key",
        }
    }

    /// Maps an operation error to a probe failure. Unsupported operations
    /// are code 1, everything else code 5.
    fn from_error(err: &ClassError) -> Self {
        match err {
            ClassError::Unsupported(_) => Self::MissingOperation,
            _ => Self::UnexpectedError,
        }
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code {}: {}", self.code(), self.describe())
    }
}

impl From<ProbeFailure> for ClassError {
    fn from(failure: ProbeFailure) -> Self {
        Self::InvalidNamespace {
            code: failure.code(),
            reason: failure.describe().to_string(),
        }
    }
}

/// Builds classes from declaration namespaces.
#[derive(Debug, Default)]
pub struct ClassFactory {
    config: FactoryConfig,
    registry: ClassRegistry,
}

impl ClassFactory {
    /// Creates a factory with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory with the given configuration.
    #[must_use]
    pub fn with_config(config: FactoryConfig) -> Self {
        Self {
            config,
            registry: ClassRegistry::new(),
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// The global class registry.
    #[must_use]
    pub const fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Opens a validated [`DeclarationNamespace`] for `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::InvalidNamespace`] if the probe fails.
    pub fn prepare(&self, descriptor: &ClassDescriptor) -> ClassResult<DeclarationNamespace> {
        self.prepare_with(descriptor, |d| DeclarationNamespace::new(d.clone()))
    }

    /// Opens a namespace produced by `create`, after probing a separate
    /// namespace from the same constructor.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::InvalidNamespace`] if the probe fails.
    pub fn prepare_with<N, F>(&self, descriptor: &ClassDescriptor, create: F) -> ClassResult<N>
    where
        N: NamespaceMapping,
        F: Fn(&ClassDescriptor) -> N,
    {
        let mut scratch = create(descriptor);
        match self.probe(&mut scratch) {
            Ok(()) => {
                tracing::debug!("Namespace for '{}' passed the probe", descriptor.class_name());
                Ok(create(descriptor))
            }
            Err(failure) => {
                tracing::debug!(
                    "Namespace for '{}' failed the probe ({})",
                    descriptor.class_name(),
                    failure
                );
                Err(failure.into())
            }
        }
    }

    /// Runs the namespace probe against `namespace`, which it mutates.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProbeFailure`] encountered.
    pub fn probe<N>(&self, namespace: &mut N) -> Result<(), ProbeFailure>
    where
        N: NamespaceMapping + ?Sized,
    {
        let key = self.config.probe_key.as_str();
        let expected = Declaration::Value(Value::Text(self.config.probe_value.clone()));

        namespace
            .assign(key, expected.clone())
            .map_err(|err| ProbeFailure::from_error(&err))?;

        match namespace.lookup(key) {
            Ok(found) if found == expected => {}
            Ok(_) => return Err(ProbeFailure::ValueMismatch),
            Err(err) if err.is_not_found() => return Err(ProbeFailure::ProbeKeyLost),
            Err(err) => return Err(ProbeFailure::from_error(&err)),
        }

        match namespace.contains_key(key) {
            Ok(true) => {}
            Ok(false) => return Err(ProbeFailure::MembershipMissing),
            Err(err) => return Err(ProbeFailure::from_error(&err)),
        }

        let absent = self.absent_key(namespace)?;
        match namespace.lookup(&absent) {
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(ProbeFailure::from_error(&err)),
            Ok(_) => Err(ProbeFailure::MissingKeyFound),
        }
    }

    /// Builds a class from a finished namespace.
    ///
    /// `pre_init` and `post_init` default to no-ops unless the namespace or
    /// a base class declares them.
    #[must_use]
    pub fn build(&self, namespace: DeclarationNamespace) -> ClassRef {
        let (descriptor, declarations) = namespace.finalize();
        let class = Arc::new(Class::new(descriptor, declarations));
        class.attach_default(PRE_INIT, noop());
        class.attach_default(POST_INIT, noop());

        if self.config.register_classes {
            self.registry.register(&class);
        }
        tracing::info!(
            "Built class '{}' with {} slot(s)",
            class.name(),
            class.slots().len()
        );
        class
    }

    /// Prepares a namespace, runs `body` on it and builds the class.
    ///
    /// # Errors
    ///
    /// Probe failures and the first error raised by `body`.
    pub fn declare<F>(&self, descriptor: &ClassDescriptor, body: F) -> ClassResult<ClassRef>
    where
        F: FnOnce(&mut DeclarationNamespace) -> ClassResult<()>,
    {
        let mut namespace = self.prepare(descriptor)?;
        body(&mut namespace)?;
        Ok(self.build(namespace))
    }

    /// Declares a class from a schema.
    ///
    /// # Errors
    ///
    /// Unknown type names, access names rejected by the configuration,
    /// defaults that do not convert or do not match their type, and any
    /// declaration error.
    pub fn declare_schema(&self, schema: &ClassSchema) -> ClassResult<ClassRef> {
        let mut descriptor = ClassDescriptor::new(&schema.name);
        if let Some(owner) = &schema.owner {
            descriptor = descriptor.with_owner_name(owner);
        }

        self.declare(&descriptor, |ns| {
            for slot in &schema.slots {
                let mut builder = if slot.constant {
                    Slot::constant()
                } else {
                    Slot::builder()
                };
                if let Some(type_name) = &slot.type_name {
                    builder = builder.ty(TypeTag::from_name(type_name)?);
                }
                if let Some(access) = &slot.access {
                    builder = builder.capability(self.config.capability_for(access)?);
                }
                if let Some(default) = &slot.default {
                    builder = builder.default(value_from_toml(default)?);
                }
                ns.set(&slot.name, builder.build()?)?;
            }
            Ok(())
        })
    }

    /// Loads a schema file and declares its class.
    ///
    /// # Errors
    ///
    /// Load errors, then as [`ClassFactory::declare_schema`].
    pub fn declare_schema_file(&self, path: impl AsRef<Path>) -> ClassResult<ClassRef> {
        let schema = ClassSchema::from_path(path)?;
        self.declare_schema(&schema)
    }

    /// Resolves the owner class named in `descriptor`: provided owner,
    /// then this factory's registry, then `local`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::NotFound`] if nothing resolves.
    pub fn resolve_owner(
        &self,
        descriptor: &ClassDescriptor,
        local: Option<&ClassRegistry>,
    ) -> ClassResult<ClassRef> {
        descriptor.resolve_owner(&self.registry, local)
    }

    /// Counts up from the seed until the namespace reports a key absent.
    fn absent_key<N>(&self, namespace: &N) -> Result<String, ProbeFailure>
    where
        N: NamespaceMapping + ?Sized,
    {
        let prefix = &self.config.missing_key_prefix;
        let mut counter = self.config.missing_key_seed;
        for _ in 0..self.config.max_probe_attempts {
            let candidate = format!("{prefix}{counter}");
            match namespace.contains_key(&candidate) {
                Ok(false) => return Ok(candidate),
                Ok(true) => counter = counter.wrapping_add(1),
                Err(err) => return Err(ProbeFailure::from_error(&err)),
            }
        }
        // Everything reads as contained, so nothing can read as missing.
        Err(ProbeFailure::MissingKeyFound)
    }
}

fn noop() -> Method {
    Arc::new(|_: &Instance, _: &Arguments| -> ClassResult<Option<Value>> { Ok(None) })
}
