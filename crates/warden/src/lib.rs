//! # Warden
//!
//! Capability-gated class declarations with a two-phase construction
//! protocol.
//!
//! A class is declared into a [`DeclarationNamespace`], which the
//! [`ClassFactory`] validates before the body runs and finalizes into a
//! shared [`Class`] afterwards. Attributes declared as slots keep their
//! capability for the lifetime of the class.
//!
//! ## Architecture Rules
//!
//! 1. **Probe before trust** - every namespace passes the mapping probe first
//! 2. **Slots are claimed once** - a slot's key can never be rebound
//! 3. **Storage is per class** - all instances share each slot's cell
//!
//! ## Example
//!
//! ```rust
//! use warden::{Arguments, Capability, ClassDescriptor, ClassFactory, Slot, TypeTag};
//!
//! let factory = ClassFactory::new();
//! let player = factory.declare(&ClassDescriptor::new("Player"), |ns| {
//!     let level = Slot::builder()
//!         .ty(TypeTag::Int)
//!         .capability(Capability::ReadOnly)
//!         .build()?;
//!     ns.set("level", level)
//! })?;
//!
//! let a = player.instantiate(&Arguments::new())?;
//! let b = player.instantiate(&Arguments::new())?;
//! a.set("level", 5)?;
//! assert_eq!(b.get("level")?.as_int(), Some(5));
//! assert!(b.set("level", 6).is_err());
//! # Ok::<(), warden::ClassError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod class;
pub mod config;
pub mod factory;
pub mod namespace;
pub mod registry;

pub use class::{Class, ClassRef, Instance, Method, INIT, POST_INIT, PRE_INIT};
pub use config::{value_from_toml, ClassSchema, ConfigError, ConfigResult, FactoryConfig, SlotSchema};
pub use factory::{ClassFactory, ProbeFailure};
pub use namespace::{ClassDescriptor, Declaration, DeclarationNamespace, NamespaceMapping};
pub use registry::ClassRegistry;

pub use warden_core::{
    take_arg, Access, Arguments, Capability, ClassError, ClassResult, Facet, Record, RecordType,
    RootToken, Slot, SlotBuilder, SlotKind, TypeTag, Value,
};
