//! # Warden Core
//!
//! Capability-gated storage cells for the warden class protocol:
//! - Four ordered capability levels with derived get/set/delete rights
//! - A small dynamic value model with canonical base instances
//! - An argument binder for order-independent constructor calls
//! - Slots: typed, class-level cells guarded by their capability
//!
//! ## Architecture Rules
//!
//! 1. **Capability lives on the slot** - no per-caller identity checks
//! 2. **Structural facets are write-once** - name and type never change once set
//! 3. **Escalation needs a token** - capability changes require the slot's root token
//!
//! ## Example
//!
//! ```rust
//! use warden_core::{Capability, Slot, TypeTag, Value};
//!
//! let lives = Slot::builder()
//!     .ty(TypeTag::Int)
//!     .capability(Capability::ReadOnly)
//!     .build()?;
//!
//! assert_eq!(lives.get()?, Value::Int(0));
//! lives.set(3)?;
//! assert!(lives.set(4).is_err());
//! # Ok::<(), warden_core::ClassError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod args;
pub mod capability;
pub mod error;
pub mod slot;
pub mod value;

pub use args::{take_arg, Arguments};
pub use capability::Capability;
pub use error::{Access, ClassError, ClassResult};
pub use slot::{Facet, RootToken, Slot, SlotBuilder, SlotKind};
pub use value::{Record, RecordType, TypeTag, Value};
