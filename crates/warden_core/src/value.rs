//! # Value Model
//!
//! Slots store dynamically typed [`Value`]s and check them against a
//! [`TypeTag`]. A tag can also produce the canonical base instance of its
//! type, which is what an empty slot hands out on first read:
//!
//! | Tag          | Base                                   |
//! |--------------|----------------------------------------|
//! | `list`       | `[]`                                   |
//! | `int`        | `0`                                    |
//! | `float`      | `0.0`                                  |
//! | `str`        | `""`                                   |
//! | `bool`       | `false`                                |
//! | `capability` | `Secret`                               |
//! | record       | every field at its own base            |
//! | `type`, opaque | none (no parameterless constructor)  |

use std::fmt;
use std::sync::Arc;

use crate::capability::Capability;
use crate::error::{ClassError, ClassResult};

/// Runtime type of a [`Value`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Booleans.
    Bool,
    /// Signed 64-bit integers.
    Int,
    /// 64-bit floats.
    Float,
    /// Text.
    Text,
    /// Ordered sequences of values.
    List,
    /// Capability levels.
    Capability,
    /// Type tags themselves.
    Type,
    /// A user declared record type.
    Record(Arc<RecordType>),
    /// A named type without a parameterless constructor.
    Opaque(String),
}

impl TypeTag {
    /// Returns the exact type of a value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Bool(_) => Self::Bool,
            Value::Int(_) => Self::Int,
            Value::Float(_) => Self::Float,
            Value::Text(_) => Self::Text,
            Value::List(_) => Self::List,
            Value::Capability(_) => Self::Capability,
            Value::Type(_) => Self::Type,
            Value::Record(record) => Self::Record(Arc::clone(&record.record_type)),
        }
    }

    /// Instance check: whether `value` is of exactly this type.
    ///
    /// There is no numeric tower, an `int` is not a `float`.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool, Value::Bool(_))
            | (Self::Int, Value::Int(_))
            | (Self::Float, Value::Float(_))
            | (Self::Text, Value::Text(_))
            | (Self::List, Value::List(_))
            | (Self::Capability, Value::Capability(_))
            | (Self::Type, Value::Type(_)) => true,
            (Self::Record(expected), Value::Record(record)) => {
                Arc::ptr_eq(expected, &record.record_type) || **expected == *record.record_type
            }
            _ => false,
        }
    }

    /// Resolves a builtin type by name.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::NotFound`] if no builtin type has that name.
    pub fn from_name(name: &str) -> ClassResult<Self> {
        match name {
            "bool" => Ok(Self::Bool),
            "int" | "i64" => Ok(Self::Int),
            "float" | "f64" => Ok(Self::Float),
            "str" | "text" | "string" => Ok(Self::Text),
            "list" => Ok(Self::List),
            "capability" => Ok(Self::Capability),
            "type" => Ok(Self::Type),
            other => Err(ClassError::NotFound(format!("type '{other}'"))),
        }
    }

    /// Returns the canonical base instance of this type.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::TypeMismatch`] when the type has no
    /// parameterless constructor.
    pub fn base_instance(&self) -> ClassResult<Value> {
        match self {
            Self::Bool => Ok(Value::Bool(false)),
            Self::Int => Ok(Value::Int(0)),
            Self::Float => Ok(Value::Float(0.0)),
            Self::Text => Ok(Value::Text(String::new())),
            Self::List => Ok(Value::List(Vec::new())),
            Self::Capability => Ok(Value::Capability(Capability::Secret)),
            Self::Record(record_type) => Ok(Value::Record(Record::new(record_type)?)),
            Self::Type | Self::Opaque(_) => Err(ClassError::type_mismatch(
                "type with a parameterless constructor",
                self,
                "base instance",
            )),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Text => f.write_str("str"),
            Self::List => f.write_str("list"),
            Self::Capability => f.write_str("capability"),
            Self::Type => f.write_str("type"),
            Self::Record(record_type) => f.write_str(&record_type.name),
            Self::Opaque(name) => f.write_str(name),
        }
    }
}

/// A user declared record type: a name and typed fields.
///
/// Its parameterless constructor builds a record with every field at the
/// canonical base of its type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordType {
    /// Type name.
    pub name: String,
    /// Field names and types, in declaration order.
    pub fields: Vec<(String, TypeTag)>,
}

impl RecordType {
    /// Creates a record type with no fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, tag: TypeTag) -> Self {
        self.fields.push((name.into(), tag));
        self
    }

    /// Wraps the record type in a tag.
    #[must_use]
    pub fn into_tag(self) -> TypeTag {
        TypeTag::Record(Arc::new(self))
    }

    fn field_type(&self, field: &str) -> Option<&TypeTag> {
        self.fields
            .iter()
            .find_map(|(name, tag)| (name == field).then_some(tag))
    }
}

/// An instance of a [`RecordType`].
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    record_type: Arc<RecordType>,
    values: Vec<Value>,
}

impl Record {
    /// Builds a record with every field at its canonical base.
    ///
    /// # Errors
    ///
    /// Fails if a field type has no canonical base.
    pub fn new(record_type: &Arc<RecordType>) -> ClassResult<Self> {
        let values = record_type
            .fields
            .iter()
            .map(|(_, tag)| tag.base_instance())
            .collect::<ClassResult<Vec<_>>>()?;
        Ok(Self {
            record_type: Arc::clone(record_type),
            values,
        })
    }

    /// The record's type.
    #[must_use]
    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    /// Reads a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        let index = self.index_of(field)?;
        self.values.get(index)
    }

    /// Writes a field, checking its declared type.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::NotFound`] for unknown fields and
    /// [`ClassError::TypeMismatch`] for values of the wrong type.
    pub fn set(&mut self, field: &str, value: Value) -> ClassResult<()> {
        let Some(index) = self.index_of(field) else {
            return Err(ClassError::NotFound(format!(
                "field '{field}' on {}",
                self.record_type.name
            )));
        };
        if let Some(tag) = self.record_type.field_type(field) {
            if !tag.matches(&value) {
                return Err(ClassError::type_mismatch(tag, value.type_tag(), field));
            }
        }
        self.values[index] = value;
        Ok(())
    }

    fn index_of(&self, field: &str) -> Option<usize> {
        self.record_type
            .fields
            .iter()
            .position(|(name, _)| name == field)
    }
}

/// A dynamically typed value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// Text.
    Text(String),
    /// An ordered sequence.
    List(Vec<Value>),
    /// A capability level.
    Capability(Capability),
    /// A type tag.
    Type(TypeTag),
    /// A record.
    Record(Record),
}

impl Value {
    /// Returns the value's exact type.
    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        TypeTag::of(self)
    }

    /// Returns the integer, if this is one.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the float, if this is one.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the boolean, if this is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the text, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the elements, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the record, if this is one.
    #[must_use]
    pub const fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::Text(value) => write!(f, "{value:?}"),
            Self::List(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            Self::Capability(level) => write!(f, "{level:?}"),
            Self::Type(tag) => write!(f, "<type {tag}>"),
            Self::Record(record) => {
                write!(f, "{}(", record.record_type.name)?;
                for (i, ((name, _), value)) in record
                    .record_type
                    .fields
                    .iter()
                    .zip(&record.values)
                    .enumerate()
                {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}={value}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

impl From<TypeTag> for Value {
    fn from(tag: TypeTag) -> Self {
        Self::Type(tag)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}
