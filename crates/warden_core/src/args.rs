//! # Argument Binder
//!
//! Flexible constructors in this workspace accept their arguments in any
//! order, positionally or by keyword alias. [`Arguments`] holds both
//! collections and hands values out one extraction at a time:
//!
//! ```text
//! take(Int, ["count"])
//!   1. keyword aliases, exact name then lower-case ("count", ...)
//!   2. first positional value of type Int
//! ```
//!
//! Every extraction removes at most one value. When nothing qualifies the
//! collections are returned unmodified.

use crate::error::{ClassError, ClassResult};
use crate::value::{TypeTag, Value};

/// Removes the first value of type `target` from `values`.
///
/// Returns the removed value, if any, and the remaining values in order.
///
/// ```rust
/// use warden_core::{take_arg, TypeTag, Value};
///
/// let values = vec![Value::Int(1), Value::from("a"), Value::Int(2)];
/// let (removed, remaining) = take_arg(&TypeTag::Int, values);
/// assert_eq!(removed, Some(Value::Int(1)));
/// assert_eq!(remaining, vec![Value::from("a"), Value::Int(2)]);
/// ```
#[must_use]
pub fn take_arg(target: &TypeTag, mut values: Vec<Value>) -> (Option<Value>, Vec<Value>) {
    match values.iter().position(|value| target.matches(value)) {
        Some(index) => {
            let removed = values.remove(index);
            (Some(removed), values)
        }
        None => (None, values),
    }
}

/// Positional and keyword arguments of a flexible constructor call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    /// Positional values, in call order.
    pub positional: Vec<Value>,
    /// Keyword values, in call order.
    pub named: Vec<(String, Value)>,
}

impl Arguments {
    /// Creates an empty argument list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positional: Vec::new(),
            named: Vec::new(),
        }
    }

    /// Adds a positional value.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Adds a keyword value.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }

    /// Returns true if no arguments remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Total number of remaining arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    /// Extracts the first value matching `target` by keyword alias or
    /// by position, keywords first.
    ///
    /// A keyword whose value has the wrong type does not qualify.
    #[must_use]
    pub fn take(mut self, target: &TypeTag, aliases: &[&str]) -> (Option<Value>, Self) {
        if let Some(index) = self.alias_index(aliases, |value| target.matches(value)) {
            let (_, value) = self.named.remove(index);
            return (Some(value), self);
        }
        let (removed, remaining) = take_arg(target, self.positional);
        self.positional = remaining;
        (removed, self)
    }

    /// Extracts a keyword value under any of `aliases`, whatever its type.
    #[must_use]
    pub fn take_any(mut self, aliases: &[&str]) -> (Option<Value>, Self) {
        match self.alias_index(aliases, |_| true) {
            Some(index) => {
                let (_, value) = self.named.remove(index);
                (Some(value), self)
            }
            None => (None, self),
        }
    }

    /// Extracts every positional value of type `target`, in order.
    #[must_use]
    pub fn take_all(mut self, target: &TypeTag) -> (Vec<Value>, Self) {
        let (taken, kept): (Vec<Value>, Vec<Value>) = self
            .positional
            .into_iter()
            .partition(|value| target.matches(value));
        self.positional = kept;
        (taken, self)
    }

    /// Like [`Arguments::take`], but a missing value is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ClassError::MissingArgument`] when nothing matches.
    pub fn require(self, target: &TypeTag, aliases: &[&str]) -> ClassResult<(Value, Self)> {
        match self.take(target, aliases) {
            (Some(value), rest) => Ok((value, rest)),
            (None, _) => Err(ClassError::MissingArgument(format!(
                "{target} (aliases: {})",
                aliases.join(", ")
            ))),
        }
    }

    /// Finds the keyword for the first alias that is present, trying each
    /// alias verbatim and then lower-cased.
    fn alias_index(&self, aliases: &[&str], accept: impl Fn(&Value) -> bool) -> Option<usize> {
        aliases.iter().find_map(|alias| {
            let lowered = alias.to_lowercase();
            self.named
                .iter()
                .position(|(name, value)| name == alias && accept(value))
                .or_else(|| {
                    self.named
                        .iter()
                        .position(|(name, value)| *name == lowered && accept(value))
                })
        })
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(positional: Vec<Value>) -> Self {
        Self {
            positional,
            named: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_arg_first_match_only() {
        let values = vec![Value::Int(1), Value::from("a"), Value::Int(2)];
        let (removed, remaining) = take_arg(&TypeTag::Int, values);
        assert_eq!(removed, Some(Value::Int(1)));
        assert_eq!(remaining, vec![Value::from("a"), Value::Int(2)]);
    }

    #[test]
    fn test_take_arg_no_match_is_unmodified() {
        let values = vec![Value::from("a"), Value::Bool(true)];
        let (removed, remaining) = take_arg(&TypeTag::Int, values.clone());
        assert_eq!(removed, None);
        assert_eq!(remaining, values);
    }

    #[test]
    fn test_keyword_alias_wins_over_position() {
        let args = Arguments::new().arg(1).kwarg("count", 7);
        let (value, rest) = args.take(&TypeTag::Int, &["count"]);
        assert_eq!(value, Some(Value::Int(7)));
        assert_eq!(rest.positional, vec![Value::Int(1)]);
        assert!(rest.named.is_empty());
    }

    #[test]
    fn test_alias_lowercase_fallback() {
        let args = Arguments::new().kwarg("varname", "speed");
        let (value, rest) = args.take(&TypeTag::Text, &["varName"]);
        assert_eq!(value, Some(Value::from("speed")));
        assert!(rest.is_empty());
    }

    #[test]
    fn test_keyword_of_wrong_type_is_skipped() {
        let args = Arguments::new().kwarg("name", 3).arg("title");
        let (value, rest) = args.take(&TypeTag::Text, &["name"]);
        assert_eq!(value, Some(Value::from("title")));
        assert_eq!(rest.named.len(), 1);
    }

    #[test]
    fn test_take_all_and_require() {
        let args = Arguments::new()
            .arg(TypeTag::Int)
            .arg("x")
            .arg(TypeTag::Text);
        let (types, rest) = args.take_all(&TypeTag::Type);
        assert_eq!(types.len(), 2);
        assert_eq!(rest.len(), 1);

        let missing = rest.require(&TypeTag::Float, &["ratio"]);
        assert!(matches!(missing, Err(ClassError::MissingArgument(_))));
    }
}
