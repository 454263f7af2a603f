//! The flag descriptor.

use std::borrow::Cow;

use crate::overlay::{EnvAnnotations, with_env_hint};
use crate::value::{FlagValue, ValueError, ValueType};

/// A declared command-line flag.
///
/// A flag owns its current [`FlagValue`], the compiled-in default it was
/// declared with, and a usage description. The environment overlay records
/// its per-flag settings in [`EnvAnnotations`] and appends an env hint to the
/// usage string when it resolves the flag.
///
/// # Examples
///
/// ```
/// use envy_core::{Flag, FlagValue, ValueType};
///
/// let flag = Flag::new("count-fancy", FlagValue::Int(7), "a fancy count");
/// assert_eq!(flag.name(), "count-fancy");
/// assert_eq!(flag.value_type(), ValueType::Int);
/// assert_eq!(flag.usage(), "a fancy count");
/// assert!(!flag.changed());
/// ```
#[derive(Debug, Clone)]
pub struct Flag {
    name: String,
    shorthand: Option<char>,
    description: String,
    env_hint: Option<String>,
    value: FlagValue,
    default: FlagValue,
    changed: bool,
    env: EnvAnnotations,
}

impl Flag {
    /// Creates a flag whose default is `value`.
    pub fn new(name: impl Into<String>, value: FlagValue, usage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shorthand: None,
            description: usage.into(),
            env_hint: None,
            default: value.clone(),
            value,
            changed: false,
            env: EnvAnnotations::default(),
        }
    }

    /// Adds a single-character shorthand (`-v`).
    pub fn with_shorthand(mut self, shorthand: char) -> Self {
        self.shorthand = Some(shorthand);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shorthand(&self) -> Option<char> {
        self.shorthand
    }

    /// Returns the usage string, including the env hint once the flag has
    /// been resolved (`"set the url [EXAMPLE_URL]"`).
    pub fn usage(&self) -> Cow<'_, str> {
        match &self.env_hint {
            Some(hint) => Cow::Owned(with_env_hint(&self.description, hint)),
            None => Cow::Borrowed(&self.description),
        }
    }

    /// Returns the usage string as declared, without any env hint.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn value(&self) -> &FlagValue {
        &self.value
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    /// Returns the compiled-in default the flag was declared with.
    pub fn default_value(&self) -> &FlagValue {
        &self.default
    }

    /// Returns `true` once the flag was set on the command line.
    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn env(&self) -> &EnvAnnotations {
        &self.env
    }

    /// Parses `raw` with the flag's type-specific setter.
    pub fn set(&mut self, raw: &str) -> Result<(), ValueError> {
        self.value.set(raw)
    }

    pub(crate) fn env_mut(&mut self) -> &mut EnvAnnotations {
        &mut self.env
    }

    pub(crate) fn set_env_hint(&mut self, hint: String) {
        self.env_hint = Some(hint);
    }

    pub(crate) fn mark_changed(&mut self) {
        self.changed = true;
    }
}
