//! Ordered, name-addressable collection of flags and the final argv parse.
//!
//! [`FlagSet`] is the collaborator the overlay runs against: callers declare
//! flags, let [`resolve`](crate::resolve) layer environment values on top of
//! the defaults, then call [`FlagSet::parse`] so explicit arguments win.
//!
//! # Examples
//!
//! ```
//! use envy_core::FlagSet;
//!
//! let mut flags = FlagSet::new("example");
//! flags.string("url", "http://127.0.0.1:8080", "set the url").unwrap();
//! flags.int("count", 13, "a standard count").unwrap();
//! flags.bool("once", false, "perform the thing once and exit").unwrap();
//!
//! flags.parse(["--count=2", "--once", "extra"]).unwrap();
//! assert_eq!(flags.get_int("count").unwrap(), 2);
//! assert!(flags.get_bool("once").unwrap());
//! assert_eq!(flags.get_string("url").unwrap(), "http://127.0.0.1:8080");
//! assert_eq!(flags.args(), ["extra"]);
//! ```

use std::collections::HashMap;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, Command};

use crate::error::{Error, Result};
use crate::flag::Flag;
use crate::value::{FlagValue, ValueType};

/// Id of the catch-all positional arg; not a valid flag name.
const POSITIONAL_ID: &str = "--";

/// A set of declared flags.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    name: String,
    flags: Vec<Flag>,
    index: HashMap<String, usize>,
    args: Vec<String>,
    parsed: bool,
}

impl FlagSet {
    /// Creates an empty flag set. `name` is used as the program name in help
    /// output.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declares a flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateFlag`] if the name or shorthand is taken.
    pub fn add(&mut self, flag: Flag) -> Result<()> {
        if self.index.contains_key(flag.name()) {
            return Err(Error::DuplicateFlag(flag.name().to_string()));
        }
        if let Some(shorthand) = flag.shorthand() {
            if self.flags.iter().any(|f| f.shorthand() == Some(shorthand)) {
                return Err(Error::DuplicateFlag(format!("-{shorthand}")));
            }
        }
        self.index.insert(flag.name().to_string(), self.flags.len());
        self.flags.push(flag);
        Ok(())
    }

    pub fn bool(&mut self, name: &str, default: bool, usage: &str) -> Result<()> {
        self.add(Flag::new(name, FlagValue::Bool(default), usage))
    }

    pub fn string(&mut self, name: &str, default: &str, usage: &str) -> Result<()> {
        self.add(Flag::new(name, FlagValue::String(default.to_string()), usage))
    }

    pub fn int(&mut self, name: &str, default: i64, usage: &str) -> Result<()> {
        self.add(Flag::new(name, FlagValue::Int(default), usage))
    }

    pub fn uint(&mut self, name: &str, default: u64, usage: &str) -> Result<()> {
        self.add(Flag::new(name, FlagValue::Uint(default), usage))
    }

    pub fn float(&mut self, name: &str, default: f64, usage: &str) -> Result<()> {
        self.add(Flag::new(name, FlagValue::Float(default), usage))
    }

    pub fn duration(&mut self, name: &str, default: Duration, usage: &str) -> Result<()> {
        self.add(Flag::new(name, FlagValue::Duration(default), usage))
    }

    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.index.get(name).map(|&i| &self.flags[i])
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Flag> {
        self.index.get(name).map(|&i| &mut self.flags[i])
    }

    /// Iterates flags in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Flag> {
        self.flags.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Positional arguments collected by [`parse`](Self::parse).
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn parsed(&self) -> bool {
        self.parsed
    }

    /// Builds the [`clap::Command`] used for the final parse and for help.
    ///
    /// Each flag becomes a long option (plus its shorthand) taking a raw
    /// string, so values go through [`FlagValue::set`] rather than clap's
    /// own parsers. Bool flags take an optional `=value` and may be grouped
    /// (`-vo`). Remaining arguments are collected as positionals.
    pub fn command(&self) -> Command {
        let help_taken = self.index.contains_key("help")
            || self.flags.iter().any(|f| f.shorthand() == Some('h'));

        let mut command = Command::new(self.name.clone())
            .no_binary_name(true)
            .args_override_self(true)
            .disable_help_flag(help_taken);

        for flag in &self.flags {
            let mut arg = Arg::new(flag.name().to_string())
                .long(flag.name().to_string())
                .help(flag.usage().into_owned())
                .value_name(flag.value_type().to_string())
                .action(ArgAction::Set);
            if let Some(shorthand) = flag.shorthand() {
                arg = arg.short(shorthand);
            }
            arg = if flag.value_type() == ValueType::Bool {
                arg.num_args(0..=1)
                    .require_equals(true)
                    .default_missing_value("true")
            } else {
                arg.num_args(1).allow_hyphen_values(true)
            };
            if let Some(default) = default_hint(flag.default_value()) {
                arg = arg.default_value(default);
            }
            command = command.arg(arg);
        }

        command.arg(
            Arg::new(POSITIONAL_ID)
                .value_name("ARGS")
                .num_args(0..)
                .action(ArgAction::Append),
        )
    }

    /// Parses command-line arguments, not including the program name.
    ///
    /// Accepts `--name value`, `--name=value`, `-n value` and `-n=value`.
    /// Bool flags may omit the value and their shorthands may be grouped.
    /// `--` ends flag parsing; the remaining non-flag arguments replace
    /// [`args`](Self::args). Values set here overwrite both the default and
    /// anything the environment overlay applied; a repeated flag keeps its
    /// last value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HelpRequested`] for `-h`/`--help` when no flag claims
    /// them, [`Error::CommandLine`] for anything clap rejects, or
    /// [`Error::InvalidValue`] when a flag's setter rejects its value.
    pub fn parse<I, S>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let matches = self
            .command()
            .try_get_matches_from(args)
            .map_err(|err| match err.kind() {
                ErrorKind::DisplayHelp => Error::HelpRequested,
                _ => Error::CommandLine(err.to_string().trim_end().to_string()),
            })?;

        for flag in &mut self.flags {
            if matches.value_source(flag.name()) != Some(ValueSource::CommandLine) {
                continue;
            }
            let Some(raw) = matches.get_one::<String>(flag.name()) else {
                continue;
            };
            flag.set(raw).map_err(|source| Error::InvalidValue {
                flag: flag.name().to_string(),
                source,
            })?;
            flag.mark_changed();
        }

        self.args = matches
            .get_many::<String>(POSITIONAL_ID)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        self.parsed = true;
        Ok(())
    }

    fn value_of(&self, name: &str) -> Result<&FlagValue> {
        self.lookup(name)
            .map(Flag::value)
            .ok_or_else(|| Error::FlagNotFound(name.to_string()))
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.value_of(name)? {
            FlagValue::Bool(v) => Ok(*v),
            other => Err(mismatch(name, ValueType::Bool, other)),
        }
    }

    pub fn get_string(&self, name: &str) -> Result<String> {
        match self.value_of(name)? {
            FlagValue::String(v) => Ok(v.clone()),
            other => Err(mismatch(name, ValueType::String, other)),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<i64> {
        match self.value_of(name)? {
            FlagValue::Int(v) => Ok(*v),
            other => Err(mismatch(name, ValueType::Int, other)),
        }
    }

    pub fn get_uint(&self, name: &str) -> Result<u64> {
        match self.value_of(name)? {
            FlagValue::Uint(v) => Ok(*v),
            other => Err(mismatch(name, ValueType::Uint, other)),
        }
    }

    pub fn get_float(&self, name: &str) -> Result<f64> {
        match self.value_of(name)? {
            FlagValue::Float(v) => Ok(*v),
            other => Err(mismatch(name, ValueType::Float, other)),
        }
    }

    pub fn get_duration(&self, name: &str) -> Result<Duration> {
        match self.value_of(name)? {
            FlagValue::Duration(v) => Ok(*v),
            other => Err(mismatch(name, ValueType::Duration, other)),
        }
    }

    /// Renders clap's help for this set.
    ///
    /// Usage strings include the env hint once the set has been resolved.
    /// Non-zero defaults are shown as `[default: ...]`.
    ///
    /// ```
    /// use envy_core::FlagSet;
    ///
    /// let mut flags = FlagSet::new("example");
    /// flags.int("count", 13, "a standard count").unwrap();
    /// flags.bool("once", false, "perform the thing once").unwrap();
    ///
    /// let help = flags.usage_text();
    /// assert!(help.contains("--count <int>"));
    /// assert!(help.contains("a standard count [default: 13]"));
    /// assert!(help.contains("perform the thing once"));
    /// ```
    pub fn usage_text(&self) -> String {
        self.command().render_help().to_string()
    }
}

fn mismatch(name: &str, expected: ValueType, actual: &FlagValue) -> Error {
    Error::TypeMismatch {
        flag: name.to_string(),
        expected,
        actual: actual.value_type(),
    }
}

fn default_hint(value: &FlagValue) -> Option<String> {
    match value {
        FlagValue::Bool(false) | FlagValue::Int(0) | FlagValue::Uint(0) => None,
        FlagValue::Float(v) if *v == 0.0 => None,
        FlagValue::Duration(v) if v.is_zero() => None,
        FlagValue::String(v) if v.is_empty() => None,
        other => Some(other.to_string()),
    }
}
