//! Environment overlay: derive an env var name per flag and layer its value
//! over the flag's default.
//!
//! Precedence, lowest to highest: compiled-in default, environment variable,
//! explicit command-line argument. The overlay only handles the middle layer,
//! so it must run after all flags are declared and before the final parse.
//!
//! Name derivation for a flag:
//!
//! 1. a disabled flag is skipped entirely;
//! 2. a custom name is used verbatim, ignoring the prefix;
//! 3. otherwise the name is the normalized prefix followed by the flag name,
//!    uppercased with `-` replaced by `_` (`count-fancy` → `EXAMPLE_COUNT_FANCY`).
//!
//! # Examples
//!
//! ```
//! use std::collections::HashMap;
//! use envy_core::{FlagSet, disable, resolve_with, set_custom_name};
//!
//! let mut flags = FlagSet::new("example");
//! flags.string("url", "http://127.0.0.1:8080", "set the url").unwrap();
//! flags.string("kube-config", "~/.kube/config", "set the kube config").unwrap();
//! flags.bool("once", false, "perform the thing once and exit").unwrap();
//!
//! disable("once", &mut flags).unwrap();
//! set_custom_name("kube-config", "KUBECONFIG", &mut flags).unwrap();
//!
//! let env = HashMap::from([("EXAMPLE_URL", "http://10.0.0.1"), ("EXAMPLE_ONCE", "true")]);
//! resolve_with("example", &mut flags, &env).unwrap();
//!
//! let url = flags.lookup("url").unwrap();
//! assert_eq!(url.usage(), "set the url [EXAMPLE_URL http://10.0.0.1]");
//! assert_eq!(flags.get_string("url").unwrap(), "http://10.0.0.1");
//! assert_eq!(flags.lookup("kube-config").unwrap().usage(), "set the kube config [KUBECONFIG]");
//! assert_eq!(flags.lookup("once").unwrap().usage(), "perform the thing once and exit");
//! assert!(!flags.get_bool("once").unwrap());
//! ```

use tracing::{debug, trace, warn};

use crate::env::{Environment, ProcessEnv};
use crate::error::{Error, Result};
use crate::flag::Flag;
use crate::flagset::FlagSet;
use crate::value::{ValueType, parse_bool};

/// Per-flag overlay settings.
///
/// Both settings are one-way: a flag cannot be re-enabled once disabled, and
/// its custom name cannot be replaced once set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvAnnotations {
    disabled: bool,
    custom_name: Option<String>,
}

impl EnvAnnotations {
    /// Returns `true` if the overlay skips this flag.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the prefix-independent env var name, if one was set.
    pub fn custom_name(&self) -> Option<&str> {
        self.custom_name.as_deref()
    }

    pub(crate) fn disable(&mut self) {
        self.disabled = true;
    }

    pub(crate) fn set_custom_name(&mut self, flag: &str, env_name: &str) -> Result<()> {
        if let Some(existing) = &self.custom_name {
            return Err(Error::DuplicateCustomName {
                flag: flag.to_string(),
                existing: existing.clone(),
            });
        }
        self.custom_name = Some(normalize_env_name(env_name));
        Ok(())
    }
}

/// Normalizes a prefix for concatenation with flag names.
///
/// The prefix is uppercased and stripped of trailing underscores, then a
/// single `_` separator is appended. A prefix that is empty after stripping
/// yields an empty string, with no separator.
///
/// ```
/// use envy_core::normalize_prefix;
///
/// assert_eq!(normalize_prefix("foo_"), "FOO_");
/// assert_eq!(normalize_prefix("FOO"), "FOO_");
/// assert_eq!(normalize_prefix(""), "");
/// ```
pub fn normalize_prefix(prefix: &str) -> String {
    let upper = prefix.to_uppercase();
    let trimmed = upper.trim_end_matches('_');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}_")
    }
}

/// Uppercases `name` and replaces `-` with `_`.
pub fn normalize_env_name(name: &str) -> String {
    name.replace('-', "_").to_uppercase()
}

/// Derives the env var name for a flag, or `None` if the flag is disabled.
///
/// `prefix` must already be normalized with [`normalize_prefix`].
///
/// ```
/// use envy_core::{EnvAnnotations, env_name_for};
///
/// let annotations = EnvAnnotations::default();
/// assert_eq!(
///     env_name_for("EXAMPLE_", "count-fancy", &annotations).as_deref(),
///     Some("EXAMPLE_COUNT_FANCY"),
/// );
/// assert_eq!(env_name_for("", "url", &annotations).as_deref(), Some("URL"));
/// ```
pub fn env_name_for(prefix: &str, flag_name: &str, annotations: &EnvAnnotations) -> Option<String> {
    if annotations.is_disabled() {
        return None;
    }
    match annotations.custom_name() {
        Some(custom) => Some(custom.to_string()),
        None => Some(format!("{prefix}{}", normalize_env_name(flag_name))),
    }
}

/// Builds the bracketed hint body: `ENV` or `ENV value`.
pub(crate) fn env_hint(env_name: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => format!("{env_name} {value}"),
        None => env_name.to_string(),
    }
}

pub(crate) fn with_env_hint(usage: &str, hint: &str) -> String {
    format!("{usage} [{hint}]")
}

/// Appends the env hint to a usage string.
///
/// ```
/// use envy_core::annotate_usage;
///
/// assert_eq!(annotate_usage("verbose usage", "FOO_VERBOSE", None), "verbose usage [FOO_VERBOSE]");
/// assert_eq!(
///     annotate_usage("verbose usage", "FOO_VERBOSE", Some("true")),
///     "verbose usage [FOO_VERBOSE true]",
/// );
/// ```
pub fn annotate_usage(usage: &str, env_name: &str, value: Option<&str>) -> String {
    with_env_hint(usage, &env_hint(env_name, value))
}

/// Overlays process environment variables onto `flags`.
///
/// See [`resolve_with`].
pub fn resolve(prefix: &str, flags: &mut FlagSet) -> Result<()> {
    resolve_with(prefix, flags, &ProcessEnv)
}

/// Overlays variables from `env` onto every flag in `flags`.
///
/// Each resolved flag gets its usage annotated with the env var name, plus
/// the value when the variable is set. A set variable is passed to the
/// flag's setter. A value the setter rejects is logged and the default is
/// kept, except for bool flags.
///
/// # Errors
///
/// Returns [`Error::InvalidBoolEnvValue`] when a bool flag's variable is not a
/// bool literal. Flags resolved before the failing one stay modified.
pub fn resolve_with<E>(prefix: &str, flags: &mut FlagSet, env: &E) -> Result<()>
where
    E: Environment + ?Sized,
{
    let prefix = normalize_prefix(prefix);

    for flag in flags.iter_mut() {
        let Some(env_name) = env_name_for(&prefix, flag.name(), flag.env()) else {
            trace!(flag = flag.name(), "environment overlay disabled");
            continue;
        };

        let value = env.var(&env_name);
        if let Some(raw) = value.as_deref() {
            apply_env_value(flag, &env_name, raw)?;
        }
        flag.set_env_hint(env_hint(&env_name, value.as_deref()));
    }

    Ok(())
}

fn apply_env_value(flag: &mut Flag, env_name: &str, raw: &str) -> Result<()> {
    if flag.value_type() == ValueType::Bool && parse_bool(raw).is_none() {
        return Err(Error::InvalidBoolEnvValue {
            flag: flag.name().to_string(),
            env_name: env_name.to_string(),
            value: raw.to_string(),
        });
    }

    match flag.set(raw) {
        Ok(()) => debug!(flag = flag.name(), env = env_name, "applied environment override"),
        Err(err) => warn!(
            flag = flag.name(),
            env = env_name,
            error = %err,
            "ignoring environment override"
        ),
    }
    Ok(())
}

/// Excludes the named flag from every later [`resolve`] pass.
///
/// # Errors
///
/// Returns [`Error::FlagNotFound`] if `name` is not declared in `flags`.
pub fn disable(name: &str, flags: &mut FlagSet) -> Result<()> {
    let flag = flags
        .lookup_mut(name)
        .ok_or_else(|| Error::FlagNotFound(name.to_string()))?;
    flag.env_mut().disable();
    Ok(())
}

/// Binds the named flag to an exact env var name that ignores the prefix.
///
/// `env_name` is uppercased with `-` replaced by `_` before it is stored.
///
/// # Errors
///
/// Returns [`Error::FlagNotFound`] if `name` is not declared, or
/// [`Error::DuplicateCustomName`] if the flag already has a custom name, even
/// an identical one.
pub fn set_custom_name(name: &str, env_name: &str, flags: &mut FlagSet) -> Result<()> {
    let flag = flags
        .lookup_mut(name)
        .ok_or_else(|| Error::FlagNotFound(name.to_string()))?;
    flag.env_mut().set_custom_name(name, env_name)
}
