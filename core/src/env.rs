//! Sources of environment variables.
//!
//! The overlay reads variables through [`Environment`] so it can run against
//! the real process environment ([`ProcessEnv`]) or a plain map in tests and
//! embedded use.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

/// Read-only lookup of environment variables.
pub trait Environment {
    /// Returns the value of `key`, or `None` if it is not set.
    fn var(&self, key: &str) -> Option<String>;
}

/// The environment of the current process.
///
/// Values that are not valid Unicode are converted lossily rather than
/// treated as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
    }
}

impl<K, V, S> Environment for HashMap<K, V, S>
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<str>,
    S: BuildHasher,
{
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).map(|value| value.as_ref().to_string())
    }
}

impl<K, V> Environment for BTreeMap<K, V>
where
    K: Borrow<str> + Ord,
    V: AsRef<str>,
{
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).map(|value| value.as_ref().to_string())
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}
