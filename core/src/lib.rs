//! Environment-variable overrides for command-line flags.
//!
//! This crate layers `PREFIX_FLAG_NAME` environment variables over flag
//! defaults, below anything given explicitly on the command line:
//!
//! - [`FlagSet`]: a typed flag set whose final argv parse ([`FlagSet::parse`])
//!   and help go through clap.
//! - [`resolve`] / [`resolve_with`]: derive each flag's env var name, apply
//!   its value, and annotate the usage string (`"set the url [EXAMPLE_URL]"`).
//! - [`disable`]: opt a flag out of the overlay.
//! - [`set_custom_name`]: bind a flag to a fixed, unprefixed variable such as
//!   `KUBECONFIG`.
//! - [`global`]: the same operations on a process-wide default set.
//! - [`ClapOverlay`]: the overlay for a [`clap::Command`].
//!
//! Call order matters: declare flags, set annotations, resolve, then parse.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use envy_core::*;
//!
//! let mut flags = FlagSet::new("example");
//! flags.string("url", "http://127.0.0.1:8080", "set the url").unwrap();
//! flags.int("count", 13, "a standard count").unwrap();
//!
//! let env = HashMap::from([("EXAMPLE_URL", "http://10.0.0.1"), ("EXAMPLE_COUNT", "21")]);
//! resolve_with("example", &mut flags, &env).unwrap();
//! flags.parse(["--count", "42"]).unwrap();
//!
//! assert_eq!(flags.get_string("url").unwrap(), "http://10.0.0.1");
//! assert_eq!(flags.get_int("count").unwrap(), 42);
//! assert_eq!(flags.lookup("count").unwrap().usage(), "a standard count [EXAMPLE_COUNT 21]");
//! ```

mod clap_overlay;
mod env;
mod error;
mod flag;
mod flagset;
pub mod global;
mod overlay;
mod value;

pub use clap_overlay::ClapOverlay;
pub use env::{Environment, ProcessEnv};
pub use error::{Error, Result};
pub use flag::Flag;
pub use flagset::FlagSet;
pub use overlay::{
    EnvAnnotations, annotate_usage, disable, env_name_for, normalize_env_name, normalize_prefix,
    resolve, resolve_with, set_custom_name,
};
pub use value::{FlagValue, ValueError, ValueType, format_duration, parse_bool, parse_duration};
