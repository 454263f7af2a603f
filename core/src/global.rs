//! Process-wide default flag set.
//!
//! Programs that don't want to pass a [`FlagSet`] around can declare their
//! flags on [`command_line`] and use the functions here, which forward to the
//! explicit-set operations in the crate root. The set is created lazily on
//! first use and lives for the rest of the process. Configure it once during
//! startup, from one thread.
//!
//! Each function locks the set for its own duration, so don't call them while
//! holding the guard returned by [`command_line`].
//!
//! ```no_run
//! use envy_core::global;
//!
//! {
//!     let mut flags = global::command_line();
//!     flags.string("url", "http://127.0.0.1:8080", "set the url").unwrap();
//!     flags.bool("once", false, "perform the thing once and exit").unwrap();
//! }
//!
//! global::disable("once").unwrap();
//! global::resolve("EXAMPLE").unwrap();
//! global::parse().unwrap();
//!
//! let url = global::command_line().get_string("url").unwrap();
//! ```

use std::path::Path;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::flagset::FlagSet;
use crate::overlay;

static COMMAND_LINE: LazyLock<Mutex<FlagSet>> =
    LazyLock::new(|| Mutex::new(FlagSet::new(program_name())));

fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "envy".to_string())
}

/// Locks and returns the default flag set.
pub fn command_line() -> MutexGuard<'static, FlagSet> {
    COMMAND_LINE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs [`overlay::resolve`] on the default flag set.
pub fn resolve(prefix: &str) -> Result<()> {
    overlay::resolve(prefix, &mut command_line())
}

/// Runs [`overlay::disable`] on the default flag set.
pub fn disable(name: &str) -> Result<()> {
    overlay::disable(name, &mut command_line())
}

/// Runs [`overlay::set_custom_name`] on the default flag set.
pub fn set_custom_name(name: &str, env_name: &str) -> Result<()> {
    overlay::set_custom_name(name, env_name, &mut command_line())
}

/// Parses the process arguments into the default flag set with
/// [`FlagSet::parse`].
///
/// Returns [`Error::HelpRequested`](crate::Error::HelpRequested) for
/// `-h`/`--help`; print [`FlagSet::usage_text`] and exit in that case.
pub fn parse() -> Result<()> {
    command_line().parse(
        std::env::args_os()
            .skip(1)
            .map(|arg| arg.to_string_lossy().into_owned()),
    )
}
