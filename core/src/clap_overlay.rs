//! Environment overlay for [`clap::Command`].
//!
//! Applies the same name derivation and help annotation as
//! [`resolve`](crate::resolve), but the environment value becomes the arg's
//! default value instead of being written to a [`FlagSet`](crate::FlagSet).
//! clap's own parse then applies explicit arguments on top, which keeps the
//! default < environment < command line precedence.
//!
//! Only args with a long name take part. They are matched by long name or
//! by arg id.
//!
//! A `SetTrue` arg whose environment value is `true` cannot be switched off
//! from the command line, since clap offers no `--flag=false` for it. Declare
//! such an arg with `ArgAction::Set` and `value_parser!(bool)` instead; it is
//! treated as a bool here and accepts `--flag=false`.
//!
//! ```
//! use std::collections::HashMap;
//! use clap::{Arg, ArgAction, Command};
//! use envy_core::ClapOverlay;
//!
//! let command = Command::new("example")
//!     .arg(Arg::new("url").long("url").default_value("http://127.0.0.1:8080").help("set the url"))
//!     .arg(Arg::new("once").long("once").action(ArgAction::SetTrue).help("perform the thing once"));
//!
//! let mut overlay = ClapOverlay::new(command);
//! overlay.disable("once").unwrap();
//!
//! let env = HashMap::from([("EXAMPLE_URL", "http://10.0.0.1")]);
//! let command = overlay.resolve("EXAMPLE", &env).unwrap();
//!
//! let matches = command.try_get_matches_from(["example"]).unwrap();
//! assert_eq!(matches.get_one::<String>("url").unwrap(), "http://10.0.0.1");
//! assert!(!matches.get_flag("once"));
//! ```

use std::collections::HashMap;

use clap::{Arg, ArgAction, Command};
use tracing::{debug, trace};

use crate::env::Environment;
use crate::error::{Error, Result};
use crate::overlay::{EnvAnnotations, annotate_usage, env_name_for, normalize_prefix};
use crate::value::parse_bool;

/// A [`Command`] plus per-arg overlay settings, keyed by arg id.
#[derive(Debug, Clone)]
pub struct ClapOverlay {
    command: Command,
    annotations: HashMap<String, EnvAnnotations>,
}

struct ArgUpdate {
    id: String,
    help: String,
    default: Option<String>,
}

impl ClapOverlay {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            annotations: HashMap::new(),
        }
    }

    fn arg_id(&self, name: &str) -> Result<String> {
        self.command
            .get_arguments()
            .filter(|arg| arg.get_long().is_some())
            .find(|arg| arg.get_long() == Some(name) || arg.get_id().as_str() == name)
            .map(|arg| arg.get_id().as_str().to_string())
            .ok_or_else(|| Error::FlagNotFound(name.to_string()))
    }

    /// Excludes an arg from the overlay.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FlagNotFound`] if no arg with a long name has this
    /// long name or id. Positionals never match.
    pub fn disable(&mut self, name: &str) -> Result<()> {
        let id = self.arg_id(name)?;
        self.annotations.entry(id).or_default().disable();
        Ok(())
    }

    /// Binds an arg to an exact, prefix-independent env var name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FlagNotFound`] if no arg matches, or
    /// [`Error::DuplicateCustomName`] on a second call for the same arg.
    pub fn set_custom_name(&mut self, name: &str, env_name: &str) -> Result<()> {
        let id = self.arg_id(name)?;
        self.annotations
            .entry(id)
            .or_default()
            .set_custom_name(name, env_name)
    }

    /// Applies `env` to the command's args and returns the updated command.
    ///
    /// Bool args (`SetTrue`/`SetFalse`, or `Set` with a `true`/`false` value
    /// parser) must receive a bool literal; it is stored as a canonical
    /// `true`/`false` default. Other values become the arg's default verbatim
    /// and are validated by clap when the command is parsed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBoolEnvValue`] for a malformed bool value.
    pub fn resolve<E>(self, prefix: &str, env: &E) -> Result<Command>
    where
        E: Environment + ?Sized,
    {
        let prefix = normalize_prefix(prefix);
        let none = EnvAnnotations::default();
        let mut updates = Vec::new();

        for arg in self.command.get_arguments() {
            let Some(long) = arg.get_long() else {
                continue;
            };
            let action = arg.get_action();
            if matches!(
                action,
                ArgAction::Help | ArgAction::HelpShort | ArgAction::HelpLong | ArgAction::Version
            ) {
                continue;
            }

            let id = arg.get_id().as_str().to_string();
            let annotations = self.annotations.get(&id).unwrap_or(&none);
            let Some(env_name) = env_name_for(&prefix, long, annotations) else {
                trace!(flag = long, "environment overlay disabled");
                continue;
            };

            let value = env.var(&env_name);
            let default = match value.as_deref() {
                Some(raw) if is_bool(arg) => {
                    let parsed = parse_bool(raw).ok_or_else(|| Error::InvalidBoolEnvValue {
                        flag: long.to_string(),
                        env_name: env_name.clone(),
                        value: raw.to_string(),
                    })?;
                    Some(parsed.to_string())
                }
                Some(raw) => Some(raw.to_string()),
                None => None,
            };
            if default.is_some() {
                debug!(flag = long, env = %env_name, "applied environment override");
            }

            let description = arg.get_help().map(ToString::to_string).unwrap_or_default();
            updates.push(ArgUpdate {
                id,
                help: annotate_usage(&description, &env_name, value.as_deref()),
                default,
            });
        }

        let mut command = self.command;
        for ArgUpdate { id, help, default } in updates {
            command = command.mut_arg(id, move |arg| {
                let arg = arg.help(help);
                match default {
                    Some(default) => arg.default_value(default),
                    None => arg,
                }
            });
        }
        Ok(command)
    }
}

fn is_bool(arg: &Arg) -> bool {
    match arg.get_action() {
        ArgAction::SetTrue | ArgAction::SetFalse => true,
        ArgAction::Set => {
            let values = arg.get_possible_values();
            values.len() == 2
                && values.iter().any(|v| v.get_name() == "true")
                && values.iter().any(|v| v.get_name() == "false")
        }
        _ => false,
    }
}
#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use clap::{Arg, value_parser};

    use super::*;

    fn example() -> Command {
        Command::new("example")
            .arg(
                Arg::new("url")
                    .long("url")
                    .default_value("http://127.0.0.1:8080")
                    .help("set the url"),
            )
            .arg(
                Arg::new("count")
                    .long("count")
                    .value_parser(value_parser!(i64))
                    .default_value("13")
                    .help("a standard count"),
            )
            .arg(
                Arg::new("once")
                    .long("once")
                    .action(ArgAction::SetTrue)
                    .help("perform the thing once and exit"),
            )
            .arg(
                Arg::new("count_fancy")
                    .long("count-fancy")
                    .value_parser(value_parser!(i64))
                    .default_value("7")
                    .help("a fancy count"),
            )
            .arg(Arg::new("input").help("input file"))
    }

    fn help_of(command: &Command, id: &str) -> String {
        command
            .get_arguments()
            .find(|arg| arg.get_id().as_str() == id)
            .and_then(|arg| arg.get_help())
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    #[test]
    fn test_help_is_annotated_without_env() {
        let env: HashMap<&str, &str> = HashMap::new();
        let command = ClapOverlay::new(example()).resolve("example_", &env).unwrap();

        assert_eq!(help_of(&command, "url"), "set the url [EXAMPLE_URL]");
        assert_eq!(
            help_of(&command, "count_fancy"),
            "a fancy count [EXAMPLE_COUNT_FANCY]"
        );
        assert_eq!(help_of(&command, "input"), "input file");
    }

    #[test]
    fn test_precedence_default_env_command_line() {
        let none: HashMap<&str, &str> = HashMap::new();
        let env = HashMap::from([("EXAMPLE_COUNT", "21"), ("EXAMPLE_ONCE", "1")]);

        let matches = ClapOverlay::new(example())
            .resolve("EXAMPLE", &none)
            .unwrap()
            .try_get_matches_from(["example"])
            .unwrap();
        assert_eq!(matches.get_one::<i64>("count"), Some(&13));
        assert!(!matches.get_flag("once"));

        let command = ClapOverlay::new(example()).resolve("EXAMPLE", &env).unwrap();
        assert_eq!(help_of(&command, "count"), "a standard count [EXAMPLE_COUNT 21]");
        let matches = command.clone().try_get_matches_from(["example"]).unwrap();
        assert_eq!(matches.get_one::<i64>("count"), Some(&21));
        assert!(matches.get_flag("once"));

        let matches = command
            .try_get_matches_from(["example", "--count", "42"])
            .unwrap();
        assert_eq!(matches.get_one::<i64>("count"), Some(&42));
    }

    #[test]
    fn test_invalid_bool_env_fails() {
        let env = HashMap::from([("EXAMPLE_ONCE", "yay")]);
        let err = ClapOverlay::new(example()).resolve("EXAMPLE", &env).unwrap_err();

        assert_eq!(
            err,
            Error::InvalidBoolEnvValue {
                flag: "once".to_string(),
                env_name: "EXAMPLE_ONCE".to_string(),
                value: "yay".to_string(),
            }
        );
    }

    #[test]
    fn test_disabled_and_custom_names() {
        let env = HashMap::from([
            ("EXAMPLE_ONCE", "true"),
            ("EXAMPLE_COUNT_FANCY", "99"),
            ("SERVICE_URL", "http://svc"),
        ]);
        let mut overlay = ClapOverlay::new(example());
        overlay.disable("once").unwrap();
        overlay.disable("count_fancy").unwrap();
        overlay.set_custom_name("url", "service-url").unwrap();

        let command = overlay.resolve("EXAMPLE", &env).unwrap();
        assert_eq!(help_of(&command, "once"), "perform the thing once and exit");
        assert_eq!(help_of(&command, "url"), "set the url [SERVICE_URL http://svc]");

        let matches = command.try_get_matches_from(["example"]).unwrap();
        assert!(!matches.get_flag("once"));
        assert_eq!(matches.get_one::<i64>("count_fancy"), Some(&7));
        assert_eq!(matches.get_one::<String>("url").unwrap(), "http://svc");
    }

    #[test]
    fn test_set_bool_env_can_be_turned_off_on_command_line() {
        let command = example().arg(
            Arg::new("verbose")
                .long("verbose")
                .action(ArgAction::Set)
                .value_parser(value_parser!(bool))
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .default_value("false")
                .help("verbose output"),
        );
        let env = HashMap::from([("EXAMPLE_VERBOSE", "T")]);
        let command = ClapOverlay::new(command).resolve("EXAMPLE", &env).unwrap();

        let matches = command.clone().try_get_matches_from(["example"]).unwrap();
        assert_eq!(matches.get_one::<bool>("verbose"), Some(&true));

        let matches = command
            .try_get_matches_from(["example", "--verbose=false"])
            .unwrap();
        assert_eq!(matches.get_one::<bool>("verbose"), Some(&false));
    }

    #[test]
    fn test_set_bool_env_rejects_non_bool() {
        let command = example().arg(
            Arg::new("verbose")
                .long("verbose")
                .value_parser(value_parser!(bool))
                .help("verbose output"),
        );
        let env = HashMap::from([("EXAMPLE_VERBOSE", "yes")]);
        assert!(matches!(
            ClapOverlay::new(command).resolve("EXAMPLE", &env),
            Err(Error::InvalidBoolEnvValue { ref flag, .. }) if flag == "verbose"
        ));
    }

    #[test]
    fn test_annotation_errors() {
        let mut overlay = ClapOverlay::new(example());
        assert_eq!(
            overlay.disable("missing"),
            Err(Error::FlagNotFound("missing".to_string()))
        );
        assert_eq!(
            overlay.disable("input"),
            Err(Error::FlagNotFound("input".to_string()))
        );
        assert_eq!(
            overlay.set_custom_name("input", "INPUT_FILE"),
            Err(Error::FlagNotFound("input".to_string()))
        );

        overlay.set_custom_name("count-fancy", "FANCY").unwrap();
        assert_eq!(
            overlay.set_custom_name("count_fancy", "FANCY"),
            Err(Error::DuplicateCustomName {
                flag: "count_fancy".to_string(),
                existing: "FANCY".to_string(),
            })
        );
    }
}
