//! Outcome formatting
//!
//! Pure formatting behind the default renderer callbacks. A value renders as
//! `{title}{delimiter}{value}` under the command's display options, with
//! `Done!` standing in for an absent value; a failure renders either as one
//! concise line (recognized [`ShellError`] kinds, with their chained cause)
//! or as a generic warning plus the full diagnostic for anything else.

use miette::Report;

use crate::cmd::Signature;
use crate::data::Value;
use crate::error::ShellError;

/// Default delimiter between title and value
pub const DEFAULT_DELIMITER: &str = "->";

/// Format a command's returned value under its display options.
///
/// Returns `None` when the command's `ignore-value` option is truthy, in
/// which case nothing at all should be printed.
pub fn format_value(sig: &Signature, value: Option<&Value>) -> Option<String> {
    if sig
        .options
        .get("ignore-value")
        .is_some_and(Value::is_truthy)
    {
        return None;
    }

    let title = match sig.options.get("title") {
        Some(t) => t.to_string(),
        None => sig.name().to_string(),
    };
    let delimiter = match sig.options.get("delimiter") {
        Some(d) => d.to_string(),
        None => DEFAULT_DELIMITER.to_string(),
    };

    Some(match value {
        None | Some(Value::Nil) => format!("{}{}Done!", title, delimiter),
        Some(value) => format!("{}{}{}", title, delimiter, value),
    })
}

/// Format a failure outcome.
///
/// Recognized taxonomy errors produce one concise line naming the command
/// being invoked when there was one, plus a `Cause:` line when the error
/// chains one. Anything else gets a generic warning and the full report.
pub fn format_error(error: &Report, command: Option<&Signature>) -> String {
    match error.downcast_ref::<ShellError>() {
        Some(err) => {
            let mut out = match command {
                Some(sig) => format!("! An error occured running command {}: {}", sig.name(), err),
                None => format!("! An error occured: {}", err),
            };
            if let Some(cause) = std::error::Error::source(err) {
                out.push_str(&format!("\n! Cause: {}", cause));
            }
            out
        }
        None => format!("An unexpected error was raised: {}\n{:?}", error, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::Command;
    use pretty_assertions::assert_eq;

    fn sig_of(command: Command) -> Signature {
        command.sig
    }

    #[test]
    fn test_value_with_default_options() {
        let sig = sig_of(Command::new("greet", "Greets"));
        let line = format_value(&sig, Some(&Value::from("x")));
        assert_eq!(line, Some("greet->x".to_string()));
    }

    #[test]
    fn test_absent_value_renders_done() {
        let sig = sig_of(Command::new("greet", "Greets"));
        assert_eq!(format_value(&sig, None), Some("greet->Done!".to_string()));
        assert_eq!(
            format_value(&sig, Some(&Value::Nil)),
            Some("greet->Done!".to_string())
        );
    }

    #[test]
    fn test_title_and_delimiter_overrides() {
        let sig = sig_of(
            Command::new("help", "Shows help")
                .option("title", "Help")
                .option("delimiter", "\n"),
        );
        let line = format_value(&sig, Some(&Value::from("stuff")));
        assert_eq!(line, Some("Help\nstuff".to_string()));
    }

    #[test]
    fn test_ignore_value_suppresses_everything() {
        let sig = sig_of(Command::new("clear", "Clears").option("ignore-value", true));
        assert_eq!(format_value(&sig, Some(&Value::from("x"))), None);
        assert_eq!(format_value(&sig, None), None);
    }

    #[test]
    fn test_falsy_ignore_value_does_not_suppress() {
        let sig = sig_of(Command::new("clear", "Clears").option("ignore-value", false));
        assert!(format_value(&sig, None).is_some());
    }

    #[test]
    fn test_taxonomy_error_is_one_concise_line() {
        let error = Report::new(ShellError::UnknownCommand {
            name: "frob".to_string(),
        });
        assert_eq!(
            format_error(&error, None),
            "! An error occured: unknown command `frob`"
        );
    }

    #[test]
    fn test_taxonomy_error_names_invoked_command() {
        let sig = sig_of(Command::new("greet", "Greets"));
        let error = Report::new(ShellError::handler("it broke"));
        assert_eq!(
            format_error(&error, Some(&sig)),
            "! An error occured running command greet: it broke"
        );
    }

    #[test]
    fn test_chained_cause_gets_its_own_line() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = Report::new(ShellError::handler_with_cause("could not read", io));
        let sig = sig_of(Command::new("read", "Reads"));
        assert_eq!(
            format_error(&error, Some(&sig)),
            "! An error occured running command read: could not read\n! Cause: gone"
        );
    }

    #[test]
    fn test_unexpected_error_gets_diagnostic_output() {
        let error = miette::miette!("disk on fire");
        let out = format_error(&error, None);
        assert!(out.starts_with("An unexpected error was raised: disk on fire"));
    }
}
