//! Read-dispatch-render loop
//!
//! Drives a [`Shell`] from an interactive terminal: reads one line, runs one
//! dispatch cycle, and hands the outcome to exactly one of the two
//! caller-supplied renderer callbacks. The loop survives every
//! per-invocation failure and exits only on a handler's stop directive or
//! end-of-input.

use miette::{Report, Result};
use reedline::{Reedline, Signal};
use tracing::debug;

use crate::cmd::Signature;
use crate::data::Value;
use crate::shell::{Outcome, Shell};
use crate::term::prompt::ShellPrompt;

/// Interactive session driver around a [`Shell`]
pub struct Repl {
    shell: Shell,
    line_editor: Reedline,
}

impl Repl {
    pub fn new(shell: Shell) -> Self {
        Self {
            shell,
            line_editor: Reedline::create(),
        }
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut Shell {
        &mut self.shell
    }

    /// Run the session until a handler issues the stop directive.
    ///
    /// `on_error` receives every failure outcome together with the command
    /// that was being invoked, when resolution had already succeeded;
    /// `on_value` receives every successful outcome.
    pub fn run<E, V>(&mut self, mut on_error: E, mut on_value: V) -> Result<()>
    where
        E: FnMut(&Report, Option<&Signature>),
        V: FnMut(&Signature, Option<&Value>),
    {
        loop {
            if self.shell.stopped() {
                debug!("stop directive issued, leaving session");
                break;
            }

            let prompt = ShellPrompt::new(self.shell.title(), self.shell.marker());
            match self.line_editor.read_line(&prompt) {
                Ok(Signal::Success(line)) => {
                    let Some(outcome) = self.shell.eval_line(&line) else {
                        continue;
                    };
                    render_outcome(&self.shell, outcome, &mut on_error, &mut on_value);
                }
                Ok(Signal::CtrlD) => {
                    debug!("end of input, leaving session");
                    break;
                }
                Ok(Signal::CtrlC) => {
                    // Abandon the current line, show a fresh prompt
                    continue;
                }
                Err(err) => {
                    eprintln!("Error: {}", err);
                    continue;
                }
            }
        }

        Ok(())
    }
}

/// Route one outcome to exactly one renderer callback
pub fn render_outcome<E, V>(shell: &Shell, outcome: Outcome, on_error: &mut E, on_value: &mut V)
where
    E: FnMut(&Report, Option<&Signature>),
    V: FnMut(&Signature, Option<&Value>),
{
    match outcome {
        Outcome::Value { command, value } => {
            if let Some(sig) = shell.signature(command) {
                on_value(sig, value.as_ref());
            }
        }
        Outcome::Failure { command, error } => {
            let sig = command.and_then(|id| shell.signature(id));
            on_error(&error, sig);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::Command;
    use crate::error::ShellError;
    use pretty_assertions::assert_eq;

    fn shell_with_commands() -> Shell {
        let mut shell = Shell::builder("Test").build();
        shell
            .register(
                Command::new("greet", "Greets").handler(|_, _| Ok(Some(Value::from("hello")))),
            )
            .unwrap();
        shell
            .register(
                Command::new("fail", "Always fails")
                    .handler(|_, _| Err(ShellError::handler("it broke").into())),
            )
            .unwrap();
        shell
    }

    #[test]
    fn test_value_outcome_routes_to_value_renderer() {
        let mut shell = shell_with_commands();
        let outcome = shell.eval_line("greet").unwrap();

        let mut errors = Vec::new();
        let mut values = Vec::new();
        render_outcome(
            &shell,
            outcome,
            &mut |error: &Report, _sig: Option<&Signature>| errors.push(error.to_string()),
            &mut |sig: &Signature, value: Option<&Value>| {
                values.push((sig.name().to_string(), value.cloned()))
            },
        );

        assert!(errors.is_empty());
        assert_eq!(
            values,
            vec![("greet".to_string(), Some(Value::from("hello")))]
        );
    }

    #[test]
    fn test_failure_outcome_routes_to_error_renderer_with_command() {
        let mut shell = shell_with_commands();
        let outcome = shell.eval_line("fail").unwrap();

        let mut errors = Vec::new();
        let mut values = Vec::new();
        render_outcome(
            &shell,
            outcome,
            &mut |error: &Report, sig: Option<&Signature>| {
                errors.push((error.to_string(), sig.map(|s| s.name().to_string())))
            },
            &mut |_sig: &Signature, _value: Option<&Value>| values.push(()),
        );

        assert!(values.is_empty());
        assert_eq!(
            errors,
            vec![("it broke".to_string(), Some("fail".to_string()))]
        );
    }

    #[test]
    fn test_resolution_failure_has_no_command() {
        let mut shell = shell_with_commands();
        let outcome = shell.eval_line("frob").unwrap();

        let mut seen = Vec::new();
        render_outcome(
            &shell,
            outcome,
            &mut |_error: &Report, sig: Option<&Signature>| {
                seen.push(sig.map(|s| s.name().to_string()))
            },
            &mut |_sig: &Signature, _value: Option<&Value>| panic!("value renderer must not fire"),
        );

        assert_eq!(seen, vec![None]);
    }
}
