//! Demo shell built on the verb-shell engine.
//!
//! Wires up an interactive session with env-backed `set`/`get` commands,
//! file printing, OS routing, and a custom boolean parser, then runs the
//! loop with console renderers.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use indexmap::IndexMap;
use miette::{IntoDiagnostic, Result};
use nu_ansi_term::Color::Red;

use verb_shell::render::{format_error, format_value};
use verb_shell::shell::env::EnvStore;
use verb_shell::{Command, ParamType, Repl, Shell, ShellError, Signature, Value};

const APP_TITLE: &str = "CLI App";
const DEFAULT_TABWIDTH: i64 = 4;

fn main() -> Result<()> {
    // Set up miette for readable error reporting
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let shell = build_shell()?;
    let mut repl = Repl::new(shell);

    println!("{}", APP_TITLE);
    println!("Type 'quit' or press Ctrl+D to exit");
    println!();

    repl.run(
        |error, sig| eprintln!("{}", Red.paint(format_error(error, sig))),
        |sig, value| {
            if let Some(line) = format_value(sig, value) {
                println!("{}", line);
            }
        },
    )?;

    Ok(())
}

/// Custom boolean parser replacing the builtin `true`/`false` one
fn parse_bool(entry: &str) -> Result<Value, String> {
    match entry.to_lowercase().as_str() {
        "yes" | "true" | "positive" | "allow" => Ok(Value::Bool(true)),
        "no" | "false" | "negative" | "deny" => Ok(Value::Bool(false)),
        other => Err(format!(
            "`{}` must be one of yes/true/positive/allow or no/false/negative/deny",
            other
        )),
    }
}

fn build_shell() -> Result<Shell> {
    let mut shell = Shell::builder(APP_TITLE)
        .prompt("> ")
        .ignore_case(true)
        .parser(ParamType::Bool, parse_bool)
        .env("username", Value::Nil)
        .env("age", Value::Nil)
        .env("user-items", Value::Obj(IndexMap::new()))
        .env("tabwidth", Value::Int(DEFAULT_TABWIDTH))
        .build();

    shell.register(help_command())?;
    shell.register(clear_command())?;
    shell.register(quit_command())?;

    shell.register_verb("set")?;
    shell.register_noun("set", set_name_command())?;
    shell.register_noun("set", set_age_command())?;
    shell.register_noun("set", set_item_command())?;
    shell.register_noun("set", set_tabwidth_command())?;

    shell.register_verb("get")?;
    shell.register_noun("get", get_name_command())?;
    shell.register_noun("get", get_age_command())?;
    shell.register_noun("get", get_item_command())?;
    shell.register_noun("get", get_tabwidth_command())?;

    shell.register(printfile_command())?;
    shell.register(route_command())?;
    shell.register(echo_command())?;

    Ok(shell)
}

/// The `user-items` object in the env store, created on first use
fn user_items(env: &mut EnvStore) -> Result<&mut IndexMap<String, Value>> {
    if !matches!(env.get("user-items"), Some(Value::Obj(_))) {
        env.set("user-items", Value::Obj(IndexMap::new()));
    }
    match env.get_mut("user-items") {
        Some(Value::Obj(items)) => Ok(items),
        _ => miette::bail!("user-items is not an object"),
    }
}

/// Indentation from the `tabwidth` env key, reseeding the default if unset
fn expanded_tab(env: &mut EnvStore) -> String {
    let width = match env.get("tabwidth") {
        Some(Value::Int(n)) if *n > 0 => *n as usize,
        _ => {
            env.set("tabwidth", Value::Int(DEFAULT_TABWIDTH));
            DEFAULT_TABWIDTH as usize
        }
    };
    " ".repeat(width)
}

fn describe(sig: &Signature, full: bool) -> String {
    if full {
        format!("{} | {}", sig.detail(), sig.description)
    } else {
        sig.detail()
    }
}

fn help_command() -> Command {
    Command::new("help", "Show help for a command, or for all commands")
        .optional("command", ParamType::Str, Value::Nil)
        .optional("full", ParamType::Bool, false)
        .handler(|args, ctx| {
            let full = args.get_bool("full")?;

            if let Some(name) = args.get("command").and_then(Value::as_str) {
                let line = match ctx.find(name) {
                    Some(sig) => describe(sig, full),
                    None => {
                        return Err(ShellError::UnknownCommand {
                            name: name.to_string(),
                        }
                        .into())
                    }
                };
                let options = ctx.options_mut();
                options.insert("title".to_string(), Value::from("Help for"));
                options.insert("delimiter".to_string(), Value::from(" "));
                return Ok(Some(Value::from(line)));
            }

            let tab = expanded_tab(ctx.env);
            let lines: Vec<String> = ctx
                .commands()
                .map(|sig| format!("{}{}", tab, describe(sig, full)))
                .collect();
            let options = ctx.options_mut();
            options.insert("title".to_string(), Value::from("Help"));
            options.insert("delimiter".to_string(), Value::from("\n"));
            Ok(Some(Value::from(lines.join("\n"))))
        })
}

fn clear_command() -> Command {
    Command::new("clear", "Clear the output window")
        .option("ignore-value", true)
        .handler(|_, _| {
            execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0)).into_diagnostic()?;
            Ok(None)
        })
}

fn quit_command() -> Command {
    Command::new("quit", "Exit the program")
        .alias("exit")
        .alias("q")
        .option("ignore-value", true)
        .handler(|_, ctx| {
            ctx.stop();
            Ok(None)
        })
}

fn set_name_command() -> Command {
    Command::new("name", "Set the current user name")
        .optional("name", ParamType::Str, "")
        .handler(|args, ctx| {
            let name = args.get_str("name")?.to_string();
            ctx.env.set("username", Value::from(name.clone()));
            if name.is_empty() {
                ctx.set_title(APP_TITLE);
            } else {
                ctx.set_title(format!("{}@{}", name, APP_TITLE));
            }
            Ok(Some(Value::from(name)))
        })
}

fn set_age_command() -> Command {
    Command::new("age", "Set the stored age")
        .required("age", ParamType::Int)
        .handler(|args, ctx| {
            let age = args.get_int("age")?;
            ctx.env.set("age", Value::Int(age));
            Ok(Some(Value::Int(age)))
        })
}

fn set_item_command() -> Command {
    Command::new("item", "Store a key-value pair")
        .required("key", ParamType::Str)
        .optional("value", ParamType::Str, Value::Nil)
        .handler(|args, ctx| {
            let key = args.get_str("key")?.to_string();
            let value = args.get("value").cloned().unwrap_or(Value::Nil);
            let display = format!("{}:{}", key, value);
            let items = user_items(ctx.env)?;
            let message = if items.insert(key, value).is_some() {
                format!("Overwritten as {}", display)
            } else {
                display
            };
            Ok(Some(Value::from(message)))
        })
}

fn set_tabwidth_command() -> Command {
    Command::new("tabwidth", "Set the indentation width")
        .required("width", ParamType::Int)
        .handler(|args, ctx| {
            let width = args.get_int("width")?;
            if width <= 0 {
                return Err(ShellError::handler("tabwidth must be greater than 0").into());
            }
            ctx.env.set("tabwidth", Value::Int(width));
            Ok(None)
        })
}

fn get_name_command() -> Command {
    Command::new("name", "Get the current user name").handler(|_, ctx| {
        let value = match ctx.env.get("username") {
            Some(Value::Nil) | None => Value::from(""),
            Some(v) => v.clone(),
        };
        Ok(Some(value))
    })
}

fn get_age_command() -> Command {
    Command::new("age", "Get the stored age").handler(|_, ctx| {
        let value = match ctx.env.get("age") {
            Some(Value::Nil) | None => Value::from(""),
            Some(v) => v.clone(),
        };
        Ok(Some(value))
    })
}

fn get_item_command() -> Command {
    Command::new("item", "Get a stored key-value pair, or all of them")
        .optional("key", ParamType::Str, Value::Nil)
        .handler(|args, ctx| {
            if let Some(key) = args.get("key").and_then(Value::as_str) {
                let key = key.to_string();
                let items = user_items(ctx.env)?;
                return Ok(Some(match items.get(&key) {
                    Some(value) => value.clone(),
                    None => Value::from(format!("Key {} does not exist", key)),
                }));
            }

            let tab = expanded_tab(ctx.env);
            let items = user_items(ctx.env)?;
            let lines: Vec<String> = items
                .iter()
                .map(|(key, value)| format!("{}{}:{}", tab, key, value))
                .collect();
            Ok(Some(Value::from(format!("\n{}", lines.join("\n")))))
        })
}

fn get_tabwidth_command() -> Command {
    Command::new("tabwidth", "Get the indentation width").handler(|_, ctx| {
        if ctx.env.get("tabwidth").is_none() {
            ctx.env.set("tabwidth", Value::Int(DEFAULT_TABWIDTH));
        }
        let value = ctx
            .env
            .get("tabwidth")
            .cloned()
            .unwrap_or(Value::Int(DEFAULT_TABWIDTH));
        Ok(Some(value))
    })
}

fn printfile_command() -> Command {
    Command::new("printfile", "Show the contents of a file")
        .alias("print")
        .option("delimiter", ":\n")
        .required("path", ParamType::Str)
        .optional("line_no", ParamType::Bool, false)
        .optional("encoding", ParamType::Str, Value::Nil)
        .handler(|args, ctx| {
            let path = PathBuf::from(args.get_str("path")?);

            if let Some(encoding) = args.get("encoding").and_then(Value::as_str) {
                let canon = encoding.to_lowercase().replace('-', "");
                if canon != "utf8" {
                    return Err(
                        ShellError::handler(format!("unsupported encoding `{}`", encoding)).into(),
                    );
                }
            }

            if !path.is_file() {
                miette::bail!("file {} does not exist", path.display());
            }

            let contents = fs::read_to_string(&path).map_err(|e| {
                ShellError::handler_with_cause(
                    format!("could not read {}", path.display()),
                    e,
                )
            })?;

            let title = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            ctx.options_mut().insert("title".to_string(), Value::from(title));

            if args.get_bool("line_no")? {
                let lines: Vec<&str> = contents.lines().collect();
                let width = lines.len().to_string().len();
                let numbered: Vec<String> = lines
                    .iter()
                    .enumerate()
                    .map(|(i, line)| format!("{:0width$}|{}", i, line, width = width))
                    .collect();
                Ok(Some(Value::from(numbered.join("\n"))))
            } else {
                Ok(Some(Value::from(contents)))
            }
        })
}

fn route_command() -> Command {
    Command::new("route", "Route arguments to the operating system")
        .variadic("args")
        .handler(|args, ctx| {
            let parts: Vec<String> = args.rest("args").iter().map(|v| v.to_string()).collect();
            let title = parts.first().cloned().unwrap_or_else(|| "route".to_string());
            ctx.options_mut().insert("title".to_string(), Value::from(title));

            let Some((program, rest)) = parts.split_first() else {
                return Err(ShellError::handler("route: missing command").into());
            };
            let status = process::Command::new(program)
                .args(rest)
                .status()
                .map_err(|e| {
                    ShellError::handler_with_cause(format!("could not run `{}`", program), e)
                })?;
            Ok(Some(Value::Int(i64::from(status.code().unwrap_or(-1)))))
        })
}

fn echo_command() -> Command {
    Command::new("echo", "Echo the given arguments")
        .option("ignore-value", true)
        .required("string", ParamType::Str)
        .optional("second", ParamType::Str, Value::Nil)
        .optional("flat", ParamType::Bool, false)
        .variadic("args")
        .keywords("kwargs")
        .handler(|args, _| {
            println!("string={}", args.get_str("string")?);
            if let Some(second) = args.get("second").and_then(Value::as_str) {
                println!("second={}", second);
            }

            let rest = args.rest("args");
            let pairs = args.keywords("kwargs");
            if args.get_bool("flat")? {
                if !rest.is_empty() {
                    println!("args={}", Value::Array(rest.to_vec()));
                }
                if let Some(pairs) = pairs.filter(|p| !p.is_empty()) {
                    println!("kwargs={}", Value::Obj(pairs.clone()));
                }
            } else {
                for (i, value) in rest.iter().enumerate() {
                    println!("{}:{}", i, value);
                }
                if let Some(pairs) = pairs {
                    for (key, value) in pairs {
                        println!("{}:{}", key, value);
                    }
                }
            }
            Ok(None)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use verb_shell::Outcome;

    fn expect_value(outcome: Option<Outcome>) -> Option<Value> {
        match outcome {
            Some(Outcome::Value { value, .. }) => value,
            Some(Outcome::Failure { error, .. }) => panic!("unexpected failure: {}", error),
            None => panic!("expected a non-empty cycle"),
        }
    }

    #[test]
    fn test_parse_bool_accepts_the_word_lists() {
        for token in ["yes", "true", "positive", "allow", "Allow", "YES"] {
            assert_eq!(parse_bool(token), Ok(Value::Bool(true)), "token {}", token);
        }
        for token in ["no", "false", "negative", "deny", "DENY"] {
            assert_eq!(parse_bool(token), Ok(Value::Bool(false)), "token {}", token);
        }
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_set_and_get_name_updates_title() {
        let mut shell = build_shell().unwrap();
        let value = expect_value(shell.eval_line("set name bob"));
        assert_eq!(value, Some(Value::from("bob")));
        assert_eq!(shell.title(), "bob@CLI App");
        assert_eq!(
            expect_value(shell.eval_line("get name")),
            Some(Value::from("bob"))
        );

        // Resetting the name restores the default title
        expect_value(shell.eval_line("set name"));
        assert_eq!(shell.title(), "CLI App");
    }

    #[test]
    fn test_item_roundtrip_and_overwrite_message() {
        let mut shell = build_shell().unwrap();
        assert_eq!(
            expect_value(shell.eval_line("set item color red")),
            Some(Value::from("color:red"))
        );
        assert_eq!(
            expect_value(shell.eval_line("set item color blue")),
            Some(Value::from("Overwritten as color:blue"))
        );
        assert_eq!(
            expect_value(shell.eval_line("get item color")),
            Some(Value::from("blue"))
        );
        assert_eq!(
            expect_value(shell.eval_line("get item missing")),
            Some(Value::from("Key missing does not exist"))
        );
    }

    #[test]
    fn test_tabwidth_is_validated_and_stored() {
        let mut shell = build_shell().unwrap();
        match shell.eval_line("set tabwidth 0") {
            Some(Outcome::Failure { error, .. }) => {
                assert!(error.downcast_ref::<ShellError>().is_some());
            }
            _ => panic!("expected a handler failure"),
        }

        expect_value(shell.eval_line("set tabwidth 2"));
        assert_eq!(
            expect_value(shell.eval_line("get tabwidth")),
            Some(Value::Int(2))
        );
    }

    #[test]
    fn test_help_sets_its_own_display_options() {
        let mut shell = build_shell().unwrap();
        let outcome = shell.eval_line("help").unwrap();
        let (id, listing) = match outcome {
            Outcome::Value { command, value } => (command, value.unwrap()),
            Outcome::Failure { error, .. } => panic!("unexpected failure: {}", error),
        };

        let listing = listing.to_string();
        assert!(listing.contains("quit"));
        assert!(listing.contains("set age <age:int>"));

        let sig = shell.signature(id).unwrap();
        assert_eq!(sig.options.get("title"), Some(&Value::from("Help")));
        assert_eq!(sig.options.get("delimiter"), Some(&Value::from("\n")));

        // Help for one command switches to the single-command style
        let value = expect_value(shell.eval_line("help quit"));
        assert_eq!(value, Some(Value::from("quit")));
        let sig = shell.signature(id).unwrap();
        assert_eq!(sig.options.get("title"), Some(&Value::from("Help for")));
    }

    #[test]
    fn test_quit_aliases_stop_the_session() {
        let mut shell = build_shell().unwrap();
        expect_value(shell.eval_line("Q"));
        assert!(shell.stopped());
    }

    #[test]
    fn test_printfile_numbers_lines_and_sets_title() {
        let path = std::env::temp_dir().join("verb-shell-printfile-test.txt");
        fs::write(&path, "alpha\nbeta\ngamma\n").unwrap();

        let mut shell = build_shell().unwrap();
        let line = format!("print {} yes", path.display());
        let outcome = shell.eval_line(&line).unwrap();
        let (id, value) = match outcome {
            Outcome::Value { command, value } => (command, value.unwrap()),
            Outcome::Failure { error, .. } => panic!("unexpected failure: {}", error),
        };
        assert_eq!(value, Value::from("0|alpha\n1|beta\n2|gamma"));

        let sig = shell.signature(id).unwrap();
        assert_eq!(
            sig.options.get("title"),
            Some(&Value::from("verb-shell-printfile-test.txt"))
        );

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_printfile_missing_file_is_unexpected_failure() {
        let mut shell = build_shell().unwrap();
        match shell.eval_line("print /no/such/file") {
            Some(Outcome::Failure { error, .. }) => {
                // Not part of the taxonomy, so the renderer shows the full diagnostic
                assert!(error.downcast_ref::<ShellError>().is_none());
            }
            _ => panic!("expected a failure"),
        }
    }

    #[test]
    fn test_printfile_rejects_unknown_encoding() {
        let mut shell = build_shell().unwrap();
        match shell.eval_line("print whatever no latin-1") {
            Some(Outcome::Failure { error, .. }) => {
                assert!(error.downcast_ref::<ShellError>().is_some());
            }
            _ => panic!("expected a handler failure"),
        }
    }

    #[test]
    fn test_route_without_arguments_fails() {
        let mut shell = build_shell().unwrap();
        match shell.eval_line("route") {
            Some(Outcome::Failure { error, .. }) => {
                assert!(error.downcast_ref::<ShellError>().is_some());
            }
            _ => panic!("expected a handler failure"),
        }
    }
}
