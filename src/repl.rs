//! Interactive chat loop.
//!
//! Reads one line at a time and either answers it as a question or runs a
//! `set` command against the [`Controller`]:
//!
//! ```text
//! You: set strategy document
//! Strategy changed to: document
//! You: What is course 4361?
//! Bot: Course 4361: Software Design Patterns. Description: ...
//! You: exit
//! Goodbye!
//! ```

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use coursebot_core::backend::BACKEND_NAMES;
use coursebot_core::strategy::STRATEGY_NAMES;

use crate::controller::Controller;

/// One parsed line of input.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Empty,
    Exit,
    SetStrategy(&'a str),
    SetBackend(&'a str),
    /// `set strategy` or `set backend` without a name.
    MissingName(&'static str),
    UnknownSet(&'a str),
    Question(&'a str),
}

pub fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    if line.eq_ignore_ascii_case("exit") {
        return Input::Exit;
    }

    // Keywords match case-insensitively; names are passed on as typed.
    let mut words = line.split_whitespace();
    if !words.next().is_some_and(|w| w.eq_ignore_ascii_case("set")) {
        return Input::Question(line);
    }
    let Some(target) = words.next() else {
        return Input::UnknownSet("");
    };
    let name = words.next();
    if target.eq_ignore_ascii_case("strategy") {
        name.map_or(Input::MissingName("strategy"), Input::SetStrategy)
    } else if target.eq_ignore_ascii_case("backend") || target.eq_ignore_ascii_case("provider") {
        name.map_or(Input::MissingName("backend"), Input::SetBackend)
    } else {
        Input::UnknownSet(target)
    }
}

/// Run the loop until `exit` or end of input.
pub async fn run_repl<R, W>(controller: &Controller, input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(output, "You: ")?;
        output.flush()?;

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("input closed");
                writeln!(output)?;
                break;
            }
            Err(e) => {
                warn!("input read error: {e}");
                break;
            }
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Exit => {
                writeln!(output, "Goodbye!")?;
                break;
            }
            Input::SetStrategy(name) => match controller.set_strategy(name) {
                Ok(kind) => writeln!(output, "Strategy changed to: {kind}")?,
                Err(e) => writeln!(output, "Error: {e}")?,
            },
            Input::SetBackend(name) => match controller.set_backend(name) {
                Ok(kind) => writeln!(output, "Backend changed to: {kind}")?,
                Err(e) => writeln!(output, "Error: {e}")?,
            },
            Input::MissingName("strategy") => writeln!(
                output,
                "Usage: set strategy <name> ({})",
                STRATEGY_NAMES.join(", ")
            )?,
            Input::MissingName(_) => writeln!(
                output,
                "Usage: set backend <name> ({})",
                BACKEND_NAMES.join(", ")
            )?,
            Input::UnknownSet(what) => writeln!(
                output,
                "Unknown set command: '{what}'. Use 'set strategy <name>' or 'set backend <name>'."
            )?,
            Input::Question(question) => match controller.ask(question).await {
                Ok(answer) => writeln!(output, "Bot: {answer}")?,
                Err(e) => {
                    warn!(error = %e, "question failed");
                    writeln!(output, "Error: {e}")?;
                }
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_and_exit() {
        assert_eq!(parse_input(""), Input::Empty);
        assert_eq!(parse_input("   "), Input::Empty);
        assert_eq!(parse_input("exit"), Input::Exit);
        assert_eq!(parse_input("  EXIT "), Input::Exit);
    }

    #[test]
    fn test_parse_set_commands() {
        assert_eq!(parse_input("set strategy window"), Input::SetStrategy("window"));
        assert_eq!(parse_input("set backend gemini"), Input::SetBackend("gemini"));
        assert_eq!(parse_input("set provider openai"), Input::SetBackend("openai"));
        assert_eq!(parse_input("set strategy"), Input::MissingName("strategy"));
        assert_eq!(parse_input("set provider"), Input::MissingName("backend"));
        assert_eq!(parse_input("set colour blue"), Input::UnknownSet("colour"));
        assert_eq!(parse_input("set"), Input::UnknownSet(""));
    }

    #[test]
    fn test_parse_set_keywords_ignore_case() {
        assert_eq!(parse_input("Set strategy window"), Input::SetStrategy("window"));
        assert_eq!(parse_input("SET Backend openai"), Input::SetBackend("openai"));
        assert_eq!(parse_input("set PROVIDER gemini"), Input::SetBackend("gemini"));
        // The name itself keeps its case and is rejected later.
        assert_eq!(parse_input("set strategy Window"), Input::SetStrategy("Window"));
    }

    #[test]
    fn test_parse_questions() {
        assert_eq!(
            parse_input("  What is course 4361? "),
            Input::Question("What is course 4361?")
        );
        // Only a leading `set` word is a command.
        assert_eq!(
            parse_input("settings for 2320"),
            Input::Question("settings for 2320")
        );
        assert_eq!(parse_input("exit now"), Input::Question("exit now"));
    }
}
