//! Per-item approval before a mutating action.

use std::io::{self, BufRead, Write};

use crate::common::{Action, Entry};

/// `rotate` runs unattended unless asked otherwise.
pub const ROTATE_CONFIRMS_BY_DEFAULT: bool = false;
/// `remove` and `compress` ask before every item unless told not to.
pub const STANDALONE_CONFIRMS_BY_DEFAULT: bool = true;

/// Decides whether one action on one entry may proceed.
/// A declined action is skipped silently: no result, no error.
pub trait ConfirmationGate {
    fn approve(&mut self, action: Action, entry: &Entry) -> bool;
}

/// Approves everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

impl ConfirmationGate for AutoApprove {
    fn approve(&mut self, _action: Action, _entry: &Entry) -> bool {
        true
    }
}

/// Declines everything, logging what would have happened.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRun;

impl ConfirmationGate for DryRun {
    fn approve(&mut self, action: Action, entry: &Entry) -> bool {
        tracing::info!(path = %entry.path.display(), %action, "dry run: would {}", verb(action));
        false
    }
}

/// Interactive prompt with yes / yes-to-all / no / no-to-all answers.
/// End of input counts as "no".
pub struct Prompt<R, W> {
    input: R,
    output: W,
    sticky: Option<bool>,
}

impl Prompt<io::StdinLock<'static>, io::Stderr> {
    /// Prompts on stderr, reads answers from stdin.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output, sticky: None }
    }

    fn ask(&mut self, action: Action, entry: &Entry) -> io::Result<bool> {
        loop {
            write!(
                self.output,
                "{} '{}'? [y] Yes  [a] Yes to all  [n] No  [l] No to all (default n): ",
                capitalize(verb(action)),
                entry.path.display()
            )?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(false);
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "a" | "all" => {
                    self.sticky = Some(true);
                    return Ok(true);
                }
                "" | "n" | "no" => return Ok(false),
                "l" | "none" => {
                    self.sticky = Some(false);
                    return Ok(false);
                }
                _ => continue,
            }
        }
    }
}

impl<R: BufRead, W: Write> ConfirmationGate for Prompt<R, W> {
    fn approve(&mut self, action: Action, entry: &Entry) -> bool {
        if let Some(answer) = self.sticky {
            return answer;
        }
        match self.ask(action, entry) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "confirmation prompt failed, declining");
                false
            }
        }
    }
}

fn verb(action: Action) -> &'static str {
    match action {
        Action::Delete => "delete",
        Action::Compress => "compress",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
