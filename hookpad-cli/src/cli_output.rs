// ABOUTME: Centralized CLI output utilities for consistent user-facing messages
// ABOUTME: Formats errors with their cause chain and SDK help text, plus warnings and notices

use hookpad_sdk::HookpadError;
use owo_colors::OwoColorize;
use std::io::IsTerminal;

pub struct CliOutput {
    use_color: bool,
}

impl CliOutput {
    /// Create new CLI output utility with TTY detection
    pub fn new() -> Self {
        Self {
            use_color: std::io::stderr().is_terminal(),
        }
    }

    pub fn with_color(use_color: bool) -> Self {
        Self { use_color }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{}", self.label("error:", message, Tone::Red));
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{}", self.label("warning:", message, Tone::Yellow));
    }

    pub fn info(&self, message: &str) {
        eprintln!("{}", self.label("info:", message, Tone::Blue));
    }

    pub fn success(&self, message: &str) {
        eprintln!("{}", self.label("success:", message, Tone::Green));
    }

    /// Print an error with its causes, followed by a hint when the root
    /// cause is an SDK error that has one.
    pub fn report(&self, err: &anyhow::Error) {
        self.error(&format!("{:#}", err));

        let help = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<HookpadError>())
            .and_then(HookpadError::help_text);
        if let Some(help) = help {
            self.info(help);
        }
    }

    fn label(&self, label: &str, message: &str, tone: Tone) -> String {
        if !self.use_color {
            return format!("{} {}", label, message);
        }
        let label = match tone {
            Tone::Red => label.red().bold().to_string(),
            Tone::Yellow => label.yellow().bold().to_string(),
            Tone::Blue => label.blue().bold().to_string(),
            Tone::Green => label.green().bold().to_string(),
        };
        format!("{} {}", label, message)
    }
}

enum Tone {
    Red,
    Yellow,
    Blue,
    Green,
}

impl Default for CliOutput {
    fn default() -> Self {
        Self::new()
    }
}
