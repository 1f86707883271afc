//! Styled terminal output.

use console::{Style, Term};

/// Writes user-facing progress to the terminal.
///
/// Status lines go to stdout; warnings and errors go to stderr so they stay
/// visible when stdout is redirected.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    stdout: Term,
    stderr: Term,
}

impl OutputManager {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            stdout: Term::stdout(),
            stderr: Term::stderr(),
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Only printed with `--verbose`.
    pub fn verbose(&self, message: &str) -> std::io::Result<()> {
        if self.verbose && !self.quiet {
            self.stdout
                .write_line(&Style::new().dim().apply_to(message).to_string())?;
        }
        Ok(())
    }

    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout.write_line(&format!(
            "{} {message}",
            Style::new().cyan().bold().apply_to("==>")
        ))
    }

    pub fn success(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout.write_line(&format!(
            "{} {message}",
            Style::new().green().bold().apply_to("ok")
        ))
    }

    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stderr.write_line(&format!(
            "{} {message}",
            Style::new().yellow().bold().apply_to("warning:")
        ))
    }

    /// Printed even with `--quiet`.
    pub fn error(&self, message: &str) -> std::io::Result<()> {
        self.stderr.write_line(&format!(
            "{} {message}",
            Style::new().red().bold().apply_to("error:")
        ))
    }

    pub fn section(&self, title: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout.write_line("")?;
        self.stdout
            .write_line(&Style::new().bold().underlined().apply_to(title).to_string())
    }

    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout.write_line(&format!("    {message}"))
    }
}
