//! Colored terminal output honoring `--verbose` and `--quiet`.

use owo_colors::{OwoColorize, Stream};
use std::io::{self, Write};

/// Writes user-facing status lines.
///
/// Errors always print (to stderr); everything else is suppressed by
/// `quiet`, and [`OutputManager::verbose`] additionally needs `verbose`.
#[derive(Debug, Clone, Copy)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
}

impl OutputManager {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if !self.verbose || self.quiet {
            return Ok(());
        }
        let mut out = io::stdout().lock();
        writeln!(
            out,
            "  {}",
            message.if_supports_color(Stream::Stdout, |t| t.dimmed())
        )
    }

    pub fn progress(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut out = io::stdout().lock();
        writeln!(
            out,
            "  {} {message}",
            "→".if_supports_color(Stream::Stdout, |t| t.cyan())
        )
    }

    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut out = io::stdout().lock();
        writeln!(
            out,
            "  {} {message}",
            "✓".if_supports_color(Stream::Stdout, |t| t.green())
        )
    }

    pub fn warn(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut out = io::stdout().lock();
        writeln!(
            out,
            "  {} {message}",
            "!".if_supports_color(Stream::Stdout, |t| t.yellow())
        )
    }

    pub fn error(&self, message: &str) -> io::Result<()> {
        let mut err = io::stderr().lock();
        writeln!(
            err,
            "{} {message}",
            "error:".if_supports_color(Stream::Stderr, |t| t.red())
        )
    }

    pub fn section(&self, title: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut out = io::stdout().lock();
        writeln!(out)?;
        writeln!(
            out,
            "{}",
            title.if_supports_color(Stream::Stdout, |t| t.bold())
        )
    }

    pub fn indent(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(io::stdout().lock(), "    {message}")
    }

    /// Print a line verbatim, e.g. data the user asked for.
    pub fn plain(&self, message: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{message}")
    }
}
