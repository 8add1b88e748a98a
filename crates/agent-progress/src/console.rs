use std::io::{self, Stdout, Write};
use std::time::Duration;

use agent_progress_core::ProgressDisplay;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use owo_colors::OwoColorize;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
const SUCCESS_SYMBOL: &str = "✔";
const FAILURE_SYMBOL: &str = "✖";

/// Builder for [`ConsoleConfig`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConsoleConfigBuilder {
    tick_interval: Option<Duration>,
    colors: Option<bool>,
}

impl ConsoleConfigBuilder {
    /// Creates a builder with default settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how often the spinner advances.
    #[inline]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = Some(tick_interval);
        self
    }

    /// Enables or disables ANSI colors.
    #[inline]
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> ConsoleConfig {
        ConsoleConfig {
            tick_interval: self
                .tick_interval
                .unwrap_or_else(|| Duration::from_millis(80)),
            colors: self.colors.unwrap_or(true),
        }
    }
}

/// Configuration for [`ConsoleDisplay`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConsoleConfig {
    pub(crate) tick_interval: Duration,
    pub(crate) colors: bool,
}

impl Default for ConsoleConfig {
    #[inline]
    fn default() -> Self {
        ConsoleConfigBuilder::new().build()
    }
}

/// A [`ProgressDisplay`] that renders to the terminal.
///
/// Text and terminal status lines go to the writer (stdout by default),
/// the spinner is drawn by `indicatif` on stderr. Text written while the
/// spinner runs is printed with the spinner suspended, so lines never
/// tear.
///
/// Dropping the display clears a running spinner and terminates an
/// unfinished text line.
pub struct ConsoleDisplay<W: Write = Stdout> {
    writer: W,
    config: ConsoleConfig,
    style: ProgressStyle,
    bar: Option<ProgressBar>,
    spinner_visible: bool,
    line_open: bool,
}

impl ConsoleDisplay<Stdout> {
    /// Creates a display writing to stdout, with the spinner on stderr.
    #[inline]
    pub fn new(config: ConsoleConfig) -> Self {
        let mut display = Self::with_writer(io::stdout(), config);
        display.spinner_visible = true;
        display
    }
}

impl<W: Write> ConsoleDisplay<W> {
    /// Creates a display writing to `writer`. The spinner is not drawn.
    pub fn with_writer(writer: W, config: ConsoleConfig) -> Self {
        let style = ProgressStyle::with_template("{spinner:.green} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(TICK_CHARS);
        Self {
            writer,
            config,
            style,
            bar: None,
            spinner_visible: false,
            line_open: false,
        }
    }

    /// Returns the underlying writer.
    #[inline]
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Returns whether a spinner is currently running.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.bar.is_some()
    }

    fn paint_running(&self, label: &str) -> String {
        if self.config.colors {
            label.green().to_string()
        } else {
            label.to_owned()
        }
    }

    fn status_line(&self, label: &str, succeeded: bool) -> String {
        let symbol = if succeeded {
            SUCCESS_SYMBOL
        } else {
            FAILURE_SYMBOL
        };
        match (self.config.colors, succeeded) {
            (false, _) => format!("{symbol} {label}"),
            (true, true) => format!("{} {}", symbol.green(), label.green()),
            (true, false) => format!("{} {}", symbol.red(), label.red()),
        }
    }

    fn write_status(&mut self, label: &str, succeeded: bool) -> io::Result<()> {
        let mut line = String::new();
        if self.line_open {
            line.push('\n');
        }
        line.push_str(&self.status_line(label, succeeded));
        emit(&mut self.writer, self.bar.as_ref(), |w| writeln!(w, "{line}"))?;
        self.line_open = false;
        Ok(())
    }

    fn draw_target(&self) -> ProgressDrawTarget {
        if self.spinner_visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        }
    }
}

impl<W: Write> ProgressDisplay for ConsoleDisplay<W> {
    type Error = io::Error;

    fn write_text(
        &mut self,
        fragment: &str,
        is_final: bool,
    ) -> Result<(), Self::Error> {
        let text = if self.config.colors {
            fragment.bright_white().to_string()
        } else {
            fragment.to_owned()
        };
        emit(&mut self.writer, self.bar.as_ref(), |w| {
            if is_final {
                writeln!(w, "{text}")
            } else {
                write!(w, "{text}")
            }
        })?;
        self.line_open = !is_final;
        Ok(())
    }

    fn begin_progress(&mut self, label: &str) -> Result<(), Self::Error> {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        // The spinner must start on its own line.
        if self.line_open {
            writeln!(self.writer)?;
            self.writer.flush()?;
            self.line_open = false;
        }

        let bar = ProgressBar::with_draw_target(None, self.draw_target());
        bar.set_style(self.style.clone());
        bar.set_message(self.paint_running(label));
        bar.enable_steady_tick(self.config.tick_interval);
        self.bar = Some(bar);
        Ok(())
    }

    fn update_progress(&mut self, label: &str) -> Result<(), Self::Error> {
        if let Some(bar) = &self.bar {
            bar.set_message(self.paint_running(label));
        }
        Ok(())
    }

    fn finish_progress(
        &mut self,
        label: &str,
        succeeded: bool,
    ) -> Result<(), Self::Error> {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        self.write_status(label, succeeded)
    }

    fn print_status(
        &mut self,
        label: &str,
        succeeded: bool,
    ) -> Result<(), Self::Error> {
        self.write_status(label, succeeded)
    }
}

impl<W: Write> Drop for ConsoleDisplay<W> {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        if self.line_open {
            writeln!(self.writer).ok();
        }
        self.writer.flush().ok();
    }
}

fn emit<W: Write>(
    writer: &mut W,
    bar: Option<&ProgressBar>,
    f: impl FnOnce(&mut W) -> io::Result<()>,
) -> io::Result<()> {
    let write = move || {
        f(&mut *writer)?;
        writer.flush()
    };
    match bar {
        Some(bar) => bar.suspend(write),
        None => write(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display() -> ConsoleDisplay<Vec<u8>> {
        let config = ConsoleConfigBuilder::new()
            .with_colors(false)
            .with_tick_interval(Duration::from_millis(10))
            .build();
        ConsoleDisplay::with_writer(vec![], config)
    }

    fn output(display: &ConsoleDisplay<Vec<u8>>) -> &str {
        str::from_utf8(display.writer()).unwrap()
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_default_config() {
        let config = ConsoleConfig::default();
        assert_eq!(config.tick_interval, Duration::from_millis(80));
        assert!(config.colors);
    }

    #[test]
    fn test_streamed_text() {
        let mut display = display();
        display.write_text("Hel", false).unwrap();
        display.write_text("lo", false).unwrap();
        display.write_text("!", true).unwrap();
        assert_eq!(output(&display), "Hello!\n");
    }

    #[test]
    fn test_progress_lifecycle() {
        let mut display = display();
        display.write_text("Checking", false).unwrap();
        display.begin_progress("lookup: Preparing...").unwrap();
        assert!(display.is_active());
        display.update_progress("lookup: 2 chars").unwrap();
        display.write_text("still streaming", true).unwrap();
        display
            .finish_progress("lookup completed in 0.10s", true)
            .unwrap();
        assert!(!display.is_active());

        display.begin_progress("notify: Preparing...").unwrap();
        display
            .finish_progress("notify failed after 1.00s", false)
            .unwrap();

        assert_eq!(
            output(&display),
            "Checking\n\
             still streaming\n\
             ✔ lookup completed in 0.10s\n\
             ✖ notify failed after 1.00s\n"
        );
    }

    #[test]
    fn test_replacing_indicator_prints_nothing() {
        let mut display = display();
        display.begin_progress("a").unwrap();
        display.begin_progress("b").unwrap();
        assert!(display.is_active());
        assert_eq!(output(&display), "");
    }

    #[test]
    fn test_detached_status_keeps_indicator() {
        let mut display = display();
        display.begin_progress("notify").unwrap();
        display.print_status("lookup completed in 0.50s", true).unwrap();
        assert!(display.is_active());
        assert_eq!(output(&display), "✔ lookup completed in 0.50s\n");
    }

    #[test]
    fn test_update_without_indicator() {
        let mut display = display();
        display.update_progress("nothing").unwrap();
        assert!(!display.is_active());
        assert_eq!(output(&display), "");
    }

    #[test]
    fn test_status_closes_open_line() {
        let mut display = display();
        display.write_text("partial", false).unwrap();
        display.finish_progress("done", true).unwrap();
        assert_eq!(output(&display), "partial\n✔ done\n");
    }

    #[test]
    fn test_colored_status() {
        let mut display = ConsoleDisplay::with_writer(
            vec![],
            ConsoleConfigBuilder::new().build(),
        );
        display.print_status("failed", false).unwrap();
        let output = output(&display);
        assert!(output.contains("\u{1b}["));
        assert!(output.contains("failed"));
    }

    #[test]
    fn test_write_failure() {
        let mut display =
            ConsoleDisplay::with_writer(BrokenPipe, ConsoleConfig::default());
        let err = display.write_text("hi", true).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
