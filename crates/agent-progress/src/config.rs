use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::path::PathBuf;
use std::time::Duration;

use crate::console::{ConsoleConfig, ConsoleConfigBuilder};
use crate::source::Format;

/// An invalid configuration value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigError {
    var: &'static str,
    value: String,
}

impl ConfigError {
    /// Returns the name of the offending variable.
    #[inline]
    pub fn var(&self) -> &str {
        self.var
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value for {}: {:?}", self.var, self.value)
    }
}

impl StdError for ConfigError {}

/// Builder for [`ReplayConfig`].
#[derive(Clone, Debug, Default)]
pub struct ReplayConfigBuilder {
    input: Option<PathBuf>,
    format: Option<Format>,
    delay: Option<Duration>,
    console: ConsoleConfigBuilder,
}

impl ReplayConfigBuilder {
    /// Creates a builder that replays stdin as JSON lines.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the recording from a file instead of stdin.
    #[inline]
    pub fn with_input<P: Into<PathBuf>>(mut self, input: P) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Sets the framing of the recording.
    #[inline]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets a pause between consecutive events.
    #[inline]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sets how often the spinner advances.
    #[inline]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.console = self.console.with_tick_interval(tick_interval);
        self
    }

    /// Enables or disables ANSI colors.
    #[inline]
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.console = self.console.with_colors(colors);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> ReplayConfig {
        ReplayConfig {
            input: self.input,
            format: self.format.unwrap_or_default(),
            delay: self.delay.unwrap_or_default(),
            console: self.console.build(),
        }
    }
}

/// Configuration of the replay program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayConfig {
    /// The recording to replay; stdin if `None`.
    pub input: Option<PathBuf>,
    /// The framing of the recording.
    pub format: Format,
    /// Pause between consecutive events.
    pub delay: Duration,
    /// Terminal display settings.
    pub console: ConsoleConfig,
}

impl ReplayConfig {
    /// Reads the configuration from the process environment.
    ///
    /// - `AGENT_PROGRESS_INPUT`: path of the recording.
    /// - `AGENT_PROGRESS_FORMAT`: `jsonl` or `sse`.
    /// - `AGENT_PROGRESS_DELAY_MS`: pause between events.
    /// - `AGENT_PROGRESS_TICK_MS`: spinner tick interval.
    /// - `NO_COLOR`: disables colors when set to anything.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `var`, which looks up a variable
    /// by name.
    pub fn from_vars(
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ReplayConfigBuilder::new();
        if let Some(input) = var("AGENT_PROGRESS_INPUT") {
            builder = builder.with_input(input);
        }
        if let Some(format) = var("AGENT_PROGRESS_FORMAT") {
            let format = format.parse().map_err(|_| ConfigError {
                var: "AGENT_PROGRESS_FORMAT",
                value: format.clone(),
            })?;
            builder = builder.with_format(format);
        }
        if let Some(delay) = millis(&var, "AGENT_PROGRESS_DELAY_MS")? {
            builder = builder.with_delay(delay);
        }
        if let Some(tick) = millis(&var, "AGENT_PROGRESS_TICK_MS")? {
            if tick.is_zero() {
                return Err(ConfigError {
                    var: "AGENT_PROGRESS_TICK_MS",
                    value: "0".to_owned(),
                });
            }
            builder = builder.with_tick_interval(tick);
        }
        if var("NO_COLOR").is_some() {
            builder = builder.with_colors(false);
        }
        Ok(builder.build())
    }
}

fn millis(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(value) = var(name) else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(ms) => Ok(Some(Duration::from_millis(ms))),
        Err(_) => Err(ConfigError { var: name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ReplayConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ReplayConfig::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config, ReplayConfigBuilder::new().build());
        assert_eq!(config.input, None);
        assert_eq!(config.format, Format::JsonLines);
        assert_eq!(config.delay, Duration::ZERO);
        assert_eq!(config.console, ConsoleConfig::default());
    }

    #[test]
    fn test_all_vars() {
        let config = from_pairs(&[
            ("AGENT_PROGRESS_INPUT", "/tmp/session.sse"),
            ("AGENT_PROGRESS_FORMAT", "sse"),
            ("AGENT_PROGRESS_DELAY_MS", "120"),
            ("AGENT_PROGRESS_TICK_MS", "40"),
            ("NO_COLOR", ""),
        ])
        .unwrap();
        let expected = ReplayConfigBuilder::new()
            .with_input("/tmp/session.sse")
            .with_format(Format::Sse)
            .with_delay(Duration::from_millis(120))
            .with_tick_interval(Duration::from_millis(40))
            .with_colors(false)
            .build();
        assert_eq!(config, expected);
    }

    #[test]
    fn test_invalid_values() {
        let err = from_pairs(&[("AGENT_PROGRESS_FORMAT", "xml")]).unwrap_err();
        assert_eq!(err.var(), "AGENT_PROGRESS_FORMAT");

        let err =
            from_pairs(&[("AGENT_PROGRESS_DELAY_MS", "-5")]).unwrap_err();
        assert_eq!(err.var(), "AGENT_PROGRESS_DELAY_MS");

        let err = from_pairs(&[("AGENT_PROGRESS_TICK_MS", "0")]).unwrap_err();
        assert_eq!(err.var(), "AGENT_PROGRESS_TICK_MS");
    }
}
