//! Logging setup for the CLI.
//!
//! Everything goes to stderr so that logs never mix with generated output.
//! `RUST_LOG`, when set, replaces the preset chosen on the command line.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("invalid log format '{s}', use 'text' or 'json'")),
        }
    }
}

/// Verbosity presets, from `-q` up to `-vvv`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Errors only.
    Quiet,
    /// Warnings and errors.
    #[default]
    Normal,
    /// Progress messages.
    Verbose,
    /// Dropped records, merge statistics.
    Debug,
    Trace,
}

impl LogPreset {
    /// `-q` wins over any number of `-v`.
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return LogPreset::Quiet;
        }
        match verbose {
            0 => LogPreset::Normal,
            1 => LogPreset::Verbose,
            2 => LogPreset::Debug,
            _ => LogPreset::Trace,
        }
    }

    fn directives(self) -> &'static str {
        match self {
            LogPreset::Quiet => "error",
            LogPreset::Normal => "warn",
            LogPreset::Verbose => "warn,claudebook=info",
            LogPreset::Debug => "warn,claudebook=debug",
            LogPreset::Trace => "claudebook=trace,info",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    pub format: LogFormat,
}

impl LogConfig {
    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }
        EnvFilter::new(self.preset.directives())
    }
}

/// Install the global subscriber. Call once, before any work starts.
pub fn init(config: &LogConfig) {
    let filter = config.build_filter();
    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(true),
                )
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn presets_follow_flag_counts() {
        assert_eq!(LogPreset::from_flags(0, false), LogPreset::Normal);
        assert_eq!(LogPreset::from_flags(1, false), LogPreset::Verbose);
        assert_eq!(LogPreset::from_flags(2, false), LogPreset::Debug);
        assert_eq!(LogPreset::from_flags(7, false), LogPreset::Trace);
        assert_eq!(LogPreset::from_flags(3, true), LogPreset::Quiet);
    }

    #[test]
    fn every_preset_is_a_valid_filter() {
        for preset in [
            LogPreset::Quiet,
            LogPreset::Normal,
            LogPreset::Verbose,
            LogPreset::Debug,
            LogPreset::Trace,
        ] {
            assert!(EnvFilter::try_new(preset.directives()).is_ok(), "{preset:?}");
        }
    }
}
