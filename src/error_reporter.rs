use tracing::{error, info, warn};

use crate::config::{ConfigError, OutputConfig};
use crate::error::{RowErrors, ValidationError};

/// Verbosity levels for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Error kind and location only
    Quiet,
    /// Location and root cause
    Normal,
    /// Adds the offending value and a suggestion
    Verbose,
    /// Adds the raw error structure and the full source chain
    Debug,
}

impl From<&OutputConfig> for VerbosityLevel {
    fn from(output: &OutputConfig) -> Self {
        if output.quiet {
            VerbosityLevel::Quiet
        } else if output.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Renders validation failures and emits them as log events
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    verbosity: VerbosityLevel,
}

impl ErrorReporter {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self { verbosity }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    /// Report a validation error with appropriate verbosity
    pub fn report_validation_error(&self, error: &ValidationError) {
        let formatted = self.format_validation_error(error);
        if error.is_cancelled() {
            warn!("{}", formatted);
        } else {
            error!("{}", formatted);
        }
    }

    /// Report every failing row of a collect-all validation
    pub fn report_row_errors(&self, rows: &RowErrors) {
        warn!("{}", rows);
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }
        for row in &rows.errors {
            error!("{}", self.format_validation_error(row));
        }
    }

    /// Report a configuration error
    pub fn report_config_error(&self, error: &ConfigError) {
        error!("{}", self.format_config_error(error));
    }

    /// Report a successful validation of `count` values
    pub fn report_success(&self, count: usize) {
        if self.verbosity != VerbosityLevel::Quiet {
            info!(count, "validation succeeded");
        }
    }

    /// Render a validation error at the configured verbosity
    pub fn format_validation_error(&self, error: &ValidationError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => self.format_error_brief(error),
            VerbosityLevel::Normal => self.format_error_normal(error),
            VerbosityLevel::Verbose => self.format_error_verbose(error),
            VerbosityLevel::Debug => self.format_error_debug(error),
        }
    }

    pub fn format_config_error(&self, error: &ConfigError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => format!("Config error: {}", error),
            VerbosityLevel::Normal | VerbosityLevel::Verbose => {
                format!(
                    "Configuration Error: {}\n{}",
                    error,
                    self.get_config_help(error)
                )
            }
            VerbosityLevel::Debug => {
                format!(
                    "Configuration Error: {}\nDebug: {:?}\n{}",
                    error,
                    error,
                    self.get_config_help(error)
                )
            }
        }
    }

    fn format_error_brief(&self, error: &ValidationError) -> String {
        match error.trail() {
            Some(trail) => format!("{}: {}", error.kind_label(), trail),
            None => error.kind_label().to_string(),
        }
    }

    fn format_error_normal(&self, error: &ValidationError) -> String {
        match error.trail() {
            Some(trail) => format!("{}: {}", trail, error.root_cause()),
            None => error.root_cause().to_string(),
        }
    }

    fn format_error_verbose(&self, error: &ValidationError) -> String {
        let mut output = self.format_error_normal(error);

        match error.root_cause() {
            ValidationError::TypeMismatch { expected, found } => {
                output.push_str(&format!(
                    "\nSuggestion: Provide a value of kind {} instead of {}",
                    expected, found
                ));
            }
            ValidationError::FieldNotFound { path } => {
                output.push_str(&format!(
                    "\nSuggestion: Add a non-null value for '{}'",
                    path
                ));
            }
            ValidationError::UnmetRequirement { value, cause, .. } => {
                output.push_str(&format!("\nValue: {}", value));
                if let Some(cause) = cause {
                    output.push_str(&format!("\nCause: {}", cause));
                }
                output.push_str("\nSuggestion: Check the value against the schema's requirement");
            }
            ValidationError::Cancelled => {
                output.push_str("\nSuggestion: Increase the timeout or avoid cancelling the call");
            }
            ValidationError::NestedFailure { .. } => {}
        }

        output
    }

    fn format_error_debug(&self, error: &ValidationError) -> String {
        let mut output = self.format_error_verbose(error);
        output.push_str(&format!("\nDebug Info: {:?}", error));

        output.push_str("\nError Chain:");
        let mut current_error: &dyn std::error::Error = error;
        let mut level = 0;
        while let Some(source) = current_error.source() {
            output.push_str(&format!("\n  {}: {}", level + 1, source));
            current_error = source;
            level += 1;
        }

        output
    }

    fn get_config_help(&self, error: &ConfigError) -> String {
        match error {
            ConfigError::Io(_) => "Check that the configuration file exists and is readable".to_string(),
            ConfigError::TomlParsing(_) | ConfigError::JsonParsing(_) => {
                "Check the configuration file syntax (TOML/JSON format expected)".to_string()
            }
            ConfigError::UnsupportedFormat(ext) => {
                format!("Rename the configuration file from .{} to .toml or .json", ext)
            }
            ConfigError::Environment(_) => {
                "Fix the VALIDATE_JSON_* environment variable value".to_string()
            }
            ConfigError::Validation(_) => {
                "Adjust the engine settings to a supported range".to_string()
            }
            ConfigError::ThreadPool(_) => {
                "Lower the number of workers or check system thread limits".to_string()
            }
        }
    }
}
