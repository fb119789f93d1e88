// CLI module for argument parsing and configuration

use crate::domain::format::OutputFormat;
use crate::domain::{normalize_extension, SUPPORTED_EXTENSIONS};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// docmerger - Merge PDFs, images and text files from the terminal
///
/// Pick files from a directory, put them in order and combine them into one
/// PDF, TXT or PNG under <DIRECTORY>/result.
#[derive(Parser, Debug, Clone)]
#[command(name = "docmerger")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding the files to merge
    ///
    /// If not specified, defaults to the current directory.
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Show files with this extension
    ///
    /// Can be specified multiple times. Example: --ext pdf --ext png
    /// Defaults to the filters saved from the last session.
    #[arg(short = 'e', long = "ext")]
    pub extensions: Vec<String>,

    /// Output format (pdf, txt or png)
    #[arg(short = 'f', long = "format")]
    pub format: Option<String>,

    /// Output file name, without extension
    #[arg(short = 'o', long = "output")]
    pub output: Option<String>,

    /// Merge these files in this order and exit, without the TUI
    #[arg(long = "files", num_args = 1..)]
    pub files: Vec<String>,

    /// Overwrite an existing output without asking
    #[arg(short = 'y', long = "yes", action = ArgAction::SetTrue)]
    pub yes: bool,

    /// Write logs to this file instead of the default cache location
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Show the welcome screen even if it was already seen
    #[arg(long = "welcome", action = ArgAction::SetTrue)]
    pub welcome: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Normalized extension filters, or `None` when none were given
    pub fn get_extension_filters(&self) -> Option<Vec<String>> {
        if self.extensions.is_empty() {
            None
        } else {
            Some(
                self.extensions
                    .iter()
                    .map(|e| normalize_extension(e))
                    .collect(),
            )
        }
    }

    pub fn get_format(&self) -> Option<OutputFormat> {
        self.format.as_ref().and_then(|f| f.parse().ok())
    }

    /// Validate the arguments and return any errors
    pub fn validate(&self) -> Result<(), String> {
        if !self.directory.exists() {
            return Err(format!(
                "Directory does not exist: {}",
                self.directory.display()
            ));
        }

        if !self.directory.is_dir() {
            return Err(format!(
                "Path is not a directory: {}",
                self.directory.display()
            ));
        }

        for raw in &self.extensions {
            let ext = normalize_extension(raw);
            if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
                return Err(format!(
                    "Unsupported extension: '{}'. Use one of: {}",
                    raw,
                    SUPPORTED_EXTENSIONS.join(" ")
                ));
            }
        }

        if let Some(ref format) = self.format {
            if let Err(e) = format.parse::<OutputFormat>() {
                return Err(e.to_string());
            }
        }

        if let Some(ref output) = self.output {
            if output.trim().is_empty() {
                return Err("Output name cannot be empty".to_string());
            }
        }

        if !self.files.is_empty() && self.output.is_none() {
            return Err("--files requires --output".to_string());
        }

        Ok(())
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub directory: PathBuf,
    pub extension_filters: Option<Vec<String>>,
    pub format: Option<OutputFormat>,
    pub output_name: Option<String>,
    pub files: Vec<String>,
    pub assume_yes: bool,
    pub log_file: Option<PathBuf>,
    pub show_welcome: bool,
}

impl AppConfig {
    /// Headless runs merge the `--files` list once and exit.
    pub fn is_headless(&self) -> bool {
        !self.files.is_empty()
    }
}

impl From<Args> for AppConfig {
    fn from(args: Args) -> Self {
        AppConfig {
            extension_filters: args.get_extension_filters(),
            format: args.get_format(),
            directory: args.directory,
            output_name: args.output.map(|o| o.trim().to_string()),
            files: args.files,
            assume_yes: args.yes,
            log_file: args.log_file,
            show_welcome: args.welcome,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            directory: PathBuf::from("."),
            extension_filters: None,
            format: None,
            output_name: None,
            files: Vec::new(),
            assume_yes: false,
            log_file: None,
            show_welcome: false,
        }
    }
}
