//! Output formatting utilities

use colored::*;
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::errors::CasperError;
use crate::models::{Page, Resource};
use crate::utils::VersionInfo;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Summary line and table for listings, YAML for single resources
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Render a listing page. `rows` are the table form of `page.items`.
pub fn render_page<R: Tabled>(
    page: &Page<Resource>,
    noun: &str,
    rows: Vec<R>,
    format: OutputFormat,
) -> Result<String, CasperError> {
    match format {
        OutputFormat::Table => {
            let summary = page.summary(noun);
            if rows.is_empty() {
                Ok(summary)
            } else {
                Ok(format!("{}\n{}", summary, Table::new(rows)))
            }
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(page)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(page)?),
    }
}

/// Render a single resource, YAML unless JSON is asked for
pub fn render_single<T: Serialize>(data: &T, format: OutputFormat) -> Result<String, CasperError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::Table | OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
    }
}

pub fn print_page<R: Tabled>(
    page: &Page<Resource>,
    noun: &str,
    rows: Vec<R>,
    format: OutputFormat,
) -> Result<(), CasperError> {
    println!("{}", render_page(page, noun, rows, format)?.trim_end());
    Ok(())
}

pub fn print_single<T: Serialize>(data: &T, format: OutputFormat) -> Result<(), CasperError> {
    println!("{}", render_single(data, format)?.trim_end());
    Ok(())
}

pub fn print_version(info: &VersionInfo, format: OutputFormat) -> Result<(), CasperError> {
    match format {
        OutputFormat::Table => {
            println!(
                "casper {} ({}, built {})",
                info.version, info.git_hash, info.build_time
            );
            Ok(())
        }
        _ => print_single(info, format),
    }
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}
