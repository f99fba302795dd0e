//! Configuration management for the `tile-layer` command.
//!
//! This module provides the command-line interface:
//! - Subcommands via clap (`check`, `migrate`, `styles`)
//! - Environment variables with `TILE_LAYER_` prefix for global options
//! - Sensible defaults for all optional settings
//!
//! # Environment Variables
//!
//! - `TILE_LAYER_CACHE_CAPACITY` - Max layer files kept compiled (default: 64)
//! - `TILE_LAYER_SERVE_STALE` - Keep using the last good layer when a file fails to load

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::reload::{ReloadPolicy, DEFAULT_RELOAD_CACHE_CAPACITY};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Tile Layer - inspect and migrate tile layer configuration files.
#[derive(Parser, Debug, Clone)]
#[command(name = "tile-layer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Maximum number of layer files kept compiled.
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_RELOAD_CACHE_CAPACITY,
        env = "TILE_LAYER_CACHE_CAPACITY"
    )]
    pub cache_capacity: usize,

    /// Keep using the last good layer when a file fails to load.
    #[arg(long, global = true, default_value_t = false, env = "TILE_LAYER_SERVE_STALE")]
    pub serve_stale: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Load layer files, apply migrations and report their contents.
    Check(CheckConfig),

    /// Rewrite a layer file in the current format.
    Migrate(MigrateConfig),

    /// Print the cached styles of a layer.
    Styles(StylesConfig),
}

#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    /// Layer configuration files (JSON).
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Fail if a layer declares no MIME formats or no grid subsets.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MigrateConfig {
    /// Layer configuration file (JSON).
    pub file: PathBuf,

    /// Write the migrated layer here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite the input file.
    #[arg(long, default_value_t = false, conflicts_with = "output")]
    pub in_place: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StylesConfig {
    /// Layer configuration file (JSON).
    pub file: PathBuf,

    /// Styles the layer offers (comma-separated), used to bind the style filter.
    #[arg(long, value_delimiter = ',')]
    pub available: Option<Vec<String>>,
}

impl Cli {
    /// Validate the global options and the selected command.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_capacity == 0 {
            return Err("cache_capacity must be greater than 0".to_string());
        }

        match &self.command {
            Command::Check(config) => config.validate(),
            Command::Migrate(config) => config.validate(),
            Command::Styles(_) => Ok(()),
        }
    }

    /// Failure policy for the layer registry.
    pub fn reload_policy(&self) -> ReloadPolicy {
        if self.serve_stale {
            ReloadPolicy::ServeStale
        } else {
            ReloadPolicy::Propagate
        }
    }
}

impl CheckConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.files.iter().any(|f| f.as_os_str().is_empty()) {
            return Err("Layer file paths must not be empty".to_string());
        }
        Ok(())
    }
}

impl MigrateConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.output.as_ref() == Some(&self.file) {
            return Err(
                "Output is the input file. Use --in-place to overwrite it".to_string(),
            );
        }
        Ok(())
    }

    /// Where the migrated layer goes; `None` means stdout.
    pub fn destination(&self) -> Option<&PathBuf> {
        if self.in_place {
            Some(&self.file)
        } else {
            self.output.as_ref()
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
