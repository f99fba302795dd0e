//! Tile Layer - inspect and migrate tile layer configuration files.
//!
//! Layer files are loaded through a reload registry, so every command sees
//! the same normalized form the caching service would.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tile_layer_core::{
    config::{CheckConfig, Cli, Command, MigrateConfig, StylesConfig},
    is_expiry_sentinel,
    reload::{LayerConfigCompiler, ReloadRegistry},
    TileLayerConfig,
};

type LayerRegistry = ReloadRegistry<TileLayerConfig>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Err(e) = cli.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let registry = ReloadRegistry::with_capacity(LayerConfigCompiler, cli.cache_capacity)
        .with_policy(cli.reload_policy());

    match &cli.command {
        Command::Check(config) => run_check(&registry, config),
        Command::Migrate(config) => run_migrate(&registry, config),
        Command::Styles(config) => run_styles(&registry, config),
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tile_layer_core=debug,tile_layer=debug"
    } else {
        "tile_layer_core=info,tile_layer=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// =============================================================================
// Check Command
// =============================================================================

fn run_check(registry: &LayerRegistry, config: &CheckConfig) -> ExitCode {
    let mut failures = 0;

    for file in &config.files {
        println!("{}", file.display());

        let layer = match registry.get(file) {
            Ok(layer) => layer,
            Err(e) => {
                println!("  ✗ {}", e);
                failures += 1;
                continue;
            }
        };

        let problems = strict_problems(&layer);
        print_summary(&layer);

        if config.strict && !problems.is_empty() {
            for problem in &problems {
                println!("  ✗ {}", problem);
            }
            failures += 1;
        } else {
            println!("  ✓ ok");
        }
    }

    println!();
    if failures > 0 {
        println!("✗ {} of {} layer(s) failed", failures, config.files.len());
        ExitCode::FAILURE
    } else {
        println!("✓ All {} layer(s) passed", config.files.len());
        ExitCode::SUCCESS
    }
}

fn print_summary(layer: &TileLayerConfig) {
    println!("  Name: {} (id: {})", layer.name(), layer.id());
    println!("  Enabled: {}", layer.is_enabled());
    println!(
        "  Formats: {}",
        layer.mime_formats().iter().cloned().collect::<Vec<_>>().join(", ")
    );
    println!(
        "  Grid subsets: {}",
        layer
            .grid_subsets()
            .iter()
            .map(|g| g.grid_set_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "  Meta-tiling: {}x{}, gutter {}",
        layer.meta_tiling_x(),
        layer.meta_tiling_y(),
        layer.gutter()
    );
    println!(
        "  Expire cache: {}{}, clients: {}{}",
        layer.expire_cache(),
        sentinel_marker(layer.expire_cache()),
        layer.expire_clients(),
        sentinel_marker(layer.expire_clients())
    );
    println!(
        "  Parameter filters: {}",
        layer
            .parameter_filter_store()
            .keys()
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Auto-cache styles: {}", layer.is_auto_cache_styles());
}

fn sentinel_marker(seconds: i32) -> &'static str {
    if is_expiry_sentinel(seconds) {
        " (sentinel)"
    } else {
        ""
    }
}

fn strict_problems(layer: &TileLayerConfig) -> Vec<&'static str> {
    let mut problems = Vec::new();
    if layer.mime_formats().is_empty() {
        problems.push("no MIME formats declared");
    }
    if layer.grid_subsets().is_empty() {
        problems.push("no grid subsets declared");
    }
    problems
}

// =============================================================================
// Migrate Command
// =============================================================================

fn run_migrate(registry: &LayerRegistry, config: &MigrateConfig) -> ExitCode {
    let layer = match registry.get(&config.file) {
        Ok(layer) => layer,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let json = match serde_json::to_string_pretty(layer.artifact()) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize {}: {}", config.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match config.destination() {
        Some(out) => {
            if let Err(e) = std::fs::write(out, json + "\n") {
                error!("Failed to write {}: {}", out.display(), e);
                return ExitCode::FAILURE;
            }
            debug!(from = %config.file.display(), to = %out.display(), "Migrated layer");
        }
        None => println!("{}", json),
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Styles Command
// =============================================================================

fn run_styles(registry: &LayerRegistry, config: &StylesConfig) -> ExitCode {
    let compiled = match registry.get(&config.file) {
        Ok(layer) => layer,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut layer = compiled.artifact().clone();
    if let Some(ref available) = config.available {
        layer.bind_available_styles(available.iter().cloned());
    }

    if layer.is_auto_cache_styles() {
        println!("(auto: all styles offered by the layer are cached)");
        return ExitCode::SUCCESS;
    }

    let styles = layer.cached_styles();
    if styles.is_empty() {
        println!("(no cached styles)");
    }
    for style in styles {
        println!("{}", style);
    }

    ExitCode::SUCCESS
}
