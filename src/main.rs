//! # rakshctl
//!
//! Command-line entry point. Parses arguments, sets up logging, and drives the
//! library.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{AppCommands, Cli, Commands, CreateArgs, DecryptArgs};
use rakshctl::config::default_workers;
use rakshctl::manifest::{decrypt_config_maps, find_manifests};
use rakshctl::{
    AesGcmEncryptor, KindRegistry, LogConfig, LogFormat, ManifestTransformer, RunConfig,
    TransformConfig,
};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&log.default_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match log.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Cancel the returned token on Ctrl-C
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let signal_token = token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl-C, finishing in-flight files");
            signal_token.cancel();
        }
    });

    token
}

async fn create(args: CreateArgs) -> Result<ExitCode> {
    let key = args.key.load().context("Failed to load encryption key")?;

    let mut registry = KindRegistry::builtin();
    for spec in args.workload_kinds {
        if registry.register_spec(spec).is_some() {
            debug!("Custom workload kind replaces a built-in registration");
        }
    }

    let config = TransformConfig::new(args.image)
        .with_scratch_image(args.scratch_image)
        .with_vault_secret(args.vault_secret);
    let transformer = Arc::new(ManifestTransformer::new(
        registry,
        config,
        AesGcmEncryptor::new(key),
    ));

    let files = find_manifests(&args.filename)
        .with_context(|| format!("Failed to read {}", args.filename.display()))?;
    if files.is_empty() {
        warn!("No manifest files found in {}", args.filename.display());
        return Ok(ExitCode::SUCCESS);
    }

    let run_config = RunConfig {
        output_dir: args.output,
        workers: args.workers.map_or_else(default_workers, usize::from),
        fail_fast: !args.keep_going,
    };

    let report = rakshctl::run(transformer, files, &run_config, install_signal_handler()).await;

    for (path, error) in report.failures() {
        eprintln!("❌ {}: {}", path.display(), error);
    }
    println!("{report}");

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn decrypt(args: &DecryptArgs) -> Result<ExitCode> {
    let key = args.key.load().context("Failed to load encryption key")?;
    let content = std::fs::read_to_string(&args.filename)
        .with_context(|| format!("Failed to read {}", args.filename.display()))?;

    let entries = decrypt_config_maps(&content, &AesGcmEncryptor::new(key))
        .with_context(|| format!("Failed to decrypt {}", args.filename.display()))?;
    if entries.is_empty() {
        warn!("No secure ConfigMaps found in {}", args.filename.display());
    }

    for entry in entries {
        println!("# {} / {}", entry.config_map, entry.container);
        println!("{}", entry.plaintext.trim_end());
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&LogConfig::from_env());

    info!(
        "rakshctl {} (git {}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_GIT_HASH"),
        env!("BUILD_DATETIME")
    );

    match cli.command {
        Commands::App(AppCommands::Create(args)) => create(args).await,
        Commands::App(AppCommands::Decrypt(args)) => decrypt(&args),
    }
}
