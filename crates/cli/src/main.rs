mod config;
mod report;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use recast_engine::{sniff, Category, Engine, SourceFile};

use crate::config::CliConfig;
use crate::report::{format_size, ConversionReport, ValidationReport};

#[derive(Parser)]
#[command(name = "recast", about = "Classify files and convert them between registered formats")]
struct Args {
    /// Path to a TOML config file (caller-side policy, e.g. size ceiling)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit machine-readable JSON instead of human output
    #[arg(long)]
    json: bool,

    /// Suppress color output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a file and list its legal conversion targets
    Inspect {
        file: PathBuf,

        /// Declared MIME type, as the file's source environment attached it
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
    },

    /// List supported categories, extensions and conversion targets
    Formats,

    /// Convert a file to a target format
    Convert {
        file: PathBuf,

        /// Target extension, e.g. `pdf`
        #[arg(long)]
        to: String,

        /// Output path (defaults to the renamed artifact in the current directory)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Declared MIME type of the source file
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    let cfg = config::load(args.config.as_deref())?;
    let engine = Engine::new();

    match args.command {
        Command::Inspect { file, mime } => inspect(&engine, &cfg, &file, &mime, args.json).await,
        Command::Formats => {
            formats(&engine, args.json);
            Ok(())
        }
        Command::Convert { file, to, out, mime } => {
            convert(&engine, &cfg, &file, &to, out, &mime, args.json).await
        }
    }
}

async fn inspect(
    engine: &Engine,
    cfg: &CliConfig,
    path: &Path,
    declared_mime: &str,
    json: bool,
) -> Result<()> {
    check_size_ceiling(cfg, path).await?;
    let header = read_header(path).await?;
    let name = file_name_of(path)?;

    match engine.validate_file(&name, declared_mime, &header) {
        Ok(class) => {
            let targets = engine.legal_targets(&class.extension);
            if json {
                println!("{}", serde_json::to_string_pretty(&ValidationReport::ok(&class, targets))?);
                return Ok(());
            }
            println!(
                "{} {} ({} .{})",
                "valid".green().bold(),
                name,
                class.category,
                class.extension
            );
            if targets.is_empty() {
                println!("no conversion targets defined for .{}", class.extension);
            } else {
                println!("targets: {}", targets.join(", ").cyan());
            }
            Ok(())
        }
        Err(err) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&ValidationReport::err(&err))?);
                std::process::exit(1);
            }
            Err(err.into())
        }
    }
}

fn formats(engine: &Engine, json: bool) {
    let registry = engine.registry();

    if json {
        let mut doc = serde_json::Map::new();
        for category in Category::ALL {
            let mut entry = serde_json::Map::new();
            for ext in registry.extensions(category) {
                entry.insert(
                    ext.to_string(),
                    serde_json::json!(registry.legal_targets(ext)),
                );
            }
            doc.insert(category.label().to_string(), entry.into());
        }
        println!("{}", serde_json::Value::Object(doc));
        return;
    }

    for category in Category::ALL {
        println!("{}", category.label().cyan().bold());
        for ext in registry.extensions(category) {
            let targets = registry.legal_targets(ext);
            if targets.is_empty() {
                println!("  {ext}");
            } else {
                println!("  {ext} -> {}", targets.join(", "));
            }
        }
    }
}

async fn convert(
    engine: &Engine,
    cfg: &CliConfig,
    path: &Path,
    target: &str,
    out: Option<PathBuf>,
    declared_mime: &str,
    json: bool,
) -> Result<()> {
    check_size_ceiling(cfg, path).await?;

    let name = file_name_of(path)?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    // Classification first, then authorization inside `convert`; the
    // engine re-checks the pair even though `inspect` may already have
    // shown it as legal.
    engine.validate_file(&name, declared_mime, &bytes)?;

    let mut handle = engine.convert(SourceFile { name, declared_mime: declared_mime.to_string(), bytes }, target)?;

    let mut cancel_requested = false;
    loop {
        tokio::select! {
            maybe = handle.recv_progress() => match maybe {
                Some(pct) => {
                    if !json {
                        eprint!("\rconverting {pct:>3}%");
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                cancel_requested = true;
                break;
            }
        }
    }
    if cancel_requested {
        handle.cancel();
    }
    if !json {
        eprintln!();
    }

    let artifact = handle.wait().await?;

    let out_path = out.unwrap_or_else(|| PathBuf::from(&artifact.file_name));
    tokio::fs::write(&out_path, &artifact.bytes)
        .await
        .with_context(|| format!("writing {}", out_path.display()))?;
    tracing::debug!(path = %out_path.display(), "artifact written");

    if json {
        let report = ConversionReport::succeeded(&artifact, engine.transcoder_name());
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {} ({}, {} -> {}, ratio {:.1}%)",
        "wrote".green().bold(),
        out_path.display(),
        artifact.mime_type,
        format_size(artifact.original_size),
        format_size(artifact.converted_size),
        artifact.compression_ratio(),
    );
    if engine.transcoder_name() == "passthrough" {
        eprintln!(
            "{}",
            "note: passthrough rewrap; the bytes were renamed and re-tagged, not re-encoded"
                .yellow()
        );
    }
    Ok(())
}

/// Enforce the caller-side size ceiling before the engine sees the file.
async fn check_size_ceiling(cfg: &CliConfig, path: &Path) -> Result<()> {
    let meta = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    if meta.len() > cfg.max_file_size_bytes() {
        bail!(
            "{} is {}, over the {} limit",
            path.display(),
            format_size(meta.len()),
            format_size(cfg.max_file_size_bytes())
        );
    }
    Ok(())
}

/// Read the leading bytes the sniffer looks at.
async fn read_header(path: &Path) -> Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("opening {}", path.display()))?;
    let mut header = [0u8; sniff::SNIFF_LEN];
    let mut filled = 0;
    while filled < header.len() {
        let n = file.read(&mut header[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(header[..filled].to_vec())
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no usable file name", path.display()))
}
