mod cli;

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::Semaphore;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shrinkray_core::{
    load_config_or_default, validate_config, FfmpegEngine, Logger, PipelineOptions, ShrinkRay,
    TranscodeEngine, ZipArchiver,
};

use cli::Args;

type Pipeline = ShrinkRay<FfmpegEngine, ZipArchiver>;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.default_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(args).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = load_config_or_default(args.config.as_deref()).with_context(|| {
        match &args.config {
            Some(path) => format!("Failed to load config from {:?}", path),
            None => "Failed to load default config".to_string(),
        }
    })?;

    if let Some(keep) = args.keep_workspace {
        config.workspace.keep = keep;
    }

    validate_config(&config).context("Configuration validation failed")?;

    let engine = FfmpegEngine::new(config.engine.clone());
    engine
        .validate()
        .await
        .context("FFmpeg is not available")?;

    info!(
        renditions = config.catalog.len(),
        workspace = %config.workspace.root.display(),
        keep = %config.workspace.keep,
        jobs = args.jobs,
        "Configuration loaded"
    );

    let pipeline: Arc<Pipeline> = Arc::new(ShrinkRay::new(config, engine, ZipArchiver::new()));
    let semaphore = Arc::new(Semaphore::new(args.jobs as usize));

    let mut handles = Vec::with_capacity(args.files.len());
    for file in args.files.iter().cloned() {
        let pipeline = Arc::clone(&pipeline);
        let semaphore = Arc::clone(&semaphore);
        let options = run_options(&file, args.retain_audio, args.quiet);

        handles.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .context("Job queue closed")?;
            pipeline
                .run(&file, options)
                .await
                .with_context(|| format!("Failed to process {:?}", file))
                .map(|_| ())
        }));
    }

    let total = handles.len();
    let mut failed = 0usize;
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("{:#}", e);
                failed += 1;
            }
            Err(e) => {
                error!("Pipeline task panicked: {}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} inputs failed", failed, total);
    }

    Ok(())
}

/// Options for one input: archive paths go to stdout, progress to stderr.
fn run_options(file: &Path, retain_audio: bool, quiet: bool) -> PipelineOptions {
    let options = PipelineOptions::new()
        .with_retain_audio(retain_audio)
        .with_logger(Logger::Default);

    if quiet {
        return options;
    }

    let label = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());
    let last_percent = AtomicU32::new(0);

    options.with_progress(move |event| {
        let percent = event.percent.floor() as u32;
        if percent > last_percent.swap(percent, Ordering::Relaxed) {
            eprintln!(
                "{}: {:>3}% [{}] {} frames, {:.1} fps",
                label, percent, event.timemark, event.frames, event.current_fps
            );
        }
    })
}
