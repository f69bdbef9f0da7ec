//! Binary entrypoint for the gallery preview.
//!
//! Runs a gallery against the headless surface for a while and logs every command it
//! issues, which is handy for checking timing and corner choices without a renderer.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser};
use kenburns_gallery::surface::headless::HeadlessSurface;
use kenburns_gallery::{GalleryConfig, Size, StaticProbe, attach};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

const SAMPLE_IMAGES: [Size; 3] = [
    Size::new(1600.0, 1200.0),
    Size::new(1500.0, 1000.0),
    Size::new(1000.0, 1500.0),
];

#[derive(Debug, Parser)]
#[command(
    name = "kenburns-preview",
    version,
    about = "Run a Ken Burns gallery against a headless surface"
)]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Container size
    #[arg(long, value_name = "WxH", default_value = "1280x720")]
    container: Size,

    /// Natural size of one slide's image (repeatable); 0x0 marks an image still loading
    #[arg(long = "image", value_name = "WxH")]
    images: Vec<Size>,

    /// Number of sample slides when no --image is given
    #[arg(long, default_value_t = 3)]
    slides: usize,

    /// How long to run, e.g. "3s" or "1500ms"
    #[arg(long, value_name = "DURATION", default_value = "3s", value_parser = humantime::parse_duration)]
    run_for: Duration,

    /// Override the corner-selection seed
    #[arg(long)]
    seed: Option<u64>,

    /// Act as if the engine lacks accelerated transforms
    #[arg(long)]
    no_accel: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // RUST_LOG wins; otherwise map -v to our crates' level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn")
            .add_directive(format!("kenburns_gallery={level}").parse()?)
            .add_directive(format!("kenburns_preview={level}").parse()?),
    };
    fmt().with_env_filter(filter).with_target(true).compact().init();
    Ok(())
}

fn slide_images(cli: &Cli) -> Vec<Option<Size>> {
    if cli.images.is_empty() {
        return SAMPLE_IMAGES.iter().copied().cycle().take(cli.slides).map(Some).collect();
    }
    cli.images
        .iter()
        .map(|size| size.aspect_ratio().map(|_| *size))
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut cfg = match cli.config.as_ref() {
        Some(path) => GalleryConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => GalleryConfig::default(),
    };
    if cli.seed.is_some() {
        cfg.seed = cli.seed;
    }
    let cfg = cfg
        .validated()
        .context("invalid configuration values")?
        .with_on_slide_advance(|index| info!(index, "slide advanced"));
    tracing::debug!("Using configuration:\n{:#?}", cfg);

    let surface = HeadlessSurface::new(cli.container, slide_images(&cli));
    let gallery = attach(surface, StaticProbe(!cli.no_accel), cfg)?;

    tokio::select! {
        _ = tokio::time::sleep(cli.run_for) => {}
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for ctrl-c")?;
            info!("interrupted");
        }
    }

    let status = gallery.status();
    let surface = gallery
        .stop()
        .await
        .ok_or_else(|| anyhow!("gallery task did not shut down cleanly"))?;

    println!(
        "slides={} current={} ticks={} strategy={} commands={} in-flight={}",
        status.total_slides,
        status.current_index,
        status.ticks,
        status.strategy,
        surface.commands_issued(),
        surface.in_flight(),
    );
    Ok(())
}
