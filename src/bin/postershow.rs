use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use postershow::display::{FileUpdateSource, SystemClock, WindowScreen};
use postershow::{
    AppConfig, DisplayLoop, FetchOutcome, Fetcher, JellyfinClient, PosterRequest, Year,
};

#[derive(Parser, Debug)]
#[command(name = "postershow", version)]
struct Cli {
    /// JSON config file; missing fields keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a framed poster from a raw cover image.
    Compose(ComposeArgs),
    /// Show the published poster full-screen, crossfading on change.
    Show(ShowArgs),
    /// Query the media server once and publish a poster if the movie changed.
    Fetch(FetchArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Raw poster image.
    #[arg(long)]
    raw: PathBuf,

    #[arg(long)]
    title: String,

    /// Release year; omitted renders as "Unknown".
    #[arg(long)]
    year: Option<i32>,

    #[arg(long)]
    tagline: Option<String>,

    /// External page encoded as a QR glyph.
    #[arg(long)]
    url: Option<String>,

    /// Output image path (format follows the extension).
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ShowArgs {
    /// Poster file to watch.
    #[arg(long)]
    poster: Option<PathBuf>,

    #[arg(long)]
    poll_secs: Option<f64>,

    #[arg(long)]
    fade_secs: Option<f64>,

    #[arg(long)]
    fps: Option<f64>,
}

#[derive(Parser, Debug)]
struct FetchArgs {
    /// Output image path.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => AppConfig::from_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => AppConfig::default(),
    };
    match cli.cmd {
        Command::Compose(args) => cmd_compose(cfg, args),
        Command::Show(args) => cmd_show(cfg, args),
        Command::Fetch(args) => cmd_fetch(cfg, args),
    }
}

fn cmd_compose(cfg: AppConfig, args: ComposeArgs) -> anyhow::Result<()> {
    let request = PosterRequest {
        raw_image_path: args.raw,
        title: args.title,
        year: Year::from(args.year),
        tagline: args.tagline,
        external_url: args.url,
        output_path: args.out,
    };
    let report = postershow::compose(&request, &cfg.poster)
        .with_context(|| format!("compose poster '{}'", request.output_path.display()))?;
    eprintln!(
        "wrote {} ({}x{})",
        request.output_path.display(),
        report.width,
        report.height
    );
    Ok(())
}

fn cmd_show(mut cfg: AppConfig, args: ShowArgs) -> anyhow::Result<()> {
    let display = &mut cfg.display;
    if let Some(p) = args.poster {
        display.poster_path = p;
    }
    if let Some(v) = args.poll_secs {
        display.poll_interval_secs = v;
    }
    if let Some(v) = args.fade_secs {
        display.fade_duration_secs = v;
    }
    if let Some(v) = args.fps {
        display.fps = v;
    }
    display.validate()?;

    let screen = WindowScreen::open(display).context("open display surface")?;
    let source = FileUpdateSource::new(display.poster_path.clone());
    let mut display_loop = DisplayLoop::new(display.clone(), source, screen, SystemClock)?;
    display_loop.run()?;
    Ok(())
}

fn cmd_fetch(mut cfg: AppConfig, args: FetchArgs) -> anyhow::Result<()> {
    if let Some(out) = args.out {
        cfg.fetch.output_path = out;
    }
    let client = JellyfinClient::new(cfg.fetch.server_url.clone(), cfg.fetch.api_key.clone())?;
    let fetcher = Fetcher::new(client, cfg.fetch, cfg.poster);
    match fetcher.run_once().context("fetch cycle")? {
        FetchOutcome::Published(report) => {
            eprintln!("published poster ({}x{})", report.width, report.height)
        }
        other => eprintln!("no poster published: {other:?}"),
    }
    Ok(())
}
