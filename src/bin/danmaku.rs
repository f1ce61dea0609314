use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use danmaku::RenderSurface as _;
use serde::de::DeserializeOwned;

#[derive(Parser, Debug)]
#[command(name = "danmaku", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a comment list against a simulated clock and print per-second statistics.
    Simulate(SimulateArgs),
    /// List the font families found in font files.
    Fonts(FontsArgs),
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input comment list JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Subtitle list JSON merged into the comments.
    #[arg(long)]
    subtitles: Option<PathBuf>,

    /// Overlay configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Viewport width, px.
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// Viewport height, px.
    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Stop the clock at this time, ms. Defaults to the last comment's end plus 5 s.
    #[arg(long)]
    until: Option<u32>,

    /// Simulated frame rate.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Font files used for text measurement; fixed glyph metrics when omitted.
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct FontsArgs {
    /// Font files (TTF/OTF/TTC).
    #[arg(long = "font", required = true)]
    fonts: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Simulate(args) => cmd_simulate(args),
        Command::Fonts(args) => cmd_fonts(args),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    let value = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse {what} JSON '{}'", path.display()))?;
    Ok(value)
}

fn make_surface(fonts: &[PathBuf]) -> anyhow::Result<danmaku::HeadlessSurface> {
    if fonts.is_empty() {
        return Ok(danmaku::HeadlessSurface::with_fixed_metrics(12.0, 24.0));
    }
    let mut data = Vec::with_capacity(fonts.len());
    for path in fonts {
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        data.push(bytes);
    }
    Ok(danmaku::HeadlessSurface::with_fonts(data)?)
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.fps > 0, "--fps must be > 0");

    let mut comments: Vec<danmaku::Comment> = read_json(&args.in_path, "comment list")?;
    danmaku::sort_comments(&mut comments);
    let mut subtitles: Vec<danmaku::Comment> = match &args.subtitles {
        Some(path) => read_json(path, "subtitle list")?,
        None => Vec::new(),
    };
    danmaku::sort_comments(&mut subtitles);
    let config: danmaku::OverlayConfig = match &args.config {
        Some(path) => read_json(path, "overlay config")?,
        None => danmaku::OverlayConfig::default(),
    };

    let until = args.until.unwrap_or_else(|| {
        let end = comments
            .iter()
            .chain(&subtitles)
            .map(danmaku::Comment::end_ms)
            .max()
            .unwrap_or(0);
        u32::try_from(end + 5000).unwrap_or(u32::MAX)
    });

    let surface = Arc::new(make_surface(&args.fonts)?);
    let viewport = danmaku::Size::new(args.width, args.height);
    let overlay = Arc::new(danmaku::Overlay::new(surface.clone(), viewport, config)?);
    overlay.device_created(danmaku::DeviceCaps::default());

    let timeline = danmaku::Timeline::detached(overlay.clone());
    timeline.set_comments(comments)?;
    if !subtitles.is_empty() {
        timeline.set_subtitles(subtitles)?;
    }

    let frame = Duration::from_secs(1) / args.fps;
    let mut now = Duration::ZERO;
    let mut next_report = 1000_u32;
    let mut peak = 0_usize;
    let mut commands = 0_usize;

    println!("second\tlive\tpeak\tcreated\tcommands");
    loop {
        let t = u32::try_from(now.as_millis()).unwrap_or(u32::MAX);
        timeline.submit_time(t)?;
        overlay.update(frame);
        overlay.draw()?;

        commands += surface
            .take_batches()
            .iter()
            .map(|b| b.commands.len())
            .sum::<usize>();
        let live = overlay.total_items();
        peak = peak.max(live);

        if t >= next_report || t >= until {
            println!(
                "{}\t{}\t{}\t{}\t{}",
                next_report / 1000,
                live,
                peak,
                surface.created_texts().len(),
                commands
            );
            next_report = next_report.saturating_add(1000);
            peak = 0;
            commands = 0;
        }
        if t >= until {
            break;
        }
        now += frame;
    }

    tracing::info!(
        until_ms = until,
        created = surface.created_texts().len(),
        released = surface.released_count(),
        "simulation finished"
    );
    timeline.close();
    Ok(())
}

fn cmd_fonts(args: FontsArgs) -> anyhow::Result<()> {
    let surface = make_surface(&args.fonts)?;
    for family in surface.font_families() {
        println!("{family}");
    }
    Ok(())
}
