use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use image::{RgbImage, RgbaImage};
use log::{error, info};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};

use pagefit::panic_handler;
use pagefit::render::{
    DocumentSession, LayoutResult, PixelFormat, Viewport, page_fitted_bgra, page_fitted_rgb,
    page_native_rgb, page_native_size, two_pages_fitted_bgra,
};
use pagefit::settings::{self, PageLayout};

#[derive(Parser, Debug)]
#[command(name = "pagefit", version, about)]
struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the page count and every page's bounds.
    Info(InfoArgs),
    /// Render one page at native scale as a PNG.
    Native(NativeArgs),
    /// Render one page (or a two-page spread) fitted to a viewport as a PNG.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Document, comic archive or image directory
    doc: PathBuf,
}

#[derive(Parser, Debug)]
struct NativeArgs {
    doc: PathBuf,

    /// Page index (0-based)
    #[arg(long, default_value_t = 0)]
    page: usize,

    /// Output PNG path
    #[arg(short, long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Bgra,
    Rgb,
}

impl From<FormatArg> for PixelFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Bgra => PixelFormat::Bgra,
            FormatArg::Rgb => PixelFormat::Rgb,
        }
    }
}

#[derive(Parser, Debug)]
struct RenderArgs {
    doc: PathBuf,

    /// Page index (0-based); the first page of the spread with --spread
    #[arg(long, default_value_t = 0)]
    page: usize,

    /// Lay out this page and the next side by side
    #[arg(long)]
    spread: bool,

    /// Viewport width (defaults to the configured texture width)
    #[arg(long)]
    width: Option<u32>,

    /// Viewport height (defaults to the configured texture height)
    #[arg(long)]
    height: Option<u32>,

    /// Destination pixel format (defaults to the configured format)
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Save the whole viewport instead of the occupied region
    #[arg(long)]
    full: bool,

    /// Output PNG path
    #[arg(short, long)]
    out: PathBuf,
}

/// Install the log sink. It accepts every record; the effective level is
/// the global max level, set by [`apply_log_level`] once settings are read.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let level = LevelFilter::Trace;
    match log_file {
        Some(path) => WriteLogger::init(
            level,
            Config::default(),
            File::create(path).with_context(|| format!("creating log file {}", path.display()))?,
        )?,
        None => TermLogger::init(
            level,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        )?,
    }
    Ok(())
}

fn main() -> Result<()> {
    panic_handler::initialize_panic_handler();

    let cli = Cli::parse();
    let cli_level = cli
        .log_level
        .as_deref()
        .map(|name| {
            LevelFilter::from_str(name).map_err(|_| anyhow::anyhow!("unknown log level {name:?}"))
        })
        .transpose()?;

    init_logging(cli.log_file.as_deref())?;
    // settings problems are reported at info until the configured level is known
    log::set_max_level(cli_level.unwrap_or(LevelFilter::Info));
    settings::load_settings();
    apply_log_level(cli_level);

    info!("Starting pagefit {}", env!("CARGO_PKG_VERSION"));

    let result = match cli.cmd {
        Command::Info(args) => cmd_info(args),
        Command::Native(args) => cmd_native(args),
        Command::Render(args) => cmd_render(args),
    };
    if let Err(e) = &result {
        error!("{e:#}");
    }
    result
}

/// An explicit `--log-level` wins over the configured one
fn apply_log_level(cli_level: Option<LevelFilter>) -> LevelFilter {
    let level = cli_level.unwrap_or_else(settings::get_log_level);
    log::set_max_level(level);
    level
}

fn open(doc: &Path) -> Result<DocumentSession> {
    DocumentSession::open_with(doc, settings::get_store_limit())
        .with_context(|| format!("opening {}", doc.display()))
}

fn cmd_info(args: InfoArgs) -> Result<()> {
    let session = open(&args.doc)?;
    println!("{}: {} pages", args.doc.display(), session.page_count());
    for index in 0..session.page_count() {
        let bounds = session
            .page_bounds(index)
            .with_context(|| format!("reading bounds of page {index}"))?;
        match page_native_size(&session, index) {
            Ok(size) => println!(
                "  page {index}: {:.1}x{:.1} -> {}x{} px",
                bounds.width(),
                bounds.height(),
                size.width,
                size.height
            ),
            Err(e) => println!(
                "  page {index}: {:.1}x{:.1} (not renderable: {e})",
                bounds.width(),
                bounds.height()
            ),
        }
    }
    Ok(())
}

fn cmd_native(args: NativeArgs) -> Result<()> {
    let session = open(&args.doc)?;
    let size = page_native_size(&session, args.page)
        .with_context(|| format!("sizing page {}", args.page))?;

    let mut buf = vec![0u8; size.byte_len(PixelFormat::Rgb)];
    page_native_rgb(&session, args.page, &mut buf)
        .with_context(|| format!("rendering page {}", args.page))?;

    let image = RgbImage::from_raw(size.width, size.height, buf)
        .context("native buffer does not match its reported size")?;
    image
        .save(&args.out)
        .with_context(|| format!("writing {}", args.out.display()))?;
    println!(
        "page {} -> {}x{} {}",
        args.page,
        size.width,
        size.height,
        args.out.display()
    );
    Ok(())
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let (texture_width, texture_height) = settings::get_texture_size();
    let viewport = Viewport::new(
        args.width.unwrap_or(texture_width),
        args.height.unwrap_or(texture_height),
    );
    let format = args
        .format
        .map(PixelFormat::from)
        .unwrap_or_else(settings::get_pixel_format);
    let spread = args.spread || settings::get_layout() == PageLayout::Spread;
    if spread && format == PixelFormat::Rgb {
        anyhow::bail!("two-page spreads are rendered as bgra only");
    }

    let session = open(&args.doc)?;
    let pixels = viewport.width as usize * viewport.height as usize;
    let mut buf = vec![0u8; pixels * format.bytes_per_pixel()];
    let result = match (spread, format) {
        (true, _) => two_pages_fitted_bgra(&session, args.page, viewport, &mut buf),
        (false, PixelFormat::Bgra) => page_fitted_bgra(&session, args.page, viewport, &mut buf),
        (false, PixelFormat::Rgb) => page_fitted_rgb(&session, args.page, viewport, &mut buf),
    }
    .with_context(|| format!("rendering page {}", args.page))?;

    let region = if args.full {
        LayoutResult::new(viewport.width, viewport.height)
    } else {
        result
    };
    save_png(&buf, format, viewport, region, &args.out)?;
    println!(
        "page {} -> {}x{} in {}x{} {}",
        args.page,
        result.width,
        result.height,
        viewport.width,
        viewport.height,
        args.out.display()
    );
    Ok(())
}

/// Save the top-left `region` of a `viewport`-sized buffer
fn save_png(
    buf: &[u8],
    format: PixelFormat,
    viewport: Viewport,
    region: LayoutResult,
    out: &Path,
) -> Result<()> {
    let bpp = format.bytes_per_pixel();
    let pitch = viewport.width as usize * bpp;
    let row_len = region.width as usize * bpp;

    let mut pixels = Vec::with_capacity(row_len * region.height as usize);
    for y in 0..region.height as usize {
        pixels.extend_from_slice(&buf[y * pitch..y * pitch + row_len]);
    }

    let saved = match format {
        PixelFormat::Rgb => RgbImage::from_raw(region.width, region.height, pixels)
            .context("region does not match buffer")?
            .save(out),
        PixelFormat::Bgra => {
            for px in pixels.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
            RgbaImage::from_raw(region.width, region.height, pixels)
                .context("region does not match buffer")?
                .save(out)
        }
    };
    saved.with_context(|| format!("writing {}", out.display()))
}
