//! Command-line front end for rendering icons, SVG files and cached images.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use image::RgbaImage;
use svgfx_renderer::cache::pipeline;
use svgfx_renderer::{Bi, ImageCache, RasterOptions, SvgLoader, SvgfxConfig, SvgfxError, logging};

#[derive(Parser, Debug)]
#[command(name = "svgfx", version, about = "Render SVG icons and cache remote images")]
struct Cli {
    /// Configuration file (defaults to ~/.imagecache/svgfx.json)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `svgfx_renderer=trace`
    #[arg(long, value_name = "FILTER", global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a bundled icon to PNG
    Icon {
        /// Icon name, e.g. `x-circle`
        name: String,
        /// Square size in pixels
        #[arg(long, default_value_t = 24.0)]
        size: f64,
        #[command(flatten)]
        paint: PaintArgs,
    },
    /// Render an SVG resource to PNG
    Svg {
        /// Resource path, looked up in the resource directory then the bundled set
        path: String,
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
        #[command(flatten)]
        paint: PaintArgs,
    },
    /// Load a remote image through the cache and write it as PNG
    Fetch {
        url: String,
        #[arg(long, default_value_t = 70)]
        width: u32,
        #[arg(long, default_value_t = 100)]
        height: u32,
        /// Output file
        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,
    },
    /// List the bundled icon names
    List,
}

#[derive(Args, Debug)]
struct PaintArgs {
    /// Theme token (`--accent`), hex value or color name
    #[arg(long, allow_hyphen_values = true)]
    color: Option<String>,

    /// Paint the stroke as well as the fill
    #[arg(long)]
    stroke: bool,

    /// Output file
    #[arg(short, long, value_name = "FILE")]
    out: PathBuf,
}

impl PaintArgs {
    fn options(&self) -> RasterOptions {
        RasterOptions::new().color(self.color.clone()).fill_stroke(self.stroke)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.log.as_deref());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), SvgfxError> {
    let config_path = cli.config.unwrap_or_else(SvgfxConfig::default_path);
    let config = SvgfxConfig::load(&config_path)?;

    match cli.command {
        Command::Icon { name, size, paint } => {
            let loader = SvgLoader::new(config.resources());
            let options = paint.options().size(size, size);
            // Names outside the bundled set may still exist in the resource directory.
            let image = match Bi::from_str(&name) {
                Ok(icon) => loader.render_icon(icon, &options)?,
                Err(_) => loader.bi(&name, &options)?,
            };
            write_png(&image, &paint.out)
        }
        Command::Svg { path, width, height, paint } => {
            let loader = SvgLoader::new(config.resources());
            let mut options = paint.options();
            options.width = width;
            options.height = height;
            let image = loader.load_svg_image(&path, &options)?;
            write_png(&image, &paint.out)
        }
        Command::Fetch { url, width, height, out } => {
            let cache = ImageCache::new(config.cache_config(), config.resources())?;
            let image = cache.load_image(&url, width, height);
            write_png(&image, &out)
        }
        Command::List => {
            for icon in Bi::ALL {
                println!("{icon}");
            }
            Ok(())
        }
    }
}

fn write_png(image: &RgbaImage, out: &Path) -> Result<(), SvgfxError> {
    pipeline::save_png(image, out)?;
    tracing::info!(path = %out.display(), width = image.width(), height = image.height(), "Wrote image");
    Ok(())
}
