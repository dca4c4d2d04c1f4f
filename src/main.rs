use clap::{Parser, Subcommand};
use imager::config::{self, ImagerConfig};
use imager::imaging::{
    Dimensions, FormatTag, Image, ThumbnailRequest, crop_rect, thumbnail_dimensions,
};
use imager::{batch, output};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "imager")]
#[command(about = "Validate untrusted images and derive thumbnails and crops")]
#[command(long_about = "\
Validate untrusted images and derive thumbnails and crops

Every input is checked before its pixels are decoded:

  1. Signature must be JPEG, PNG, or GIF
  2. Header must parse; EXIF orientation is applied to the reported size
  3. Both sides must be at least 2 pixels
  4. Neither side may exceed limits.max_dimension
  5. width * height may not exceed limits.max_buffer_pixels

Derived images are always upright. JPEG stays JPEG, PNG stays PNG, GIF
becomes PNG, and paletted PNG becomes JPEG unless it is transparent.

Run 'imager gen-config' to generate a documented imager.toml.")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Config file (missing file = built-in defaults)
    #[arg(long, default_value = "imager.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Target box shared by the deriving commands.
#[derive(clap::Args, Clone)]
struct BoxArgs {
    /// Target width in pixels
    #[arg(long)]
    width: u32,
    /// Target height in pixels
    #[arg(long)]
    height: u32,
}

#[derive(Subcommand)]
enum Command {
    /// Validate an image and print its format and upright size
    Identify {
        input: PathBuf,
        /// Print a JSON object instead of text
        #[arg(long)]
        json: bool,
    },
    /// Scale an image into a box without upscaling
    Thumbnail {
        input: PathBuf,
        #[command(flatten)]
        size: BoxArgs,
        /// Cover the box instead of fitting inside it
        #[arg(long)]
        fill: bool,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Cut a centered crop of the given size
    Crop {
        input: PathBuf,
        #[command(flatten)]
        size: BoxArgs,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Thumbnail every image under a directory
    Batch {
        dir: PathBuf,
        #[command(flatten)]
        size: BoxArgs,
        #[arg(long)]
        fill: bool,
        /// Output directory (mirrors the input tree)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print a stock imager.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Identify { input, json } => {
            let options = config::load_config(&cli.config)?.image_options();
            let image = Image::with_options(&std::fs::read(&input)?, &options)?;
            let report = output::IdentifyReport::new(&input, &image);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_identify_output(&report, image.transform());
            }
        }
        Command::Thumbnail {
            input,
            size,
            fill,
            output: out,
        } => {
            let options = config::load_config(&cli.config)?.image_options();
            let image = Image::with_options(&std::fs::read(&input)?, &options)?;
            let bytes = image.thumbnail(size.width, size.height, !fill)?;
            let dims = thumbnail_dimensions(image.dimensions(), size.width, size.height, !fill);
            write_derived(&input, &out, dims, &image, &bytes)?;
        }
        Command::Crop {
            input,
            size,
            output: out,
        } => {
            let options = config::load_config(&cli.config)?.image_options();
            let image = Image::with_options(&std::fs::read(&input)?, &options)?;
            let bytes = image.crop(size.width, size.height)?;
            let rect = crop_rect(image.dimensions(), size.width, size.height);
            let dims = Dimensions {
                width: rect.width,
                height: rect.height,
            };
            write_derived(&input, &out, dims, &image, &bytes)?;
        }
        Command::Batch {
            dir,
            size,
            fill,
            output: out,
        } => {
            let settings = config::load_config(&cli.config)?;
            init_thread_pool(&settings);
            let request = if fill {
                ThumbnailRequest::fill(size.width, size.height)
            } else {
                ThumbnailRequest::fit(size.width, size.height)
            };
            let report = batch::thumbnail_dir(&dir, &out, &request, &settings.image_options())?;
            output::print_batch_output(&report, &dir, &out);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn write_derived(
    input: &Path,
    out: &Path,
    size: Dimensions,
    image: &Image,
    bytes: &[u8],
) -> std::io::Result<()> {
    let format = image.output_format();
    let ext = out.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let ext_matches = ext.eq_ignore_ascii_case(format.extension())
        || (format == FormatTag::Jpeg && ext.eq_ignore_ascii_case("jpeg"));
    if !ext_matches {
        log::warn!(
            "{} will contain {} data ({})",
            out.display(),
            format,
            format.mime_type()
        );
    }
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, bytes)?;
    println!(
        "{}",
        output::format_derived_line(input, out, size, format, bytes.len())
    );
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can constrain down, not up.
fn init_thread_pool(settings: &ImagerConfig) {
    let threads = config::effective_threads(&settings.processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
