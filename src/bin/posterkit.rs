use std::{
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "posterkit", version)]
struct Cli {
    /// Log progress to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a saved poster layout to an image file.
    Render(RenderArgs),
    /// Check a category config (and optionally a font manifest) against the schema.
    Validate(ValidateArgs),
    /// List the built-in export presets.
    Presets,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Saved layout JSON (any supported version).
    #[arg(long)]
    project: PathBuf,

    /// Output image path.
    #[arg(long)]
    out: PathBuf,

    /// Export preset key, e.g. `ig-post`.
    #[arg(long, conflicts_with = "size")]
    preset: Option<String>,

    /// Custom `WIDTHxHEIGHT`. Without this or `--preset` the layout's own canvas is used.
    #[arg(long)]
    size: Option<String>,

    /// png, jpeg or webp.
    #[arg(long, default_value = "png")]
    format: String,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = posterkit::DEFAULT_JPEG_QUALITY)]
    quality: u8,

    /// Directory image sources are resolved against. Defaults to the project's directory.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Font manifest JSON; `src` paths are resolved against the assets directory.
    #[arg(long)]
    fonts: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Category config JSON.
    #[arg(long)]
    config: PathBuf,

    /// Font manifest JSON.
    #[arg(long)]
    fonts: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "info" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Validate(args) => cmd_validate(args),
        Command::Presets => {
            cmd_presets();
            Ok(())
        }
    }
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let f = File::open(path).with_context(|| format!("open '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse JSON '{}'", path.display()))
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read '{}'", path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let raw = read_json(&args.project)?;
    let layout = posterkit::migrate_layout(raw, posterkit::DEFAULT_CANVAS)
        .with_context(|| format!("load layout '{}'", args.project.display()))?;
    let (stack, options): (posterkit::LayerStack, BTreeMap<String, String>) =
        layout.into_stack()?;

    let format: posterkit::ExportFormat = args.format.parse()?;
    let size = match (&args.preset, &args.size) {
        (Some(key), _) => posterkit::ExportSize::Preset(
            posterkit::preset(key).with_context(|| format!("unknown preset '{key}'"))?,
        ),
        (None, Some(s)) => posterkit::ExportSize::parse(s)?,
        (None, None) => posterkit::ExportSize::Custom(stack.canvas()),
    };
    let target = size.canvas();
    let settings = posterkit::ExportSettings {
        size,
        format,
        quality: args.quality,
    };
    settings.validate()?;

    let root = match args.assets {
        Some(dir) => dir,
        None => args
            .project
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };
    let mut assets = posterkit::AssetStore::with_root(&root);
    for source in stack.image_sources() {
        assets.request(&source);
    }
    assets.resolve_pending();

    let mut fonts = posterkit::FontBook::new();
    if let Some(path) = &args.fonts {
        let manifest = posterkit::parse_font_manifest(&read_text(path)?)
            .with_context(|| format!("font manifest '{}'", path.display()))?;
        for family in fonts.load_manifest(&manifest, &root) {
            eprintln!("warning: font family '{family}' failed to load");
        }
    }

    let mut compositor = posterkit::Compositor::default();
    let mut cx = posterkit::CompileContext {
        assets: &assets,
        fonts: &mut fonts,
        options: &options,
        clear: posterkit::Color::WHITE,
    };
    let out = compositor
        .render(&stack, target, &mut cx)?
        .context("renderer busy")?;
    for source in &out.pending_sources {
        eprintln!("warning: image '{source}' was not ready");
    }

    let bytes = posterkit::encode_frame(&out.frame, settings.format, settings.quality)?;
    posterkit::write_export(&args.out, &bytes)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let config = posterkit::parse_category_config(&read_text(&args.config)?)
        .with_context(|| format!("invalid category config '{}'", args.config.display()))?;
    let templates: u32 = config.categories.iter().map(|c| c.count).sum();
    eprintln!(
        "{}: {} categories, {templates} templates",
        args.config.display(),
        config.categories.len()
    );

    if let Some(path) = &args.fonts {
        let manifest = posterkit::parse_font_manifest(&read_text(path)?)
            .with_context(|| format!("invalid font manifest '{}'", path.display()))?;
        eprintln!("{}: {} fonts", path.display(), manifest.fonts.len());
    }
    Ok(())
}

fn cmd_presets() {
    for p in posterkit::PRESETS {
        println!("{:<12} {:>5}x{:<5} {}", p.key, p.width, p.height, p.label);
    }
}
