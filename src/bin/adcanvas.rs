use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "adcanvas", version)]
struct Cli {
    /// Log at DEBUG level instead of WARN.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a specification to an image.
    Render(RenderArgs),
    /// Validate a specification and print every violated field.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input specification JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output image path.
    #[arg(long)]
    out: PathBuf,

    /// Resolution multiplier applied to width and height.
    #[arg(long, default_value_t = adcanvas::DEFAULT_MULTIPLIER)]
    multiplier: f64,

    /// Output encoding.
    #[arg(long, value_enum, default_value_t = FormatChoice::Png)]
    format: FormatChoice,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = 90)]
    quality: u8,

    /// Per-asset timeout in milliseconds (overrides ADCANVAS_ASSET_TIMEOUT_MS).
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Directory relative image paths are resolved against. Defaults to the input's directory.
    #[arg(long)]
    assets_root: Option<PathBuf>,

    /// Extra directory of font files to load on top of system fonts.
    #[arg(long)]
    font_dir: Option<PathBuf>,

    /// Retry transient asset failures this many times.
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Write a base64 `data:` URI instead of raw image bytes.
    #[arg(long)]
    data_uri: bool,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input specification JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Jpeg,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    match adcanvas::Specification::from_path(&args.in_path) {
        Ok(spec) => {
            eprintln!(
                "{}: valid ({}x{}, {} objects)",
                args.in_path.display(),
                spec.width(),
                spec.height(),
                spec.objects().len()
            );
            Ok(())
        }
        Err(adcanvas::CanvasError::Validation(errors)) => {
            for e in errors.iter() {
                eprintln!("{e}");
            }
            anyhow::bail!(
                "{}: {} validation error(s)",
                args.in_path.display(),
                errors.len()
            )
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let spec = adcanvas::Specification::from_path(&args.in_path)?;

    let assets_root = match &args.assets_root {
        Some(root) => root.clone(),
        None => args
            .in_path
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .to_path_buf(),
    };
    let resolver = adcanvas::UriResolver::new(adcanvas::UriResolverOpts {
        assets_root,
        ..Default::default()
    })?;
    let resolver = adcanvas::Retry::new(resolver, args.retries + 1, Duration::from_millis(200));

    let mut opts = adcanvas::CompositorOpts::from_env();
    if let Some(ms) = args.timeout_ms {
        opts.asset_timeout = Duration::from_millis(ms);
    }
    let compositor = adcanvas::Compositor::with_opts(resolver, opts);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    let mut scene = adcanvas::Scene::for_specification(&spec);
    rt.block_on(compositor.render(&mut scene, &spec))?;
    for d in scene.diagnostics() {
        eprintln!("warning: {d}");
    }

    let mut fonts = adcanvas::FontBook::shared();
    if let Some(dir) = &args.font_dir {
        fonts = fonts.with_font_dir(dir);
    }
    let format = match args.format {
        FormatChoice::Png => adcanvas::ExportFormat::Png,
        FormatChoice::Jpeg => adcanvas::ExportFormat::Jpeg {
            quality: args.quality,
        },
    };
    let mut exporter = adcanvas::Exporter::with_fonts(
        fonts,
        adcanvas::ExportOpts {
            multiplier: args.multiplier,
            format,
        },
    );

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    if args.data_uri {
        let uri = exporter.export_data_uri(&scene)?;
        std::fs::write(&args.out, uri)
            .with_context(|| format!("write data uri '{}'", args.out.display()))?;
    } else {
        let bytes = exporter.export(&scene)?;
        std::fs::write(&args.out, bytes)
            .with_context(|| format!("write image '{}'", args.out.display()))?;
    }

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
