use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use storeshot::assets::{RAW_EXTENSIONS, find_with_extensions, raw_stem};
use storeshot::{BackgroundResolver, Compositor, Config, TextRenderer};

#[derive(Parser, Debug)]
#[command(name = "storeshot", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite every screenshot for every device.
    Composite(CompositeArgs),
    /// Validate a config and report which inputs and fonts would be used.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct CompositeArgs {
    /// Batch config JSON.
    #[arg(long)]
    config: PathBuf,

    /// Override the raw capture directory.
    #[arg(long)]
    raw_dir: Option<PathBuf>,

    /// Override the background asset directory.
    #[arg(long)]
    backgrounds_dir: Option<PathBuf>,

    /// Override the output directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Emit structured JSON logs.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Batch config JSON.
    #[arg(long)]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Composite(args) => cmd_composite(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn load_config(path: &std::path::Path) -> anyhow::Result<Config> {
    Config::from_path(path).with_context(|| format!("load config '{}'", path.display()))
}

fn cmd_composite(args: CompositeArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.config)?;
    if let Some(dir) = args.raw_dir {
        cfg.paths.raw_dir = dir;
    }
    if let Some(dir) = args.backgrounds_dir {
        cfg.paths.backgrounds_dir = dir;
    }
    if let Some(dir) = args.out_dir {
        cfg.paths.output_dir = dir;
    }
    if args.json_logs {
        cfg.logging.json = true;
    }
    storeshot::logging::init_logging(&cfg.logging);

    let backgrounds = BackgroundResolver::new(&cfg.paths.backgrounds_dir, cfg.background.clone());
    let text = TextRenderer::new(&cfg.fonts);
    tracing::info!(font = %text.description(), "text renderer ready");

    let mut compositor = Compositor::new(&cfg, &backgrounds, text);
    let report = compositor.run().context("composite screenshots")?;

    for pair in &report.pairs {
        println!("{}_{}: {}", pair.screenshot, pair.device, pair.outcome);
    }
    println!("{report}");
    println!("output: {}", cfg.paths.output_dir.display());
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.config)?;

    println!("devices:");
    for (key, d) in &cfg.devices {
        println!("  {key}: {}x{}", d.width, d.height);
    }

    println!("screenshots:");
    for shot in &cfg.screenshots {
        println!("  {} ({}) \"{}\"", shot.id, shot.accent, shot.title);
        for key in cfg.devices.keys() {
            let stem = raw_stem(&shot.id, key);
            match find_with_extensions(&cfg.paths.raw_dir, &stem, RAW_EXTENSIONS) {
                Some(p) => println!("    {key}: {}", p.display()),
                None => println!("    {key}: missing ({stem}.png)"),
            }
        }
    }

    match cfg.background.gradient() {
        Ok((top, bottom)) => println!("gradient fallback: {top} -> {bottom}"),
        Err(_) => println!("gradient fallback: not configured"),
    }

    let text = TextRenderer::new(&cfg.fonts);
    println!("font: {}", text.description());

    let missing = cfg
        .screenshots
        .iter()
        .flat_map(|s| cfg.devices.keys().map(move |k| raw_stem(&s.id, k)))
        .filter(|stem| find_with_extensions(&cfg.paths.raw_dir, stem, RAW_EXTENSIONS).is_none())
        .count();
    if missing > 0 {
        println!("{missing} raw capture(s) missing; those pairs will be skipped");
    }
    Ok(())
}
