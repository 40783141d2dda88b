//! Store Layout CLI
//!
//! Usage:
//!   store-layout [OPTIONS] [SCRIPT]
//!
//! Options:
//!   -c, --config <FILE>    Engine configuration (TOML)
//!   -C, --catalog <FILE>   Placeable catalog (JSON array of templates)
//!   -p, --palette <FILE>   Color palette for the SVG view (TOML)
//!   -s, --svg <FILE>       Write a top-down SVG of the final layout
//!   -o, --snapshot <FILE>  Write the committed entities as JSON
//!   -v, --verbose          Debug logging (otherwise RUST_LOG, default warn)
//!   -h, --help             Print help

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use store_layout::lint;
use store_layout::{render_svg, script, Catalog, EngineConfig, Palette, Session, SvgConfig};

#[derive(Parser)]
#[command(name = "store-layout")]
#[command(about = "Replay store layout scripts: zones, plan matching and scene placement")]
struct Cli {
    /// Script file (reads from stdin if not provided)
    script: Option<PathBuf>,

    /// Engine configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Placeable catalog (JSON format)
    #[arg(short = 'C', long)]
    catalog: Option<PathBuf>,

    /// Color palette for SVG output (TOML format)
    #[arg(short, long)]
    palette: Option<PathBuf>,

    /// Write the final layout as SVG
    #[arg(short, long)]
    svg: Option<PathBuf>,

    /// Write the committed entities as a JSON snapshot
    #[arg(short = 'o', long)]
    snapshot: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn fail(message: String) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn write_output(path: &Path, content: &str, what: &str) {
    if let Err(e) = fs::write(path, content) {
        fail(format!("Error writing {} '{}': {}", what, path.display(), e));
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path).unwrap_or_else(|e| {
            fail(format!("Error loading config '{}': {}", path.display(), e))
        }),
        None => EngineConfig::default(),
    };

    let catalog = match &cli.catalog {
        Some(path) => Catalog::from_file(path).unwrap_or_else(|e| {
            fail(format!("Error loading catalog '{}': {}", path.display(), e))
        }),
        None => Catalog::new(),
    };

    let palette = match &cli.palette {
        Some(path) => Palette::from_file(path).unwrap_or_else(|e| {
            fail(format!("Error loading palette '{}': {}", path.display(), e))
        }),
        None => Palette::default(),
    };

    // Read input
    let (source, filename) = match &cli.script {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => fail(format!("Error reading file '{}': {}", path.display(), e)),
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => fail(format!("Error reading from stdin: {}", e)),
            }
        }
    };

    let parsed = match script::parse(&source) {
        Ok(parsed) => parsed,
        Err(errors) => {
            for error in &errors {
                eprint!("{}", error.format(&source, &filename));
            }
            std::process::exit(1);
        }
    };

    let mut session = Session::new(config, catalog);
    let report = script::execute(&mut session, &parsed, &source);
    println!("{}", report);

    for warning in lint::check(&session) {
        println!("warning: {}", warning);
    }

    if let Some(path) = &cli.svg {
        let svg = render_svg(&session, &SvgConfig::default(), &palette);
        write_output(path, &svg, "SVG");
    }

    if let Some(path) = &cli.snapshot {
        match session.snapshot_json() {
            Ok(json) => write_output(path, &json, "snapshot"),
            Err(e) => fail(format!("Error serializing snapshot: {}", e)),
        }
    }
}
