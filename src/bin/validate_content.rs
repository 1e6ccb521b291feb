//! Content validation utility
//!
//! Loads every pose, action and skin under a content root and reports each
//! problem, without installing defaults or registering anything.
//!
//! Usage:
//!     validate_content [OPTIONS] [CONTENT_DIR]
//!
//! Options:
//!     -c, --config <FILE>     Config file (default: mannequin.json)
//!     -q, --quiet             Only print problems
//!     -h, --help              Show this help message

use std::env;
use std::path::PathBuf;
use std::time::Instant;

use mannequin::core::config::CONFIG_FILENAME;
use mannequin::core::MannequinConfig;
use mannequin::library::{ActionLibrary, PoseLibrary};
use mannequin::variant::{discover_skins, DiscoveryOptions};

fn print_help() {
    eprintln!("validate_content - Content validation utility");
    eprintln!();
    eprintln!("Usage: validate_content [OPTIONS] [CONTENT_DIR]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("    -c, --config <FILE>     Config file (default: {})", CONFIG_FILENAME);
    eprintln!("    -q, --quiet             Only print problems");
    eprintln!("    -h, --help              Show this help message");
}

#[derive(Debug)]
struct Args {
    config: PathBuf,
    content_dir: Option<PathBuf>,
    quiet: bool,
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut config = PathBuf::from(CONFIG_FILENAME);
    let mut content_dir: Option<PathBuf> = None;
    let mut quiet = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --config".to_string());
                }
                config = PathBuf::from(&args[i]);
            }
            "-q" | "--quiet" => quiet = true,
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            path => {
                if content_dir.is_some() {
                    return Err("Multiple content directories specified".to_string());
                }
                content_dir = Some(PathBuf::from(path));
            }
        }
        i += 1;
    }

    Ok(Args {
        config,
        content_dir,
        quiet,
    })
}

fn main() {
    mannequin::core::logging::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_help();
            std::process::exit(2);
        }
    };

    let mut config = match MannequinConfig::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: cannot read {}: {}", args.config.display(), e);
            std::process::exit(2);
        }
    };
    if let Some(dir) = args.content_dir {
        config.content_root = dir;
    }

    let start = Instant::now();
    let mut problems = 0usize;

    let poses = PoseLibrary::new(config.poses_path());
    match poses.load_all() {
        Ok(report) => {
            for (path, error) in &report.failed {
                println!("pose   {}: {}", path.display(), error);
            }
            problems += report.failed.len();
        }
        Err(e) => {
            println!("poses  {}: {}", config.poses_path().display(), e);
            problems += 1;
        }
    }

    let actions = ActionLibrary::new(config.actions_path());
    match actions.load_all(&poses) {
        Ok(report) => {
            for (path, error) in &report.failed {
                println!("action {}: {}", path.display(), error);
            }
            problems += report.failed.len();
        }
        Err(e) => {
            println!("actions {}: {}", config.actions_path().display(), e);
            problems += 1;
        }
    }

    let discovery = match discover_skins(&config.skins_path(), &DiscoveryOptions::from_config(&config)) {
        Ok(discovery) => {
            for skipped in &discovery.skipped {
                println!("skin   {}: {}", skipped.path.display(), skipped.error);
            }
            problems += discovery.skipped.len();
            Some(discovery)
        }
        Err(e) => {
            println!("skins  {}: {}", config.skins_path().display(), e);
            problems += 1;
            None
        }
    };

    if !args.quiet {
        println!();
        println!("Content root: {}", config.content_root.display());
        println!("Poses:    {}", poses.len());
        println!("Actions:  {}", actions.len());
        if let Some(discovery) = &discovery {
            println!("Variants: {}", discovery.descriptors.len());
            for d in &discovery.descriptors {
                let arms = if d.is_alternate_skeleton() { "slim" } else { "classic" };
                println!("    {:<24} {:<24} {}", d.id, d.display_name, arms);
            }
        }
        println!("Problems: {}", problems);
        println!("Checked in {:.2}s", start.elapsed().as_secs_f64());
    }

    if problems > 0 {
        std::process::exit(1);
    }
}
