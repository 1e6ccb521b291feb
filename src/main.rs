//! Mannequin - figurine content service
//!
//! Installs bundled definitions, registers skin variants, then runs the
//! simulation tick with the preview tooling server alongside.
//!
//! Usage:
//!     mannequin [--config <FILE>] [--content <DIR>] [--no-tooling]

use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Instant;

use mannequin::core::config::CONFIG_FILENAME;
use mannequin::core::{logging, MannequinConfig};
use mannequin::selection::SelectionStore;
use mannequin::studio::{Studio, StudioHandler};

struct Args {
    config: PathBuf,
    content: Option<PathBuf>,
    tooling: bool,
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut parsed = Args {
        config: PathBuf::from(CONFIG_FILENAME),
        content: None,
        tooling: true,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--config" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --config")?;
                parsed.config = PathBuf::from(value);
            }
            "--content" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --content")?;
                parsed.content = Some(PathBuf::from(value));
            }
            "--no-tooling" => parsed.tooling = false,
            other => return Err(format!("Unknown option: {}", other)),
        }
        i += 1;
    }
    Ok(parsed)
}

fn main() {
    logging::init();
    log::info!("Mannequin starting...");

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Usage: mannequin [--config <FILE>] [--content <DIR>] [--no-tooling]");
            std::process::exit(2);
        }
    };

    let mut config = match MannequinConfig::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Cannot read config {}: {}", args.config.display(), e);
            std::process::exit(1);
        }
    };
    if let Some(content) = args.content {
        config.content_root = content;
    }
    if !args.tooling {
        config.debug_server.enabled = false;
    }
    log::info!("Content root: {}", config.content_root.display());

    let selections = Arc::new(SelectionStore::new());
    let (studio, report) = match Studio::open(config.clone(), selections) {
        Ok(opened) => opened,
        Err(e) => {
            log::error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };
    log::info!(
        "Ready: {} poses, {} actions, {} variants",
        studio.poses().len(),
        studio.actions().len(),
        studio.registry().registered_count()
    );
    if !report.is_clean() {
        log::warn!("Some content was skipped during startup; see warnings above");
    }

    let studio = Arc::new(StdMutex::new(studio));

    // Tooling server runs on its own runtime thread; the tick stays on main
    if config.debug_server.enabled {
        let address = config.debug_server.address.clone();
        let handler = Arc::new(tokio::sync::Mutex::new(StudioHandler::new(studio.clone())));
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Failed to create tokio runtime: {}", e);
                    return;
                }
            };
            rt.block_on(async move {
                let _server = match mannequin_debug::DebugServer::start(handler, &address).await {
                    Ok(server) => server,
                    Err(e) => {
                        log::error!("Failed to bind tooling server on {}: {}", address, e);
                        return;
                    }
                };
                // Keep runtime alive forever
                loop {
                    tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                }
            });
        });
    }

    let interval = config.tick_interval();
    let mut next_tick = Instant::now();
    loop {
        studio.lock().unwrap_or_else(PoisonError::into_inner).tick();

        next_tick += interval;
        let now = Instant::now();
        if next_tick > now {
            std::thread::sleep(next_tick - now);
        } else {
            // Fell behind; don't try to catch up
            next_tick = now;
        }
    }
}
