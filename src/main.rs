use std::env;
use std::path::PathBuf;
use std::process;

use tabsheet::input::discover_in;
use tabsheet::{discover, process_file, Config, SongSource};

const DEFAULT_CONFIG: &str = "tabsheet.yaml";

fn usage() {
    eprintln!("Usage: tabsheet [--config <file>] [<input>...]");
    eprintln!("       tabsheet [--config <file>] --init-config");
    eprintln!();
    eprintln!("Inputs are .txt or .rawtxt files, or folders to search.");
    eprintln!("Without inputs the folders listed in the config file are searched.");
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut config_path = PathBuf::from(DEFAULT_CONFIG);
    let mut init_config = false;
    let mut inputs: Vec<PathBuf> = Vec::new();

    // Parse flags
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => match iter.next() {
                Some(path) => config_path = PathBuf::from(path),
                None => {
                    eprintln!("--config needs a file name");
                    usage();
                    process::exit(1);
                }
            },
            "--init-config" => init_config = true,
            "-h" | "--help" => {
                usage();
                return;
            }
            flag if flag.starts_with("--") => {
                eprintln!("Unknown option '{}'", flag);
                usage();
                process::exit(1);
            }
            input => inputs.push(PathBuf::from(input)),
        }
    }

    if init_config {
        if let Err(e) = Config::default().save_to_path(&config_path) {
            eprintln!("Error writing config: {}", e);
            process::exit(1);
        }
        eprintln!("Wrote default configuration to {}", config_path.display());
        return;
    }

    // Load config
    let config = match Config::load_from_path(&config_path) {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    env_logger::Builder::new()
        .filter_level(config.options.level_filter())
        .parse_default_env()
        .init();

    let sources = collect_sources(&inputs, &config);
    if sources.is_empty() {
        log::error!("No songs found");
        process::exit(1);
    }

    let mut succeeded = 0;
    for source in &sources {
        match process_file(source, &config) {
            Ok(report) => {
                succeeded += 1;
                log::info!(
                    "{}: {} pages (target {}), font size {}",
                    source.title,
                    report.pages,
                    report.target_pages,
                    report.font_size
                );
            }
            Err(e) => log::error!("Skipping {}: {}", source.path.display(), e),
        }
    }

    log::info!("Processed {} of {} songs", succeeded, sources.len());
    if succeeded == 0 {
        process::exit(1);
    }
}

fn collect_sources(inputs: &[PathBuf], config: &Config) -> Vec<SongSource> {
    if inputs.is_empty() {
        return discover(&config.input);
    }

    let mut sources = Vec::new();
    for input in inputs {
        if input.is_dir() {
            sources.extend(discover_in(input, &config.input));
        } else {
            match SongSource::from_path(input) {
                Some(source) => sources.push(source),
                None => log::warn!("Skipping {}: not a .txt or .rawtxt file", input.display()),
            }
        }
    }
    sources
}
