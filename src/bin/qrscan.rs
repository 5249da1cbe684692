use clap::{Args, Parser, Subcommand};
use qr_frame_scanner::annotate::save_annotated;
use qr_frame_scanner::compare::ResolutionComparison;
use qr_frame_scanner::debug::log_filter;
use qr_frame_scanner::export::{
    default_csv_name, default_json_name, resolve_output, to_json, write_csv, write_json,
};
use qr_frame_scanner::generate::{FrameLayout, default_payloads, render_code, test_frame};
use qr_frame_scanner::tools::{
    STDIN_SOURCE, bench_limit_from_env, dataset_iter, dataset_root_from_env, load_image_source,
    smoke_from_env,
};
use qr_frame_scanner::{ErrorReport, Result, ScanError, ScanProfile, Scanner, ScannerConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "qrscan", version, about = "Locate QR-coded modules in a frame and report them as JSON")]
struct Cli {
    /// Retry plan: standard, enhanced, low-res or web
    #[arg(long, global = true, default_value = "low-res")]
    profile: ScanProfile,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct OutputArgs {
    /// Indent the JSON
    #[arg(long)]
    pretty: bool,

    /// Write JSON here instead of stdout (a directory gets a timestamped name)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan one image (`-` reads it from stdin)
    Scan {
        image: String,

        #[command(flatten)]
        out: OutputArgs,

        /// Also write the module table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Save a copy of the frame with modules drawn on it
        #[arg(long)]
        annotate: Option<PathBuf>,
    },
    /// Scan every image under a directory in parallel
    Batch {
        /// Directory to walk (defaults to QR_DATASET_ROOT)
        #[arg(long)]
        root: Option<PathBuf>,
        /// Scan at most this many images (defaults to QR_BENCH_LIMIT)
        #[arg(long)]
        limit: Option<usize>,
        /// Restrict to the `_smoke.txt` list
        #[arg(long)]
        smoke: bool,

        #[command(flatten)]
        out: OutputArgs,
    },
    /// Compare the enhanced and low-res profiles on images
    Compare {
        #[arg(required = true)]
        images: Vec<PathBuf>,

        #[command(flatten)]
        out: OutputArgs,
    },
    /// Write a test image: one code for `--data`, else the four-module frame
    Generate {
        #[arg(long, default_value = "test_qr_frame.png")]
        output: PathBuf,
        /// Payload of a single code
        #[arg(long)]
        data: Option<String>,
        /// Pixels per module
        #[arg(long)]
        box_size: Option<u32>,
        /// Quiet zone in modules
        #[arg(long)]
        border: Option<u32>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(log_filter(cli.verbose))
        .parse_default_env()
        .init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return fail(&err, None),
    };

    match cli.command {
        Command::Scan {
            image,
            out,
            csv,
            annotate,
        } => scan_cmd(cli.profile, config, &image, &out, csv.as_deref(), annotate.as_deref()),
        Command::Batch {
            root,
            limit,
            smoke,
            out,
        } => batch_cmd(cli.profile, config, root, limit, smoke, &out),
        Command::Compare { images, out } => compare_cmd(config, &images, &out),
        Command::Generate {
            output,
            data,
            box_size,
            border,
        } => generate_cmd(&output, data.as_deref(), box_size, border),
    }
}

fn load_config(path: Option<&Path>) -> Result<ScannerConfig> {
    let mut config = match path {
        Some(path) => ScannerConfig::from_json_file(path)?,
        None => ScannerConfig::default(),
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn scan_cmd(
    profile: ScanProfile,
    config: ScannerConfig,
    source: &str,
    out: &OutputArgs,
    csv: Option<&Path>,
    annotate: Option<&Path>,
) -> ExitCode {
    let image = match load_image_source(source) {
        Ok(image) => image,
        Err(err) => return fail(&err, None),
    };
    let label = if source == STDIN_SOURCE { "stdin" } else { source };
    let report = Scanner::with_config(profile, config).scan_image(&image, label);

    let written = emit(&report, out).and_then(|()| {
        if let Some(path) = csv {
            write_csv(&report, &resolve_output(path, default_csv_name))?;
        }
        if let Some(path) = annotate {
            save_annotated(&image, &report, path)?;
        }
        Ok(())
    });
    match written {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(&err, Some(label.to_string())),
    }
}

fn batch_cmd(
    profile: ScanProfile,
    config: ScannerConfig,
    root: Option<PathBuf>,
    limit: Option<usize>,
    smoke: bool,
    out: &OutputArgs,
) -> ExitCode {
    let root = root.unwrap_or_else(dataset_root_from_env);
    let limit = limit.or_else(bench_limit_from_env);
    let paths: Vec<PathBuf> = dataset_iter(&root, limit, smoke || smoke_from_env()).collect();
    if paths.is_empty() {
        let err = ScanError::config(format!("no images under {}", root.display()));
        return fail(&err, None);
    }

    let outcomes = Scanner::with_config(profile, config).scan_paths(&paths);
    let found: usize = outcomes.iter().map(|o| o.modules_detected()).sum();
    log::info!("{} image(s), {found} module(s)", outcomes.len());

    match emit(&outcomes, out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(&err, None),
    }
}

fn compare_cmd(config: ScannerConfig, images: &[PathBuf], out: &OutputArgs) -> ExitCode {
    let entries = ResolutionComparison::new(config).compare_all(images);
    match emit(&entries, out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(&err, None),
    }
}

fn generate_cmd(
    output: &Path,
    data: Option<&str>,
    box_size: Option<u32>,
    border: Option<u32>,
) -> ExitCode {
    let image = match data {
        Some(data) => render_code(data, box_size.unwrap_or(10), border.unwrap_or(4)),
        None => {
            let defaults = FrameLayout::default();
            let layout = FrameLayout {
                box_size: box_size.unwrap_or(defaults.box_size),
                border: border.unwrap_or(defaults.border),
                ..defaults
            };
            test_frame(&default_payloads(), &layout)
        }
    };

    let saved = image.and_then(|image| {
        image.save(output).map_err(|source| ScanError::ImageSave {
            path: output.to_path_buf(),
            source,
        })
    });
    match saved {
        Ok(()) => {
            log::info!("wrote {}", output.display());
            ExitCode::SUCCESS
        }
        Err(err) => fail(&err, None),
    }
}

/// Print JSON to stdout, or write it to `--output`
fn emit<T: Serialize + ?Sized>(value: &T, out: &OutputArgs) -> Result<()> {
    match &out.output {
        Some(path) => {
            let path = resolve_output(path, default_json_name);
            write_json(value, &path, out.pretty)?;
            log::info!("results saved to {}", path.display());
        }
        None => println!("{}", to_json(value, out.pretty)?),
    }
    Ok(())
}

fn fail(err: &ScanError, source: Option<String>) -> ExitCode {
    log::error!("{err}");
    let report = ErrorReport::new(err, source);
    match serde_json::to_string(&report) {
        Ok(json) => println!("{json}"),
        Err(_) => println!("{{\"error\": {:?}}}", err.to_string()),
    }
    ExitCode::FAILURE
}
