// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// mkpdf: convert images to PDF from the command line.
//
// A thin shim over mkpdf-document: flags become `ConvertOverrides`, merged once
// with the persisted defaults into `ConvertSettings`, then handed to the
// converter.

mod progress;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use mkpdf_core::human_errors::humanize_error;
use mkpdf_core::{
    AppConfig, ConvertError, ConvertOverrides, ConvertSettings, ImageFilter, ImagePosition,
    PageSize,
};
use mkpdf_document::{ConversionReport, Converter, PdfReader, expand_inputs};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::progress::BarProgress;

const AFTER_HELP: &str = r#"EXAMPLES:
  # One image, one page
  mkpdf single cat.jpg cat.pdf

  # Every JPEG in a folder, sorted by name, on US Letter
  mkpdf multiple 'photos/*.jpg' -o album.pdf --page-size letter

  # Resize, rotate and sharpen, with document metadata
  mkpdf multiple scans/*.png -o scans.pdf --width 1200 --rotate 90 \
      --filter sharpen --title "Scans" --author "Jo Bloggs"

  # Change the saved defaults
  mkpdf config set --quality 85 --position top

CONFIGURATION:
  Defaults are read from ~/.mkpdf/config.json (created on first run).
  Use --config or MKPDF_CONFIG to point at another file."#;

#[derive(Parser, Debug)]
#[command(
    name = "mkpdf",
    version,
    about = "Batch-convert images (JPEG, PNG, BMP, GIF, TIFF, WebP) into PDF documents",
    after_help = AFTER_HELP
)]
struct Cli {
    /// Configuration file [default: ~/.mkpdf/config.json]
    #[arg(long, global = true, env = "MKPDF_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Disable the progress bar
    #[arg(long, global = true, env = "MKPDF_NO_PROGRESS")]
    no_progress: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one image into a single-page PDF
    Single {
        /// Image to convert
        image: PathBuf,
        /// PDF to write
        output: PathBuf,
        #[command(flatten)]
        options: ConvertArgs,
    },

    /// Convert several images (paths or glob patterns) into one PDF, one page
    /// per image
    Multiple {
        /// Image paths or quoted glob patterns such as 'photos/*.jpg'
        #[arg(required = true, value_name = "PATTERN")]
        inputs: Vec<String>,
        /// PDF to write
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        options: ConvertArgs,
    },

    /// Show, change or reset the saved defaults
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print page count, page sizes and metadata of a PDF
    Info {
        /// PDF to inspect
        pdf: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration file
    Show,
    /// Save new defaults (same options as the convert commands)
    Set(ConvertArgs),
    /// Restore the built-in defaults
    Reset,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Page size: A4, A4_LANDSCAPE, A3, A5, LETTER, LETTER_LANDSCAPE, LEGAL, or <W>x<H>mm
    #[arg(long, value_name = "SIZE")]
    page_size: Option<String>,

    /// Image anchor: center, top, bottom, left, right, top_left, top_right,
    /// bottom_left, bottom_right
    #[arg(long)]
    position: Option<String>,

    /// Enable the resize stage (implied by --width/--height)
    #[arg(long, overrides_with = "no_resize")]
    resize: bool,

    /// Disable the resize stage
    #[arg(long)]
    no_resize: bool,

    /// Target width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Target height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Clockwise rotation: 0, 90, 180 or 270
    #[arg(long, value_name = "DEGREES", allow_hyphen_values = true)]
    rotate: Option<i64>,

    /// Filter: none, blur, sharpen, edge_detect, contour, emboss, smooth
    #[arg(long)]
    filter: Option<String>,

    /// JPEG quality of embedded images, 1-100
    #[arg(long, allow_hyphen_values = true)]
    quality: Option<i64>,

    /// Never enlarge an image beyond one pixel per point
    #[arg(long, overrides_with = "upscale")]
    no_upscale: bool,

    /// Allow small images to be enlarged to fill the page
    #[arg(long)]
    upscale: bool,

    /// Leave unreadable images out and report them instead of failing
    #[arg(long, overrides_with = "no_skip_invalid")]
    skip_invalid: bool,

    /// Fail on the first unreadable image
    #[arg(long)]
    no_skip_invalid: bool,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    author: Option<String>,

    #[arg(long)]
    subject: Option<String>,

    #[arg(long)]
    keywords: Option<String>,

    #[arg(long)]
    creator: Option<String>,
}

/// `Some(true)` / `Some(false)` for an explicit on/off flag pair, else `None`.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl ConvertArgs {
    fn to_overrides(&self) -> ConvertOverrides {
        ConvertOverrides {
            page_size: self.page_size.clone(),
            quality: self.quality,
            position: self.position.clone(),
            resize: switch(self.resize, self.no_resize),
            width: self.width,
            height: self.height,
            rotate: self.rotate,
            filter: self.filter.clone(),
            allow_upscale: switch(self.upscale, self.no_upscale),
            skip_invalid: switch(self.skip_invalid, self.no_skip_invalid),
            title: self.title.clone(),
            author: self.author.clone(),
            subject: self.subject.clone(),
            keywords: self.keywords.clone(),
            creator: self.creator.clone(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Patterns are expanded before logging is set up so the level can follow
    // whether a bar will really be drawn. Errors surface later, in `run`.
    let expanded = match &cli.command {
        Command::Multiple { inputs, .. } => Some(expand_inputs(inputs)),
        _ => None,
    };
    let show_progress = draws_progress(&cli, expanded.as_ref());

    // Library INFO logs are redundant while the progress bar is drawing.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, expanded, show_progress) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = report_error(&err);
            ExitCode::from(code)
        }
    }
}

/// Print `err` for a human and return the exit status.
fn report_error(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ConvertError>() {
        Some(convert_err) => {
            let human = humanize_error(convert_err);
            eprintln!("error: {}", human.message);
            if !human.suggestion.is_empty() {
                eprintln!("  hint: {}", human.suggestion);
            }
            u8::try_from(human.exit_code).unwrap_or(1)
        }
        None => {
            eprintln!("error: {err:#}");
            1
        }
    }
}

/// A bar is drawn only for multi-file conversions, unless silenced.
fn draws_progress(cli: &Cli, expanded: Option<&mkpdf_core::Result<Vec<PathBuf>>>) -> bool {
    !cli.quiet && !cli.no_progress && matches!(expanded, Some(Ok(files)) if files.len() > 1)
}

fn run(
    cli: &Cli,
    expanded: Option<mkpdf_core::Result<Vec<PathBuf>>>,
    show_progress: bool,
) -> Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::default_path()
            .ok_or_else(|| anyhow!("cannot locate the home directory; pass --config <PATH>"))?,
    };
    debug!(config = %config_path.display(), "Using configuration file");

    match &cli.command {
        Command::Single {
            image,
            output,
            options,
        } => {
            let converter = converter(&config_path, options)?;
            let report = converter.convert_single(image, output)?;
            print_report(cli, &report);
        }

        Command::Multiple {
            inputs,
            output,
            options,
        } => {
            // Resolve options before touching the filesystem for inputs.
            let converter = converter(&config_path, options)?;
            let files = match expanded {
                Some(files) => files?,
                None => expand_inputs(inputs)?,
            };
            let report = if show_progress {
                let bar = BarProgress::new();
                converter.convert_many_with_progress(&files, output, &bar)?
            } else {
                converter.convert_many(&files, output)?
            };
            print_report(cli, &report);
        }

        Command::Config { action } => config_command(&config_path, action)?,

        Command::Info { pdf } => print_info(pdf)?,
    }
    Ok(())
}

fn converter(config_path: &Path, options: &ConvertArgs) -> Result<Converter> {
    let defaults = AppConfig::load_or_init(config_path)?;
    let mut settings = ConvertSettings::resolve(&defaults, &options.to_overrides())?;
    settings.metadata = settings.metadata.with_creation_date(chrono::Utc::now());
    debug!(?settings, "Settings resolved");
    Ok(Converter::new(settings))
}

fn print_report(cli: &Cli, report: &ConversionReport) {
    for skipped in &report.skipped {
        eprintln!(
            "warning: skipped '{}': {}",
            skipped.input.display(),
            skipped.error.root()
        );
    }
    if !cli.quiet {
        println!(
            "Created {} ({} page{}, {} bytes)",
            report.output.display(),
            report.pages,
            if report.pages == 1 { "" } else { "s" },
            report.bytes
        );
    }
}

fn config_command(path: &Path, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = AppConfig::load_or_init(path)?;
            println!("# {}", path.display());
            println!(
                "{}",
                serde_json::to_string_pretty(&config).context("cannot render configuration")?
            );
            println!();
            println!(
                "page sizes: {}",
                PageSize::NAMED.map(|size| size.name()).join(", ")
            );
            println!(
                "positions:  {}",
                ImagePosition::ALL.map(|pos| pos.name()).join(", ")
            );
            println!(
                "filters:    {}",
                ImageFilter::ALL.map(|filter| filter.name()).join(", ")
            );
        }
        ConfigAction::Set(options) => {
            let mut config = AppConfig::load_or_init(path)?;
            config.apply(&options.to_overrides())?;
            config.save(path)?;
            println!("Saved defaults to {}", path.display());
        }
        ConfigAction::Reset => {
            AppConfig::default().save(path)?;
            println!("Restored built-in defaults in {}", path.display());
        }
    }
    Ok(())
}

fn print_info(pdf: &Path) -> Result<()> {
    let reader = PdfReader::open(pdf)?;
    let info = reader.metadata();

    println!("File:     {}", pdf.display());
    println!("Pages:    {}", reader.page_count());
    for (label, value) in [
        ("Title", &info.title),
        ("Author", &info.author),
        ("Subject", &info.subject),
        ("Keywords", &info.keywords),
        ("Creator", &info.creator),
        ("Producer", &info.producer),
        ("Created", &info.creation_date),
    ] {
        if let Some(value) = value {
            println!("{:<9} {value}", format!("{label}:"));
        }
    }

    for page in 1..=reader.page_count() as u32 {
        let (width, height) = reader.page_size(page)?;
        let image = match reader.page_image_size(page)? {
            Some((w, h)) => format!("{w}x{h} px image"),
            None => "no image".to_string(),
        };
        println!(
            "  page {page:>3}: {width:.2} x {height:.2} pt ({:.0} x {:.0} mm), {image}",
            width * 25.4 / 72.0,
            height * 25.4 / 72.0
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_map_to_overrides() {
        let cli = Cli::try_parse_from([
            "mkpdf",
            "multiple",
            "a.jpg",
            "b.jpg",
            "-o",
            "out.pdf",
            "--quality",
            "80",
            "--no-upscale",
            "--width",
            "640",
            "--title",
            "Trip",
        ])
        .unwrap();
        let Command::Multiple { inputs, options, .. } = cli.command else {
            panic!("expected multiple");
        };
        assert_eq!(inputs, ["a.jpg", "b.jpg"]);
        let overrides = options.to_overrides();
        assert_eq!(overrides.quality, Some(80));
        assert_eq!(overrides.allow_upscale, Some(false));
        assert_eq!(overrides.width, Some(640));
        assert_eq!(overrides.resize, None);
        assert_eq!(overrides.skip_invalid, None);
        assert_eq!(overrides.title.as_deref(), Some("Trip"));
    }

    #[test]
    fn later_switch_wins() {
        let cli = Cli::try_parse_from([
            "mkpdf",
            "config",
            "set",
            "--skip-invalid",
            "--no-skip-invalid",
        ])
        .unwrap();
        let Command::Config {
            action: ConfigAction::Set(options),
        } = cli.command
        else {
            panic!("expected config set");
        };
        assert_eq!(options.to_overrides().skip_invalid, Some(false));
    }

    #[test]
    fn bar_only_for_several_files() {
        let parse = |args: &[&str]| Cli::try_parse_from(args).unwrap();
        let expand = |cli: &Cli| match &cli.command {
            Command::Multiple { inputs, .. } => Some(expand_inputs(inputs)),
            _ => None,
        };

        let single = parse(&["mkpdf", "single", "a.jpg", "a.pdf"]);
        assert!(!draws_progress(&single, expand(&single).as_ref()));

        let one = parse(&["mkpdf", "multiple", "a.jpg", "-o", "a.pdf"]);
        assert!(!draws_progress(&one, expand(&one).as_ref()));

        let two = parse(&["mkpdf", "multiple", "a.jpg", "b.jpg", "-o", "ab.pdf"]);
        assert!(draws_progress(&two, expand(&two).as_ref()));

        let quiet = parse(&["mkpdf", "-q", "multiple", "a.jpg", "b.jpg", "-o", "ab.pdf"]);
        assert!(!draws_progress(&quiet, expand(&quiet).as_ref()));
    }

    #[test]
    fn error_exit_codes_follow_kind() {
        let err = anyhow::Error::new(ConvertError::Configuration("quality 0".into()));
        assert_eq!(report_error(&err), 2);
        let err = anyhow::Error::new(ConvertError::NoImages);
        assert_eq!(report_error(&err), 6);
        assert_eq!(report_error(&anyhow!("plain failure")), 1);
    }
}
