use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contentsmith::cli::commands::generate::{GenerateOptions, ImageOverrides, OutputFormat};
use contentsmith::content::{ModeSelection, PackageTarget, Style, TagJoin, TargetLanguage};

fn parse_target(s: &str) -> Result<PackageTarget, String> {
    s.parse()
}

fn parse_mode(s: &str) -> Result<ModeSelection, String> {
    s.parse()
}

fn parse_style(s: &str) -> Result<Style, String> {
    s.parse()
}

fn parse_language(s: &str) -> Result<TargetLanguage, String> {
    s.parse()
}

fn parse_tag_join(s: &str) -> Result<TagJoin, String> {
    s.parse()
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse()
}

/// Count options must be at least one
fn parse_count(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("Value must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("Invalid number '{}'", s)),
    }
}

#[derive(Parser)]
#[command(name = "contentsmith")]
#[command(
    version,
    about = "Structured video and blog content packages from a single topic"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate content packages for a topic
    Generate {
        #[arg(help = "Content topic, e.g. \"50대 이후 조심해야 할 음식 TOP5\"")]
        topic: String,
        #[arg(long, short, default_value = "both", value_parser = parse_target, help = "Packages: both, video, article")]
        target: PackageTarget,
        #[arg(long, short, value_parser = parse_mode, help = "Mode: auto, info, promo (default from config)")]
        mode: Option<ModeSelection>,
        #[arg(long, short, value_parser = parse_style, help = "Style: senior, expert, casual")]
        style: Option<Style>,
        #[arg(long, value_parser = parse_language, help = "Target language code (ko, ja, en, ...)")]
        language: Option<TargetLanguage>,
        #[arg(long, value_parser = parse_count, help = "Video chapter count")]
        chapters: Option<usize>,
        #[arg(long = "min-length", value_parser = parse_count, help = "Minimum article body length (characters)")]
        min_length: Option<usize>,
        #[arg(long, value_parser = parse_count, help = "Article image prompt count")]
        images: Option<usize>,
        #[arg(long, help = "Call-to-action line for promotional mode")]
        cta: Option<String>,
        #[arg(long = "no-humanize", help = "Skip the humanizing pass")]
        no_humanize: bool,
        #[arg(long = "safe-mode", help = "Assemble packages one at a time")]
        safe_mode: bool,
        #[arg(long, default_value = "space", value_parser = parse_tag_join, help = "Tag joining: space, newline")]
        tags: TagJoin,
        #[arg(long, help = "Image age group label (자동 keeps detection)")]
        age: Option<String>,
        #[arg(long, help = "Image gender label (자동 keeps detection)")]
        gender: Option<String>,
        #[arg(long, help = "Image place label")]
        place: Option<String>,
        #[arg(long, help = "Image mood label")]
        mood: Option<String>,
        #[arg(long, help = "Image shot label")]
        shot: Option<String>,
        #[arg(long = "image-style", help = "Image rendering style label")]
        image_style: Option<String>,
        #[arg(long, short, help = "Directory for package files")]
        output: Option<PathBuf>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            value_parser = parse_format,
            help = "Output format: text, json"
        )]
        format: OutputFormat,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mcontentsmith encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // backtrace with RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Generate {
            topic,
            target,
            mode,
            style,
            language,
            chapters,
            min_length,
            images,
            cta,
            no_humanize,
            safe_mode,
            tags,
            age,
            gender,
            place,
            mood,
            shot,
            image_style,
            output,
            format,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(contentsmith::cli::commands::generate::run(GenerateOptions {
                topic,
                target,
                mode,
                style,
                language,
                chapters,
                min_length,
                images,
                cta,
                no_humanize,
                safe_mode,
                tags,
                image: ImageOverrides {
                    age,
                    gender,
                    place,
                    mood,
                    shot,
                    style: image_style,
                },
                output,
                format,
            }))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                contentsmith::cli::commands::config::show(global, &format)?;
            }
            ConfigAction::Path => {
                contentsmith::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                contentsmith::cli::commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
