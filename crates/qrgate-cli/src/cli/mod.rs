//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use qrgate_core::config::Config;
use qrgate_core::logging;
use qrgate_core::qr::{DEFAULT_BACKGROUND, DEFAULT_FOREGROUND, EcLevel};

mod commands;

#[derive(Parser)]
#[command(name = "qrgate")]
#[command(version)]
#[command(about = "Session-gated QR code generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show whether a session is active
    Status,
    /// Sign in with email and password
    Login(CredentialArgs),
    /// Create a new account (confirmation is sent by email)
    Signup(CredentialArgs),
    /// Send password reset instructions
    ResetPassword {
        /// Account email
        #[arg(long)]
        email: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Render a QR code and save it as qrcode.png (requires a session)
    Generate(GenerateArgs),
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Args, Debug)]
struct CredentialArgs {
    /// Account email
    #[arg(long)]
    email: String,

    /// Password (read from stdin when omitted)
    #[arg(long, env = "QRGATE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// Text or URL to encode
    content: String,

    /// Image size in pixels (clamped to 128..=512)
    #[arg(long, default_value_t = 256, allow_negative_numbers = true)]
    size: i64,

    /// Foreground (module) color
    #[arg(long, default_value = DEFAULT_FOREGROUND)]
    fg: String,

    /// Background color
    #[arg(long, default_value = DEFAULT_BACKGROUND)]
    bg: String,

    /// Error-correction level (L, M, Q, H)
    #[arg(long, default_value = "L")]
    level: EcLevel,

    /// Omit the quiet zone around the symbol
    #[arg(long)]
    no_margin: bool,

    /// Output directory (default: [export] directory from config)
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Also print the PNG data URI
    #[arg(long)]
    data_uri: bool,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Config commands must work even when config.toml is broken.
    let config = match cli.command {
        Commands::Config { .. } => Config::default(),
        _ => Config::load()?,
    };
    let _log_guard = logging::init(config.log_file.as_deref())?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli, config).await })
}

async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Status => commands::auth::status(&config).await,
        Commands::Login(args) => commands::auth::login(&config, args.email, args.password).await,
        Commands::Signup(args) => commands::auth::signup(&config, args.email, args.password).await,
        Commands::ResetPassword { email } => commands::auth::reset_password(&config, email).await,
        Commands::Logout => commands::auth::logout(&config).await,
        Commands::Generate(args) => {
            let options = commands::generate::Options {
                content: args.content,
                size: args.size,
                foreground: args.fg,
                background: args.bg,
                level: args.level,
                include_margin: !args.no_margin,
                out: args.out,
                print_data_uri: args.data_uri,
            };
            commands::generate::run(&config, options).await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
