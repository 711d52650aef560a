//! Webex CLI - Main entry point

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webex_foundation::WebexConfig;

/// 액세스 토큰 환경 변수
const TOKEN_ENV: &str = "WEBEX_ACCESS_TOKEN";

/// Webex - command line client for the Webex REST APIs
#[derive(Parser, Debug)]
#[command(name = "webex")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Access token (overrides WEBEX_ACCESS_TOKEN and config)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered plugins
    Plugins,
    /// Manage rooms
    Rooms {
        #[command(subcommand)]
        command: RoomsCommand,
    },
    /// Send messages
    Messages {
        #[command(subcommand)]
        command: MessagesCommand,
    },
    /// Show the authenticated user
    Whoami,
    /// Manage the device registration
    Device {
        #[command(subcommand)]
        command: DeviceCommand,
    },
    /// Clear stored credentials
    Logout,
}

#[derive(Subcommand, Debug)]
enum RoomsCommand {
    /// Create a room
    Create {
        /// Room title
        #[arg(short, long)]
        title: String,
    },
    /// List rooms
    List {
        /// Maximum number of rooms per page
        #[arg(short, long)]
        max: Option<u32>,

        /// Follow pagination links until the last page
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand, Debug)]
enum MessagesCommand {
    /// Send a message to a room
    Send {
        /// Target room id
        #[arg(short, long)]
        room: String,

        /// Plain text
        #[arg(short, long)]
        text: String,

        /// Send the text as markdown
        #[arg(long)]
        markdown: bool,
    },
}

#[derive(Subcommand, Debug)]
enum DeviceCommand {
    /// Register this client as a device
    Register,
    /// Remove the device registration
    Unregister,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = WebexConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        WebexConfig::default()
    });

    // Initialize logging
    let log_level = if args.debug {
        "debug".to_string()
    } else {
        config.log_level.clone().unwrap_or_else(|| "info".to_string())
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let token = args
        .token
        .clone()
        .or_else(|| std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty()))
        .or_else(|| config.access_token.clone());

    match args.command {
        Command::Plugins => commands::list_plugins(),
        Command::Rooms { command } => {
            let webex = commands::connect(&config, token).await?;
            match command {
                RoomsCommand::Create { title } => commands::create_room(&webex, &title).await,
                RoomsCommand::List { max, all } => commands::list_rooms(&webex, max, all).await,
            }
        }
        Command::Messages {
            command:
                MessagesCommand::Send {
                    room,
                    text,
                    markdown,
                },
        } => {
            let webex = commands::connect(&config, token).await?;
            commands::send_message(&webex, &room, &text, markdown).await
        }
        Command::Whoami => {
            let webex = commands::connect(&config, token).await?;
            commands::whoami(&webex).await
        }
        Command::Device { command } => {
            let webex = commands::connect(&config, token).await?;
            match command {
                DeviceCommand::Register => commands::register_device(&webex).await,
                DeviceCommand::Unregister => commands::unregister_device(&webex).await,
            }
        }
        Command::Logout => {
            let webex = commands::connect(&config, token).await?;
            commands::logout(&webex).await
        }
    }
}
