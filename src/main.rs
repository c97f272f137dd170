//! dotpush: push coding-practice solutions to GitHub.
//!
//! Command-line front end over the same `App` the RPC server uses.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotpush::app::App;
use dotpush::logging::init_tracing;
use dotpush::managers::background_poller::EXPIRED_REASON;
use dotpush::services::language_classifier::classify;
use dotpush::services::page_snapshot::PageSnapshot;
use dotpush::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use dotpush::types::errors::AuthError;
use dotpush::types::message::BackgroundEvent;

#[derive(Parser)]
#[command(name = "dotpush")]
#[command(author, version, about = "Push coding-practice solutions to GitHub")]
#[command(propagate_version = true)]
struct Cli {
    /// Data directory for the credential store (default: platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with the GitHub device flow
    Login,

    /// Remove the stored credential
    Logout,

    /// Show whether a valid credential is stored
    Status,

    /// Detect the language of a source file
    Classify {
        /// Source file to classify
        file: PathBuf,
    },

    /// Extract the solution from a captured page snapshot
    Extract {
        /// Page snapshot (JSON)
        snapshot: PathBuf,
    },

    /// Extract the solution from a page snapshot and push it
    Push {
        /// Page snapshot (JSON)
        snapshot: PathBuf,

        /// Problem URL (default: the snapshot's url)
        #[arg(short, long)]
        url: Option<String>,

        /// Language override, e.g. python3 or cpp
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Show or edit settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the settings file path and contents
    Show,

    /// Set one value by dot path, e.g. github.client_id
    Set {
        key: String,
        /// JSON value; bare words are taken as strings
        value: String,
    },

    /// Restore defaults
    Reset,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Classify { file } => {
            let text = fs::read_to_string(&file)?;
            println!("{}", classify(&text));
        }
        Commands::Config { action } => cmd_config(action)?,
        command => {
            let app = App::new(cli.data_dir.as_deref())?;
            match command {
                Commands::Login => cmd_login(&app).await?,
                Commands::Logout => {
                    app.logout()?;
                    println!("Signed out");
                }
                Commands::Status => {
                    let status = app.auth_status().await;
                    match status.username {
                        Some(username) if status.authenticated => println!("Signed in as {}", username),
                        _ => println!("Not signed in"),
                    }
                }
                Commands::Extract { snapshot } => {
                    let page = PageSnapshot::from_file(&snapshot)?;
                    let result = app.extract(&page);
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                Commands::Push {
                    snapshot,
                    url,
                    language,
                } => cmd_push(&app, &snapshot, url, language.as_deref()).await?,
                Commands::Classify { .. } | Commands::Config { .. } => {}
            }
        }
    }
    Ok(())
}

async fn cmd_login(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let status = app.auth_status().await;
    if let (true, Some(username)) = (status.authenticated, status.username) {
        println!("Already signed in as {}", username);
        return Ok(());
    }

    let mut events = app.poller.subscribe();
    let session = app.begin_login().await?;
    println!("Open {} and enter the code: {}", session.verification_uri, session.user_code);

    tokio::select! {
        event = events.recv() => match event? {
            BackgroundEvent::AuthComplete { profile, .. } => {
                println!("Signed in as {}", profile.login);
                Ok(())
            }
            BackgroundEvent::AuthFailed { reason } if reason == EXPIRED_REASON => {
                Err(AuthError::Expired.into())
            }
            BackgroundEvent::AuthFailed { reason } => Err(AuthError::Denied(reason).into()),
        },
        found = app.wait_for_login(&session) => {
            app.poller.cancel();
            let credential = found?;
            println!("Signed in as {}", credential.username);
            Ok(())
        }
    }
}

async fn cmd_push(
    app: &App,
    snapshot: &Path,
    url: Option<String>,
    language: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let page = PageSnapshot::from_file(snapshot)?;
    let url = url
        .or_else(|| page.url.clone())
        .ok_or("no problem URL: pass --url or capture it in the snapshot")?;
    if !dotpush::app::is_practice_page(&url) {
        return Err(format!("not a problem page: {}", url).into());
    }

    let result = app.push_page(&page, &url, language).await?;
    for warning in &result.warnings {
        eprintln!("Warning: {}", warning);
    }
    let verb = if result.created { "Created" } else { "Updated" };
    println!("{} {}", verb, result.html_url);
    Ok(())
}

fn cmd_config(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = SettingsEngine::new(None);
    engine.load()?;
    match action {
        ConfigAction::Show => {
            println!("# {}", engine.get_config_path());
            println!("{}", serde_json::to_string_pretty(engine.get_settings())?);
        }
        ConfigAction::Set { key, value } => {
            let parsed = serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
            engine.set_value(&key, parsed)?;
            println!("Set {}", key);
        }
        ConfigAction::Reset => {
            engine.reset()?;
            println!("Settings reset to defaults");
        }
    }
    Ok(())
}
