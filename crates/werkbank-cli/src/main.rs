use clap::{Parser, Subcommand};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use werkbank_core::{Claims, SettingsProvider, WerkbankSettings};
use werkbank_db::SqliteSettings;

#[derive(Parser)]
#[command(name = "werkbank")]
#[command(about = "Werkbank Local Administrative CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL", default_value = "werkbank.db")]
    db: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Global settings management
    Settings {
        #[command(subcommand)]
        sub: SettingsCommands,
    },
    /// Mint tokens for testing and service accounts
    Token {
        #[command(subcommand)]
        sub: TokenCommands,
    },
    /// Inspect the running host
    Modules {
        #[command(subcommand)]
        sub: ModuleCommands,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show the global settings row
    Show,
    /// Write the settings row (first-run setup)
    Init {
        #[arg(long)]
        base_url: String,
        #[arg(long)]
        auth_enabled: bool,
    },
    /// Toggle the global auth flag
    Auth {
        #[arg(long, action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Issue a signed bearer token
    Issue {
        /// Subject; a fresh UUID when omitted
        #[arg(long)]
        sub: Option<String>,
        #[arg(long)]
        name: Option<String>,
        /// Repeatable role grant
        #[arg(long)]
        role: Vec<String>,
        /// Lifetime in seconds
        #[arg(long, default_value_t = 3600)]
        ttl: u64,
        #[arg(long, env = "JWT_SECRET")]
        secret: String,
        #[arg(long, env = "JWT_ISSUER", default_value = "Werkbank")]
        issuer: String,
    },
}

#[derive(Subcommand)]
enum ModuleCommands {
    /// List the host's module roster
    List {
        #[arg(long, env = "HOST_URL", default_value = "http://localhost:5000")]
        host: String,
        /// Bearer token; omit when auth is disabled
        #[arg(long)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Settings { sub } => {
            let db = SqliteSettings::open(&cli.db)?;
            match sub {
                SettingsCommands::Show => match db.load()? {
                    Some(settings) => {
                        println!("auth_enabled: {}", settings.auth_enabled);
                        println!("base_url:     {}", settings.base_url);
                    }
                    None => println!("No settings row yet; run `settings init` or complete setup."),
                },
                SettingsCommands::Init {
                    base_url,
                    auth_enabled,
                } => {
                    db.complete_setup(&WerkbankSettings {
                        auth_enabled,
                        base_url,
                    })?;
                    println!("Settings row written.");
                }
                SettingsCommands::Auth { enabled } => {
                    db.set_auth_enabled(enabled)?;
                    println!("auth_enabled set to {enabled}");
                }
            }
        }
        Commands::Token { sub } => match sub {
            TokenCommands::Issue {
                sub,
                name,
                role,
                ttl,
                secret,
                issuer,
            } => {
                let exp = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)?
                    .as_secs()
                    + ttl;
                let claims = Claims {
                    sub: sub.unwrap_or_else(|| Uuid::new_v4().to_string()),
                    name,
                    roles: role,
                    iss: issuer.clone(),
                    aud: issuer,
                    exp: exp as usize,
                };
                let token = encode(
                    &Header::default(),
                    &claims,
                    &EncodingKey::from_secret(secret.as_bytes()),
                )?;
                println!("{token}");
            }
        },
        Commands::Modules { sub } => match sub {
            ModuleCommands::List { host, token } => {
                let url = format!("{}/api/modules", host.trim_end_matches('/'));
                let mut request = reqwest::Client::new().get(&url);
                if let Some(token) = token {
                    request = request.bearer_auth(token);
                }
                let response = request.send().await?;
                if !response.status().is_success() {
                    return Err(format!("host returned {}", response.status()).into());
                }
                let roster: serde_json::Value = response.json().await?;
                println!("{:<16} {:<12} {:<10} {}", "Module", "Version", "Healthy", "Last seen (ms)");
                println!("{}", "-".repeat(60));
                for entry in roster.as_array().into_iter().flatten() {
                    println!(
                        "{:<16} {:<12} {:<10} {}",
                        entry["module"]["ModuleName"].as_str().unwrap_or("?"),
                        entry["module"]["Version"].as_str().unwrap_or("?"),
                        entry["healthy"].as_bool().unwrap_or(false),
                        entry["last_seen_ms"]
                            .as_u64()
                            .map_or_else(|| "never".to_string(), |ms| ms.to_string()),
                    );
                }
            }
        },
    }

    Ok(())
}
