//! Command-line client for Folio.

mod api_client;

use anyhow::{Context, Result};
use api_client::ApiClient;
use clap::{Args, Parser, Subcommand};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use folio_core::{TokenSecret, codec};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

#[derive(Parser)]
#[command(name = "folioctl")]
#[command(about = "Command-line client for Folio")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct SessionArgs {
    /// Server URL (overrides client config)
    #[arg(long)]
    server: Option<String>,

    /// Subject id to act as; omit for anonymous
    #[arg(long)]
    subject: Option<u64>,

    /// Roles to present, comma separated
    #[arg(long, value_delimiter = ',')]
    roles: Vec<String>,

    /// Client config file path
    #[arg(long, env = "FOLIO_CLIENT_CONFIG")]
    client_config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show server health
    Health {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Open a document the way the viewer does and save the decoded bytes
    View {
        /// Document file name
        filename: String,
        /// Output path (defaults to the file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Redeem an already issued token and save the decoded bytes
    Fetch {
        /// Token from a rendered viewer page
        #[arg(long)]
        token: String,
        /// Base64 secret paired with the token
        #[arg(long)]
        secret: String,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Fetch a file directly, without a token
    Get {
        filename: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Apply the byte codec to a local file (it is its own inverse)
    #[command(alias = "encode")]
    Decode {
        /// Base64 secret
        #[arg(long)]
        secret: String,
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Client settings from `folioctl.toml` and `FOLIO_CLIENT_` variables.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClientConfig {
    server: Option<String>,
    subject: Option<u64>,
    roles: Vec<String>,
    subject_header: Option<String>,
    roles_header: Option<String>,
}

fn default_client_config_path() -> PathBuf {
    PathBuf::from("folioctl.toml")
}

fn load_client_config(path: &Path) -> Result<ClientConfig> {
    let mut figment = Figment::new();

    if path.exists() {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("FOLIO_CLIENT_").ignore(&["CONFIG"]));

    match figment.extract() {
        Ok(config) => Ok(config),
        Err(_) if !path.exists() => Ok(ClientConfig::default()),
        Err(err) => Err(anyhow::anyhow!(err).context("failed to load client configuration")),
    }
}

/// Build a client from flags layered over the client config.
fn build_client(session: &SessionArgs) -> Result<ApiClient> {
    let path = session
        .client_config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(default_client_config_path);
    let config = load_client_config(&path)?;

    let server = session
        .server
        .clone()
        .or(config.server)
        .unwrap_or_else(|| DEFAULT_SERVER.to_string());
    let subject = session.subject.or(config.subject);
    let roles = if session.roles.is_empty() {
        config.roles
    } else {
        session.roles.clone()
    };

    let mut client = ApiClient::new(&server)?.with_subject(subject, roles);
    if let (Some(subject_header), Some(roles_header)) =
        (config.subject_header.as_deref(), config.roles_header.as_deref())
    {
        client = client.with_headers(subject_header, roles_header);
    }
    tracing::debug!(server = %server, subject = ?subject, "Client configured");
    Ok(client)
}

fn decode_with(secret: &str, data: &[u8]) -> Result<Vec<u8>> {
    let key = TokenSecret::from_base64(secret).context("invalid secret")?;
    Ok(codec::transform(data, key.as_bytes()))
}

/// Local file name for a document, keeping only the final component so a
/// name supplied by the server cannot point outside the working directory.
fn default_output(filename: &str) -> Result<PathBuf> {
    Path::new(filename)
        .file_name()
        .map(PathBuf::from)
        .with_context(|| format!("cannot derive an output file from {filename:?}; pass --output"))
}

async fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    tokio::fs::write(path, data)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let Cli { command } = Cli::parse();

    match command {
        Commands::Health { session } => {
            let health = build_client(&session)?.health().await?;
            println!("Status:             {}", health.status);
            println!("Version:            {}", health.version);
            println!("Active tokens:      {}", health.active_tokens);
            println!("Cached derivatives: {}", health.cached_derivatives);
        }
        Commands::View {
            filename,
            output,
            session,
        } => {
            let client = build_client(&session)?;
            let viewer = client.view(&filename).await?;
            let content = client
                .fetch_content_at(&viewer.content_url, &viewer.token)
                .await?;
            let decoded = decode_with(&viewer.secret, &content.bytes)?;

            let output = match output {
                Some(path) => path,
                None => default_output(&viewer.filename)?,
            };
            write_output(&output, &decoded).await?;
            println!(
                "Saved {} ({} bytes, {})",
                output.display(),
                decoded.len(),
                viewer.entitlement
            );
        }
        Commands::Fetch {
            token,
            secret,
            output,
            session,
        } => {
            let content = build_client(&session)?.fetch_content(&token).await?;
            let decoded = decode_with(&secret, &content.bytes)?;
            write_output(&output, &decoded).await?;
            println!(
                "Saved {} ({} bytes, {})",
                output.display(),
                decoded.len(),
                content.entitlement.as_deref().unwrap_or("unknown")
            );
        }
        Commands::Get {
            filename,
            output,
            session,
        } => {
            let data = build_client(&session)?.get_file(&filename).await?;
            let output = match output {
                Some(path) => path,
                None => default_output(&filename)?,
            };
            write_output(&output, &data).await?;
            println!("Saved {} ({} bytes)", output.display(), data.len());
        }
        Commands::Decode {
            secret,
            input,
            output,
        } => {
            let data = tokio::fs::read(&input)
                .await
                .with_context(|| format!("failed to read {}", input.display()))?;
            let decoded = decode_with(&secret, &data)?;
            write_output(&output, &decoded).await?;
            println!("Wrote {} ({} bytes)", output.display(), decoded.len());
        }
    }

    Ok(())
}
