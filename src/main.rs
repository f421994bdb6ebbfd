// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::io::{Read, Write};
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use pb::auth::{add_authorized_key, generate_signing_key, KeyDiscovery};
use pb::client::{self, SyncClient};
use pb::config::{
    ClientConfig, ConfigPaths, ServerConfig, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SERVER, HOST_ENV,
    KEY_ENV, PORT_ENV, PROGRAM_NAME, SERVER_ENV,
};
use pb::server;
use pb::telemetry::{self, CLIENT_FILTER, SERVER_FILTER, VERBOSE_FILTER};

/// Copies and pastes text between machines.
///
/// Shares a clipboard over the network using HTTPS and SSH key
/// authentication.
#[derive(Parser, Debug)]
#[command(name = "pb", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Server address
    #[arg(short, long, global = true, env = SERVER_ENV, default_value = DEFAULT_SERVER)]
    server: String,

    /// Server port
    #[arg(short, long, global = true, env = PORT_ENV, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Path to private key
    #[arg(long, global = true, env = KEY_ENV)]
    key: Option<PathBuf>,

    /// Enable logging output for debugging
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Starts the listener server
    Server(ServerArgs),

    /// Copies data to the server's clipboard
    Copy(CopyArgs),

    /// Pastes text from the server's clipboard
    Paste,

    /// Opens a URL on the server
    Open {
        /// URL to open in the server's default browser
        url: String,
    },

    /// Quits server
    Quit,

    /// Generates a new pb-specific SSH key
    KeyGen,

    /// Prints the public key that will be used for authentication
    KeyPrint,

    /// Adds a public key to the server's authorized_keys
    KeyAdd {
        /// Public key line; read from stdin when omitted
        key: Option<String>,
    },
}

#[derive(Args, Debug)]
struct ServerArgs {
    /// Use the in-memory clipboard only
    #[arg(long)]
    fallback: bool,

    /// Use CLI tools for clipboard operations (wl-copy/paste, xclip, xsel or termux)
    #[arg(long)]
    use_cli_tool: bool,

    /// Address to bind
    #[arg(long, env = HOST_ENV, default_value = DEFAULT_HOST)]
    host: IpAddr,
}

#[derive(Args, Debug)]
struct CopyArgs {
    /// Data to copy; read from stdin when omitted
    data: Option<String>,

    /// Bypass the clipboard size limit
    #[arg(long)]
    rosebud: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match (&cli.command, cli.log) {
        (Command::Server(_), _) => SERVER_FILTER,
        (_, true) => VERBOSE_FILTER,
        (_, false) => CLIENT_FILTER,
    };
    telemetry::init_tracing(filter);

    let result = server::run_to_exit(run(cli), server::RUNTIME_EXIT_GRACE)
        .context("could not start async runtime")
        .and_then(|result| result);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client_config = ClientConfig {
        server: cli.server,
        port: cli.port,
        key_path: cli.key,
    };

    match cli.command {
        Command::Server(args) => {
            let config = ServerConfig {
                host: args.host,
                port: client_config.port,
                paths: config_paths()?,
                use_fallback: args.fallback,
                use_external_tool: args.use_cli_tool,
            };
            server::serve(config, CancellationToken::new()).await
        }
        Command::Copy(args) => {
            let data = match args.data {
                Some(data) => Bytes::from(data),
                None => read_stdin().await?,
            };
            client::check_copy_size(data.len(), args.rosebud)?;

            let client = connect(&client_config)?;
            if let Err(remote) = client.copy(data.clone()).await {
                warn!(error = %remote, "Server copy failed, using local clipboard");
                client::local_copy(data).await.map_err(|local| {
                    anyhow!("server unreachable ({remote}) and local clipboard failed: {local}")
                })?;
            }
            Ok(())
        }
        Command::Paste => {
            let client = connect(&client_config)?;
            let content = match client.paste().await {
                Ok(content) => content.to_vec(),
                Err(remote) => {
                    warn!(error = %remote, "Server paste failed, using local clipboard");
                    client::local_paste().await.map_err(|local| {
                        anyhow!("server unreachable ({remote}) and local clipboard failed: {local}")
                    })?
                }
            };
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&content)?;
            stdout.flush()?;
            Ok(())
        }
        Command::Open { url } => {
            client::validate_url(&url)?;
            let client = connect(&client_config)?;
            client.open(&url).await?;
            println!("Successfully requested server to open URL: {url}");
            Ok(())
        }
        Command::Quit => {
            let client = connect(&client_config)?;
            client.quit().await?;
            Ok(())
        }
        Command::KeyGen => {
            let paths = config_paths()?;
            let key_path = generate_signing_key(&paths)?;
            println!("New ed25519 key pair generated in {}/", paths.root().display());
            println!("You can now add this key to a server's authorized_keys file by running:");
            println!(
                "  {PROGRAM_NAME} key-add \"$(cat {}.pub)\"",
                key_path.display()
            );
            Ok(())
        }
        Command::KeyPrint => {
            let identity = KeyDiscovery::new(client_config.key_path).discover()?;
            println!("{}", identity.authorized_key_line()?);
            Ok(())
        }
        Command::KeyAdd { key } => {
            let line = match key {
                Some(key) => key,
                None => String::from_utf8(read_stdin().await?.to_vec())
                    .context("public key on stdin is not UTF-8")?,
            };
            let path = config_paths()?.authorized_keys();
            let fingerprint = add_authorized_key(&path, &line)?;
            println!("Successfully added key {fingerprint} to {}", path.display());
            Ok(())
        }
    }
}

/// Discover the signing key and build a client. Key errors are fatal.
fn connect(config: &ClientConfig) -> anyhow::Result<SyncClient> {
    let identity = KeyDiscovery::new(config.key_path.clone()).discover()?;
    Ok(SyncClient::new(config, identity)?)
}

fn config_paths() -> anyhow::Result<ConfigPaths> {
    ConfigPaths::from_home().context("could not determine home directory")
}

async fn read_stdin() -> anyhow::Result<Bytes> {
    let data = tokio::task::spawn_blocking(|| {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf).map(|_| buf)
    })
    .await?
    .context("failed to read from stdin")?;
    Ok(Bytes::from(data))
}
