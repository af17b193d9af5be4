mod config;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use wishwall_board::render::{format_timestamp, render_board_html};
use wishwall_board::{BoardError, BoardHandle, BoardSnapshot, Reconciler, Session, create_room};
use wishwall_db::{Database, LocalStore};
use wishwall_gateway::RestBackend;
use wishwall_gateway::ip::lookup_public_ip;
use wishwall_types::{CookieSummary, DeviceInfo, OriginMetadata};

use crate::config::ClientConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so the board stays readable on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wishwall=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env();

    let address = match std::env::args().nth(1).as_deref() {
        Some("--new-room") => {
            let link = create_room(&config.page_url);
            println!("Share this link: {}", link.address);
            link.address
        }
        Some(address) => address.to_string(),
        None => config.page_url.clone(),
    };

    let db = Database::open(&config.db_path)?;
    let local = LocalStore::new(Arc::new(db));

    let remote = config.remote().map(|rest| Arc::new(RestBackend::new(rest)));
    if remote.is_none() {
        warn!("Remote backend not configured. Wishes are saved locally only.");
    }

    let http = reqwest::Client::new();
    let origin = collect_origin(&config, &http).await;

    let session = Session::from_address(&address);
    info!("Opening the wall in {} mode", session.mode());

    let mut reconciler = Reconciler::new(session, local, remote);
    if let Err(e) = reconciler.initialize().await {
        warn!("Initial load failed: {}", e);
    }

    let (handle, task) = BoardHandle::spawn(reconciler);
    print_board(&handle.snapshot().await?);
    println!("Type a wish and press enter. /board, /html, /new-room, /quit");

    let mut changes = handle.changes();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "/quit" => break,
                    "/board" => print_board(&handle.snapshot().await?),
                    "/html" => print!("{}", render_board_html(&handle.snapshot().await?)),
                    "/new-room" => match handle.create_room().await {
                        Ok(link) => println!("Share this link: {}", link.address),
                        Err(e) => println!("{}", e),
                    },
                    text => match handle.submit(text, &config.wisher_name, origin.clone()).await {
                        Ok(submitted) => match submitted.local_failure {
                            None => println!("Your wish has been submitted!"),
                            Some(e) => println!("Your wish is on the board, but {}", e),
                        },
                        Err(BoardError::Validation) => println!("Please write a wish!"),
                        Err(e) => return Err(e.into()),
                    },
                }
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                print_board(&handle.snapshot().await?);
            }
        }
    }

    handle.shutdown();
    task.await?;
    Ok(())
}

fn print_board(snapshot: &BoardSnapshot) {
    println!();
    println!("== Wishes ({}) ==", snapshot.mode);
    if let Some(notice) = &snapshot.notice {
        println!("{}", notice);
    }
    for entry in &snapshot.entries {
        println!(
            "[{}] {}: {}",
            format_timestamp(&entry.created_at),
            entry.wisher_name,
            entry.message
        );
    }
}

/// Origin metadata for wishes typed into this terminal.
async fn collect_origin(config: &ClientConfig, http: &reqwest::Client) -> OriginMetadata {
    let ip_address = if config.lookup_ip {
        lookup_public_ip(http).await
    } else {
        None
    };

    let platform = match std::env::consts::OS {
        "windows" => "Windows NT",
        "macos" => "Macintosh; Mac OS X",
        "linux" => "X11; Linux",
        "android" => "Linux; Android",
        other => other,
    };
    let user_agent = format!(
        "wishwall/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        platform,
        std::env::consts::ARCH
    );
    let language = std::env::var("LANG").unwrap_or_default();

    OriginMetadata {
        ip_address,
        device_info: Some(DeviceInfo::from_user_agent(&user_agent, std::env::consts::OS, &language)),
        // A terminal has no cookie jar.
        cookies: Some(CookieSummary::from_header(None)),
    }
}
