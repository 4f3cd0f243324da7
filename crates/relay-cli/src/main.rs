//! relay-cli: talk to an agent through the prompt relay.
//!
//! With PROMPT words: send one prompt, print the response, exit.
//! Without: interactive mode, responses stream in as they arrive.

use anyhow::Result;
use clap::Parser;
use relay_cli::{RESPONSE_TIMEOUT, RelayClient, Update, display, live::RECONNECT_DELAY};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay server URL
    #[arg(long, default_value = "http://localhost:8000")]
    server: String,

    /// Session ID
    #[arg(long, default_value = "cursor-desktop-session")]
    session: String,

    /// Prompt to send (interactive mode if omitted)
    prompt: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args = Args::parse();
    let client = RelayClient::new(args.server, args.session);

    if args.prompt.is_empty() {
        interactive(client).await
    } else {
        let prompt = args.prompt.join(" ");
        let response = relay_cli::ask(&client, &prompt, RESPONSE_TIMEOUT).await?;
        println!("{}", response.text);
        Ok(())
    }
}

async fn interactive(client: RelayClient) -> Result<()> {
    println!("Server: {}", client.server_url());
    println!("Session: {}", client.session_id());
    println!("Type a prompt and press Enter. 'history' shows recent messages, 'exit' quits.");

    let live_task = tokio::spawn(stream_live(client.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        match input.to_lowercase().as_str() {
            "exit" | "quit" => break,
            "history" => match client.recent_history(20).await {
                Ok(page) => print!("{}", display::format_history(&page)),
                Err(e) => eprintln!("Error fetching history: {e}"),
            },
            _ => match client.send_prompt(input).await {
                Ok(receipt) => tracing::debug!(client_msg_id = %receipt.client_msg_id, "Prompt sent"),
                Err(e) => eprintln!("Error: {e}"),
            },
        }
    }

    live_task.abort();
    println!("Goodbye!");
    Ok(())
}

/// Print live updates, reconnecting whenever the channel drops.
async fn stream_live(client: RelayClient) {
    loop {
        match client.connect_live().await {
            Ok(mut live) => loop {
                match live.next_update().await {
                    Ok(Some(Update::Message(r))) => println!("\nAssistant: {}", r.text),
                    Ok(Some(Update::ServerError { error, details })) => {
                        eprintln!("Server error: {error} - {}", details.unwrap_or_default());
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("Live channel error: {e}");
                        break;
                    }
                }
            },
            Err(e) => tracing::warn!("Live channel connect failed: {e}"),
        }
        tracing::info!("Reconnecting in {} seconds", RECONNECT_DELAY.as_secs());
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}
