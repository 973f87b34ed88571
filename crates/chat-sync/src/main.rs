//! Headless chat client
//!
//! Run with:
//! ```bash
//! CHAT_USER_ID=u1 CHAT_AUTH_TOKEN=... cargo run -p chat-sync
//! ```
//!
//! Endpoints and timeouts are loaded from environment variables. The client
//! keeps the room list in sync and logs every state change until Ctrl-C.

use chat_common::{try_init_tracing_with_config, ClientConfig, TracingConfig};
use chat_sync::{ChatSession, Identity};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Chat client failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        gateway = %config.endpoints.namespace_url(),
        "Configuration loaded"
    );

    let identity = Identity::new(
        std::env::var("CHAT_USER_ID")?,
        std::env::var("CHAT_AUTH_TOKEN").unwrap_or_default(),
    );
    let session = ChatSession::connect(identity, &config).await?;
    let client = session.client();
    let mut updates = client.subscribe();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                info!(
                    connection = %snapshot.connection,
                    rooms = snapshot.rooms.len(),
                    unread = snapshot.total_unread,
                    active_room = ?snapshot.active_room,
                    messages = snapshot.messages.len(),
                    "State updated"
                );
                if let Some(reason) = snapshot.auth_error {
                    error!(reason = %reason, "Authentication rejected");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    session.shutdown().await;
    Ok(())
}
