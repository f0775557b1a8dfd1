use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use docudesk::config::{APP_ID, APP_NAME};
use docudesk::services::auth::AuthService;
use docudesk::services::chat::ChatEvent;
use docudesk::services::export::export_to_markdown;
use docudesk::services::guard::{self, Route, RouteDecision};
use docudesk::services::{ChatService, MockAuthBackend, Persistence, SettingsService, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let span = tracing::info_span!("app", id = APP_ID);
    let _enter = span.enter();

    let text = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if text.trim().is_empty() {
        bail!("usage: docudesk <message>");
    }

    let storage = Storage::new().await.context("Failed to open local storage")?;
    let persistence = Persistence::new(storage);
    let settings = SettingsService::load(&persistence).await;

    let backend = Arc::new(MockAuthBackend::new(persistence.clone(), Duration::ZERO));
    let mut auth = AuthService::new(backend);
    auth.restore().await;
    if !auth.state().is_authenticated() {
        let email = std::env::var("DOCUDESK_EMAIL").unwrap_or_else(|_| "editor@docudesk.io".into());
        let password = std::env::var("DOCUDESK_PASSWORD").unwrap_or_else(|_| "editor123".into());
        if !auth.login(&email, &password).await {
            bail!(
                "{}",
                auth.state().error.clone().unwrap_or_else(|| "Login failed".into())
            );
        }
    }

    if let Some(user) = &auth.state().user {
        tracing::info!("Signed in as {} ({})", user.name, user.role.display_name());
    }

    match guard::check_session(auth.state(), Route::Assistant) {
        RouteDecision::Render => {}
        RouteDecision::Redirect(path) => bail!("Not signed in (redirect to {})", path),
        RouteDecision::Forbidden => bail!("This account cannot use the assistant"),
    }

    let chat = ChatService::new(persistence, &settings);
    chat.load().await?;
    let mut events = chat.subscribe();

    chat.send_message(&text).await?;
    tracing::info!("{}: waiting for reply", APP_NAME);

    loop {
        match events.recv().await {
            Ok(ChatEvent::TypingChanged(false)) => break,
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => break,
        }
    }

    if let Some(conversation) = chat.active_conversation() {
        let messages = chat.messages(&conversation.id);
        println!("{}", export_to_markdown(&conversation, &messages));
    }

    chat.shutdown();
    Ok(())
}
