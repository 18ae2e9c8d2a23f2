use std::time::Duration;

use anyhow::{Context, Result};
use teamline_chat::ConversationEvent;
use teamline_config::AppConfig;
use teamline_socket::{SocketHandle, StaticToken};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::INFO)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

#[derive(Clone)]
pub struct ClientServices {
    pub credentials: StaticToken,
    ws_url: String,
    connect_timeout: Duration,
}

impl ClientServices {
    pub fn initialise(config: &AppConfig) -> Result<Self> {
        let credentials = StaticToken::new(config.auth.access_token.clone());
        if config.auth.access_token.is_some() {
            info!("using configured access token");
        } else {
            info!("no access token configured, connecting anonymously");
        }

        Ok(Self {
            credentials,
            ws_url: config.server.ws_url.clone(),
            connect_timeout: Duration::from_secs(config.server.connect_timeout_seconds),
        })
    }

    /// Establish the socket connection, returning the transport handle and
    /// the inbound event receiver.
    pub async fn connect_socket(
        &self,
    ) -> Result<(SocketHandle, UnboundedReceiver<ConversationEvent>)> {
        let (handle, events) =
            teamline_socket::connect(&self.ws_url, &self.credentials, self.connect_timeout)
                .await
                .with_context(|| format!("failed to connect to {}", self.ws_url))?;

        info!(url = %self.ws_url, "socket connection established");
        Ok((handle, events))
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialise_wires_credentials_from_config() {
        use teamline_socket::CredentialProvider;

        let mut config = AppConfig::default();
        config.auth.access_token = Some("secret".to_string());

        let services = ClientServices::initialise(&config).unwrap();
        assert_eq!(
            services.credentials.access_token(),
            Some("secret".to_string())
        );
    }
}
