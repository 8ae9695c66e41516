mod state;
mod webhook;

use axum::{Router, extract::State, http::HeaderMap, routing::post};
use std::{io, sync::Arc};
use tokio::signal::{self, unix::SignalKind};

use crate::{App, config::WebhookConfig};

use state::RequestState;
use webhook::handle_webhook;

pub struct Server {
    app: Router,
    config: WebhookConfig,
}

impl Server {
    pub fn new(app: Arc<App>, config: WebhookConfig) -> Self {
        let router = Router::new()
            .route(
                "/buildkite",
                post(
                    |state: State<RequestState>, headers: HeaderMap, body: String| {
                        handle_webhook(state, headers, body)
                    },
                ),
            )
            .with_state(RequestState {
                app,
                secret: config.secret.clone(),
            });

        Self {
            app: router,
            config,
        }
    }

    pub async fn start(self) -> Result<(), io::Error> {
        let listener = tokio::net::TcpListener::bind(self.config.bind).await?;

        tracing::info!("listening on {}", listener.local_addr()?);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received SIGINT, shutting down"),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    let terminate = async {
        match signal::unix::signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                tracing::info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {}
    }
}
