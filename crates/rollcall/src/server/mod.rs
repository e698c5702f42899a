//! HTTP service for rollcall.
//!
//! Wires the submission handler, the record store and the live channel
//! into an axum router:
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /` | form for opening a session |
//! | `POST /` | open a session, returns the form link, its QR code and existing records |
//! | `GET /attendance-form` | submission form for a session |
//! | `POST /attendance-form` | submit, answer with the form page |
//! | `POST /submit-attendance` | submit, answer with JSON |
//! | `GET /admin` | all records grouped by session |
//! | `GET /show-attendance/{lecture_name}/{date}/{time}` | one session |
//! | `GET /live` | WebSocket stream of `new_attendance` events |
//! | `GET /uploads/...` | stored photos |

mod error;
mod live;
pub mod pages;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

use crate::broadcast::Broadcaster;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::photos::PhotoStore;
use crate::record::SessionKey;
use crate::storage::{JsonFileStore, RecordStore};
use crate::submission::SubmissionHandler;

pub use error::ApiError;
pub use routes::{SessionView, SubmitResponse};

/// Shared state of the HTTP service.
#[derive(Debug)]
pub struct AppState {
    handler: SubmissionHandler,
    broadcaster: Broadcaster,
    public_url: String,
    uploads_dir: PathBuf,
    uploads_route: String,
    max_body_bytes: usize,
}

impl AppState {
    /// Build the state from configuration, backed by the JSON file store.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let store = Arc::new(JsonFileStore::new(config.attendance_path()));
        Self::with_store(config, store)
    }

    /// Build the state around an existing record store.
    #[must_use]
    pub fn with_store(config: &Config, store: Arc<dyn RecordStore>) -> Self {
        let broadcaster = Broadcaster::new(config.live.channel_capacity);
        let photos = PhotoStore::new(
            config.uploads_path(),
            config.uploads_dir_name(),
            config.uploads.allowed_extensions.clone(),
        );

        Self {
            handler: SubmissionHandler::new(store, photos, broadcaster.clone()),
            broadcaster,
            public_url: config.public_url(),
            uploads_dir: config.uploads_path(),
            uploads_route: format!("/{}", config.uploads_dir_name()),
            max_body_bytes: config.uploads.max_photo_bytes,
        }
    }

    /// The submission handler.
    #[must_use]
    pub fn handler(&self) -> &SubmissionHandler {
        &self.handler
    }

    /// The live channel.
    #[must_use]
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Link to the submission form of a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be encoded as a query string.
    pub fn form_url(&self, session: &SessionKey) -> Result<String> {
        form_url(&self.public_url, session)
    }
}

/// Link to the submission form of `session` under `base_url`.
///
/// This is the payload a QR code for the session encodes.
///
/// # Errors
///
/// Returns an error if the session cannot be encoded as a query string.
pub fn form_url(base_url: &str, session: &SessionKey) -> Result<String> {
    let query = serde_urlencoded::to_string(session)
        .map_err(|err| Error::internal(format!("cannot encode session: {err}")))?;
    Ok(format!(
        "{}/attendance-form?{query}",
        base_url.trim_end_matches('/')
    ))
}

/// Build the router for the given state.
pub fn router(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(&state.uploads_dir);

    Router::new()
        .route("/", get(routes::session_form).post(routes::open_session))
        .route(
            "/attendance-form",
            get(routes::attendance_form).post(routes::submit_form),
        )
        .route("/submit-attendance", post(routes::submit_json))
        .route("/admin", get(routes::admin))
        .route(
            "/show-attendance/{lecture_name}/{date}/{time}",
            get(routes::show_attendance),
        )
        .route("/live", get(live::live_updates))
        .nest_service(&state.uploads_route, uploads)
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP service until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve(config: &Config) -> Result<()> {
    info!("Using attendance file {}", config.attendance_path().display());
    let state = Arc::new(AppState::from_config(config));
    let app = router(state);

    let address = config.listen_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| Error::ServerBind {
            address: address.clone(),
            source,
        })?;
    info!("Server running on {address}");
    info!("Public URL is {}", config.public_url());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                error!("Failed to install terminate handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
