//! HTTP service: data files, rank conversion, backend proxy and sign-in.

pub mod error;
pub mod routes;
pub mod state;

use anyhow::{Context, Result};
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use routes::{auth, gaokao, health, proxy, rank};
pub use state::{AppState, SharedState};

/// All routes with CORS and request tracing
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/health", get(health::health_handler))
        .route("/api/gaokao/data", get(gaokao::data_handler))
        .route("/api/gaokao/available", get(gaokao::available_handler))
        .route("/api/rank/getRank", get(rank::get_rank_handler))
        .route("/api/rank/getScore", get(rank::get_score_handler))
        .route("/api/options/provinces", get(proxy::provinces_handler))
        .route(
            "/api/report/get",
            get(proxy::report_get_handler).post(proxy::report_post_handler),
        )
        .route("/api/voluntary/majorGroup", post(proxy::major_group_handler))
        .route(
            "/api/voluntary/majorPriority",
            post(proxy::major_priority_handler),
        )
        .route(
            "/api/voluntary/universityPriority",
            post(proxy::university_priority_handler)
                .get(proxy::university_priority_status_handler),
        )
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/logout", post(auth::logout_handler))
        .route("/api/auth/session", get(auth::session_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind, serve until Ctrl+C or SIGTERM, then drain
pub async fn start_server(config: Config) -> Result<()> {
    info!("Initializing state...");
    let state = AppState::new(config)?;

    info!(
        data_dir = %state.config.data_dir.display(),
        backend = %state.backend.base_url(),
        users = state.users.len(),
        "state ready"
    );

    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use axum::body::Body;
    use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tower::ServiceExt;

    /// Router over a temporary data directory and user store
    pub(crate) struct TestApp {
        pub dir: TempDir,
        pub router: Router,
        pub state: SharedState,
    }

    /// Directory laid out, state not yet built
    pub(crate) struct PendingApp {
        dir: TempDir,
        backend_url: String,
    }

    impl PendingApp {
        pub fn users_path(&self) -> PathBuf {
            self.dir.path().join("users.json")
        }

        pub async fn start(self) -> TestApp {
            let config = Config {
                data_dir: self.dir.path().join("data"),
                users_path: Some(self.users_path()),
                backend_url: self.backend_url.clone(),
                ..Config::default()
            };
            let state = AppState::new(config).unwrap();
            TestApp {
                dir: self.dir,
                router: build_router(state.clone()),
                state,
            }
        }
    }

    impl TestApp {
        pub fn prepare() -> PendingApp {
            Self::prepare_with_backend("http://127.0.0.1:9")
        }

        fn prepare_with_backend(backend_url: &str) -> PendingApp {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir(dir.path().join("data")).unwrap();
            PendingApp {
                dir,
                backend_url: backend_url.to_string(),
            }
        }

        pub async fn new() -> Self {
            Self::prepare().start().await
        }

        pub async fn with_backend(backend_url: &str) -> Self {
            Self::prepare_with_backend(backend_url).start().await
        }

        pub fn data_dir(&self) -> PathBuf {
            self.dir.path().join("data")
        }
    }

    /// Serve `router` on an ephemeral port and return its base URL
    pub(crate) async fn spawn_backend(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Run one request; non-JSON bodies read as null
    pub(crate) async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub(crate) async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        send(router, request).await
    }

    pub(crate) async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(router, request).await
    }
}
