use std::{sync::Arc, time::Instant};

use anyhow::Context as _;
use axum::{
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use log::{debug, info};
use tower_http::services::ServeDir;

use crate::{config::ServeConfig, context::Context, error::StoreError, store::PostStore};

mod activity;
mod admin;
mod auth;
mod error;
mod posts;
mod rebuild;
mod webhooks;

pub(crate) use activity::ActivityLog;
pub(crate) use auth::Credentials;
pub(crate) use rebuild::{spawn_rebuild_worker, RebuildHandle};

use error::ApiError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub ctx: Arc<Context>,
    pub credentials: Arc<Credentials>,
    pub activity: Arc<ActivityLog>,
    pub rebuild: RebuildHandle,
}

impl AppState {
    /// Runs a blocking store operation off the async workers.
    pub async fn with_store<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&PostStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let ctx = self.ctx.clone();
        tokio::task::spawn_blocking(move || f(&ctx.store))
            .await
            .map_err(|e| ApiError::internal("Storage task failed", e))?
            .map_err(ApiError::from)
    }
}

async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();
    let response = next.run(request).await;
    debug!(
        "{method} {uri} -> {} ({}ms)",
        response.status(),
        start.elapsed().as_millis()
    );
    response
}

pub(crate) fn build_router(state: AppState) -> Router {
    let webhooks = Router::new()
        .route(
            "/api/webhook",
            get(webhooks::describe_article).post(webhooks::create_article),
        )
        .route(
            "/api/matches",
            get(webhooks::describe_match).post(webhooks::create_match),
        )
        .route(
            "/api/transfers",
            get(webhooks::describe_transfer).post(webhooks::create_transfer),
        )
        .route(
            "/api/viral",
            get(webhooks::describe_viral).post(webhooks::create_viral),
        )
        .route(
            "/api/admin/delete-manager",
            get(posts::deleted_posts).post(posts::delete_manager),
        )
        .route("/api/posts/delete", delete(posts::hard_delete))
        .route("/api/posts/soft-delete", post(posts::soft_delete))
        .route("/api/posts/restore", post(posts::restore))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            activity::record_activity,
        ));

    let public_api = Router::new()
        .route("/api/posts/list", get(posts::list_posts))
        .route("/api/posts/featured", get(posts::featured_posts))
        .route("/api/posts", get(posts::filter_posts))
        .route("/api/posts/{id}", get(posts::get_post));

    let admin = Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/admin/posts", get(admin::posts))
        .route("/admin/webhooks", get(admin::webhooks))
        .route("/admin/posts/new", get(admin::new_post_form).post(admin::create_post))
        .route("/admin/posts/{filename}/soft-delete", post(admin::soft_delete))
        .route("/admin/posts/{filename}/restore", post(admin::restore))
        .route("/admin/posts/{filename}/delete", post(admin::hard_delete))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let out_dir = state.ctx.config.out_dir.clone();
    Router::new()
        .merge(webhooks)
        .merge(public_api)
        .merge(admin)
        .with_state(state)
        .fallback_service(ServeDir::new(out_dir))
        .layer(middleware::from_fn(log_requests))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

pub(crate) async fn serve(ctx: Context, serve_config: ServeConfig) -> anyhow::Result<()> {
    let ctx = Arc::new(ctx);
    let state = AppState {
        ctx: ctx.clone(),
        credentials: Arc::new(Credentials {
            webhook_secret: serve_config.webhook_secret,
            admin_password: serve_config.admin_password,
        }),
        activity: Arc::new(ActivityLog::default()),
        rebuild: spawn_rebuild_worker(ctx),
    };
    state.rebuild.request();

    let listener = tokio::net::TcpListener::bind(serve_config.listen)
        .await
        .with_context(|| format!("binding {}", serve_config.listen))?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, Response},
    };
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use tower::ServiceExt;

    use super::*;
    use crate::config::testing::config_in;

    pub(crate) const SECRET: &str = "test-secret";
    pub(crate) const ADMIN_PASSWORD: &str = "admin-pass";

    /// State over a temp content dir; rebuild requests are recorded but no
    /// worker runs.
    pub(crate) fn state(dir: &tempfile::TempDir) -> AppState {
        let ctx = Context::new(config_in(dir.path())).unwrap();
        ctx.config.validate().unwrap();
        AppState {
            ctx: Arc::new(ctx),
            credentials: Arc::new(Credentials {
                webhook_secret: SECRET.to_string(),
                admin_password: ADMIN_PASSWORD.to_string(),
            }),
            activity: Arc::new(ActivityLog::default()),
            rebuild: RebuildHandle::default(),
        }
    }

    pub(crate) fn bearer() -> String {
        format!("Bearer {SECRET}")
    }

    pub(crate) fn basic() -> String {
        format!("Basic {}", STANDARD.encode(format!("admin:{ADMIN_PASSWORD}")))
    }

    pub(crate) fn json_request(method: &str, uri: &str, auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder
            .body(Body::from(body.to_string()))
            .expect("request should build")
    }

    pub(crate) async fn send(state: &AppState, request: Request<Body>) -> Response<Body> {
        build_router(state.clone())
            .oneshot(request)
            .await
            .expect("router should respond")
    }

    pub(crate) async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub(crate) async fn body_text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, Request, StatusCode};

    use super::testing::*;

    #[tokio::test]
    async fn static_output_is_served() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        crate::generator::generate(&state.ctx).unwrap();

        let request = Request::builder()
            .method(Method::GET)
            .uri("/robots.txt")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = send(&state, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("User-agent"));
    }

    #[tokio::test]
    async fn unknown_paths_are_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let request = Request::builder()
            .uri("/nope.html")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(send(&state, request).await.status(), StatusCode::NOT_FOUND);
    }
}
