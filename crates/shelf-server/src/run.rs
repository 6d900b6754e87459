use crate::config::ServerConfig;
use crate::error::Result;
use axum::http::StatusCode;
use axum::{middleware, response::IntoResponse, routing::get, Router};
use futures::FutureExt;
use shelf_app::request_id::assign_request_id;
use shelf_app::state::{AppConfig, AppState};
use tracing::{debug, info};

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let mut app = main_router(state);

    if args.cors {
        app = app.layer(tower_http::cors::CorsLayer::very_permissive());
    }

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = std::net::SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server stopped");
    Ok(())
}

#[cfg(feature = "openapi")]
fn api_docs() -> utoipa::openapi::OpenApi {
    #[derive(utoipa::OpenApi)]
    #[openapi(info(title = "Shelf", description = "Book catalog API"))]
    struct OpenApi;

    use utoipa::OpenApi as _;
    OpenApi::openapi().nest("/api/book", shelf_app::rest_api::book::api_docs())
}

pub fn main_router(state: AppState) -> Router<()> {
    #[allow(unused_mut)]
    let mut router = Router::new()
        .nest("/api/book", shelf_app::rest_api::book::router())
        .with_state(state)
        .route("/health", get(health));

    #[cfg(feature = "openapi")]
    {
        let docs = api_docs();
        router = router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs),
        );
    }
    router.layer(middleware::from_fn(assign_request_id))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let app_config = AppConfig {
        base_url: config.base_url.clone(),
    };

    let database_url = config.database_url();
    debug!("Connecting to database {database_url}");
    let pool = shelf_dal::new_pool(&database_url).await?;
    shelf_dal::migrate(&pool).await?;
    info!("Database ready");

    Ok(AppState::new(app_config, pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use clap::Parser as _;
    use shelf_app::request_id::REQUEST_ID_HEADER;
    use tower::ServiceExt as _;
    use tracing_test::traced_test;

    async fn test_state() -> AppState {
        let config = ServerConfig::try_parse_from([
            "shelf-server",
            "--database-url",
            "sqlite::memory:",
            "--data-dir",
            "/tmp",
        ])
        .unwrap();
        build_state(&config).await.unwrap()
    }

    #[tokio::test]
    #[traced_test]
    async fn test_health() {
        let app = main_router(test_state().await);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[cfg(feature = "openapi")]
    #[test]
    fn test_api_docs_contain_book_paths() {
        let docs = api_docs();
        assert!(docs.paths.paths.contains_key("/api/book"));
        assert!(docs.paths.paths.contains_key("/api/book/{isbn}"));
        assert!(docs.paths.paths.contains_key("/api/book/count"));
    }
}
