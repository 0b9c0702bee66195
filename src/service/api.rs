use crate::{
    application::app::Application,
    domain::{
        errors::AggregatorError,
        models::{AddressSummary, EnrichedTransaction, SearchQuery},
    },
    infrastructure::shutdown::{Shutdown, ShutdownChannel},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::{any::Any, sync::Arc};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use super::views::{IndexView, Views};

pub const INTERNAL_ERROR_MESSAGE: &str = "Erro interno no servidor";
pub const UNKNOWN_ERROR_DETAILS: &str = "Ocorreu um erro desconhecido";
pub const SEARCH_ERROR_MESSAGE: &str = "Failed to fetch data.";

pub struct AppState<A> {
    app: Arc<A>,
    views: Arc<Views>,
}

impl<A> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
            views: self.views.clone(),
        }
    }
}

pub async fn start_server(
    shutdown: ShutdownChannel,
    app: Arc<impl Application + Send + Sync + 'static>,
    listen_port: u16,
) -> anyhow::Result<()> {
    let views = Arc::new(Views::new()?);
    let router = router(app, views);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", listen_port)).await?;
    tracing::info!("API server started on port {}", listen_port);

    let mut shutdown_rx = shutdown.subscribe();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            tracing::warn!("API server received shutdown signal");
        })
        .await?;

    Ok(())
}

pub fn router<A>(app: Arc<A>, views: Arc<Views>) -> Router
where
    A: Application + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(index::<A>))
        .route("/search", get(search::<A>))
        .route("/address/:address", get(address_summary::<A>))
        .route("/address/:address/:txid", get(transaction_detail::<A>))
        .with_state(AppState { app, views })
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct ErrorBody {
    message: &'static str,
    details: String,
}

fn internal_error(details: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            message: INTERNAL_ERROR_MESSAGE,
            details,
        }),
    )
        .into_response()
}

/// Failure of a JSON route, reported as HTTP 500 with the error description.
pub struct ApiError(AggregatorError);

impl From<AggregatorError> for ApiError {
    fn from(err: AggregatorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("Error processing request: {}", self.0);
        internal_error(self.0.to_string())
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let reason = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    tracing::error!("Error processing request with unexpected failure: {}", reason);
    internal_error(UNKNOWN_ERROR_DETAILS.to_string())
}

fn render(views: &Views, view: &IndexView) -> Response {
    match views.render_index(view) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render index view: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE).into_response()
        }
    }
}

async fn index<A>(State(state): State<AppState<A>>) -> Response {
    render(&state.views, &IndexView::default())
}

async fn search<A>(State(state): State<AppState<A>>, Query(query): Query<SearchQuery>) -> Response
where
    A: Application + Send + Sync + 'static,
{
    let view = match state.app.search(query).await {
        Ok(results) => IndexView::from(results),
        Err(e) => {
            tracing::error!("Error: {}", e);
            IndexView::failed(SEARCH_ERROR_MESSAGE)
        }
    };
    render(&state.views, &view)
}

async fn address_summary<A>(
    State(state): State<AppState<A>>,
    Path(address): Path<String>,
) -> Result<Json<AddressSummary>, ApiError>
where
    A: Application + Send + Sync + 'static,
{
    let summary = state.app.address_summary(&address).await?;
    Ok(Json(summary))
}

async fn transaction_detail<A>(
    State(state): State<AppState<A>>,
    Path((address, txid)): Path<(String, String)>,
) -> Result<Json<EnrichedTransaction>, ApiError>
where
    A: Application + Send + Sync + 'static,
{
    let transaction = state.app.transaction_detail(&address, &txid).await?;
    Ok(Json(transaction))
}
