//! HTTP surface.
//!
//! | Route            | Handler                                  |
//! |------------------|------------------------------------------|
//! | `GET /`          | upload form                              |
//! | `POST /convert`  | multipart in, converted file out         |
//! | `GET /health`    | JSON liveness plus engine availability   |
//!
//! Handlers are thin: they decode the multipart body into [`FormFields`],
//! call [`Gateway::convert`], and stream the result. Every failure is a
//! [`GatewayError`], which renders itself as a plain-text response.

use crate::config::GatewayConfig;
use crate::convert::Gateway;
use crate::error::GatewayError;
use crate::form::UPLOAD_FORM;
use crate::options::{FormFields, UploadedFile};
use crate::output::DOWNLOAD_CONTENT_TYPE;
use crate::stream;
use axum::body::Body;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build the router around a shared gateway.
pub fn router(gateway: Arc<Gateway>) -> Router {
    let limit = gateway.config().max_upload_bytes;
    Router::new()
        .route("/", get(index))
        .route("/convert", post(convert))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

/// Bind `config.listen_addr` and serve until Ctrl-C.
pub async fn serve(config: GatewayConfig) -> Result<(), GatewayError> {
    let addr = config.listen_addr;
    let gateway = Arc::new(Gateway::new(config)?);

    if !gateway.engine().is_available().await {
        warn!(
            "{} at {} is not runnable; conversions will fail until it is installed",
            gateway.engine().name(),
            gateway.config().pandoc_path.display()
        );
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| GatewayError::io(format!("binding {addr}"), e))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, router(gateway))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GatewayError::io("serving HTTP", e))?;
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received, draining connections");
}

async fn index() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

async fn convert(
    State(gateway): State<Arc<Gateway>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, GatewayError> {
    let multipart = multipart.map_err(|e| GatewayError::MalformedRequest {
        reason: e.body_text(),
    })?;
    let fields = read_form(multipart).await?;
    let document = gateway.convert(fields).await?;

    let disposition = document.content_disposition();
    let (len, body) = stream::read_once(document.artifact).await?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, DOWNLOAD_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        Body::from_stream(body),
    )
        .into_response())
}

/// Drain a multipart body into [`FormFields`].
///
/// A part carrying a filename is a file, everything else is text.
pub async fn read_form(mut multipart: Multipart) -> Result<FormFields, GatewayError> {
    let malformed = |e: axum::extract::multipart::MultipartError| GatewayError::MalformedRequest {
        reason: e.body_text(),
    };

    let mut fields = FormFields::new();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let bytes = field.bytes().await.map_err(malformed)?;
                fields.insert_file(name, UploadedFile::new(Some(filename), bytes));
            }
            None => {
                let value = field.text().await.map_err(malformed)?;
                fields.insert_text(name, value);
            }
        }
    }
    Ok(fields)
}

async fn health(State(gateway): State<Arc<Gateway>>) -> impl IntoResponse {
    let engine = gateway.engine();
    let available = engine.is_available().await;
    let (status, label) = if available {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        status,
        Json(json!({
            "status": label,
            "service": "pandoc-gateway",
            "version": env!("CARGO_PKG_VERSION"),
            "engine": {
                "name": engine.name(),
                "available": available,
            },
        })),
    )
}
