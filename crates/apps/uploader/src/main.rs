mod error;
mod format;
mod parse;
mod upload;

use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{get, post};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Largest accepted file, in bytes.
pub const DEFAULT_MAX_BYTES: usize = 20_000_000;

#[derive(Clone, Debug)]
pub struct UploaderConfig {
    pub addr: SocketAddr,
    pub max_bytes: usize,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 9200)),
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl UploaderConfig {
    fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        let addr = match env::var("UPLOADER_ADDR") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| format!("invalid UPLOADER_ADDR {raw:?}: {e}"))?,
            Err(_) => defaults.addr,
        };
        Ok(Self {
            addr,
            max_bytes: env_var_usize("UPLOADER_MAX_BYTES", defaults.max_bytes),
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match UploaderConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let addr = config.addr;

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {addr}: {err}");
            return ExitCode::FAILURE;
        }
    };
    info!(
        "uploader listening on http://{addr} (max {} bytes)",
        config.max_bytes
    );
    if let Err(err) = axum::serve(listener, app(config)).await {
        error!("server error: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn app(config: UploaderConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload::upload))
        // The size cap is enforced while streaming the file field.
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(config))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

fn env_var_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::{UploaderConfig, app};
    use crate::parse::shp::tests::zcta_points_zip;

    const BOUNDARY: &str = "geomap-upload-boundary";

    fn multipart(field: &str, file_name: &str, content_type: Option<&str>, data: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .into_bytes();
        if let Some(ct) = content_type {
            body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn router() -> Router {
        app(UploaderConfig::default())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        assert_eq!(send(router(), req).await, (StatusCode::OK, json!({"status": "ok"})));
    }

    #[tokio::test]
    async fn csv_upload_succeeds() {
        let req = multipart("data", "pop.csv", Some("text/csv"), b"zcta,pop\n94103,12\n");
        assert_eq!(
            send(router(), req).await,
            (
                StatusCode::OK,
                json!({"status": "success", "data": [{"zcta": 94103, "pop": 12}]})
            )
        );
    }

    #[tokio::test]
    async fn oversized_upload_is_refused() {
        let data = vec![b'1'; 20_000_001];
        let req = multipart("data", "big.csv", Some("text/csv"), &data);
        assert_eq!(
            send(router(), req).await,
            (
                StatusCode::OK,
                json!({"status": "failed", "message": "Uploads are capped at 20MB."})
            )
        );
    }

    #[tokio::test]
    async fn exactly_at_the_cap_is_accepted() {
        let config = UploaderConfig {
            max_bytes: 16,
            ..UploaderConfig::default()
        };
        let req = multipart("data", "x.json", None, b"[1,2,3,4,5,6,77]");
        let (_, body) = send(app(config), req).await;
        assert_eq!(body, json!({"status": "success", "data": [1, 2, 3, 4, 5, 6, 77]}));
    }

    #[tokio::test]
    async fn shapefile_bundle_yields_feature_per_record() {
        let req = multipart("data", "zcta.zip", Some("application/zip"), &zcta_points_zip());
        let (status, body) = send(router(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("success"));
        let features = body["data"]["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[1]["properties"]["ZCTA"], json!("02108"));
    }

    #[tokio::test]
    async fn octet_stream_uses_the_extension() {
        let req = multipart(
            "data",
            "doc.geojson",
            Some("application/octet-stream"),
            br#"{"type":"FeatureCollection","features":[]}"#,
        );
        let (_, body) = send(router(), req).await;
        assert_eq!(body["data"], json!({"type": "FeatureCollection", "features": []}));
    }

    #[tokio::test]
    async fn unknown_mime_type_fails() {
        let req = multipart("data", "photo.png", Some("image/png"), b"\x89PNG");
        assert_eq!(
            send(router(), req).await.1,
            json!({"status": "failed", "message": "Unsupported file type: image/png"})
        );
    }

    #[tokio::test]
    async fn parse_errors_are_reported_not_raised() {
        let req = multipart("data", "bad.json", Some("application/json"), b"{");
        let (status, body) = send(router(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("failed"));
        assert!(body["message"].as_str().unwrap().starts_with("Could not read JSON file"));
    }

    #[tokio::test]
    async fn missing_data_field_fails() {
        let req = multipart("file", "pop.csv", Some("text/csv"), b"a\n1\n");
        let (_, body) = send(router(), req).await;
        assert_eq!(body["status"], json!("failed"));
    }

    #[tokio::test]
    async fn non_multipart_request_fails_with_200() {
        let req = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = send(router(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("failed"));
    }
}
