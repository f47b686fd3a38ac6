use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};

use crate::{asset_cache::Offline, server_state::ServerState};

pub const ASSET_SOURCE_HEADER: HeaderName = HeaderName::from_static("x-asset-source");

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new().fallback(serve_asset).with_state(state)
}

/// Every GET goes through the network-first cache. Other methods are not cached.
async fn serve_asset(State(state): State<Arc<ServerState>>, method: Method, uri: Uri) -> Response {
    if method != Method::GET {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    match state.cache.fetch(path).await {
        Ok(asset) => {
            let mut response = (asset.status, asset.body).into_response();
            let headers = response.headers_mut();
            if let Some(content_type) = asset.content_type.and_then(|ct| HeaderValue::from_str(&ct).ok()) {
                headers.insert(header::CONTENT_TYPE, content_type);
            }
            headers.insert(ASSET_SOURCE_HEADER, HeaderValue::from_static(asset.source.as_str()));
            response
        }
        Err(Offline) => {
            tracing::warn!("Offline and no cached copy of {}", path);
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::asset_cache::tests::{cache_with, MockUpstream};

    async fn get(app: Router, path: &str) -> Response {
        app.oneshot(Request::get(path).body(Body::empty()).unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn serves_from_network_then_cache() {
        let dir = tempfile::tempdir().unwrap();
        let upstream = Arc::new(MockUpstream::default());
        upstream.serve("/index.html", "text/html", "<html>");
        let state = Arc::new(ServerState {
            cache: cache_with(upstream.clone(), dir.path()).await,
            ip_address: None,
        });

        let online = get(router(state.clone()), "/index.html").await;
        assert_eq!(online.status(), StatusCode::OK);
        assert_eq!(online.headers()[ASSET_SOURCE_HEADER], "network");
        assert_eq!(online.headers()[header::CONTENT_TYPE], "text/html");

        upstream.set_offline(true);
        let offline = get(router(state), "/index.html").await;
        assert_eq!(offline.status(), StatusCode::OK);
        assert_eq!(offline.headers()[ASSET_SOURCE_HEADER], "cache");
        let body = to_bytes(offline.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<html>");
    }

    #[tokio::test]
    async fn offline_miss_is_gateway_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let upstream = Arc::new(MockUpstream::default());
        upstream.set_offline(true);
        let state = Arc::new(ServerState {
            cache: cache_with(upstream, dir.path()).await,
            ip_address: None,
        });

        let response = get(router(state), "/app.js").await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn non_get_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let upstream = Arc::new(MockUpstream::default());
        let state = Arc::new(ServerState {
            cache: cache_with(upstream.clone(), dir.path()).await,
            ip_address: None,
        });

        let response = router(state)
            .oneshot(Request::post("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(upstream.requests.lock().unwrap().is_empty());
    }
}
