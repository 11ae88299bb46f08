//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation,
//! body collection, route matching, and access logging.

use crate::config::AppState;
use crate::handler::resources;
use crate::http;
use crate::logger;
use crate::logger::AccessLogEntry;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
///
/// Generic over the body type so the full path is exercisable with
/// in-memory bodies; the server feeds it `hyper::body::Incoming`.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();

    let access_log = state
        .cached_access_log
        .load(std::sync::atomic::Ordering::Relaxed);
    let mut entry = access_log.then(|| new_log_entry(&req, remote_addr));

    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match method {
        Method::GET | Method::POST => {
            // 1. Reject bodies with an oversized declared length before
            //    reading anything
            if let Some(resp) = check_body_size(
                req.headers(),
                state.config.http.max_body_size,
                state.config.http.enable_cors,
            ) {
                resp
            } else {
                // 2. Collect the body (POST only) under the same cap, then
                //    dispatch. Chunked uploads carry no Content-Length, so
                //    the cap must also hold on the bytes actually read.
                match read_body(req, &method, state.config.http.max_body_size).await {
                    Ok(body) => dispatch(&method, &path, body, &state).await,
                    Err(BodyError::TooLarge) => {
                        logger::log_error(&format!(
                            "Request body exceeded {} bytes, rejecting",
                            state.config.http.max_body_size
                        ));
                        http::build_413_response(state.config.http.enable_cors)
                    }
                    Err(BodyError::Read(err)) => {
                        logger::log_warning(&format!("Failed to read request body: {err}"));
                        http::build_400_response(state.config.http.enable_cors)
                    }
                }
            }
        }
        _ => dispatch(&method, &path, Bytes::new(), &state).await,
    };

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response_body_bytes(&response);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route a request to the matching resource operation
///
/// OPTIONS is answered for every path so CORS preflights succeed even for
/// routes that do not exist. Unknown paths return an empty 404. Methods other
/// than GET/POST/OPTIONS get a 405.
pub async fn dispatch(
    method: &Method,
    path: &str,
    body: Bytes,
    state: &AppState,
) -> Response<Full<Bytes>> {
    match method {
        &Method::OPTIONS => http::build_options_response(state.config.http.enable_cors),
        &Method::GET => match state.resources.get(path) {
            Some(resource) => resources::serve_get(state, resource).await,
            None => http::build_404_response(),
        },
        &Method::POST => match state.resources.get(path) {
            Some(resource) => resources::serve_post(state, resource, body).await,
            None => http::build_404_response(),
        },
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            http::build_405_response()
        }
    }
}

/// Fast-path 413 from the declared Content-Length, before any body bytes
/// are read
fn check_body_size(
    headers: &hyper::HeaderMap,
    max_body_size: u64,
    enable_cors: bool,
) -> Option<Response<Full<Bytes>>> {
    let content_length = headers.get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response(enable_cors))
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Why body collection stopped short of a usable payload
enum BodyError {
    /// The bytes read exceeded `http.max_body_size`
    TooLarge,
    /// The transport failed mid-body
    Read(Box<dyn std::error::Error + Send + Sync>),
}

/// Collect the request body, capping the bytes actually read. GET bodies
/// are dropped unread.
async fn read_body<B>(
    req: Request<B>,
    method: &Method,
    max_body_size: u64,
) -> Result<Bytes, BodyError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if *method != Method::POST {
        return Ok(Bytes::new());
    }
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.is::<LengthLimitError>() => Err(BodyError::TooLarge),
        Err(err) => Err(BodyError::Read(err)),
    }
}

fn new_log_entry<B>(req: &Request<B>, remote_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = http_version_label(req.version()).to_string();
    entry.referer = header_value(req, "referer");
    entry.user_agent = header_value(req, "user-agent");
    entry
}

fn header_value<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn http_version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

/// Exact response body size, used for the access log
fn response_body_bytes(response: &Response<Full<Bytes>>) -> usize {
    response
        .body()
        .size_hint()
        .exact()
        .map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::MemoryStore;

    fn test_state() -> AppState {
        capped_state(10_485_760)
    }

    fn capped_state(max_body_size: u64) -> AppState {
        let mut config = Config::load_from("no-such-config-file").expect("defaults");
        config.http.max_body_size = max_body_size;
        let keys = config
            .resources
            .store_entries()
            .into_iter()
            .map(|(key, _)| key);
        AppState::new(&config, Arc::new(MemoryStore::new(keys)))
    }

    async fn body_bytes(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.expect("body").to_bytes()
    }

    fn header<'a>(resp: &'a Response<Full<Bytes>>, name: &str) -> Option<&'a str> {
        resp.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_get_returns_default_before_any_post() {
        let state = test_state();

        let resp = dispatch(&Method::GET, "/chat_history", Bytes::new(), &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(header(&resp, "Content-Type"), Some("application/json"));
        assert_eq!(body_bytes(resp).await, Bytes::from_static(b"{}"));

        let resp = dispatch(&Method::GET, "/atividades", Bytes::new(), &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_bytes(resp).await, Bytes::from_static(b"[]"));
    }

    #[tokio::test]
    async fn test_post_then_get_round_trip() {
        let state = test_state();
        let payload = Bytes::from_static(br#"[{"id":1,"done":false}]"#);

        let resp = dispatch(&Method::POST, "/atividades", payload.clone(), &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(header(&resp, "Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(body_bytes(resp).await, Bytes::new());

        let resp = dispatch(&Method::GET, "/atividades", Bytes::new(), &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(header(&resp, "Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(body_bytes(resp).await, payload);
    }

    #[tokio::test]
    async fn test_second_post_replaces_first() {
        let state = test_state();

        let first = Bytes::from_static(br#"{"msgs":["hi"]}"#);
        dispatch(&Method::POST, "/chat_history", first, &state).await;
        let second = Bytes::from_static(b"{}");
        dispatch(&Method::POST, "/chat_history", second.clone(), &state).await;

        let resp = dispatch(&Method::GET, "/chat_history", Bytes::new(), &state).await;
        assert_eq!(body_bytes(resp).await, second);
    }

    #[tokio::test]
    async fn test_resources_are_independent() {
        let state = test_state();

        let history = Bytes::from_static(br#"{"msgs":["hi"]}"#);
        dispatch(&Method::POST, "/chat_history", history.clone(), &state).await;

        // The other route still serves its own default
        let resp = dispatch(&Method::GET, "/atividades", Bytes::new(), &state).await;
        assert_eq!(body_bytes(resp).await, Bytes::from_static(b"[]"));

        let resp = dispatch(&Method::GET, "/chat_history", Bytes::new(), &state).await;
        assert_eq!(body_bytes(resp).await, history);
    }

    #[tokio::test]
    async fn test_unknown_path_returns_empty_404() {
        let state = test_state();

        for method in [Method::GET, Method::POST] {
            let resp = dispatch(&method, "/nope", Bytes::new(), &state).await;
            assert_eq!(resp.status(), 404);
            assert_eq!(header(&resp, "Access-Control-Allow-Origin"), None);
            assert_eq!(body_bytes(resp).await, Bytes::new());
        }
    }

    #[tokio::test]
    async fn test_options_answered_for_any_path() {
        let state = test_state();

        for path in ["/chat_history", "/atividades", "/nope"] {
            let resp = dispatch(&Method::OPTIONS, path, Bytes::new(), &state).await;
            assert_eq!(resp.status(), 200);
            assert_eq!(header(&resp, "Access-Control-Allow-Origin"), Some("*"));
            assert_eq!(
                header(&resp, "Access-Control-Allow-Methods"),
                Some("GET, POST, OPTIONS")
            );
            assert_eq!(
                header(&resp, "Access-Control-Allow-Headers"),
                Some("Content-Type")
            );
        }
    }

    #[tokio::test]
    async fn test_other_methods_return_405() {
        let state = test_state();

        for method in [Method::PUT, Method::DELETE, Method::HEAD, Method::PATCH] {
            let resp = dispatch(&method, "/chat_history", Bytes::new(), &state).await;
            assert_eq!(resp.status(), 405, "method {method}");
            assert_eq!(header(&resp, "Allow"), Some("GET, POST, OPTIONS"));
        }
    }

    #[tokio::test]
    async fn test_binary_payload_survives_round_trip() {
        let state = test_state();
        let payload = Bytes::from_static(&[0xff, 0x00, 0xfe, 0x01]);

        let resp = dispatch(&Method::POST, "/chat_history", payload.clone(), &state).await;
        assert_eq!(resp.status(), 200);

        let resp = dispatch(&Method::GET, "/chat_history", Bytes::new(), &state).await;
        assert_eq!(body_bytes(resp).await, payload);
    }

    #[tokio::test]
    async fn test_undeclared_body_over_cap_returns_413() {
        let state = Arc::new(capped_state(8));
        let addr: SocketAddr = "127.0.0.1:4000".parse().expect("addr");

        // A chunked upload has no Content-Length, so only the read-side
        // cap can stop it
        let req = Request::builder()
            .method(Method::POST)
            .uri("/atividades")
            .header("Transfer-Encoding", "chunked")
            .body(Full::new(Bytes::from_static(b"AAAAAAAAAAAAAAAAAAAA")))
            .expect("request");
        let resp = handle_request(req, Arc::clone(&state), addr)
            .await
            .expect("infallible");
        assert_eq!(resp.status(), 413);
        assert_eq!(header(&resp, "Access-Control-Allow-Origin"), Some("*"));

        // The rejected payload must not reach the store
        let resp = dispatch(&Method::GET, "/atividades", Bytes::new(), &state).await;
        assert_eq!(body_bytes(resp).await, Bytes::from_static(b"[]"));
    }

    #[tokio::test]
    async fn test_body_under_cap_is_stored_unchanged() {
        let state = Arc::new(capped_state(8));
        let addr: SocketAddr = "127.0.0.1:4000".parse().expect("addr");

        let req = Request::builder()
            .method(Method::POST)
            .uri("/atividades")
            .body(Full::new(Bytes::from_static(b"[1,2]")))
            .expect("request");
        let resp = handle_request(req, Arc::clone(&state), addr)
            .await
            .expect("infallible");
        assert_eq!(resp.status(), 200);

        let resp = dispatch(&Method::GET, "/atividades", Bytes::new(), &state).await;
        assert_eq!(body_bytes(resp).await, Bytes::from_static(b"[1,2]"));
    }

    /// Body that fails mid-read, as when the peer drops the connection
    /// during an upload.
    struct AbortedBody;

    impl Body for AbortedBody {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Option<Result<hyper::body::Frame<Self::Data>, Self::Error>>> {
            std::task::Poll::Ready(Some(Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection reset during body",
            ))))
        }
    }

    #[tokio::test]
    async fn test_failed_body_read_returns_400() {
        let state = Arc::new(test_state());
        let addr: SocketAddr = "127.0.0.1:4000".parse().expect("addr");

        let req = Request::builder()
            .method(Method::POST)
            .uri("/atividades")
            .body(AbortedBody)
            .expect("request");
        let resp = handle_request(req, Arc::clone(&state), addr)
            .await
            .expect("infallible");
        assert_eq!(resp.status(), 400);
        assert_eq!(header(&resp, "Access-Control-Allow-Origin"), Some("*"));

        let resp = dispatch(&Method::GET, "/atividades", Bytes::new(), &state).await;
        assert_eq!(body_bytes(resp).await, Bytes::from_static(b"[]"));
    }

    #[tokio::test]
    async fn test_query_string_does_not_affect_route_match() {
        let state = Arc::new(test_state());
        let addr: SocketAddr = "127.0.0.1:4000".parse().expect("addr");

        let payload = Bytes::from_static(br#"[{"id":1,"done":false}]"#);
        dispatch(&Method::POST, "/atividades", payload.clone(), &state).await;

        // Routes match on the path alone; the query is only logged
        let req = Request::builder()
            .method(Method::GET)
            .uri("/atividades?v=1")
            .body(Full::new(Bytes::new()))
            .expect("request");
        let resp = handle_request(req, state, addr).await.expect("infallible");
        assert_eq!(resp.status(), 200);
        assert_eq!(body_bytes(resp).await, payload);
    }

    #[test]
    fn test_body_size_check_rejects_oversized_declaration() {
        let mut headers = hyper::HeaderMap::new();
        headers.insert("content-length", "10485761".parse().expect("value"));
        let resp = check_body_size(&headers, 10_485_760, true).expect("413");
        assert_eq!(resp.status(), 413);
        assert_eq!(header(&resp, "Access-Control-Allow-Origin"), Some("*"));
    }

    #[test]
    fn test_body_size_check_passes_small_and_malformed() {
        let mut headers = hyper::HeaderMap::new();
        headers.insert("content-length", "2".parse().expect("value"));
        assert!(check_body_size(&headers, 10_485_760, true).is_none());

        // Unparseable declarations are left for hyper's framing to reject
        headers.insert("content-length", "not-a-number".parse().expect("value"));
        assert!(check_body_size(&headers, 10_485_760, true).is_none());

        let empty = hyper::HeaderMap::new();
        assert!(check_body_size(&empty, 10_485_760, true).is_none());
    }

    #[test]
    fn test_http_version_label() {
        assert_eq!(http_version_label(Version::HTTP_10), "1.0");
        assert_eq!(http_version_label(Version::HTTP_11), "1.1");
        assert_eq!(http_version_label(Version::HTTP_2), "2");
    }
}
