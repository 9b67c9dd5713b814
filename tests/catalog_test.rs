//! End-to-end catalog calls against a local stand-in for the upstream APIs.

use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
};
use reqwest::Client;
use serde_json::{Value, json};
use tokio::{
    io::AsyncReadExt,
    net::{TcpListener, TcpStream},
};

use vorplay::{
    AppError,
    deezer::DeezerClient,
    management::TrackManager,
    pagination::PageWindow,
    spotify::{
        Catalog, CatalogClient, ClientCredentials, HttpError, RetryPolicy, RetryingHttpClient,
        TokenCache,
    },
};

#[derive(Clone, Default)]
struct Upstream {
    token_calls: Arc<AtomicUsize>,
    album_calls: Arc<AtomicUsize>,
    search_calls: Arc<AtomicUsize>,
    expires_in: u64,
    omit_access_token: bool,
}

async fn token(State(upstream): State<Upstream>) -> Json<Value> {
    let n = upstream.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
    if upstream.omit_access_token {
        return Json(json!({ "token_type": "Bearer", "expires_in": 3600 }));
    }
    Json(json!({
        "access_token": format!("tok-{n}"),
        "token_type": "Bearer",
        "expires_in": upstream.expires_in
    }))
}

fn track_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "artists": [{ "id": "1Xyo4u8uXC1ZmMpatF05PJ", "name": "The Weeknd" }],
        "album": {
            "id": "4yP0hdKOZPNshxUOjY0cZj",
            "name": "After Hours",
            "images": [{ "url": "https://i.scdn.co/image/after-hours", "width": 640, "height": 640 }]
        },
        "duration_ms": 200040,
        "popularity": 91,
        "external_urls": { "spotify": format!("https://open.spotify.com/track/{id}") }
    })
}

async fn search(
    State(upstream): State<Upstream>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    upstream.search_calls.fetch_add(1, Ordering::SeqCst);
    if !headers.contains_key("authorization") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "no token" })));
    }
    let limit = params
        .iter()
        .find(|(k, _)| k == "limit")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(20);
    let items: Vec<Value> = (0..limit.min(1))
        .map(|_| track_json("0VjIjW4GlUZAMYd2vXMi3b", "Blinding Lights"))
        .collect();
    (
        StatusCode::OK,
        Json(json!({ "tracks": { "items": items, "total": 1, "next": null } })),
    )
}

async fn track(Path(id): Path<String>) -> impl IntoResponse {
    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "status": 404, "message": "Non existing id" } })),
        );
    }
    (StatusCode::OK, Json(track_json(&id, "Save Your Tears")))
}

async fn album(State(upstream): State<Upstream>) -> impl IntoResponse {
    upstream.album_calls.fetch_add(1, Ordering::SeqCst);
    (StatusCode::BAD_GATEWAY, "bad gateway")
}

async fn deezer_search() -> Json<Value> {
    Json(json!({
        "data": [{
            "id": 3135556,
            "title": "Harder, Better, Faster, Stronger",
            "link": "https://www.deezer.com/track/3135556",
            "duration": 224,
            "artist": { "id": 27, "name": "Daft Punk" },
            "album": { "id": 302127, "title": "Discovery", "cover_medium": "https://cdn/cover.jpg" }
        }]
    }))
}

async fn deezer_track() -> Json<Value> {
    Json(json!({
        "error": { "type": "DataException", "message": "no data", "code": 800 }
    }))
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn(upstream: Upstream) -> SocketAddr {
    let app = Router::new()
        .route("/token", post(token))
        .route("/v1/search", get(search))
        .route("/v1/tracks/{id}", get(track))
        .route("/v1/albums/{id}", get(album))
        .route("/deezer/search", get(deezer_search))
        .route("/deezer/track/{id}", get(deezer_track))
        .with_state(upstream);
    serve(app).await
}

/// Upstream that records every catalog request it receives and answers 404.
async fn spawn_recording() -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let app = Router::new()
        .route("/token", post(token))
        .fallback(move |uri: Uri| {
            let recorder = Arc::clone(&recorder);
            async move {
                recorder.lock().unwrap().push(uri.to_string());
                StatusCode::NOT_FOUND
            }
        })
        .with_state(upstream());
    (serve(app).await, seen)
}

/// Raw TCP upstream that reads each request head and then closes the
/// connection, with a reset (`SO_LINGER` 0) or a plain FIN.
async fn spawn_closing(reset: bool) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            read_request_head(&mut stream).await;
            if reset {
                #[allow(deprecated)]
                stream.set_linger(Some(Duration::ZERO)).unwrap();
            }
            drop(stream);
        }
    });
    (addr, accepted)
}

async fn read_request_head(stream: &mut TcpStream) {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => {
                head.extend_from_slice(&chunk[..n]);
                if head.windows(4).any(|w| w == b"\r\n\r\n") {
                    return;
                }
            }
        }
    }
}

fn http() -> RetryingHttpClient {
    RetryingHttpClient::new(Client::new(), RetryPolicy::new(2, Duration::from_millis(10)))
}

fn tokens(addr: SocketAddr) -> TokenCache {
    TokenCache::new(
        http(),
        Some(format!("http://{addr}/token")),
        Some(ClientCredentials {
            client_id: "client".into(),
            client_secret: "secret".into(),
        }),
    )
}

fn catalog(addr: SocketAddr) -> CatalogClient {
    CatalogClient::new(http(), Arc::new(tokens(addr)), Some(format!("http://{addr}/v1")))
}

fn upstream() -> Upstream {
    Upstream {
        expires_in: 3600,
        ..Upstream::default()
    }
}

#[tokio::test]
async fn test_search_page_with_full_window_has_next_cursor() {
    let upstream = upstream();
    let addr = spawn(upstream.clone()).await;
    let manager = TrackManager::new(
        Arc::new(catalog(addr)),
        DeezerClient::new(http(), format!("http://{addr}/deezer")),
    );

    let page = manager
        .search("blinding lights", PageWindow { cursor: 0, limit: 1 })
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].title, "Blinding Lights");
    assert_eq!(page.next_cursor, Some(1));

    let body = serde_json::to_value(&page).unwrap();
    assert_eq!(body["nextCursor"], json!(1));
    assert_eq!(body["items"][0]["artistNames"], json!(["The Weeknd"]));
}

#[tokio::test]
async fn test_token_is_exchanged_once_while_valid() {
    let upstream = upstream();
    let addr = spawn(upstream.clone()).await;
    let cache = tokens(addr);

    let first = cache.get_token().await.unwrap();
    let second = cache.get_token().await.unwrap();

    assert_eq!(first.value, "tok-1");
    assert_eq!(first, second);
    assert_eq!(upstream.token_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let upstream = Upstream {
        expires_in: 1,
        ..Upstream::default()
    };
    let addr = spawn(upstream.clone()).await;
    let cache = tokens(addr);

    assert_eq!(cache.get_token().await.unwrap().value, "tok-1");
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(cache.get_token().await.unwrap().value, "tok-2");
    assert_eq!(upstream.token_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_exchange() {
    let upstream = upstream();
    let addr = spawn(upstream.clone()).await;
    let cache = Arc::new(tokens(addr));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_token().await.unwrap() })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().value, "tok-1");
    }
    assert_eq!(upstream.token_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_token_response_without_access_token_is_auth_error() {
    let upstream = Upstream {
        omit_access_token: true,
        ..upstream()
    };
    let addr = spawn(upstream.clone()).await;

    let err = catalog(addr).search_tracks("x", 1, 0).await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamAuth { .. }), "{err:?}");
    assert_eq!(upstream.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_track_is_not_found() {
    let addr = spawn(upstream()).await;

    let err = catalog(addr).get_track("missing").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");

    let found = catalog(addr).get_track("7MXVkk9YMctZqd1Srtv4MB").await.unwrap();
    assert_eq!(found.name, "Save Your Tears");
}

#[tokio::test]
async fn test_bad_gateway_is_retried_within_budget() {
    let upstream = upstream();
    let addr = spawn(upstream.clone()).await;

    let err = catalog(addr).get_album("4yP0hdKOZPNshxUOjY0cZj").await.unwrap_err();

    match err {
        AppError::UpstreamUnavailable { status, .. } => assert_eq!(status, Some(502)),
        other => panic!("unexpected error: {other:?}"),
    }
    // first attempt plus two retries
    assert_eq!(upstream.album_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_missing_api_url_is_configuration_error() {
    let addr = spawn(upstream()).await;
    let client = CatalogClient::new(http(), Arc::new(tokens(addr)), None);

    let err = client.get_track("abc").await.unwrap_err();
    assert!(matches!(err, AppError::Configuration(_)), "{err:?}");
}

#[tokio::test]
async fn test_deezer_search_and_unknown_track() {
    let addr = spawn(upstream()).await;
    let deezer = DeezerClient::new(http(), format!("http://{addr}/deezer"));

    let tracks = deezer.search_tracks("daft punk").await.unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].artist.name, "Daft Punk");

    let err = deezer.get_track("1").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn test_ids_stay_inside_their_path_segment() {
    let (addr, seen) = spawn_recording().await;

    let err = catalog(addr)
        .get_track("x/../../me/playlists?limit=50#")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["/v1/tracks/x%2F..%2F..%2Fme%2Fplaylists%3Flimit=50%23".to_string()]
    );
}

#[tokio::test]
async fn test_dot_segment_id_is_rejected_before_any_request() {
    let (addr, seen) = spawn_recording().await;

    let err = catalog(addr).get_album("..").await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)), "{err:?}");
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_deezer_ids_stay_inside_their_path_segment() {
    let (addr, seen) = spawn_recording().await;
    let deezer = DeezerClient::new(http(), format!("http://{addr}/deezer"));

    // deezer reports missing ids in a 200 body, so a bare 404 is an outage
    let err = deezer.get_track("1/../../search?q=x").await.unwrap_err();

    assert!(matches!(err, AppError::UpstreamUnavailable { .. }), "{err:?}");
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["/deezer/track/1%2F..%2F..%2Fsearch%3Fq=x".to_string()]
    );
}

#[tokio::test]
async fn test_connection_reset_is_retried_within_budget() {
    let (addr, accepted) = spawn_closing(true).await;

    let err = http()
        .execute(|client| client.get(format!("http://{addr}/v1/tracks/abc")))
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Transport(_)), "{err:?}");
    assert!(err.is_transient());
    assert_eq!(accepted.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_orderly_close_is_not_retried() {
    let (addr, accepted) = spawn_closing(false).await;

    let err = http()
        .execute(|client| client.get(format!("http://{addr}/v1/tracks/abc")))
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Transport(_)), "{err:?}");
    assert!(!err.is_transient());
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}
