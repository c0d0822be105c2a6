use super::*;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{TimeZone, Utc};
use shared::{
    domain::{Article, Profile, Username},
    error::ErrorCode,
};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Recorded {
    List(ArticleListRequest),
    Feed,
    Favorite(String),
    UnFavorite(String),
}

#[derive(Clone, Default)]
struct ServerState {
    calls: Arc<Mutex<Vec<Recorded>>>,
    authorizations: Arc<Mutex<Vec<Option<String>>>>,
}

impl ServerState {
    async fn record(&self, call: Recorded, headers: &HeaderMap) {
        self.calls.lock().await.push(call);
        self.authorizations.lock().await.push(
            headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
        );
    }
}

fn sample_article(slug: &str, favorited: bool) -> Article {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Article {
        slug: Slug::from(slug),
        title: slug.replace('-', " "),
        description: "desc".to_string(),
        body: "body".to_string(),
        tag_list: Vec::new(),
        created_at: at,
        updated_at: at,
        favorited,
        favorites_count: u64::from(favorited),
        author: Profile {
            username: Username::from("jake"),
            bio: None,
            image: None,
            following: false,
        },
    }
}

async fn handle_list(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(filter): Query<ArticleListRequest>,
) -> Json<MultipleArticlesResponse> {
    state.record(Recorded::List(filter), &headers).await;
    Json(MultipleArticlesResponse {
        articles: vec![sample_article("first", false), sample_article("second", true)],
        articles_count: 20,
    })
}

async fn handle_feed(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> Result<Json<MultipleArticlesResponse>, StatusCode> {
    state.record(Recorded::Feed, &headers).await;
    if !headers.contains_key("authorization") {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(MultipleArticlesResponse {
        articles: vec![sample_article("followed", false)],
        articles_count: 1,
    }))
}

async fn handle_favorite(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Json<SingleArticleResponse> {
    state.record(Recorded::Favorite(slug.clone()), &headers).await;
    Json(SingleArticleResponse {
        article: sample_article(&slug, true),
    })
}

async fn handle_un_favorite(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> (StatusCode, String) {
    state.record(Recorded::UnFavorite(slug), &headers).await;
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"errors":{"article":["is not favorited"]}}"#.to_string(),
    )
}

async fn spawn_article_server() -> anyhow::Result<(Url, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/articles", get(handle_list))
        .route("/api/articles/feed", get(handle_feed))
        .route(
            "/api/articles/:slug/favorite",
            post(handle_favorite).delete(handle_un_favorite),
        )
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((Url::parse(&format!("http://{addr}/api"))?, state))
}

#[tokio::test]
async fn article_list_forwards_filter_as_query() {
    let (base_url, state) = spawn_article_server().await.expect("spawn server");
    let repository = HttpArticleRepository::new(base_url, Arc::new(Session::new()));

    let filter = ArticleListRequest::by_tag("rust").with_page(10, 20);
    let response = repository
        .get_article_list(&filter)
        .await
        .expect("article list");

    assert_eq!(response.articles_count, 20);
    assert_eq!(response.articles.len(), 2);
    assert_eq!(response.articles[1].slug.as_str(), "second");
    assert_eq!(*state.calls.lock().await, vec![Recorded::List(filter)]);
    assert_eq!(*state.authorizations.lock().await, vec![None]);
}

#[tokio::test]
async fn feed_sends_session_token() {
    let (base_url, state) = spawn_article_server().await.expect("spawn server");
    let session = Arc::new(Session::with_token("jwt").await);
    let repository = HttpArticleRepository::new(base_url, session);

    let response = repository.get_feed_article_list().await.expect("feed");

    assert_eq!(response.articles[0].slug.as_str(), "followed");
    assert_eq!(
        *state.authorizations.lock().await,
        vec![Some("Token jwt".to_string())]
    );
}

#[tokio::test]
async fn feed_without_token_surfaces_unauthorized() {
    let (base_url, _state) = spawn_article_server().await.expect("spawn server");
    let repository = HttpArticleRepository::new(base_url, Arc::new(Session::new()));

    let err = repository
        .get_feed_article_list()
        .await
        .expect_err("must fail");
    let api = err.downcast_ref::<ApiException>().expect("api exception");
    assert_eq!(api.status, 401);
    assert_eq!(api.code, ErrorCode::Unauthorized);
}

#[tokio::test]
async fn favorite_posts_to_slug_endpoint() {
    let (base_url, state) = spawn_article_server().await.expect("spawn server");
    let session = Arc::new(Session::with_token("jwt").await);
    let repository = HttpArticleRepository::new(base_url, session);

    let response = repository
        .favorite_article(&Slug::from("how-to-train"))
        .await
        .expect("favorite");

    assert!(response.article.favorited);
    assert_eq!(
        *state.calls.lock().await,
        vec![Recorded::Favorite("how-to-train".to_string())]
    );
}

#[tokio::test]
async fn un_favorite_maps_validation_body() {
    let (base_url, state) = spawn_article_server().await.expect("spawn server");
    let session = Arc::new(Session::with_token("jwt").await);
    let repository = HttpArticleRepository::new(base_url, session);

    let err = repository
        .un_favorite_article(&Slug::from("how-to-train"))
        .await
        .expect_err("must fail");

    let api = err.downcast_ref::<ApiException>().expect("api exception");
    assert_eq!(api.code, ErrorCode::Validation);
    assert_eq!(api.message, "article is not favorited");
    assert_eq!(
        *state.calls.lock().await,
        vec![Recorded::UnFavorite("how-to-train".to_string())]
    );
}

#[test]
fn endpoint_keeps_base_path_with_trailing_slash() {
    let repository = HttpArticleRepository::new(
        Url::parse("https://api.example.com/api/").expect("url"),
        Arc::new(Session::new()),
    );
    let url = repository
        .endpoint(&["articles", "a b", "favorite"])
        .expect("endpoint");
    assert_eq!(
        url.as_str(),
        "https://api.example.com/api/articles/a%20b/favorite"
    );
}

#[tokio::test]
async fn unreachable_server_propagates_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let base_url = Url::parse(&format!("http://{addr}/api")).expect("url");
    let repository = HttpArticleRepository::new(base_url, Arc::new(Session::new()));

    let err = repository
        .get_article_list(&ArticleListRequest::default())
        .await
        .expect_err("must fail");
    assert!(err.downcast_ref::<reqwest::Error>().is_some());
}

#[tokio::test]
async fn truncated_error_body_still_maps_status() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        let mut request = [0u8; 1024];
        let _ = stream.read(&mut request).await;
        let _ = stream
            .write_all(
                b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\npartial",
            )
            .await;
        let _ = stream.shutdown().await;
    });

    let base_url = Url::parse(&format!("http://{addr}/api")).expect("url");
    let repository = HttpArticleRepository::new(base_url, Arc::new(Session::new()));

    let err = repository
        .get_article_list(&ArticleListRequest::default())
        .await
        .expect_err("must fail");

    let api = err.downcast_ref::<ApiException>().expect("api exception");
    assert_eq!(api.status, 500);
    assert_eq!(api.code, ErrorCode::Internal);
    assert!(api.message.is_empty());
}
