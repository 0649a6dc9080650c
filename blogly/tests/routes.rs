#![cfg(feature = "libsql-backend")]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use async_trait::async_trait;
use blogly::{db, AppState, Repository, User, DEFAULT_IMAGE_URL};
use blogly_core::{RepoError, RepoResult};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A router over a fresh database seeded with the fixture user.
struct TestApp {
    _dir: TempDir,
    router: Router,
    users: db::UserRepo,
    user_id: i64,
}

impl TestApp {
    async fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blogly_test.db");
        let users = db::connect(path.to_str().expect("utf-8 path"))
            .await
            .expect("open test database");
        let stored = users
            .insert(&tests_common::test_user())
            .await
            .expect("seed test user");
        let router = blogly::app(AppState::new(users.clone()));
        Self {
            _dir: dir,
            router,
            users,
            user_id: stored.id.expect("seeded id"),
        }
    }

    async fn send(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.expect("infallible")
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, body: &str) -> Response {
        let req = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    /// Follow a single redirect the way a browser would after a POST.
    async fn follow(&self, resp: Response) -> Response {
        assert_eq!(resp.status(), StatusCode::FOUND);
        let location = location(&resp);
        self.get(&location).await
    }
}

fn location(resp: &Response) -> String {
    resp.headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
        .to_string()
}

async fn body_text(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn list_users() {
    let app = TestApp::new().await;
    let resp = app.get("/users").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("test1_first"));
    assert!(html.contains("test1_last"));
}

#[tokio::test]
async fn new_user_form() {
    let app = TestApp::new().await;
    let resp = app.get("/users/new").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("new user test"));
}

#[tokio::test]
async fn add_new_user_redirects_to_list() {
    let app = TestApp::new().await;
    let resp = app
        .post_form("/users/new", "first=bob&last=banana&imgURL=")
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/users");
}

#[tokio::test]
async fn redirect_after_add_shows_new_user() {
    let app = TestApp::new().await;
    let resp = app
        .post_form("/users/new", "first=bob&last=banana&imgURL=")
        .await;
    let resp = app.follow(resp).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("banana"));
    assert!(html.contains("<!-- TESTSTRING_USERS -->"));

    let all = app.users.find_all().await.unwrap();
    let bob = all.iter().find(|u| u.first_name == "bob").expect("bob stored");
    assert_eq!(bob.image_url, None);
}

#[tokio::test]
async fn user_details_show_default_image() {
    let app = TestApp::new().await;
    let resp = app.get(&format!("/users/{}", app.user_id)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("test1_first"));
    assert!(html.contains("test1_last"));
    assert!(html.contains(DEFAULT_IMAGE_URL));
}

#[tokio::test]
async fn delete_removes_user_from_list() {
    let app = TestApp::new().await;
    let resp = app
        .post_form(&format!("/users/{}/delete", app.user_id), "")
        .await;
    let resp = app.follow(resp).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(!html.contains("test1_first"));
    assert!(!html.contains("test1_last"));
}

#[tokio::test]
async fn edit_updates_user() {
    let app = TestApp::new().await;
    let edit_uri = format!("/users/{}/edit", app.user_id);

    let resp = app.get(&edit_uri).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("value=\"test1_first\""));

    let resp = app
        .post_form(
            &edit_uri,
            "first=Robert&last=Banana&imgURL=http%3A%2F%2Fimg%2Fb.png",
        )
        .await;
    assert_eq!(location(&resp), "/users");

    let html = body_text(app.get(&format!("/users/{}", app.user_id)).await).await;
    assert!(html.contains("Robert"));
    assert!(html.contains("src=\"http://img/b.png\""));
    assert!(!html.contains("test1_first"));
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let app = TestApp::new().await;
    let missing = app.user_id + 1000;

    let resp = app.get(&format!("/users/{missing}")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_text(resp).await.contains("404 Not Found"));

    assert_eq!(
        app.get(&format!("/users/{missing}/edit")).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.post_form(&format!("/users/{missing}/edit"), "first=a&last=b")
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.post_form(&format!("/users/{missing}/delete"), "")
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn bad_requests_are_rejected() {
    let app = TestApp::new().await;
    assert_eq!(
        app.get("/users/not-a-number").await.status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        app.post_form("/users/new", "first=bob").await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(app.users.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn root_redirects_and_health_answers() {
    let app = TestApp::new().await;
    let resp = app.get("/").await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/users");

    let resp = app.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "ok");
}

#[tokio::test]
async fn user_text_is_escaped() {
    let app = TestApp::new().await;
    app.post_form("/users/new", "first=%3Cscript%3Ealert(1)%3C%2Fscript%3E&last=x")
        .await;
    let html = body_text(app.get("/users").await).await;
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
}

/// Every call fails the way a locked or unreachable database would.
struct BrokenRepo;

fn unavailable() -> RepoError {
    RepoError::backend(std::io::Error::new(
        std::io::ErrorKind::Other,
        "database is locked",
    ))
}

#[async_trait]
impl Repository<User> for BrokenRepo {
    async fn find_all(&self) -> RepoResult<Vec<User>> {
        Err(unavailable())
    }
    async fn find_by_id(&self, _id: &i64) -> RepoResult<Option<User>> {
        Err(unavailable())
    }
    async fn insert(&self, _entity: &User) -> RepoResult<User> {
        Err(unavailable())
    }
    async fn update(&self, _entity: &User) -> RepoResult<Option<User>> {
        Err(unavailable())
    }
    async fn delete_by_id(&self, _id: &i64) -> RepoResult<bool> {
        Err(unavailable())
    }
}

#[tokio::test]
async fn database_failures_render_a_generic_error_page() {
    let router = blogly::app(AppState::new(Arc::new(BrokenRepo)));
    let form = |uri: &str, body: &'static str| {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    };
    let requests = [
        Request::get("/users").body(Body::empty()).unwrap(),
        Request::get("/users/1").body(Body::empty()).unwrap(),
        Request::get("/users/1/edit").body(Body::empty()).unwrap(),
        form("/users/new", "first=bob&last=banana"),
        form("/users/1/edit", "first=bob&last=banana"),
        form("/users/1/delete", ""),
    ];

    for req in requests {
        let uri = req.uri().to_string();
        let resp = router.clone().oneshot(req).await.expect("infallible");
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        let html = body_text(resp).await;
        assert!(html.contains("500 Internal Server Error"), "{uri}");
        assert!(!html.contains("database is locked"), "{uri}");
    }
}
