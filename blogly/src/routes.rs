use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use blogly_core::UserForm;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{db::UserRepo, error::AppError, views};

#[derive(Clone)]
pub struct AppState {
    pub users: UserRepo,
}

impl AppState {
    pub fn new(users: UserRepo) -> Self {
        Self { users }
    }
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "ok" }))
        .route("/users", get(list_users))
        .route("/users/new", get(new_user_form).post(create_user))
        .route("/users/:id", get(show_user))
        .route("/users/:id/edit", get(edit_user_form).post(update_user))
        .route("/users/:id/delete", post(delete_user))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 302 Found, which is what browsers and the form flow expect after a POST.
fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

async fn root() -> Response {
    found("/users")
}

async fn list_users(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let users = state.users.find_all().await?;
    Ok(Html(views::user_list(&users)))
}

async fn new_user_form() -> Html<String> {
    Html(views::new_user_form())
}

async fn create_user(
    State(state): State<AppState>,
    Form(form): Form<UserForm>,
) -> Result<Response, AppError> {
    let user = state.users.insert(&form.into_user()).await?;
    info!(user_id = ?user.id, "created user");
    Ok(found("/users"))
}

async fn show_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let user = state
        .users
        .find_by_id(&id)
        .await?
        .ok_or(AppError::UserNotFound(id))?;
    Ok(Html(views::user_detail(&user)))
}

async fn edit_user_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let user = state
        .users
        .find_by_id(&id)
        .await?
        .ok_or(AppError::UserNotFound(id))?;
    Ok(Html(views::edit_user_form(&user)))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<UserForm>,
) -> Result<Response, AppError> {
    state
        .users
        .update(&form.into_user_with_id(id))
        .await?
        .ok_or(AppError::UserNotFound(id))?;
    info!(user_id = id, "updated user");
    Ok(found("/users"))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    if !state.users.delete_by_id(&id).await? {
        return Err(AppError::UserNotFound(id));
    }
    info!(user_id = id, "deleted user");
    Ok(found("/users"))
}
