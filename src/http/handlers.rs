use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::auth::AuthService;
use crate::app::comments::CommentService;
use crate::app::likes::LikeService;
use crate::app::posts::{PostQuery, PostService};
use crate::domain::comment::Comment;
use crate::domain::image::StoredImage;
use crate::domain::like::{LikeStatus, LikeToggle};
use crate::domain::post::Post;
use crate::domain::user::User;
use crate::http::{AppError, AuthUser};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = match state.db.ping().await {
        Ok(()) => "ok",
        Err(err) => {
            tracing::warn!(error = ?err, "database ping failed");
            "degraded"
        }
    };

    Json(HealthResponse { status })
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

fn auth_response(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let issued = state.tokens().issue(user.id)?;
    Ok(AuthResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        token: issued.token,
        expires_at: issued.expires_at,
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let service = AuthService::new(state.db.clone());
    let user = service
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("email and password are required"));
    }

    let service = AuthService::new(state.db.clone());
    let user = service.verify(&payload.email, &payload.password).await?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(auth_response(&state, user)?))
}

pub async fn current_user(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, AppError> {
    let service = AuthService::new(state.db.clone());
    let user = service.get_user(auth.user_id).await?;
    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub image: Option<String>,
}

pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    let service = PostService::new(state.db.clone());
    let post = service
        .create(auth.user_id, &payload.title, &payload.content, payload.image)
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

#[derive(Deserialize)]
pub struct ListPostsQuery {
    pub limit: Option<i64>,
    pub author_id: Option<Uuid>,
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Vec<Post>>, AppError> {
    let service = PostService::new(state.db.clone());
    let posts = service
        .list(PostQuery {
            author_id: query.author_id,
            limit: query.limit,
        })
        .await?;

    Ok(Json(posts))
}

pub async fn get_post(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Post>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.get(id).await?;
    Ok(Json(post))
}

#[derive(Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
}

pub async fn update_post(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Post>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service
        .update(id, auth.user_id, payload.title, payload.content, payload.image)
        .await?;
    Ok(Json(post))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub async fn delete_post(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    let service = PostService::new(state.db.clone());
    service.delete(id, auth.user_id).await?;
    Ok(Json(MessageResponse {
        message: "post deleted",
    }))
}

pub async fn list_comments(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let service = CommentService::new(state.db.clone());
    let comments = service.list(id).await?;
    Ok(Json(comments))
}

#[derive(Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub content: String,
}

pub async fn add_comment(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let service = CommentService::new(state.db.clone());
    let comment = service.add(id, auth.user_id, &payload.content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn toggle_like(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<LikeToggle>), AppError> {
    let service = LikeService::new(state.db.clone());
    let toggle = service.toggle(id, auth.user_id).await?;

    let status = if toggle.liked {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(toggle)))
}

pub async fn like_status(
    Path(id): Path<Uuid>,
    auth: Option<AuthUser>,
    State(state): State<AppState>,
) -> Result<Json<LikeStatus>, AppError> {
    let viewer_id = auth.map(|user| user.user_id);
    let service = LikeService::new(state.db.clone());
    let status = service.status(id, viewer_id).await?;
    Ok(Json(status))
}

pub async fn upload_image(
    auth: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredImage>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("invalid multipart body: {}", err)))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(format!("invalid image field: {}", err)))?;

        let image = state.images().upload(file_name.as_deref(), data).await?;
        tracing::info!(user_id = %auth.user_id, image_id = %image.id, "image uploaded");
        return Ok((StatusCode::CREATED, Json(image)));
    }

    Err(AppError::bad_request("image field is required"))
}
