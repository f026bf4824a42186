use actix_web::{delete, get, post, put, web, HttpMessage, HttpRequest, HttpResponse};
use chrono::Utc;
use log::{info, warn};
use serde_json::json;
use sqlx::SqlitePool;

use crate::auth::{self, AuthenticatedUser};
use crate::error::{AppError, Result};
use crate::filters::{VideoFilter, DEFAULT_LIMIT};
use crate::models::{
    BulkDeleteRequest, BulkDeleteResponse, BulkUpdateRequest, BulkUpdateResponse, CountResponse,
    ImportRequest, ImportResponse, LoginRequest, NewVideo, RegisterRequest, TokenResponse, User,
    UserResponse, VideoQuery, VideoUpdate,
};
use crate::{repository, stats, text_format, AppState};

fn token_response(token: String, user: &User) -> TokenResponse {
    TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: UserResponse::from(user),
    }
}

fn parse_video_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Invalid video ID '{}'", raw)))
}

#[get("/api/status")]
async fn status() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[post("/api/auth/register")]
async fn register(req: web::Json<RegisterRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let (token, user) = auth::register(&state.db_pool, &state.config, &req).await?;
    Ok(HttpResponse::Created().json(token_response(token, &user)))
}

#[post("/api/auth/login")]
async fn login(req: web::Json<LoginRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let (token, user) = auth::login(&state.db_pool, &state.config, &req).await?;
    Ok(HttpResponse::Ok().json(token_response(token, &user)))
}

#[get("/api/auth/me")]
async fn me(AuthenticatedUser(user): AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse::from(&user))
}

#[get("/api/videos")]
async fn list_videos(
    AuthenticatedUser(user): AuthenticatedUser,
    query: web::Query<VideoQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let filter = VideoFilter::from_query(&query, Utc::now())?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let videos = repository::list_videos(&state.db_pool, user.id, &filter, query.skip, limit).await?;
    Ok(HttpResponse::Ok().json(videos))
}

#[get("/api/videos/count")]
async fn count_videos(
    AuthenticatedUser(user): AuthenticatedUser,
    query: web::Query<VideoQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let filter = VideoFilter::from_query(&query, Utc::now())?;
    let count = repository::count_videos(&state.db_pool, user.id, &filter).await?;
    Ok(HttpResponse::Ok().json(CountResponse { count }))
}

#[get("/api/videos/stats")]
async fn video_stats(AuthenticatedUser(user): AuthenticatedUser, state: web::Data<AppState>) -> Result<HttpResponse> {
    let stats = stats::user_stats(&state.db_pool, user.id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[get("/api/videos/export")]
async fn export_videos(AuthenticatedUser(user): AuthenticatedUser, state: web::Data<AppState>) -> Result<HttpResponse> {
    let videos = repository::all_videos(&state.db_pool, user.id).await?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(text_format::export(&videos)))
}

async fn import_parsed(pool: &SqlitePool, user_id: i64, parsed: Vec<NewVideo>) -> ImportResponse {
    let mut imported_count = 0;
    let mut errors = Vec::new();

    for video in parsed {
        let title = video.title.clone();
        match repository::insert_video(pool, user_id, video).await {
            Ok(_) => imported_count += 1,
            Err(e) => {
                warn!("Skipping imported video '{}' for user {}: {}", title, user_id, e);
                errors.push(format!("Error importing '{}': {}", title, e));
            }
        }
    }

    ImportResponse {
        success: errors.is_empty(),
        imported_count,
        errors,
    }
}

/// Accepts the tagged-block text as the raw body, or wrapped as
/// `{"content": "..."}` when sent as JSON.
#[post("/api/videos/import")]
async fn import_videos(
    AuthenticatedUser(user): AuthenticatedUser,
    req: HttpRequest,
    body: String,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let content = if req.content_type() == "application/json" {
        serde_json::from_str::<ImportRequest>(&body)
            .map_err(|e| AppError::Validation(format!("Invalid import payload: {}", e)))?
            .content
    } else {
        body
    };

    let parsed = text_format::parse(&content);
    if parsed.is_empty() {
        return Err(AppError::Validation("No valid videos found in the content".to_string()));
    }

    let report = import_parsed(&state.db_pool, user.id, parsed).await;
    info!(
        "User {} imported {} videos ({} failed)",
        user.id,
        report.imported_count,
        report.errors.len()
    );
    Ok(HttpResponse::Ok().json(report))
}

#[post("/api/videos/bulk-update")]
async fn bulk_update_videos(
    AuthenticatedUser(user): AuthenticatedUser,
    req: web::Json<BulkUpdateRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let updated_count =
        repository::bulk_update(&state.db_pool, user.id, &req.video_ids, req.status, req.completed_at).await?;
    info!("User {} bulk-updated {} videos", user.id, updated_count);
    Ok(HttpResponse::Ok().json(BulkUpdateResponse {
        success: true,
        updated_count,
    }))
}

#[post("/api/videos/bulk-delete")]
async fn bulk_delete_videos(
    AuthenticatedUser(user): AuthenticatedUser,
    req: web::Json<BulkDeleteRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let deleted_count = repository::bulk_delete(&state.db_pool, user.id, &req.video_ids).await?;
    info!("User {} bulk-deleted {} videos", user.id, deleted_count);
    Ok(HttpResponse::Ok().json(BulkDeleteResponse {
        success: true,
        deleted_count,
    }))
}

#[post("/api/videos")]
async fn create_video(
    AuthenticatedUser(user): AuthenticatedUser,
    req: web::Json<NewVideo>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let video = repository::insert_video(&state.db_pool, user.id, req.into_inner()).await?;
    info!("User {} created video {}", user.id, video.id);
    Ok(HttpResponse::Created().json(video))
}

#[get("/api/videos/{id}")]
async fn get_video(
    AuthenticatedUser(user): AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let id = parse_video_id(&path)?;
    let video = repository::find_video(&state.db_pool, user.id, id).await?;
    Ok(HttpResponse::Ok().json(video))
}

#[put("/api/videos/{id}")]
async fn update_video(
    AuthenticatedUser(user): AuthenticatedUser,
    path: web::Path<String>,
    req: web::Json<VideoUpdate>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let id = parse_video_id(&path)?;
    let video = repository::update_video(&state.db_pool, user.id, id, req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(video))
}

#[delete("/api/videos/{id}")]
async fn delete_video(
    AuthenticatedUser(user): AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let id = parse_video_id(&path)?;
    repository::delete_video(&state.db_pool, user.id, id).await?;
    info!("User {} deleted video {}", user.id, id);
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .service(status)
    .service(register)
    .service(login)
    .service(me)
    // Literal /api/videos/* paths go before /api/videos/{id}.
    .service(count_videos)
    .service(video_stats)
    .service(export_videos)
    .service(import_videos)
    .service(bulk_update_videos)
    .service(bulk_delete_videos)
    .service(list_videos)
    .service(create_video)
    .service(get_video)
    .service(update_video)
    .service(delete_video);
}
