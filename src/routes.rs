//! HTTP surface: public translate/contact/read endpoints plus the
//! token-gated admin API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, DefaultBodyLimit, Multipart, Path, Query, Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::cms::CmsClient;
use crate::config::Config;
use crate::contact::{self, ContactGuard, ContactPayload};
use crate::db::{self, ProjectInput};
use crate::error::{AppError, AppResult};
use crate::language::Language;
use crate::pipeline;
use crate::resolve;
use crate::security::constant_time_compare;
use crate::translate::Translator;
use crate::upload;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: SqlitePool,
    pub cms: CmsClient,
    pub translator: Translator,
    pub contact_guard: Arc<ContactGuard>,
}

pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route(
            "/content",
            get(list_content)
                .post(upsert_content)
                .delete(delete_content),
        )
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/upload-image", post(upload_image))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_token,
        ));

    Router::new()
        .route("/api/translate-to-en", post(translate_to_en))
        .route("/api/contact", post(submit_contact))
        .route("/api/content/:base", get(resolve_content))
        .nest("/api/admin", admin)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(4 * 1024 * 1024))
        .with_state(state)
}

/// Admin gate: a shared token compared in constant time. With no token
/// configured the admin surface stays disabled.
async fn require_admin_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = request
        .headers()
        .get("x-admin-token")
        .and_then(|v| v.to_str().ok());

    match (&state.config.admin_token, provided) {
        (Some(expected), Some(given)) if constant_time_compare(expected, given) => {
            Ok(next.run(request).await)
        }
        _ => Err(AppError::Unauthorized),
    }
}

// ==================== Translation ====================

#[derive(Debug, Deserialize)]
struct TranslateRequest {
    id: Option<String>,
    #[serde(rename = "type")]
    schema_type: Option<String>,
    document: Option<Value>,
}

async fn translate_to_en(
    State(state): State<AppState>,
    Json(body): Json<TranslateRequest>,
) -> AppResult<Json<Value>> {
    let (id, schema_type, document) = match (body.id, body.schema_type, body.document) {
        (Some(id), Some(schema_type), Some(document)) => (id, schema_type, document),
        _ => {
            return Err(AppError::InvalidPayload(
                "missing required fields: id, type, document".to_string(),
            ))
        }
    };

    let target_id = pipeline::translate_document(
        &state.translator,
        &state.cms,
        &id,
        &schema_type,
        &document,
    )
    .await?;

    Ok(Json(json!({ "success": true, "targetId": target_id })))
}

// ==================== Public read path ====================

#[derive(Debug, Deserialize)]
struct LanguageQuery {
    language: Option<String>,
}

async fn resolve_content(
    State(state): State<AppState>,
    Path(base): Path<String>,
    Query(query): Query<LanguageQuery>,
) -> AppResult<Json<Value>> {
    let language = Language::from_code(query.language.as_deref().unwrap_or("id"))?;

    // Managed relational rows are keyed by exact language; the CMS fallback
    // chain only applies to legacy document variants.
    if db::is_managed_key(&base) {
        if let Some(data) = db::get_content(&state.db, language, &base).await? {
            return Ok(Json(json!({
                "language": language.code(),
                "key": base,
                "data": data,
            })));
        }
    }

    if let Some(doc) = resolve::resolve_section(&state.cms, &base, language).await? {
        return Ok(Json(json!({
            "language": language.code(),
            "key": base,
            "data": doc,
        })));
    }

    if db::is_managed_key(&base) {
        return Ok(Json(json!({
            "language": language.code(),
            "key": base,
            "data": db::default_for_key(&base),
        })));
    }

    Err(AppError::NotFound(format!("no content for '{base}'")))
}

// ==================== Admin: managed content ====================

async fn list_content(
    State(state): State<AppState>,
    Query(query): Query<LanguageQuery>,
) -> AppResult<Json<Value>> {
    let language = Language::from_code(query.language.as_deref().unwrap_or("id"))?;
    let rows = db::list_content(&state.db, language).await?;
    Ok(Json(json!({ "language": language.code(), "content": rows })))
}

#[derive(Debug, Deserialize)]
struct UpsertContentRequest {
    language: String,
    key: String,
    data: Value,
}

async fn upsert_content(
    State(state): State<AppState>,
    Json(body): Json<UpsertContentRequest>,
) -> AppResult<Json<Value>> {
    let language = Language::from_code(&body.language)?;
    db::upsert_content(&state.db, language, &body.key, &body.data).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
struct DeleteContentRequest {
    language: String,
    key: String,
}

async fn delete_content(
    State(state): State<AppState>,
    Json(body): Json<DeleteContentRequest>,
) -> AppResult<Json<Value>> {
    let language = Language::from_code(&body.language)?;
    let deleted = db::delete_content(&state.db, language, &body.key).await?;
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

// ==================== Admin: projects ====================

async fn list_projects(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let projects = db::list_projects(&state.db).await?;
    Ok(Json(json!({ "projects": projects })))
}

async fn create_project(
    State(state): State<AppState>,
    Json(input): Json<ProjectInput>,
) -> AppResult<Json<Value>> {
    let project = db::create_project(&state.db, &input).await?;
    Ok(Json(json!({ "success": true, "project": project })))
}

async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let project = db::get_project(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {id} not found")))?;
    Ok(Json(json!({ "project": project })))
}

async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ProjectInput>,
) -> AppResult<Json<Value>> {
    let project = db::update_project(&state.db, id, &input).await?;
    Ok(Json(json!({ "success": true, "project": project })))
}

async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let deleted = db::delete_project(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {id} not found")))?;

    // Best-effort cleanup of locally stored media the record referenced.
    if let Some(image_url) = &deleted.image_url {
        if image_url.starts_with(upload::PUBLIC_PREFIX) {
            if let Err(e) = upload::delete_previous(&state.config.upload_dir, image_url).await {
                warn!("Failed to remove media for deleted project {id}: {e}");
            }
        }
    }

    Ok(Json(json!({ "success": true })))
}

// ==================== Admin: uploads ====================

async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<Value>> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut target = "projects".to_string();
    let mut previous_url: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidPayload(format!("invalid multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("file").to_string();
                let content_type = field.content_type().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidPayload(format!("failed to read upload: {e}")))?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            "target" => {
                target = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidPayload(format!("invalid target field: {e}")))?;
            }
            "previousUrl" => {
                previous_url = Some(field.text().await.map_err(|e| {
                    AppError::InvalidPayload(format!("invalid previousUrl field: {e}"))
                })?);
            }
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| AppError::InvalidPayload("missing file field".to_string()))?;

    let url = upload::store_image(
        &state.config.upload_dir,
        &target,
        &file_name,
        &content_type,
        &bytes,
    )
    .await?;

    if let Some(previous) = previous_url.filter(|p| !p.trim().is_empty()) {
        if let Err(e) = upload::delete_previous(&state.config.upload_dir, &previous).await {
            warn!("Failed to delete previous upload: {e}");
        }
    }

    Ok(Json(json!({ "url": url })))
}

// ==================== Contact ====================

/// Prefer the first hop of `x-forwarded-for`; fall back to the socket peer.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}

async fn submit_contact(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<ContactPayload>,
) -> AppResult<Json<Value>> {
    let ip = client_ip(&headers, peer);
    contact::accept(&state.contact_guard, &state.cms, &ip, &payload).await?;
    Ok(Json(json!({ "ok": true })))
}
