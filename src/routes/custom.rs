//! Logo, embroidery and design request endpoints, one set of handlers
//! parameterized by the `{kind}` path segment.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    domain::packages::RequestKind,
    dto::custom::{
        AddFinalDesignRequest, CreateCustomRequest, CustomRequestDetail, CustomRequestList,
        PackageList, RevisionRequest, UpdateCustomRequest, UpdateRequestStatus,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::CustomRequest,
    response::ApiResponse,
    routes::params::ListQuery,
    services::custom_request_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{kind}", get(list_requests).post(create_request))
        .route("/{kind}/packages", get(list_packages))
        .route("/{kind}/{id}", get(get_request).put(update_request))
        .route("/{kind}/{id}/cancel", post(cancel_request))
        .route("/{kind}/{id}/revisions", post(request_revision))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/{kind}", get(admin_list_requests))
        .route("/{kind}/{id}", axum::routing::delete(delete_request))
        .route("/{kind}/{id}/status", patch(update_status))
        .route("/{kind}/{id}/final-designs", post(add_final_design))
}

#[utoipa::path(
    get,
    path = "/api/custom/{kind}/packages",
    params(("kind" = RequestKind, Path, description = "logo, embroidery or design")),
    responses(
        (status = 200, description = "Package tiers with price and turnaround", body = ApiResponse<PackageList>)
    ),
    tag = "Custom Requests"
)]
pub async fn list_packages(Path(kind): Path<RequestKind>) -> Json<ApiResponse<PackageList>> {
    Json(custom_request_service::packages(kind))
}

#[utoipa::path(
    post,
    path = "/api/custom/{kind}",
    params(("kind" = RequestKind, Path, description = "logo, embroidery or design")),
    request_body = CreateCustomRequest,
    responses(
        (status = 200, description = "Request submitted", body = ApiResponse<CustomRequest>),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Custom Requests"
)]
pub async fn create_request(
    State(state): State<AppState>,
    user: AuthUser,
    Path(kind): Path<RequestKind>,
    Json(payload): Json<CreateCustomRequest>,
) -> AppResult<Json<ApiResponse<CustomRequest>>> {
    let resp = custom_request_service::create_request(&state, &user, kind, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/custom/{kind}",
    params(
        ("kind" = RequestKind, Path, description = "logo, embroidery or design"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "Requests of the current user", body = ApiResponse<CustomRequestList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Custom Requests"
)]
pub async fn list_requests(
    State(state): State<AppState>,
    user: AuthUser,
    Path(kind): Path<RequestKind>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<CustomRequestList>>> {
    let resp = custom_request_service::list_my_requests(&state, &user, kind, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/custom/{kind}/{id}",
    params(
        ("kind" = RequestKind, Path, description = "logo, embroidery or design"),
        ("id" = Uuid, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request with revisions and status log", body = ApiResponse<CustomRequestDetail>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Custom Requests"
)]
pub async fn get_request(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, id)): Path<(RequestKind, Uuid)>,
) -> AppResult<Json<ApiResponse<CustomRequestDetail>>> {
    let resp = custom_request_service::get_request(&state, &user, kind, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/custom/{kind}/{id}",
    params(
        ("kind" = RequestKind, Path, description = "logo, embroidery or design"),
        ("id" = Uuid, Path, description = "Request ID")
    ),
    request_body = UpdateCustomRequest,
    responses(
        (status = 200, description = "Request updated and repriced", body = ApiResponse<CustomRequest>),
        (status = 400, description = "Request is no longer pending"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Custom Requests"
)]
pub async fn update_request(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, id)): Path<(RequestKind, Uuid)>,
    Json(payload): Json<UpdateCustomRequest>,
) -> AppResult<Json<ApiResponse<CustomRequest>>> {
    let resp = custom_request_service::update_request(&state, &user, kind, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/custom/{kind}/{id}/cancel",
    params(
        ("kind" = RequestKind, Path, description = "logo, embroidery or design"),
        ("id" = Uuid, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request cancelled", body = ApiResponse<CustomRequest>),
        (status = 400, description = "Request can no longer be cancelled"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Custom Requests"
)]
pub async fn cancel_request(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, id)): Path<(RequestKind, Uuid)>,
) -> AppResult<Json<ApiResponse<CustomRequest>>> {
    let resp = custom_request_service::cancel_request(&state, &user, kind, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/custom/{kind}/{id}/revisions",
    params(
        ("kind" = RequestKind, Path, description = "logo, embroidery or design"),
        ("id" = Uuid, Path, description = "Request ID")
    ),
    request_body = RevisionRequest,
    responses(
        (status = 200, description = "Revision requested", body = ApiResponse<CustomRequestDetail>),
        (status = 400, description = "Revisions not allowed in the current status"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Custom Requests"
)]
pub async fn request_revision(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, id)): Path<(RequestKind, Uuid)>,
    Json(payload): Json<RevisionRequest>,
) -> AppResult<Json<ApiResponse<CustomRequestDetail>>> {
    let resp =
        custom_request_service::request_revision(&state, &user, kind, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/custom/{kind}",
    params(
        ("kind" = RequestKind, Path, description = "logo, embroidery or design"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "All requests of a kind", body = ApiResponse<CustomRequestList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn admin_list_requests(
    State(state): State<AppState>,
    user: AuthUser,
    Path(kind): Path<RequestKind>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<CustomRequestList>>> {
    let resp = custom_request_service::admin_list_requests(&state, &user, kind, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/custom/{kind}/{id}/status",
    params(
        ("kind" = RequestKind, Path, description = "logo, embroidery or design"),
        ("id" = Uuid, Path, description = "Request ID")
    ),
    request_body = UpdateRequestStatus,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<CustomRequest>),
        (status = 400, description = "Transition not allowed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, id)): Path<(RequestKind, Uuid)>,
    Json(payload): Json<UpdateRequestStatus>,
) -> AppResult<Json<ApiResponse<CustomRequest>>> {
    let resp = custom_request_service::update_status(&state, &user, kind, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/custom/{kind}/{id}/final-designs",
    params(
        ("kind" = RequestKind, Path, description = "logo, embroidery or design"),
        ("id" = Uuid, Path, description = "Request ID")
    ),
    request_body = AddFinalDesignRequest,
    responses(
        (status = 200, description = "Final design delivered", body = ApiResponse<CustomRequest>),
        (status = 400, description = "Request is cancelled"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn add_final_design(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, id)): Path<(RequestKind, Uuid)>,
    Json(payload): Json<AddFinalDesignRequest>,
) -> AppResult<Json<ApiResponse<CustomRequest>>> {
    let resp =
        custom_request_service::add_final_design(&state, &user, kind, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/custom/{kind}/{id}",
    params(
        ("kind" = RequestKind, Path, description = "logo, embroidery or design"),
        ("id" = Uuid, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_request(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, id)): Path<(RequestKind, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = custom_request_service::delete_request(&state, &user, kind, id).await?;
    Ok(Json(resp))
}
