use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::uploads::UploadList,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::upload_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/avatar", post(upload_avatar))
        .route("/product/{id}", post(upload_product_images))
        .route("/order/{id}", post(upload_order_files))
        .route("/custom/{id}", post(upload_custom_files))
}

#[utoipa::path(
    post,
    path = "/api/uploads/avatar",
    request_body(content = String, content_type = "multipart/form-data", description = "One image file"),
    responses(
        (status = 200, description = "Avatar replaced", body = ApiResponse<UploadList>),
        (status = 400, description = "Missing file, wrong type or too large")
    ),
    security(("bearer_auth" = [])),
    tag = "Uploads"
)]
pub async fn upload_avatar(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadList>>> {
    let resp = upload_service::upload_avatar(&state, &user, multipart).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/uploads/product/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body(content = String, content_type = "multipart/form-data", description = "Up to 10 image files"),
    responses(
        (status = 200, description = "Images appended to the product", body = ApiResponse<UploadList>),
        (status = 400, description = "Missing file, wrong type or too large"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Uploads"
)]
pub async fn upload_product_images(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadList>>> {
    let resp = upload_service::upload_product_images(&state, &user, id, multipart).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/uploads/order/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body(content = String, content_type = "multipart/form-data", description = "Up to 5 artwork files"),
    responses(
        (status = 200, description = "Files attached to the order", body = ApiResponse<UploadList>),
        (status = 400, description = "Missing file, wrong type or too large"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Uploads"
)]
pub async fn upload_order_files(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadList>>> {
    let resp = upload_service::upload_order_files(&state, &user, id, multipart).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/uploads/custom/{id}",
    params(("id" = Uuid, Path, description = "Custom request ID")),
    request_body(content = String, content_type = "multipart/form-data", description = "Up to 5 reference files"),
    responses(
        (status = 200, description = "Files attached to the request", body = ApiResponse<UploadList>),
        (status = 400, description = "Missing file, wrong type or too large"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Uploads"
)]
pub async fn upload_custom_files(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadList>>> {
    let resp = upload_service::upload_custom_files(&state, &user, id, multipart).await?;
    Ok(Json(resp))
}
