//! Logo, embroidery and design requests.
//!
//! All three kinds share storage and most behavior; the kind picks the
//! package table, the request number prefix and the status machine.

use chrono::{DateTime, Datelike, Utc};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    domain::{
        delivery,
        packages::{Package, RequestDetails, RequestKind},
        pricing::request_total,
    },
    dto::custom::{
        AddFinalDesignRequest, CreateCustomRequest, CustomRequestDetail, CustomRequestList,
        PackageList, RevisionRequest, UpdateCustomRequest, UpdateRequestStatus,
    },
    entity::{
        custom_requests::{
            ActiveModel as RequestActive, Column as RequestCol, Entity as CustomRequests,
            Model as RequestModel,
        },
        request_messages::{
            ActiveModel as MessageActive, Column as MessageCol, Entity as RequestMessages,
        },
        request_revisions::{
            ActiveModel as RevisionActive, Column as RevisionCol, Entity as Revisions,
        },
    },
    error::{AppError, AppResult, conflict_on_unique},
    middleware::auth::AuthUser,
    models::{CustomRequest, FinalDesign, RequestMessage, Revision},
    policy::{Action, ensure_allowed, ensure_owner_or_admin},
    response::{ApiResponse, Meta},
    routes::params::ListQuery,
    services::sequence_service,
    state::AppState,
    validation::field_errors,
};

/// Price breakdown of a request for a given package and rush choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub package_price: i64,
    pub rush_cost: i64,
    pub extras_cost: i64,
    pub total: i64,
    pub delivery_days: i64,
}

pub fn quote(kind: RequestKind, package: Package, rush: bool, extras_cost: i64) -> Quote {
    let info = kind.package(package);
    let rush_cost = if rush { info.rush_cost } else { 0 };
    Quote {
        package_price: info.price,
        rush_cost,
        extras_cost,
        total: request_total(info.price, rush_cost, extras_cost),
        delivery_days: info.delivery_days,
    }
}

impl Quote {
    fn estimate(&self, rush: bool, from: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        delivery::estimate(self.delivery_days, rush, from)
    }
}

pub fn packages(kind: RequestKind) -> ApiResponse<PackageList> {
    ApiResponse::item(
        "Packages",
        PackageList {
            items: kind.packages(),
        },
    )
}

pub async fn create_request(
    state: &AppState,
    user: &AuthUser,
    kind: RequestKind,
    payload: CreateCustomRequest,
) -> AppResult<ApiResponse<CustomRequest>> {
    ensure_allowed(user, Action::SubmitCustomRequest)?;
    let details = RequestDetails::from_json(kind, payload.details.clone())?;
    let mut errors = Vec::new();
    if let Err(err) = payload.validate() {
        errors.extend(field_errors("", &err));
    }
    if let Err(err) = details.validate() {
        errors.extend(field_errors("details", &err));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let quote = quote(kind, payload.package, payload.rush_delivery, details.extras_cost());
    let now = Utc::now();
    let estimated = quote.estimate(payload.rush_delivery, now)?;
    let details_json = serde_json::to_value(&details)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    let txn = state.orm.begin().await?;
    let request_number =
        sequence_service::next_number(&txn, kind.number_prefix(), now.year()).await?;
    let request = RequestActive {
        id: Set(Uuid::new_v4()),
        kind: Set(kind.as_str().to_string()),
        request_number: Set(request_number),
        user_id: Set(user.user_id),
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description.trim().to_string()),
        package: Set(payload.package.as_str().to_string()),
        rush_delivery: Set(payload.rush_delivery),
        package_price: Set(quote.package_price),
        rush_cost: Set(quote.rush_cost),
        extras_cost: Set(quote.extras_cost),
        total_price: Set(quote.total),
        status: Set(kind.initial_status().to_string()),
        details: Set(details_json),
        attachments: Set(serde_json::json!([])),
        final_designs: Set(serde_json::json!([])),
        estimated_delivery: Set(Some(estimated.into())),
        completed_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await
    .map_err(|e| conflict_on_unique(e, "Request number already in use, please retry"))?;
    append_message(
        &txn,
        request.id,
        user.user_id,
        format!("Request {} submitted", request.request_number),
    )
    .await?;
    txn.commit().await?;

    tracing::info!(
        kind = kind.as_str(),
        request_number = %request.request_number,
        total = request.total_price,
        "custom request created"
    );
    audit::record(
        &state.pool,
        user.user_id,
        "custom_request_create",
        "custom_requests",
        serde_json::json!({ "request_id": request.id, "kind": request.kind }),
    )
    .await;

    Ok(ApiResponse::item("Request created", CustomRequest::from(request)))
}

pub async fn list_my_requests(
    state: &AppState,
    user: &AuthUser,
    kind: RequestKind,
    query: ListQuery,
) -> AppResult<ApiResponse<CustomRequestList>> {
    let condition = Condition::all().add(RequestCol::UserId.eq(user.user_id));
    list_requests(state, kind, condition, query).await
}

pub async fn admin_list_requests(
    state: &AppState,
    user: &AuthUser,
    kind: RequestKind,
    query: ListQuery,
) -> AppResult<ApiResponse<CustomRequestList>> {
    ensure_allowed(user, Action::ManageCustomRequests)?;
    list_requests(state, kind, Condition::all(), query).await
}

async fn list_requests(
    state: &AppState,
    kind: RequestKind,
    condition: Condition,
    query: ListQuery,
) -> AppResult<ApiResponse<CustomRequestList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = condition.add(RequestCol::Kind.eq(kind.as_str()));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(RequestCol::Status.eq(status.clone()));
    }

    let finder = CustomRequests::find()
        .filter(condition)
        .order_by_desc(RequestCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CustomRequest::from)
        .collect();

    Ok(ApiResponse::success(
        "Requests",
        CustomRequestList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_request(
    state: &AppState,
    user: &AuthUser,
    kind: RequestKind,
    id: Uuid,
) -> AppResult<ApiResponse<CustomRequestDetail>> {
    let request = find_visible(state, user, kind, id).await?;
    let data = load_details(&state.orm, request).await?;
    Ok(ApiResponse::item("Request", data))
}

async fn load_details<C: ConnectionTrait>(
    conn: &C,
    request: RequestModel,
) -> AppResult<CustomRequestDetail> {
    let revisions = Revisions::find()
        .filter(RevisionCol::RequestId.eq(request.id))
        .order_by_asc(RevisionCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(Revision::from)
        .collect();
    let messages = RequestMessages::find()
        .filter(MessageCol::RequestId.eq(request.id))
        .order_by_asc(MessageCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(RequestMessage::from)
        .collect();

    Ok(CustomRequestDetail {
        request: CustomRequest::from(request),
        revisions,
        messages,
    })
}

async fn append_message<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
    sender_id: Uuid,
    content: String,
) -> AppResult<()> {
    MessageActive {
        id: Set(Uuid::new_v4()),
        request_id: Set(request_id),
        sender_id: Set(sender_id),
        content: Set(content),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Owners may edit a request until work starts. Changing package or rush
/// reprices it and re-estimates delivery from the time of the edit.
pub async fn update_request(
    state: &AppState,
    user: &AuthUser,
    kind: RequestKind,
    id: Uuid,
    payload: UpdateCustomRequest,
) -> AppResult<ApiResponse<CustomRequest>> {
    payload.validate()?;
    let txn = state.orm.begin().await?;
    let existing = lock_visible(&txn, user, kind, id).await?;
    if existing.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    if existing.status != kind.initial_status() {
        return Err(AppError::BadRequest(
            "Request can only be edited while pending".into(),
        ));
    }

    let stored_package = Package::parse(&existing.package).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("unknown stored package {}", existing.package))
    })?;
    let package = payload.package.unwrap_or(stored_package);
    let rush = payload.rush_delivery.unwrap_or(existing.rush_delivery);
    let reprice = package != stored_package || rush != existing.rush_delivery;
    let extras_cost = existing.extras_cost;
    let now = Utc::now();

    let mut active: RequestActive = existing.into();
    if let Some(description) = payload.description {
        active.description = Set(description.trim().to_string());
    }
    if reprice {
        let quote = quote(kind, package, rush, extras_cost);
        active.package = Set(package.as_str().to_string());
        active.rush_delivery = Set(rush);
        active.package_price = Set(quote.package_price);
        active.rush_cost = Set(quote.rush_cost);
        active.total_price = Set(quote.total);
        active.estimated_delivery = Set(Some(quote.estimate(rush, now)?.into()));
    }
    active.updated_at = Set(now.into());
    let request = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::item("Request updated", CustomRequest::from(request)))
}

pub async fn cancel_request(
    state: &AppState,
    user: &AuthUser,
    kind: RequestKind,
    id: Uuid,
) -> AppResult<ApiResponse<CustomRequest>> {
    let txn = state.orm.begin().await?;
    let existing = lock_visible(&txn, user, kind, id).await?;
    let next = kind.cancel(&existing.status)?;
    let previous = existing.status.clone();

    let mut active: RequestActive = existing.into();
    active.status = Set(next.to_string());
    active.updated_at = Set(Utc::now().into());
    let request = active.update(&txn).await?;
    append_message(&txn, request.id, user.user_id, "Request cancelled".to_string()).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "custom_request_cancel",
        "custom_requests",
        serde_json::json!({ "request_id": request.id, "from": previous }),
    )
    .await;

    Ok(ApiResponse::item("Request cancelled", CustomRequest::from(request)))
}

pub async fn request_revision(
    state: &AppState,
    user: &AuthUser,
    kind: RequestKind,
    id: Uuid,
    payload: RevisionRequest,
) -> AppResult<ApiResponse<CustomRequestDetail>> {
    payload.validate()?;
    let txn = state.orm.begin().await?;
    let existing = lock_visible(&txn, user, kind, id).await?;
    if existing.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    let next = kind.request_revision(&existing.status)?;
    let status_changed = next != existing.status;

    let now = Utc::now();
    RevisionActive {
        id: Set(Uuid::new_v4()),
        request_id: Set(existing.id),
        user_id: Set(user.user_id),
        message: Set(payload.message.trim().to_string()),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut active: RequestActive = existing.into();
    active.status = Set(next.to_string());
    active.updated_at = Set(now.into());
    let request = active.update(&txn).await?;
    if status_changed {
        append_message(&txn, request.id, user.user_id, "Revision requested".to_string()).await?;
    }

    let data = load_details(&txn, request).await?;
    txn.commit().await?;

    Ok(ApiResponse::item("Revision requested", data))
}

/// Admin status change; the completion timestamp is set on first completion
/// and never moved afterwards.
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    kind: RequestKind,
    id: Uuid,
    payload: UpdateRequestStatus,
) -> AppResult<ApiResponse<CustomRequest>> {
    ensure_allowed(user, Action::ManageCustomRequests)?;
    payload.validate()?;
    let txn = state.orm.begin().await?;
    let existing = lock_by_kind(&txn, kind, id).await?;
    let next = kind.transition(&existing.status, payload.status.trim())?;
    let previous = existing.status.clone();

    let now = Utc::now();
    let first_completion = next == kind.completed_status() && existing.completed_at.is_none();
    let mut active: RequestActive = existing.into();
    active.status = Set(next.to_string());
    if first_completion {
        active.completed_at = Set(Some(now.into()));
    }
    active.updated_at = Set(now.into());
    let request = active.update(&txn).await?;

    let mut message = format!("Status changed to {next}");
    if let Some(note) = payload.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        message.push_str(": ");
        message.push_str(note);
    }
    append_message(&txn, request.id, user.user_id, message).await?;
    txn.commit().await?;

    tracing::info!(
        request_number = %request.request_number,
        from = %previous,
        to = %request.status,
        "custom request status updated"
    );
    audit::record(
        &state.pool,
        user.user_id,
        "custom_request_status_update",
        "custom_requests",
        serde_json::json!({ "request_id": request.id, "from": previous, "to": request.status }),
    )
    .await;

    Ok(ApiResponse::item("Status updated", CustomRequest::from(request)))
}

pub async fn add_final_design(
    state: &AppState,
    user: &AuthUser,
    kind: RequestKind,
    id: Uuid,
    payload: AddFinalDesignRequest,
) -> AppResult<ApiResponse<CustomRequest>> {
    ensure_allowed(user, Action::ManageCustomRequests)?;
    payload.validate()?;
    let existing = find_by_kind(state, kind, id).await?;
    if existing.status == "cancelled" {
        return Err(AppError::BadRequest(
            "Cannot deliver designs for a cancelled request".into(),
        ));
    }

    let design = FinalDesign {
        file_url: payload.file_url.trim().to_string(),
        note: payload.note,
        delivered_at: Utc::now(),
    };
    let entry = serde_json::to_value(vec![design])
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    // append in place so concurrent deliveries are not lost
    sqlx::query(
        r#"
        UPDATE custom_requests
        SET final_designs = final_designs || $1::jsonb, updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(entry)
    .bind(existing.id)
    .execute(&state.pool)
    .await?;

    let request = find_by_kind(state, kind, id).await?;
    audit::record(
        &state.pool,
        user.user_id,
        "custom_request_final_design",
        "custom_requests",
        serde_json::json!({ "request_id": request.id }),
    )
    .await;

    Ok(ApiResponse::item("Design delivered", CustomRequest::from(request)))
}

pub async fn delete_request(
    state: &AppState,
    user: &AuthUser,
    kind: RequestKind,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_allowed(user, Action::ManageCustomRequests)?;
    let result = CustomRequests::delete_many()
        .filter(RequestCol::Id.eq(id))
        .filter(RequestCol::Kind.eq(kind.as_str()))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        user.user_id,
        "custom_request_delete",
        "custom_requests",
        serde_json::json!({ "request_id": id, "kind": kind.as_str() }),
    )
    .await;

    Ok(ApiResponse::done("Request deleted"))
}

pub(crate) async fn find_by_kind(
    state: &AppState,
    kind: RequestKind,
    id: Uuid,
) -> AppResult<RequestModel> {
    CustomRequests::find_by_id(id)
        .filter(RequestCol::Kind.eq(kind.as_str()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

async fn find_visible(
    state: &AppState,
    user: &AuthUser,
    kind: RequestKind,
    id: Uuid,
) -> AppResult<RequestModel> {
    let request = find_by_kind(state, kind, id).await?;
    ensure_owner_or_admin(user, request.user_id).map_err(|_| AppError::NotFound)?;
    Ok(request)
}

/// Loads the request with `FOR UPDATE`; the lock lasts until `conn` commits.
async fn lock_by_kind<C: ConnectionTrait>(
    conn: &C,
    kind: RequestKind,
    id: Uuid,
) -> AppResult<RequestModel> {
    CustomRequests::find_by_id(id)
        .filter(RequestCol::Kind.eq(kind.as_str()))
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

async fn lock_visible<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    kind: RequestKind,
    id: Uuid,
) -> AppResult<RequestModel> {
    let request = lock_by_kind(conn, kind, id).await?;
    ensure_owner_or_admin(user, request.user_id).map_err(|_| AppError::NotFound)?;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rush_logo_standard_quote() {
        let q = quote(RequestKind::Logo, Package::Standard, true, 0);
        assert_eq!(q.package_price, 9_900);
        assert_eq!(q.rush_cost, 2_500);
        assert_eq!(q.total, 12_400);
        assert_eq!(q.delivery_days, 3);
    }

    #[test]
    fn embroidery_quote_includes_extras() {
        let q = quote(RequestKind::Embroidery, Package::Basic, false, 2_300);
        assert_eq!(q.rush_cost, 0);
        assert_eq!(q.total, 2_900 + 2_300);
    }

    #[test]
    fn rush_shortens_estimate() {
        let q = quote(RequestKind::Design, Package::Basic, true, 0);
        let now = Utc::now();
        assert_eq!((q.estimate(true, now).unwrap() - now).num_days(), 5);
        assert_eq!((q.estimate(false, now).unwrap() - now).num_days(), 10);
    }
}
