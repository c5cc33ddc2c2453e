use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    domain::status::Lifecycle,
    dto::{
        orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
        users::{AdminUpdateUserRequest, AuditLogList, UserList},
    },
    entity::{
        audit_logs::{Column as AuditCol, Entity as AuditLogs},
        orders::{Column as OrderCol, Entity as Orders},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    export,
    middleware::auth::AuthUser,
    models::{AuditLog, Order, User},
    policy::{Action, ensure_allowed},
    response::{ApiResponse, Meta},
    routes::params::{ListQuery, OrderListQuery, SortOrder},
    services::order_service,
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_allowed(user, Action::ManageOrders)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = Orders::find().filter(condition);

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);

    let order_list = OrderList { items: orders };

    Ok(ApiResponse::success("Orders", order_list, Some(meta)))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_allowed(user, Action::ManageOrders)?;
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let data = order_service::load_details(&state.orm, order).await?;
    Ok(ApiResponse::item("Order found", data))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_allowed(user, Action::ManageOrders)?;

    let mut message = format!("Status changed to {}", payload.status.as_str());
    if let Some(note) = payload.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        message.push_str(": ");
        message.push_str(note);
    }

    let order = order_service::apply_status(state, user, id, payload.status, message).await?;
    tracing::info!(order_number = %order.order_number, status = %order.status, "order status updated");

    Ok(ApiResponse::item("Order updated", Order::from(order)))
}

const ORDER_CSV_HEADERS: [&str; 9] = [
    "order_number",
    "customer_email",
    "status",
    "subtotal",
    "tax",
    "discount",
    "total",
    "estimated_delivery",
    "created_at",
];

/// Every order matching the filter, newest first, as CSV text.
pub async fn export_orders_csv(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<String> {
    ensure_allowed(user, Action::ExportData)?;

    let mut finder = Orders::find().find_also_related(Users);
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        finder = finder.filter(OrderCol::Status.eq(status.clone()));
    }
    let rows = finder
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;
    let count = rows.len();

    let csv = export::write_csv(
        &ORDER_CSV_HEADERS,
        rows.into_iter().map(|(order, customer)| {
            vec![
                order.order_number,
                customer.map(|c| c.email).unwrap_or_default(),
                order.status,
                export::money(order.subtotal),
                export::money(order.tax),
                export::money(order.discount),
                export::money(order.total),
                order
                    .estimated_delivery
                    .map(|d| d.with_timezone(&Utc).to_rfc3339())
                    .unwrap_or_default(),
                order.created_at.with_timezone(&Utc).to_rfc3339(),
            ]
        }),
    )?;

    audit::record(
        &state.pool,
        user.user_id,
        "orders_export",
        "orders",
        serde_json::json!({ "rows": count }),
    )
    .await;

    Ok(csv)
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: ListQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_allowed(user, Action::ManageUsers)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(UserCol::Email).ilike(pattern.clone()))
                .add(Expr::col(UserCol::Name).ilike(pattern)),
        );
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Change a user's role or deactivate them. Deactivated users keep their
/// history and can no longer authenticate.
pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AdminUpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_allowed(user, Action::ManageUsers)?;
    payload.validate()?;
    if id == user.user_id {
        return Err(AppError::BadRequest(
            "Admins cannot change their own role or status".into(),
        ));
    }

    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = existing.into();
    if let Some(role) = payload.role {
        active.role = Set(role);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "user_update",
        "users",
        serde_json::json!({
            "user_id": updated.id,
            "role": updated.role,
            "is_active": updated.is_active,
        }),
    )
    .await;

    Ok(ApiResponse::item("User updated", User::from(updated)))
}

/// `status` filters on the action name, `q` on the resource.
pub async fn list_audit_logs(
    state: &AppState,
    user: &AuthUser,
    query: ListQuery,
) -> AppResult<ApiResponse<AuditLogList>> {
    ensure_allowed(user, Action::ManageUsers)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(action) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(AuditCol::Action.eq(action.clone()));
    }
    if let Some(resource) = query.q.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(AuditCol::Resource.eq(resource.clone()));
    }

    let finder = AuditLogs::find()
        .filter(condition)
        .order_by_desc(AuditCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(AuditLog::from)
        .collect();

    Ok(ApiResponse::success(
        "Audit logs",
        AuditLogList { items },
        Some(Meta::new(page, limit, total)),
    ))
}
