use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    domain::status::{Lifecycle, OrderStatus},
    dto::clients::{ClientList, CreateClientRequest, UpdateClientRequest},
    entity::clients::{ActiveModel as ClientActive, Column as ClientCol, Entity as Clients},
    error::{AppError, AppResult, conflict_on_unique},
    export,
    middleware::auth::AuthUser,
    models::Client,
    policy::{Action, ensure_allowed},
    response::{ApiResponse, Meta},
    routes::params::ListQuery,
    state::AppState,
};

const DUPLICATE_CLIENT: &str = "A client with this email already exists";

fn search_condition(query: &ListQuery) -> Condition {
    let mut condition = Condition::all();
    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(ClientCol::Name).ilike(pattern.clone()))
                .add(Expr::col(ClientCol::Email).ilike(pattern.clone()))
                .add(Expr::col(ClientCol::Company).ilike(pattern)),
        );
    }
    condition
}

pub async fn list_clients(
    state: &AppState,
    user: &AuthUser,
    query: ListQuery,
) -> AppResult<ApiResponse<ClientList>> {
    ensure_allowed(user, Action::ManageClients)?;
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Clients::find()
        .filter(search_condition(&query))
        .order_by_asc(ClientCol::Name);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Client::from)
        .collect();

    Ok(ApiResponse::success(
        "Clients",
        ClientList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_client(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Client>> {
    ensure_allowed(user, Action::ManageClients)?;
    let client = Clients::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::item("Client", Client::from(client)))
}

pub async fn create_client(
    state: &AppState,
    user: &AuthUser,
    payload: CreateClientRequest,
) -> AppResult<ApiResponse<Client>> {
    ensure_allowed(user, Action::ManageClients)?;
    payload.validate()?;
    let email = payload.email.trim().to_lowercase();

    let exist = Clients::find()
        .filter(ClientCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict(DUPLICATE_CLIENT.into()));
    }

    let now = Utc::now();
    let client = ClientActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        email: Set(email),
        phone: Set(payload.phone),
        company: Set(payload.company),
        address: Set(payload.address),
        notes: Set(payload.notes),
        total_spent: Set(0),
        created_by: Set(user.user_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|e| conflict_on_unique(e, DUPLICATE_CLIENT))?;

    audit::record(
        &state.pool,
        user.user_id,
        "client_create",
        "clients",
        serde_json::json!({ "client_id": client.id }),
    )
    .await;

    Ok(ApiResponse::item("Client created", Client::from(client)))
}

pub async fn update_client(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateClientRequest,
) -> AppResult<ApiResponse<Client>> {
    ensure_allowed(user, Action::ManageClients)?;
    payload.validate()?;
    let existing = Clients::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ClientActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(email) = payload.email {
        active.email = Set(email.trim().to_lowercase());
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(company) = payload.company {
        active.company = Set(Some(company));
    }
    if let Some(address) = payload.address {
        active.address = Set(Some(address));
    }
    if let Some(notes) = payload.notes {
        active.notes = Set(Some(notes));
    }
    active.updated_at = Set(Utc::now().into());
    let client = active
        .update(&state.orm)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_CLIENT))?;

    Ok(ApiResponse::item("Client updated", Client::from(client)))
}

pub async fn delete_client(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_allowed(user, Action::ManageClients)?;
    let result = Clients::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        user.user_id,
        "client_delete",
        "clients",
        serde_json::json!({ "client_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Client deleted"))
}

/// Recompute lifetime spend from completed orders placed by the user account
/// sharing the client's email.
pub async fn refresh_spend(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Client>> {
    ensure_allowed(user, Action::ManageClients)?;
    let updated = sqlx::query(
        r#"
        UPDATE clients c
        SET total_spent = COALESCE((
                SELECT SUM(o.total)
                FROM orders o
                JOIN users u ON u.id = o.user_id
                WHERE lower(u.email) = lower(c.email) AND o.status = $2
            ), 0)::BIGINT,
            updated_at = NOW()
        WHERE c.id = $1
        "#,
    )
    .bind(id)
    .bind(OrderStatus::completed().as_str())
    .execute(&state.pool)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    let client = Clients::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(client_id = %client.id, total_spent = client.total_spent, "client spend refreshed");

    Ok(ApiResponse::item("Client spend refreshed", Client::from(client)))
}

const CLIENT_CSV_HEADERS: [&str; 8] = [
    "name",
    "email",
    "phone",
    "company",
    "address",
    "total_spent",
    "notes",
    "created_at",
];

pub async fn export_clients_csv(
    state: &AppState,
    user: &AuthUser,
    query: ListQuery,
) -> AppResult<String> {
    ensure_allowed(user, Action::ExportData)?;
    let clients = Clients::find()
        .filter(search_condition(&query))
        .order_by_asc(ClientCol::Name)
        .all(&state.orm)
        .await?;
    let count = clients.len();

    let csv = export::write_csv(
        &CLIENT_CSV_HEADERS,
        clients.into_iter().map(|c| {
            vec![
                c.name,
                c.email,
                c.phone.unwrap_or_default(),
                c.company.unwrap_or_default(),
                c.address.unwrap_or_default(),
                export::money(c.total_spent),
                c.notes.unwrap_or_default(),
                c.created_at.with_timezone(&Utc).to_rfc3339(),
            ]
        }),
    )?;

    audit::record(
        &state.pool,
        user.user_id,
        "clients_export",
        "clients",
        serde_json::json!({ "rows": count }),
    )
    .await;

    Ok(csv)
}
