use std::collections::HashMap;

use chrono::{Datelike, Utc};
use sea_orm::sea_query::Expr;
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
        catalog::TierMap,
        delivery,
        numbering::ORDER_PREFIX,
        pricing::price_lines,
        status::{self, Lifecycle, OrderStatus},
    },
    dto::orders::{
        CancelOrderRequest, CreateOrderRequest, MessageList, OrderList, OrderWithItems,
        SendMessageRequest, UpdateOrderRequest,
    },
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        order_messages::{
            ActiveModel as MessageActive, Column as MessageCol, Entity as OrderMessages,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult, conflict_on_unique},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderMessage},
    policy::{Action, ensure_allowed, ensure_owner_or_admin, is_admin},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::sequence_service,
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
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
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_allowed(user, Action::PlaceOrder)?;
    payload.validate()?;

    let product_ids: Vec<Uuid> = payload.items.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .filter(ProdCol::IsActive.eq(true))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    // resolve unit prices and turnaround per line
    let mut lines = Vec::with_capacity(payload.items.len());
    let mut longest_days = 0_i64;
    for item in &payload.items {
        let product = products.get(&item.product_id).ok_or_else(|| {
            AppError::BadRequest(format!("Product {} is not available", item.product_id))
        })?;
        let prices = TierMap {
            base: product.price_base,
            premium: product.price_premium,
            enterprise: product.price_enterprise,
        };
        let unit_price = prices.get(item.tier).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Tier {} is not offered for {}",
                item.tier.as_str(),
                product.name
            ))
        })?;
        let days = TierMap {
            base: product.days_base,
            premium: product.days_premium,
            enterprise: product.days_enterprise,
        };
        longest_days = longest_days.max(days.get(item.tier).unwrap_or(product.days_base));
        lines.push((unit_price, item.quantity));
    }

    let pricing = price_lines(&lines)?;
    let now = Utc::now();
    let estimated = delivery::estimate(longest_days, false, now)?;

    let txn = state.orm.begin().await?;
    let order_number = sequence_service::next_number(&txn, ORDER_PREFIX, now.year()).await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        order_number: Set(order_number),
        user_id: Set(user.user_id),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        subtotal: Set(pricing.subtotal),
        tax: Set(pricing.tax),
        discount: Set(pricing.discount),
        total: Set(pricing.total),
        notes: Set(payload.notes),
        estimated_delivery: Set(Some(estimated.into())),
        actual_delivery: Set(None),
        attachments: Set(serde_json::json!([])),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await
    .map_err(|e| conflict_on_unique(e, "Order number already in use, please retry"))?;

    let mut order_items: Vec<OrderItem> = Vec::with_capacity(payload.items.len());
    for (item, (unit_price, quantity)) in payload.items.into_iter().zip(lines) {
        let saved = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            tier: Set(item.tier.as_str().to_string()),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            customizations: Set(item.customizations),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        order_items.push(OrderItem::from(saved));
    }

    let placed = append_message(
        &txn,
        order.id,
        user.user_id,
        format!("Order {} placed", order.order_number),
    )
    .await?;

    txn.commit().await?;

    tracing::info!(order_number = %order.order_number, total = order.total, "order created");
    audit::record(
        &state.pool,
        user.user_id,
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "order_number": order.order_number }),
    )
    .await;

    Ok(ApiResponse::item(
        "Order created",
        OrderWithItems {
            order: Order::from(order),
            items: order_items,
            messages: vec![OrderMessage::from(placed)],
        },
    ))
}

/// Owner or admin view of one order with its items and communication log.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_visible(state, user, id).await?;
    let data = load_details(&state.orm, order).await?;
    Ok(ApiResponse::item("OK", data))
}

pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    payload.validate()?;
    let order = find_visible(state, user, id).await?;
    if !is_admin(user) && order.status != OrderStatus::Pending.as_str() {
        return Err(AppError::BadRequest(
            "Order can only be edited while pending".into(),
        ));
    }

    let mut active: OrderActive = order.into();
    active.notes = Set(payload.notes);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    Ok(ApiResponse::item("Order updated", Order::from(order)))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: CancelOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let order = find_visible(state, user, id).await?;

    let note = payload
        .reason
        .filter(|r| !r.trim().is_empty())
        .map(|r| format!("Order cancelled: {}", r.trim()))
        .unwrap_or_else(|| "Order cancelled".to_string());
    let order = apply_status(state, user, order.id, OrderStatus::Cancelled, note)
        .await
        .map_err(|err| match err {
            AppError::BadRequest(_) => {
                AppError::BadRequest("Order can no longer be cancelled".into())
            }
            other => other,
        })?;

    Ok(ApiResponse::item("Order cancelled", Order::from(order)))
}

/// Move an order to `next` per the transition table, stamping the delivery
/// date on first completion and logging the change to the order's messages.
///
/// The row is locked for the transaction, so concurrent changes are checked
/// against the status the previous one committed.
pub async fn apply_status(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    next: OrderStatus,
    message: String,
) -> AppResult<OrderModel> {
    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let previous = order.status.clone();
    let next = status::check_transition(&previous, next)?;

    let now = Utc::now();
    let already_delivered = order.actual_delivery.is_some();
    let mut active: OrderActive = order.into();
    active.status = Set(next.as_str().to_string());
    if next == OrderStatus::completed() && !already_delivered {
        active.actual_delivery = Set(Some(now.into()));
    }
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    append_message(&txn, order.id, user.user_id, message).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": previous, "to": order.status }),
    )
    .await;

    Ok(order)
}

pub async fn list_messages(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<MessageList>> {
    let order = find_visible(state, user, id).await?;
    let items = OrderMessages::find()
        .filter(MessageCol::OrderId.eq(order.id))
        .order_by_asc(MessageCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderMessage::from)
        .collect();
    Ok(ApiResponse::item("Messages", MessageList { items }))
}

pub async fn send_message(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SendMessageRequest,
) -> AppResult<ApiResponse<OrderMessage>> {
    payload.validate()?;
    let order = find_visible(state, user, id).await?;
    let message =
        append_message(&state.orm, order.id, user.user_id, payload.content.trim().to_string())
            .await?;
    Ok(ApiResponse::item("Message sent", OrderMessage::from(message)))
}

/// Mark messages from the other party as read.
pub async fn mark_messages_read(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let order = find_visible(state, user, id).await?;
    let result = OrderMessages::update_many()
        .col_expr(MessageCol::IsRead, Expr::value(true))
        .filter(MessageCol::OrderId.eq(order.id))
        .filter(MessageCol::SenderId.ne(user.user_id))
        .filter(MessageCol::IsRead.eq(false))
        .exec(&state.orm)
        .await?;
    Ok(ApiResponse::item(
        "Messages marked as read",
        serde_json::json!({ "updated": result.rows_affected }),
    ))
}

pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_allowed(user, Action::ManageOrders)?;
    let result = Orders::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        user.user_id,
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Order deleted"))
}

pub async fn append_message<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    sender_id: Uuid,
    content: String,
) -> AppResult<crate::entity::order_messages::Model> {
    let message = MessageActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        sender_id: Set(sender_id),
        content: Set(content),
        is_read: Set(false),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(message)
}

pub async fn load_details<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();
    let messages = OrderMessages::find()
        .filter(MessageCol::OrderId.eq(order.id))
        .order_by_asc(MessageCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderMessage::from)
        .collect();
    Ok(OrderWithItems {
        order: Order::from(order),
        items,
        messages,
    })
}

async fn find_visible(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<OrderModel> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    // hide other customers' orders entirely
    ensure_owner_or_admin(user, order.user_id).map_err(|_| AppError::NotFound)?;
    Ok(order)
}
