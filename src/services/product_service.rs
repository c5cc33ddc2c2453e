use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::products::{CreateProductRequest, ProductList, UpdateProductRequest};

use crate::{
    audit,
    domain::catalog::Category,
    entity::products::{ActiveModel, Column, Entity as Products},
    error::{AppError, AppResult, conflict_on_unique},
    middleware::auth::AuthUser,
    models::Product,
    policy::{Action, ensure_allowed},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(Column::IsActive.eq(true));

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(category) = query.category {
        condition = condition.add(Column::Category.eq(category.as_str()));
    }

    if let Some(subcategory) = query.subcategory.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Column::Subcategory.eq(subcategory.clone()));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::PriceBase.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::PriceBase.lte(max_price));
    }

    if let Some(featured) = query.featured {
        condition = condition.add(Column::IsFeatured.eq(featured));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::PriceBase,
        ProductSortBy::Name => Column::Name,
        ProductSortBy::Rating => Column::RatingAverage,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = ProductList { items };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let result = Products::find_by_id(id)
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .map(Product::from);
    let result = match result {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", result, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_allowed(user, Action::ManageCatalog)?;
    payload.validate()?;
    payload.category.ensure_subcategory(&payload.subcategory)?;

    let now = Utc::now();
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        category: Set(payload.category.as_str().to_string()),
        subcategory: Set(payload.subcategory),
        price_base: Set(payload.prices.base),
        price_premium: Set(payload.prices.premium),
        price_enterprise: Set(payload.prices.enterprise),
        days_base: Set(payload.delivery_days.base),
        days_premium: Set(payload.delivery_days.premium),
        days_enterprise: Set(payload.delivery_days.enterprise),
        images: Set(serde_json::json!([])),
        is_featured: Set(payload.is_featured),
        is_active: Set(true),
        rating_average: Set(0.0),
        rating_count: Set(0),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    let product = active
        .insert(&state.orm)
        .await
        .map_err(|e| conflict_on_unique(e, "A product with this name already exists"))?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::item("Product created", Product::from(product)))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_allowed(user, Action::ManageCatalog)?;
    payload.validate()?;
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    // category and subcategory are validated as a pair
    let category = match payload.category {
        Some(c) => c,
        None => Category::parse(&existing.category).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("unknown stored category {}", existing.category))
        })?,
    };
    let subcategory = payload
        .subcategory
        .clone()
        .unwrap_or_else(|| existing.subcategory.clone());
    if payload.category.is_some() || payload.subcategory.is_some() {
        category.ensure_subcategory(&subcategory)?;
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    active.category = Set(category.as_str().to_string());
    active.subcategory = Set(subcategory);
    if let Some(prices) = payload.prices {
        active.price_base = Set(prices.base);
        active.price_premium = Set(prices.premium);
        active.price_enterprise = Set(prices.enterprise);
    }
    if let Some(days) = payload.delivery_days {
        active.days_base = Set(days.base);
        active.days_premium = Set(days.premium);
        active.days_enterprise = Set(days.enterprise);
    }
    if let Some(is_featured) = payload.is_featured {
        active.is_featured = Set(is_featured);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active
        .update(&state.orm)
        .await
        .map_err(|e| conflict_on_unique(e, "A product with this name already exists"))?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::item("Updated", Product::from(product)))
}

/// Soft delete: products stay referenced by past orders and reviews.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_allowed(user, Action::ManageCatalog)?;
    let result = Products::update_many()
        .col_expr(Column::IsActive, Expr::value(false))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id))
        .filter(Column::IsActive.eq(true))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        user.user_id,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Deleted"))
}
