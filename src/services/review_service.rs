use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    db::sqlx_unique_violation,
    domain::{rating::RatingSummary, status::ReviewStatus},
    dto::reviews::{CreateReviewRequest, ModerateReviewRequest, ReviewList, UpdateReviewRequest},
    entity::{
        products::{Column as ProdCol, Entity as Products},
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews},
    },
    error::{AppError, AppResult, conflict_on_unique},
    middleware::auth::AuthUser,
    models::Review,
    policy::{Action, ensure_allowed, ensure_owner_or_admin},
    response::{ApiResponse, Meta},
    routes::params::{ListQuery, Pagination},
    state::AppState,
};

const DUPLICATE_REVIEW: &str = "You have already reviewed this product";

/// Recompute a product's rating from its approved reviews and store it.
///
/// Idempotent; callers run it in the same transaction as the review write so
/// the aggregate never drifts from the reviews it summarizes.
pub async fn recompute_product_rating<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> AppResult<RatingSummary> {
    let (count, sum): (i64, Option<i64>) = Reviews::find()
        .select_only()
        .column_as(Expr::col(ReviewCol::Id).count(), "count")
        .column_as(Expr::col(ReviewCol::Rating).sum(), "sum")
        .filter(ReviewCol::ProductId.eq(product_id))
        .filter(ReviewCol::Status.eq(ReviewStatus::Approved.as_str()))
        .into_tuple()
        .one(conn)
        .await?
        .unwrap_or((0, None));

    let summary = RatingSummary::from_totals(sum.unwrap_or(0), count);

    let result = Products::update_many()
        .col_expr(ProdCol::RatingAverage, Expr::value(summary.average))
        .col_expr(ProdCol::RatingCount, Expr::value(summary.count))
        .filter(ProdCol::Id.eq(product_id))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        tracing::warn!(%product_id, "rating recompute found no product");
    }

    Ok(summary)
}

pub async fn list_product_reviews(
    state: &AppState,
    product_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Reviews::find()
        .filter(ReviewCol::ProductId.eq(product_id))
        .filter(ReviewCol::Status.eq(ReviewStatus::Approved.as_str()))
        .order_by_desc(ReviewCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Review::from)
        .collect();

    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    ensure_allowed(user, Action::WriteReview)?;
    payload.validate()?;

    let product = Products::find_by_id(product_id)
        .filter(ProdCol::IsActive.eq(true))
        .one(&state.orm)
        .await?;
    if product.is_none() {
        return Err(AppError::NotFound);
    }

    let existing = Reviews::find()
        .filter(ReviewCol::UserId.eq(user.user_id))
        .filter(ReviewCol::ProductId.eq(product_id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(DUPLICATE_REVIEW.into()));
    }

    let now = Utc::now();
    let txn = state.orm.begin().await?;
    // the unique (user_id, product_id) index catches a concurrent duplicate
    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        product_id: Set(product_id),
        rating: Set(payload.rating),
        title: Set(payload.title),
        comment: Set(payload.comment.trim().to_string()),
        // reviews count towards the rating once moderate_review approves them
        status: Set(ReviewStatus::Pending.as_str().to_string()),
        admin_response: Set(None),
        helpful_votes: Set(0),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await
    .map_err(|e| conflict_on_unique(e, DUPLICATE_REVIEW))?;
    recompute_product_rating(&txn, product_id).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "review_create",
        "reviews",
        serde_json::json!({ "review_id": review.id, "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::item("Review submitted", Review::from(review)))
}

/// Authors may edit their review; edits go back to moderation.
pub async fn update_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    payload.validate()?;
    let txn = state.orm.begin().await?;
    let existing = Reviews::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if existing.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    let product_id = existing.product_id;

    let mut active: ReviewActive = existing.into();
    if let Some(rating) = payload.rating {
        active.rating = Set(rating);
    }
    if let Some(title) = payload.title {
        active.title = Set(Some(title));
    }
    if let Some(comment) = payload.comment {
        active.comment = Set(comment.trim().to_string());
    }
    active.status = Set(ReviewStatus::Pending.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let review = active.update(&txn).await?;

    recompute_product_rating(&txn, product_id).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "review_update",
        "reviews",
        serde_json::json!({ "review_id": review.id }),
    )
    .await;

    Ok(ApiResponse::item("Review updated", Review::from(review)))
}

pub async fn delete_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    let existing = Reviews::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_admin(user, existing.user_id)?;

    let product_id = existing.product_id;
    let was_approved = existing.status == ReviewStatus::Approved.as_str();
    Reviews::delete_by_id(id).exec(&txn).await?;
    if was_approved {
        recompute_product_rating(&txn, product_id).await?;
    }
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "review_delete",
        "reviews",
        serde_json::json!({ "review_id": id, "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::done("Review deleted"))
}

/// One helpful vote per user per review; authors cannot vote for themselves.
pub async fn vote_helpful(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Review>> {
    let review = Reviews::find_by_id(id)
        .filter(ReviewCol::Status.eq(ReviewStatus::Approved.as_str()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if review.user_id == user.user_id {
        return Err(AppError::BadRequest(
            "You cannot vote on your own review".into(),
        ));
    }

    let mut tx = state.pool.begin().await?;
    let inserted = sqlx::query(
        r#"
        INSERT INTO review_votes (review_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (review_id, user_id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(user.user_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if sqlx_unique_violation(&e) {
            AppError::Conflict("Already voted".into())
        } else {
            AppError::DbError(e)
        }
    })?;
    if inserted.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "You have already voted on this review".into(),
        ));
    }

    sqlx::query("UPDATE reviews SET helpful_votes = helpful_votes + 1 WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    let updated = Reviews::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::item("Vote recorded", Review::from(updated)))
}

pub async fn admin_list_reviews(
    state: &AppState,
    user: &AuthUser,
    query: ListQuery,
) -> AppResult<ApiResponse<ReviewList>> {
    ensure_allowed(user, Action::ModerateReviews)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(ReviewCol::Status.eq(status.clone()));
    }

    let finder = Reviews::find()
        .filter(condition)
        .order_by_desc(ReviewCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Review::from)
        .collect();

    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn moderate_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ModerateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    ensure_allowed(user, Action::ModerateReviews)?;
    payload.validate()?;

    let txn = state.orm.begin().await?;
    let existing = Reviews::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let product_id = existing.product_id;

    let mut active: ReviewActive = existing.into();
    active.status = Set(payload.status.as_str().to_string());
    if let Some(response) = payload.admin_response {
        active.admin_response = Set(Some(response));
    }
    active.updated_at = Set(Utc::now().into());
    let review = active.update(&txn).await?;

    let rating = recompute_product_rating(&txn, product_id).await?;
    txn.commit().await?;

    tracing::info!(
        review_id = %review.id,
        %product_id,
        average = rating.average,
        count = rating.count,
        "review moderated"
    );
    audit::record(
        &state.pool,
        user.user_id,
        "review_moderate",
        "reviews",
        serde_json::json!({ "review_id": review.id, "status": review.status }),
    )
    .await;

    Ok(ApiResponse::item("Review moderated", Review::from(review)))
}
