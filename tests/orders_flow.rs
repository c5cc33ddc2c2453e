use chrono::{Datelike, Duration, Utc};
use sea_orm::{ConnectionTrait, SqlxPostgresConnector, Statement};
use serde_json::json;
use sgd_studio_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    domain::{
        catalog::{Category, Tier, TierMap},
        packages::{Package, RequestKind},
        status::{OrderStatus, ReviewStatus},
    },
    dto::{
        clients::CreateClientRequest,
        custom::{CreateCustomRequest, RevisionRequest, UpdateCustomRequest, UpdateRequestStatus},
        orders::{
            CancelOrderRequest, CreateOrderRequest, OrderLineRequest, UpdateOrderStatusRequest,
        },
        products::CreateProductRequest,
        reviews::{CreateReviewRequest, ModerateReviewRequest},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{CustomRequest, Order, Product},
    policy::{ROLE_ADMIN, ROLE_USER},
    services::{
        admin_service, client_service, custom_request_service, order_service, product_service,
        review_service,
    },
    state::AppState,
};
use uuid::Uuid;

// Integration flow against a real database: ordering, reviews, custom requests
// and the client book. Skipped unless TEST_DATABASE_URL is set.
#[tokio::test]
async fn storefront_and_studio_flow() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL to run integration flow tests.");
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let admin = create_user(&state, ROLE_ADMIN, "admin@example.com").await?;
    let customer = create_user(&state, ROLE_USER, "customer@example.com").await?;
    let other = create_user(&state, ROLE_USER, "other@example.com").await?;

    let flyers = create_product(&state, &admin, "Flyer Pack", 100).await?;
    let cards = create_product(&state, &admin, "Business Cards", 200).await?;

    // ordering and numbering
    let first = place_order(&state, &customer, &[flyers.id, cards.id]).await?;
    assert_eq!(first.pricing.subtotal, 300);
    assert_eq!(first.pricing.tax, 30);
    assert_eq!(first.pricing.total, 330);
    assert_eq!(first.status, "pending");

    let year = Utc::now().year();
    assert_eq!(first.order_number, format!("SGD{year}0001"));
    let second = place_order(&state, &customer, &[flyers.id]).await?;
    assert_eq!(second.order_number, format!("SGD{year}0002"));
    assert_eq!(second.pricing.total, 110);

    // simultaneous orders still draw distinct numbers
    let concurrent_ids = [cards.id];
    let (left, right) = tokio::join!(
        place_order(&state, &customer, &concurrent_ids),
        place_order(&state, &other, &concurrent_ids),
    );
    let mut numbers = vec![left?.order_number, right?.order_number];
    numbers.sort();
    assert_eq!(
        numbers,
        [format!("SGD{year}0003"), format!("SGD{year}0004")]
    );

    // the admin endpoint refuses transitions outside the table
    let skipped = admin_service::update_order_status(
        &state,
        &admin,
        second.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Completed,
            note: None,
        },
    )
    .await;
    assert!(matches!(skipped, Err(AppError::BadRequest(_))));

    // a completion racing a cancellation: exactly one of them lands
    let raced = place_order(&state, &other, &[flyers.id]).await?;
    for status in [OrderStatus::Confirmed, OrderStatus::InProgress] {
        admin_service::update_order_status(
            &state,
            &admin,
            raced.id,
            UpdateOrderStatusRequest { status, note: None },
        )
        .await?;
    }
    let (complete, cancel) = tokio::join!(
        admin_service::update_order_status(
            &state,
            &admin,
            raced.id,
            UpdateOrderStatusRequest {
                status: OrderStatus::Completed,
                note: None,
            },
        ),
        order_service::cancel_order(&state, &other, raced.id, CancelOrderRequest::default()),
    );
    assert!(complete.is_ok() != cancel.is_ok());
    let settled = order_service::get_order(&state, &other, raced.id)
        .await?
        .data
        .expect("order details");
    if complete.is_ok() {
        assert_eq!(settled.order.status, "completed");
        assert!(settled.order.actual_delivery.is_some());
    } else {
        assert_eq!(settled.order.status, "cancelled");
        assert!(settled.order.actual_delivery.is_none());
    }

    // another customer cannot see someone else's order
    let hidden = order_service::get_order(&state, &other, first.id).await;
    assert!(matches!(hidden, Err(AppError::NotFound)));

    // walk the first order to completion, then cancellation must fail
    for status in [
        OrderStatus::Confirmed,
        OrderStatus::InProgress,
        OrderStatus::Completed,
    ] {
        admin_service::update_order_status(
            &state,
            &admin,
            first.id,
            UpdateOrderStatusRequest { status, note: None },
        )
        .await?;
    }
    let completed = order_service::get_order(&state, &customer, first.id)
        .await?
        .data
        .expect("order details");
    assert_eq!(completed.order.status, "completed");
    assert!(completed.order.actual_delivery.is_some());
    // placement message plus one per status change
    assert_eq!(completed.messages.len(), 4);

    let cancel = order_service::cancel_order(
        &state,
        &customer,
        first.id,
        CancelOrderRequest::default(),
    )
    .await;
    assert!(matches!(cancel, Err(AppError::BadRequest(_))));

    let cancelled = order_service::cancel_order(
        &state,
        &customer,
        second.id,
        CancelOrderRequest {
            reason: Some("ordered twice".into()),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(cancelled.status, "cancelled");

    // reviews only count towards the rating once approved
    let review = review_service::create_review(
        &state,
        &customer,
        flyers.id,
        CreateReviewRequest {
            rating: 5,
            title: Some("Great print".into()),
            comment: "Sharp colours, quick turnaround.".into(),
        },
    )
    .await?
    .data
    .expect("review");
    assert_eq!(review.status, "pending");
    assert_eq!(rating_of(&state, flyers.id).await?, (0.0, 0));

    review_service::moderate_review(
        &state,
        &admin,
        review.id,
        ModerateReviewRequest {
            status: ReviewStatus::Approved,
            admin_response: None,
        },
    )
    .await?;
    assert_eq!(rating_of(&state, flyers.id).await?, (5.0, 1));

    let duplicate = review_service::create_review(
        &state,
        &customer,
        flyers.id,
        CreateReviewRequest {
            rating: 1,
            title: None,
            comment: "Again".into(),
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let self_vote = review_service::vote_helpful(&state, &customer, review.id).await;
    assert!(matches!(self_vote, Err(AppError::BadRequest(_))));
    let voted = review_service::vote_helpful(&state, &other, review.id)
        .await?
        .data
        .expect("review");
    assert_eq!(voted.helpful_votes, 1);
    let double_vote = review_service::vote_helpful(&state, &other, review.id).await;
    assert!(matches!(double_vote, Err(AppError::Conflict(_))));

    // deleting an approved review takes it out of the rating
    review_service::delete_review(&state, &customer, review.id).await?;
    assert_eq!(rating_of(&state, flyers.id).await?, (0.0, 0));

    // design orders cannot be cancelled once in production
    let design = submit_request(
        &state,
        &customer,
        RequestKind::Design,
        json!({ "design_type": "t-shirt", "additional_concepts": 1 }),
    )
    .await?;
    assert_eq!(design.request_number, format!("DSN{year}0001"));
    assert_eq!(design.total_price, design.package_price + 3_000);
    for status in ["in-review", "design-in-progress", "approved", "in-production"] {
        set_request_status(&state, &admin, RequestKind::Design, design.id, status).await?;
    }
    let cancel = custom_request_service::cancel_request(
        &state,
        &customer,
        RequestKind::Design,
        design.id,
    )
    .await;
    assert!(matches!(cancel, Err(AppError::BadRequest(_))));

    // completion is stamped once and the request is then closed
    let logo = submit_request(
        &state,
        &customer,
        RequestKind::Logo,
        json!({ "business_name": "Acme Roasters" }),
    )
    .await?;
    assert!(logo.completed_at.is_none());
    let mut done = logo;
    for status in ["in-review", "in-progress", "completed"] {
        done = set_request_status(&state, &admin, RequestKind::Logo, done.id, status).await?;
    }
    let completed_at = done.completed_at.expect("completion timestamp");
    let reopen =
        set_request_status(&state, &admin, RequestKind::Logo, done.id, "in-progress").await;
    assert!(matches!(reopen, Err(AppError::BadRequest(_))));
    let reloaded =
        custom_request_service::get_request(&state, &customer, RequestKind::Logo, done.id)
            .await?
            .data
            .expect("request");
    assert_eq!(reloaded.request.completed_at, Some(completed_at));
    // submission plus one entry per status change
    assert_eq!(reloaded.messages.len(), 4);
    assert_eq!(reloaded.messages[3].content, "Status changed to completed");

    // revisions open once review has started
    let revised = submit_request(
        &state,
        &customer,
        RequestKind::Logo,
        json!({ "business_name": "Night Owl Books" }),
    )
    .await?;
    let too_early = custom_request_service::request_revision(
        &state,
        &customer,
        RequestKind::Logo,
        revised.id,
        RevisionRequest {
            message: "Make it blue".into(),
        },
    )
    .await;
    assert!(matches!(too_early, Err(AppError::BadRequest(_))));
    set_request_status(&state, &admin, RequestKind::Logo, revised.id, "in-review").await?;
    let detail = custom_request_service::request_revision(
        &state,
        &customer,
        RequestKind::Logo,
        revised.id,
        RevisionRequest {
            message: "Make it blue".into(),
        },
    )
    .await?
    .data
    .expect("request");
    assert_eq!(detail.request.status, "revision-requested");
    assert_eq!(detail.revisions.len(), 1);
    assert_eq!(detail.revisions[0].message, "Make it blue");
    assert_eq!(detail.messages.len(), 3);

    // switching to rush re-estimates from the time of the edit
    let pending = submit_request(
        &state,
        &customer,
        RequestKind::Logo,
        json!({ "business_name": "Harbor Tea" }),
    )
    .await?;
    sqlx::query(
        "UPDATE custom_requests SET created_at = created_at - INTERVAL '30 days' WHERE id = $1",
    )
    .bind(pending.id)
    .execute(&state.pool)
    .await?;
    let before_edit = Utc::now();
    let rushed = custom_request_service::update_request(
        &state,
        &customer,
        RequestKind::Logo,
        pending.id,
        UpdateCustomRequest {
            rush_delivery: Some(true),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("request");
    let estimated = rushed.estimated_delivery.expect("estimate");
    assert!(rushed.rush_delivery);
    assert!(estimated >= before_edit + Duration::days(1));

    // client book: emails are unique regardless of case
    let client =
        client_service::create_client(&state, &admin, client_payload("Customer@Example.com"))
            .await?
            .data
            .expect("client");
    assert_eq!(client.email, "customer@example.com");
    let duplicate =
        client_service::create_client(&state, &admin, client_payload("customer@example.com"))
            .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    let forbidden =
        client_service::create_client(&state, &customer, client_payload("new@example.com"))
            .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    // lifetime spend sums completed orders only
    let refreshed = client_service::refresh_spend(&state, &admin, client.id)
        .await?
        .data
        .expect("client");
    assert_eq!(refreshed.total_spent, 330);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE review_votes, reviews, order_messages, order_items, orders, \
         request_messages, request_revisions, custom_requests, clients, audit_logs, \
         number_sequences, products, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        jwt_ttl_hours: 1,
        frontend_url: "http://localhost:5173".into(),
        upload_dir: std::env::temp_dir().join("sgd-uploads").display().to_string(),
        max_upload_bytes: 1024 * 1024,
        sensitive_max_attempts: 5,
        sensitive_window_secs: 60,
    };
    Ok(AppState::new(pool, orm, config))
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<AuthUser> {
    let user_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, email, password_hash, name, role) VALUES ($1, $2, 'dummy', $3, $4)",
    )
    .bind(user_id)
    .bind(email)
    .bind(email.split('@').next().unwrap_or(email))
    .bind(role)
    .execute(&state.pool)
    .await?;

    Ok(AuthUser {
        user_id,
        role: role.into(),
    })
}

async fn create_product(
    state: &AppState,
    admin: &AuthUser,
    name: &str,
    base_price: i64,
) -> anyhow::Result<Product> {
    let resp = product_service::create_product(
        state,
        admin,
        CreateProductRequest {
            name: name.into(),
            description: None,
            category: Category::Print,
            subcategory: "flyers".into(),
            prices: TierMap {
                base: base_price,
                premium: Some(base_price * 2),
                enterprise: None,
            },
            delivery_days: TierMap {
                base: 5,
                premium: Some(3),
                enterprise: None,
            },
            is_featured: false,
        },
    )
    .await?;
    Ok(resp.data.expect("product"))
}

async fn place_order(
    state: &AppState,
    user: &AuthUser,
    products: &[Uuid],
) -> anyhow::Result<Order> {
    let items = products
        .iter()
        .map(|&product_id| OrderLineRequest {
            product_id,
            tier: Tier::Base,
            quantity: 1,
            customizations: None,
        })
        .collect();
    let resp = order_service::create_order(
        state,
        user,
        CreateOrderRequest { items, notes: None },
    )
    .await?;
    Ok(resp.data.expect("order").order)
}

async fn rating_of(state: &AppState, product_id: Uuid) -> anyhow::Result<(f64, i32)> {
    let product = product_service::get_product(state, product_id)
        .await?
        .data
        .expect("product");
    Ok((product.rating.average, product.rating.count))
}

async fn submit_request(
    state: &AppState,
    user: &AuthUser,
    kind: RequestKind,
    details: serde_json::Value,
) -> anyhow::Result<CustomRequest> {
    let resp = custom_request_service::create_request(
        state,
        user,
        kind,
        CreateCustomRequest {
            title: "Launch artwork".into(),
            description: "Artwork for the spring launch".into(),
            package: Package::Standard,
            rush_delivery: false,
            details,
        },
    )
    .await?;
    Ok(resp.data.expect("request"))
}

async fn set_request_status(
    state: &AppState,
    admin: &AuthUser,
    kind: RequestKind,
    id: Uuid,
    status: &str,
) -> Result<CustomRequest, AppError> {
    let resp = custom_request_service::update_status(
        state,
        admin,
        kind,
        id,
        UpdateRequestStatus {
            status: status.into(),
            note: None,
        },
    )
    .await?;
    Ok(resp.data.expect("request"))
}

fn client_payload(email: &str) -> CreateClientRequest {
    CreateClientRequest {
        name: "Acme Roasters".into(),
        email: email.into(),
        phone: None,
        company: Some("Acme".into()),
        address: None,
        notes: None,
    }
}
