use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{
        catalog::{Category, Tier, TierMap},
        packages::{
            DesignDetails, EmbroideryDetails, LogoDetails, Package, PackageInfo, Placement,
            RequestKind,
        },
        pricing::Pricing,
        rating::RatingSummary,
        status::{DesignStatus, OrderStatus, RequestStatus, ReviewStatus},
    },
    dto::{
        auth::{
            ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest,
            UpdateProfileRequest,
        },
        clients::{ClientList, CreateClientRequest, UpdateClientRequest},
        custom::{
            AddFinalDesignRequest, CreateCustomRequest, CustomRequestDetail, CustomRequestList,
            PackageList, RevisionRequest, UpdateCustomRequest, UpdateRequestStatus,
        },
        orders::{
            CancelOrderRequest, CreateOrderRequest, MessageList, OrderLineRequest, OrderList,
            OrderWithItems, SendMessageRequest, UpdateOrderRequest, UpdateOrderStatusRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        reviews::{CreateReviewRequest, ModerateReviewRequest, ReviewList, UpdateReviewRequest},
        uploads::{UploadList, UploadedFile},
        users::{AdminUpdateUserRequest, AuditLogList, UserList},
    },
    error::FieldError,
    models::{
        AuditLog, Client, CustomRequest, FinalDesign, Order, OrderItem, OrderMessage, Product,
        RequestMessage, Review, Revision, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, clients, custom, health, orders, params, products as product_routes, reviews,
        uploads,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        auth::update_profile,
        auth::change_password,
        product_routes::list_products,
        product_routes::create_product,
        product_routes::get_product,
        product_routes::update_product,
        product_routes::delete_product,
        product_routes::list_reviews,
        product_routes::create_review,
        reviews::update_review,
        reviews::delete_review,
        reviews::vote_helpful,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
        orders::cancel_order,
        orders::list_messages,
        orders::send_message,
        orders::mark_messages_read,
        custom::list_packages,
        custom::create_request,
        custom::list_requests,
        custom::get_request,
        custom::update_request,
        custom::cancel_request,
        custom::request_revision,
        custom::admin_list_requests,
        custom::update_status,
        custom::add_final_design,
        custom::delete_request,
        clients::list_clients,
        clients::create_client,
        clients::get_client,
        clients::update_client,
        clients::delete_client,
        clients::refresh_spend,
        clients::export_clients,
        uploads::upload_avatar,
        uploads::upload_product_images,
        uploads::upload_order_files,
        uploads::upload_custom_files,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::export_orders,
        admin::list_reviews,
        admin::moderate_review,
        admin::delete_review,
        admin::list_users,
        admin::update_user,
        admin::list_audit_logs
    ),
    components(
        schemas(
            User,
            Product,
            Order,
            OrderItem,
            OrderMessage,
            Review,
            CustomRequest,
            FinalDesign,
            Revision,
            RequestMessage,
            Client,
            AuditLog,
            FieldError,
            Category,
            Tier,
            TierMap,
            Pricing,
            RatingSummary,
            OrderStatus,
            RequestStatus,
            DesignStatus,
            ReviewStatus,
            RequestKind,
            Package,
            PackageInfo,
            Placement,
            LogoDetails,
            EmbroideryDetails,
            DesignDetails,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            ChangePasswordRequest,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateReviewRequest,
            UpdateReviewRequest,
            ModerateReviewRequest,
            ReviewList,
            OrderLineRequest,
            CreateOrderRequest,
            UpdateOrderRequest,
            UpdateOrderStatusRequest,
            CancelOrderRequest,
            SendMessageRequest,
            OrderWithItems,
            OrderList,
            MessageList,
            CreateCustomRequest,
            UpdateCustomRequest,
            UpdateRequestStatus,
            RevisionRequest,
            AddFinalDesignRequest,
            CustomRequestList,
            CustomRequestDetail,
            PackageList,
            CreateClientRequest,
            UpdateClientRequest,
            ClientList,
            AdminUpdateUserRequest,
            UserList,
            AuditLogList,
            UploadedFile,
            UploadList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::ListQuery,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CustomRequest>,
            ApiResponse<ClientList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Reviews", description = "Product review endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Custom Requests", description = "Logo, embroidery and design request endpoints"),
        (name = "Clients", description = "Client relationship endpoints"),
        (name = "Uploads", description = "File upload endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_custom_request_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/custom/{kind}/{id}/revisions"));
        assert!(doc.paths.paths.contains_key("/api/admin/orders/export/csv"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
