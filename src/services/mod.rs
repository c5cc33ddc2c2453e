pub mod admin_service;
pub mod auth_service;
pub mod client_service;
pub mod custom_request_service;
pub mod order_service;
pub mod product_service;
pub mod review_service;
pub mod sequence_service;
pub mod upload_service;
