pub mod audit_logs;
pub mod clients;
pub mod custom_requests;
pub mod order_items;
pub mod order_messages;
pub mod orders;
pub mod products;
pub mod request_messages;
pub mod request_revisions;
pub mod reviews;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use clients::Entity as Clients;
pub use custom_requests::Entity as CustomRequests;
pub use order_items::Entity as OrderItems;
pub use order_messages::Entity as OrderMessages;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use request_messages::Entity as RequestMessages;
pub use request_revisions::Entity as RequestRevisions;
pub use reviews::Entity as Reviews;
pub use users::Entity as Users;
