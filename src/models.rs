use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{catalog::TierMap, pricing::Pricing, rating::RatingSummary},
    entity::{
        audit_logs, clients, custom_requests, order_items, order_messages, orders, products,
        request_messages, request_revisions, reviews, users,
    },
};

fn utc(dt: DateTimeWithTimeZone) -> DateTime<Utc> {
    dt.with_timezone(&Utc)
}

/// JSONB arrays of file paths; anything malformed reads as empty.
fn string_list(value: Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            role: model.role,
            is_active: model.is_active,
            avatar_url: model.avatar_url,
            created_at: utc(model.created_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub subcategory: String,
    pub prices: TierMap,
    pub delivery_days: TierMap,
    pub images: Vec<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub rating: RatingSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            category: model.category,
            subcategory: model.subcategory,
            prices: TierMap {
                base: model.price_base,
                premium: model.price_premium,
                enterprise: model.price_enterprise,
            },
            delivery_days: TierMap {
                base: model.days_base,
                premium: model.days_premium,
                enterprise: model.days_enterprise,
            },
            images: string_list(model.images),
            is_featured: model.is_featured,
            is_active: model.is_active,
            rating: RatingSummary {
                average: model.rating_average,
                count: model.rating_count,
            },
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: String,
    pub pricing: Pricing,
    pub notes: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number,
            user_id: model.user_id,
            status: model.status,
            pricing: Pricing {
                subtotal: model.subtotal,
                tax: model.tax,
                discount: model.discount,
                total: model.total,
            },
            notes: model.notes,
            estimated_delivery: model.estimated_delivery.map(utc),
            actual_delivery: model.actual_delivery.map(utc),
            attachments: string_list(model.attachments),
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub tier: String,
    pub quantity: i32,
    pub unit_price: i64,
    #[schema(value_type = Option<Object>)]
    pub customizations: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            tier: model.tier,
            quantity: model.quantity,
            unit_price: model.unit_price,
            customizations: model.customizations,
            created_at: utc(model.created_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderMessage {
    pub id: Uuid,
    pub order_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<order_messages::Model> for OrderMessage {
    fn from(model: order_messages::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            sender_id: model.sender_id,
            content: model.content,
            is_read: model.is_read,
            created_at: utc(model.created_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: String,
    pub status: String,
    pub admin_response: Option<String>,
    pub helpful_votes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<reviews::Model> for Review {
    fn from(model: reviews::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            product_id: model.product_id,
            rating: model.rating,
            title: model.title,
            comment: model.comment,
            status: model.status,
            admin_response: model.admin_response,
            helpful_votes: model.helpful_votes,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FinalDesign {
    pub file_url: String,
    pub note: Option<String>,
    pub delivered_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomRequest {
    pub id: Uuid,
    pub kind: String,
    pub request_number: String,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub package: String,
    pub rush_delivery: bool,
    pub package_price: i64,
    pub rush_cost: i64,
    pub extras_cost: i64,
    pub total_price: i64,
    pub status: String,
    #[schema(value_type = Object)]
    pub details: Value,
    pub attachments: Vec<String>,
    pub final_designs: Vec<FinalDesign>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<custom_requests::Model> for CustomRequest {
    fn from(model: custom_requests::Model) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            request_number: model.request_number,
            user_id: model.user_id,
            title: model.title,
            description: model.description,
            package: model.package,
            rush_delivery: model.rush_delivery,
            package_price: model.package_price,
            rush_cost: model.rush_cost,
            extras_cost: model.extras_cost,
            total_price: model.total_price,
            status: model.status,
            details: model.details,
            attachments: string_list(model.attachments),
            final_designs: serde_json::from_value(model.final_designs).unwrap_or_default(),
            estimated_delivery: model.estimated_delivery.map(utc),
            completed_at: model.completed_at.map(utc),
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Revision {
    pub id: Uuid,
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<request_revisions::Model> for Revision {
    fn from(model: request_revisions::Model) -> Self {
        Self {
            id: model.id,
            request_id: model.request_id,
            user_id: model.user_id,
            message: model.message,
            created_at: utc(model.created_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestMessage {
    pub id: Uuid,
    pub request_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<request_messages::Model> for RequestMessage {
    fn from(model: request_messages::Model) -> Self {
        Self {
            id: model.id,
            request_id: model.request_id,
            sender_id: model.sender_id,
            content: model.content,
            created_at: utc(model.created_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub total_spent: i64,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<clients::Model> for Client {
    fn from(model: clients::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            company: model.company,
            address: model.address,
            notes: model.notes,
            total_spent: model.total_spent,
            created_by: model.created_by,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl From<audit_logs::Model> for AuditLog {
    fn from(model: audit_logs::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            action: model.action,
            resource: model.resource,
            metadata: model.metadata,
            created_at: utc(model.created_at),
        }
    }
}
