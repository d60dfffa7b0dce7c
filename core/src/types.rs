//! Domain DTOs for the POS API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently,
//! so the SDK surface never couples to Axum internals. Integration tests
//! catch any schema drift between the two crates. Catalog resources carry
//! server-assigned integer ids; orders use UUIDs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collection::Record;

/// A menu product returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
}

impl Record for Product {
    const KEY_FIELD: &'static str = "id";
}

/// Request payload for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
}

/// Request payload for updating a product. Only the fields present in the
/// JSON are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProduct {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
}

/// A menu category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: u64,
    pub name: String,
}

impl Record for Category {
    const KEY_FIELD: &'static str = "id";
}

/// Request payload for creating a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategory {
    pub name: String,
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Closed,
    Cancelled,
}

impl OrderStatus {
    /// Wire form, as used in query parameters.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Closed => "closed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// One line of an order: a product and how many of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub product_id: u64,
    pub quantity: u32,
    pub price: f64,
}

/// An order returned by the API. `total` is computed server-side from the
/// order lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<u32>,
    pub items: Vec<OrderLine>,
    pub total: f64,
}

impl Record for Order {
    const KEY_FIELD: &'static str = "id";
}

/// Request payload for opening a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<u32>,
    pub items: Vec<OrderLine>,
}

/// Request payload for updating an order. Only the fields present in the
/// JSON are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOrder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<u32>,
}
