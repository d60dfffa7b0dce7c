use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
}

#[derive(Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub category_id: Option<u64>,
}

#[derive(Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateCategory {
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Closed,
    Cancelled,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: u64,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<u32>,
    pub items: Vec<OrderLine>,
    pub total: f64,
}

#[derive(Deserialize)]
pub struct CreateOrder {
    #[serde(default)]
    pub table: Option<u32>,
    pub items: Vec<OrderLine>,
}

#[derive(Deserialize)]
pub struct UpdateOrder {
    pub status: Option<OrderStatus>,
    pub table: Option<u32>,
}

#[derive(Default)]
pub struct Store {
    products: BTreeMap<u64, Product>,
    categories: BTreeMap<u64, Category>,
    orders: BTreeMap<Uuid, Order>,
    next_product_id: u64,
    next_category_id: u64,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<u64>,
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/{id}", get(get_category).delete(delete_category))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(get_order).put(update_order).delete(delete_order))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_products(
    State(db): State<Db>,
    Query(filter): Query<ProductFilter>,
) -> Json<Vec<Product>> {
    let store = db.read().await;
    let products = store
        .products
        .values()
        .filter(|p| filter.category_id.is_none_or(|id| p.category_id == Some(id)))
        .filter(|p| {
            filter
                .name
                .as_deref()
                .is_none_or(|needle| p.name.to_lowercase().contains(&needle.to_lowercase()))
        })
        .cloned()
        .collect();
    Json(products)
}

async fn create_product(
    State(db): State<Db>,
    Json(input): Json<CreateProduct>,
) -> (StatusCode, Json<Product>) {
    let mut store = db.write().await;
    store.next_product_id += 1;
    let product = Product {
        id: store.next_product_id,
        name: input.name,
        price: input.price,
        category_id: input.category_id,
    };
    store.products.insert(product.id, product.clone());
    (StatusCode::CREATED, Json(product))
}

async fn get_product(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Product>, StatusCode> {
    let store = db.read().await;
    store.products.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_product(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<UpdateProduct>,
) -> Result<Json<Product>, StatusCode> {
    let mut store = db.write().await;
    let product = store.products.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        product.name = name;
    }
    if let Some(price) = input.price {
        product.price = price;
    }
    if let Some(category_id) = input.category_id {
        product.category_id = Some(category_id);
    }
    Ok(Json(product.clone()))
}

async fn delete_product(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    store.products.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

async fn list_categories(State(db): State<Db>) -> Json<Vec<Category>> {
    let store = db.read().await;
    Json(store.categories.values().cloned().collect())
}

async fn create_category(
    State(db): State<Db>,
    Json(input): Json<CreateCategory>,
) -> (StatusCode, Json<Category>) {
    let mut store = db.write().await;
    store.next_category_id += 1;
    let category = Category { id: store.next_category_id, name: input.name };
    store.categories.insert(category.id, category.clone());
    (StatusCode::CREATED, Json(category))
}

async fn get_category(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Category>, StatusCode> {
    let store = db.read().await;
    store.categories.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_category(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    store.categories.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

async fn list_orders(
    State(db): State<Db>,
    Query(filter): Query<OrderFilter>,
) -> Json<Vec<Order>> {
    let store = db.read().await;
    let orders = store
        .orders
        .values()
        .filter(|o| filter.status.is_none_or(|status| o.status == status))
        .cloned()
        .collect();
    Json(orders)
}

async fn create_order(
    State(db): State<Db>,
    Json(input): Json<CreateOrder>,
) -> (StatusCode, Json<Order>) {
    let total = input.items.iter().map(|line| line.price * f64::from(line.quantity)).sum();
    let order = Order {
        id: Uuid::new_v4(),
        status: OrderStatus::Open,
        table: input.table,
        items: input.items,
        total,
    };
    db.write().await.orders.insert(order.id, order.clone());
    (StatusCode::CREATED, Json(order))
}

async fn get_order(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, StatusCode> {
    let store = db.read().await;
    store.orders.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_order(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateOrder>,
) -> Result<Json<Order>, StatusCode> {
    let mut store = db.write().await;
    let order = store.orders.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(status) = input.status {
        order.status = status;
    }
    if let Some(table) = input.table {
        order.table = Some(table);
    }
    Ok(Json(order.clone()))
}

async fn delete_order(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    store.orders.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}
