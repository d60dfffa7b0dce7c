//! Thin per-resource accessors.
//!
//! # Design
//! Each resource object is constructed on demand by a `PosClient` accessor
//! and borrows the client for its lifetime. The objects carry no state of
//! their own: they translate typed calls into paths, parameters and
//! payloads, and hand the round-trip to the client's cached-read / uncached-
//! write plumbing. List responses come back as [`LazyCollection`]s; nothing
//! is materialized until the caller looks.

use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::cache::Clock;
use crate::client::PosClient;
use crate::collection::LazyCollection;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpResponse, Transport};
use crate::types::{
    Category, CreateCategory, CreateOrder, CreateProduct, Order, OrderStatus, Product,
    UpdateOrder, UpdateProduct,
};
use crate::validate::sanitize_key;

fn parse_body<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Menu products.
pub struct Products<'a, T: Transport, C: Clock> {
    client: &'a mut PosClient<T, C>,
}

impl<'a, T: Transport, C: Clock> Products<'a, T, C> {
    pub(crate) fn new(client: &'a mut PosClient<T, C>) -> Self {
        Self { client }
    }

    pub fn list(&mut self) -> Result<LazyCollection<Product>, ApiError> {
        let payload = self.client.get_json("/products", &[])?;
        LazyCollection::from_value(&payload)
    }

    pub fn list_by_category(&mut self, category_id: u64) -> Result<LazyCollection<Product>, ApiError> {
        let params = vec![("category_id".to_string(), category_id.to_string())];
        let payload = self.client.get_json("/products", &params)?;
        LazyCollection::from_value(&payload)
    }

    /// Name search. The needle is sanitized before it enters the query.
    pub fn search(&mut self, name: &str) -> Result<LazyCollection<Product>, ApiError> {
        let needle = sanitize_key(name)?;
        let params = vec![("name".to_string(), needle)];
        let payload = self.client.get_json("/products", &params)?;
        LazyCollection::from_value(&payload)
    }

    pub fn get(&mut self, id: u64) -> Result<Product, ApiError> {
        let payload = self.client.get_json(&format!("/products/{id}"), &[])?;
        serde_json::from_value(payload).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn create(&mut self, input: &CreateProduct) -> Result<Product, ApiError> {
        let response = self.client.send(HttpMethod::Post, "/products", Some(input), 201)?;
        parse_body(&response)
    }

    pub fn update(&mut self, id: u64, input: &UpdateProduct) -> Result<Product, ApiError> {
        let response =
            self.client.send(HttpMethod::Put, &format!("/products/{id}"), Some(input), 200)?;
        parse_body(&response)
    }

    pub fn delete(&mut self, id: u64) -> Result<(), ApiError> {
        self.client.send::<()>(HttpMethod::Delete, &format!("/products/{id}"), None, 204)?;
        Ok(())
    }
}

/// Menu categories.
pub struct Categories<'a, T: Transport, C: Clock> {
    client: &'a mut PosClient<T, C>,
}

impl<'a, T: Transport, C: Clock> Categories<'a, T, C> {
    pub(crate) fn new(client: &'a mut PosClient<T, C>) -> Self {
        Self { client }
    }

    pub fn list(&mut self) -> Result<LazyCollection<Category>, ApiError> {
        let payload = self.client.get_json("/categories", &[])?;
        LazyCollection::from_value(&payload)
    }

    pub fn get(&mut self, id: u64) -> Result<Category, ApiError> {
        let payload = self.client.get_json(&format!("/categories/{id}"), &[])?;
        serde_json::from_value(payload).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn create(&mut self, input: &CreateCategory) -> Result<Category, ApiError> {
        let response = self.client.send(HttpMethod::Post, "/categories", Some(input), 201)?;
        parse_body(&response)
    }

    pub fn delete(&mut self, id: u64) -> Result<(), ApiError> {
        self.client.send::<()>(HttpMethod::Delete, &format!("/categories/{id}"), None, 204)?;
        Ok(())
    }
}

/// Orders.
pub struct Orders<'a, T: Transport, C: Clock> {
    client: &'a mut PosClient<T, C>,
}

impl<'a, T: Transport, C: Clock> Orders<'a, T, C> {
    pub(crate) fn new(client: &'a mut PosClient<T, C>) -> Self {
        Self { client }
    }

    pub fn list(&mut self) -> Result<LazyCollection<Order>, ApiError> {
        let payload = self.client.get_json("/orders", &[])?;
        LazyCollection::from_value(&payload)
    }

    pub fn list_by_status(&mut self, status: OrderStatus) -> Result<LazyCollection<Order>, ApiError> {
        let params = vec![("status".to_string(), status.as_str().to_string())];
        let payload = self.client.get_json("/orders", &params)?;
        LazyCollection::from_value(&payload)
    }

    pub fn get(&mut self, id: Uuid) -> Result<Order, ApiError> {
        let payload = self.client.get_json(&format!("/orders/{id}"), &[])?;
        serde_json::from_value(payload).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn create(&mut self, input: &CreateOrder) -> Result<Order, ApiError> {
        let response = self.client.send(HttpMethod::Post, "/orders", Some(input), 201)?;
        parse_body(&response)
    }

    pub fn update(&mut self, id: Uuid, input: &UpdateOrder) -> Result<Order, ApiError> {
        let response =
            self.client.send(HttpMethod::Put, &format!("/orders/{id}"), Some(input), 200)?;
        parse_body(&response)
    }

    pub fn delete(&mut self, id: Uuid) -> Result<(), ApiError> {
        self.client.send::<()>(HttpMethod::Delete, &format!("/orders/{id}"), None, 204)?;
        Ok(())
    }
}
