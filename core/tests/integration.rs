//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the full client
//! (resource accessors, lazy collections, response cache) over real HTTP
//! using ureq. A call-counting transport wrapper makes cache hits and misses
//! observable from outside the client.

use std::cell::Cell;
use std::rc::Rc;

use pos_core::{
    ApiError, ClientConfig, CreateCategory, CreateOrder, CreateProduct, HttpMethod, HttpRequest,
    HttpResponse, OrderLine, OrderStatus, PosClient, Transport, UpdateOrder, UpdateProduct,
};
use serde_json::json;

/// Executes requests with ureq. Disables ureq's automatic status-code-as-
/// error behavior so 4xx/5xx responses come back as data, letting the client
/// handle status interpretation.
struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, req: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut response = match (req.method, &req.body) {
            (HttpMethod::Get, _) => self.agent.get(&req.path).call(),
            (HttpMethod::Delete, _) => self.agent.delete(&req.path).call(),
            (HttpMethod::Post, Some(body)) => self
                .agent
                .post(&req.path)
                .content_type("application/json")
                .send(body.as_bytes()),
            (HttpMethod::Post, None) => self.agent.post(&req.path).send_empty(),
            (HttpMethod::Put, Some(body)) => self
                .agent
                .put(&req.path)
                .content_type("application/json")
                .send(body.as_bytes()),
            (HttpMethod::Put, None) => self.agent.put(&req.path).send_empty(),
        }
        .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string().unwrap_or_default();

        Ok(HttpResponse { status, headers: Vec::new(), body })
    }
}

/// Counts round-trips that actually reach the wire.
struct Counting<T> {
    inner: T,
    calls: Rc<Cell<usize>>,
}

impl<T: Transport> Transport for Counting<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.execute(request)
    }
}

/// Start the mock server on a random port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn crud_lifecycle_with_lazy_collections() {
    let base_url = start_server();
    let mut client = PosClient::new(ClientConfig::new(&base_url), UreqTransport::new());

    // Step 1: the menu starts empty.
    let mut products = client.products().list().unwrap();
    assert!(products.is_empty(), "expected empty menu");

    // Step 2: build a small menu.
    let drinks = client.categories().create(&CreateCategory { name: "Drinks".to_string() }).unwrap();
    let espresso = client
        .products()
        .create(&CreateProduct {
            name: "Espresso".to_string(),
            price: 2.5,
            category_id: Some(drinks.id),
        })
        .unwrap();
    let cortado = client
        .products()
        .create(&CreateProduct {
            name: "Cortado".to_string(),
            price: 3.0,
            category_id: Some(drinks.id),
        })
        .unwrap();
    client
        .products()
        .create(&CreateProduct { name: "Croissant".to_string(), price: 2.0, category_id: None })
        .unwrap();

    let mut categories = client.categories().list().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories.first().unwrap().unwrap().name, "Drinks");
    assert_eq!(client.categories().get(drinks.id).unwrap().name, "Drinks");

    // Step 3: the empty listing from step 1 is still cached; drop it.
    client.clear_cache();

    // Step 4: list lazily and poke at the collection.
    let mut menu = client.products().list().unwrap();
    assert_eq!(menu.len(), 3);
    assert_eq!(menu.first().unwrap().unwrap().name, "Espresso");
    assert_eq!(menu.find_by_key(&json!(cortado.id)).unwrap().unwrap().name, "Cortado");
    assert_eq!(menu.sum("price"), 7.5);

    let names: Vec<String> = menu.iter().map(|r| r.unwrap().name).collect();
    assert_eq!(names, ["Espresso", "Cortado", "Croissant"]);

    let projected = menu.to_array().unwrap();
    assert_eq!(projected.len(), 3);
    assert_eq!(projected[0]["name"], "Espresso");

    // Step 5: filtered listings.
    let mut by_category = client.products().list_by_category(drinks.id).unwrap();
    assert_eq!(by_category.len(), 2);
    let mut found = client.products().search("espresso").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found.first().unwrap().unwrap().id, espresso.id);

    // Step 6: update a product; the fresh single-resource read reflects it.
    let update = UpdateProduct { price: Some(2.8), ..Default::default() };
    let updated = client.products().update(espresso.id, &update).unwrap();
    assert_eq!(updated.price, 2.8);
    assert_eq!(updated.name, "Espresso");
    let fetched = client.products().get(espresso.id).unwrap();
    assert_eq!(fetched, updated);

    // Step 7: run an order through its lifecycle.
    let order = client
        .orders()
        .create(&CreateOrder {
            table: Some(4),
            items: vec![
                OrderLine { product_id: espresso.id, quantity: 2, price: 2.8 },
                OrderLine { product_id: cortado.id, quantity: 1, price: 3.0 },
            ],
        })
        .unwrap();
    assert_eq!(order.status, OrderStatus::Open);
    assert_eq!(order.total, 8.6);

    let closed = client
        .orders()
        .update(order.id, &UpdateOrder { status: Some(OrderStatus::Closed), table: None })
        .unwrap();
    assert_eq!(closed.status, OrderStatus::Closed);

    let mut closed_orders = client.orders().list_by_status(OrderStatus::Closed).unwrap();
    assert_eq!(closed_orders.len(), 1);
    assert_eq!(closed_orders.first().unwrap().unwrap().id, order.id);

    client.orders().delete(order.id).unwrap();
    let err = client.orders().get(order.id).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Step 8: delete a product and confirm the menu shrank.
    client.products().delete(espresso.id).unwrap();
    client.clear_cache();
    let mut menu = client.products().list().unwrap();
    assert_eq!(menu.len(), 2);
    assert!(menu.find_by_key(&json!(espresso.id)).unwrap().is_none());
}

#[test]
fn response_cache_over_live_http() {
    let base_url = start_server();
    let calls = Rc::new(Cell::new(0));
    let transport = Counting { inner: UreqTransport::new(), calls: Rc::clone(&calls) };
    let mut client = PosClient::new(ClientConfig::new(&base_url), transport);

    client
        .products()
        .create(&CreateProduct { name: "Espresso".to_string(), price: 2.5, category_id: None })
        .unwrap();
    assert_eq!(calls.get(), 1);

    // First list goes to the wire; the repeat is served from the cache.
    assert_eq!(client.products().list().unwrap().len(), 1);
    assert_eq!(calls.get(), 2);
    assert_eq!(client.products().list().unwrap().len(), 1);
    assert_eq!(calls.get(), 2);

    // A write reaches the wire but leaves the cached listing untouched.
    client
        .products()
        .create(&CreateProduct { name: "Cortado".to_string(), price: 3.0, category_id: None })
        .unwrap();
    assert_eq!(calls.get(), 3);
    assert_eq!(client.products().list().unwrap().len(), 1);
    assert_eq!(calls.get(), 3);

    // Clearing the cache restores the transport path and the fresh state.
    client.clear_cache();
    assert_eq!(client.products().list().unwrap().len(), 2);
    assert_eq!(calls.get(), 4);
}
