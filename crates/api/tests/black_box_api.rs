use pvz_infra::config::AppConfig;
use reqwest::StatusCode;
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod (in-memory stores), bound to an ephemeral port.
        let config = AppConfig::from_lookup(|_| None).expect("default config");
        let app = pvz_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn post_empty(&self, path: &str) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }

    async fn create_pvz(&self, city: &str) -> String {
        let res = self.post("/pvz", json!({ "city": city })).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn error_code(res: reqwest::Response) -> String {
    let body: Value = res.json().await.unwrap();
    body["error"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::spawn().await;
    let res = server
        .client
        .get(format!("{}/health", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_pvz_validates_city() {
    let server = TestServer::spawn().await;

    let res = server.post("/pvz", json!({ "city": "Москва" })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["city"], "Москва");
    assert!(body["registrationDate"].is_string());

    let res = server.post("/pvz", json!({ "city": "Екатеринбург" })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "InvalidCity");
}

#[tokio::test]
async fn reception_and_product_lifecycle() {
    let server = TestServer::spawn().await;
    let pvz_id = server.create_pvz("Казань").await;

    let res = server.post("/receptions", json!({ "pvzId": pvz_id })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let reception: Value = res.json().await.unwrap();
    assert_eq!(reception["status"], "in_progress");
    assert_eq!(reception["pvzId"], pvz_id.as_str());

    let res = server.post("/receptions", json!({ "pvzId": pvz_id })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "ReceptionAlreadyExist");

    for product_type in ["электроника", "одежда"] {
        let res = server
            .post("/products", json!({ "type": product_type, "pvzId": pvz_id }))
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let product: Value = res.json().await.unwrap();
        assert_eq!(product["receptionId"], reception["id"]);
    }

    let res = server
        .post_empty(&format!("/pvz/{pvz_id}/delete_last_product"))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .post_empty(&format!("/pvz/{pvz_id}/close_last_reception"))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let closed: Value = res.json().await.unwrap();
    assert_eq!(closed["status"], "close");

    let res = server
        .post("/products", json!({ "type": "обувь", "pvzId": pvz_id }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "ReceptionAlreadyClosed");

    let res = server
        .client
        .get(format!("{}/pvz", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let list: Value = res.json().await.unwrap();
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["pvz"]["id"], pvz_id.as_str());
    let products = list[0]["receptions"][0]["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["type"], "электроника");
}

#[tokio::test]
async fn missing_references_are_reported() {
    let server = TestServer::spawn().await;

    let res = server
        .post("/receptions", json!({ "pvzId": "0190a5b0-0000-7000-8000-000000000000" }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "PVZNotFound");

    let res = server.post("/receptions", json!({ "pvzId": "nope" })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "InvalidPVZId");

    let pvz_id = server.create_pvz("Санкт-Петербург").await;
    let res = server
        .post_empty(&format!("/pvz/{pvz_id}/close_last_reception"))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "ReceptionDontExist");

    server.post("/receptions", json!({ "pvzId": pvz_id })).await;
    let res = server
        .post_empty(&format!("/pvz/{pvz_id}/delete_last_product"))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "ProductNotFound");

    let res = server
        .post("/products", json!({ "type": "мебель", "pvzId": pvz_id }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "InvalidProductType");
}

#[tokio::test]
async fn list_applies_pagination_to_pickup_points() {
    let server = TestServer::spawn().await;
    let first = server.create_pvz("Москва").await;
    let second = server.create_pvz("Казань").await;

    let res = server
        .client
        .get(format!("{}/pvz?page=2&limit=1", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let list: Value = res.json().await.unwrap();
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["pvz"]["id"], second.as_str());
    assert_ne!(list[0]["pvz"]["id"], first.as_str());

    let res = server
        .client
        .get(format!("{}/pvz?page=0&limit=1", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .client
        .get(format!("{}/pvz?startDate=2999-01-01T00:00:00Z", server.base_url))
        .send()
        .await
        .unwrap();
    let list: Value = res.json().await.unwrap();
    assert!(list.as_array().unwrap().is_empty());
}
