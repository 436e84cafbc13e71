//! Content backend over its HTTP query (GROQ) and mutation API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ContentConfig;
use crate::domain::aggregates::{Category, Order, Product};
use crate::error::{Result, StorefrontError};
use crate::ports::{ContentStore, ProductPage, ProductQuery};

const PRODUCT_PROJECTION: &str = r#"{
  _id, name, "slug": slug.current, "description": pt::text(description), price, discount,
  "stock": coalesce(stock, 0), status, variant,
  "images": coalesce(images[].asset->url, []), "categories": coalesce(categories[]->title, [])
}"#;

const CATEGORY_PROJECTION: &str = r#"{
  _id, title, "slug": slug.current, description,
  "productCount": count(*[_type == "product" && references(^._id)])
}"#;

#[derive(Deserialize)]
struct QueryResponse<T> {
    result: T,
}

#[derive(Deserialize)]
struct ProductListResult {
    items: Vec<Product>,
    total: u64,
}

#[derive(Clone)]
pub struct HttpContentStore {
    client: reqwest::Client,
    data_url: String,
    dataset: String,
    token: Option<String>,
}

impl HttpContentStore {
    pub fn new(client: reqwest::Client, config: &ContentConfig) -> Self {
        Self {
            client,
            data_url: format!("{}/v{}/data", config.api_url, config.api_version),
            dataset: config.dataset.clone(),
            token: config.token.clone(),
        }
    }

    fn order_id(order_number: &str) -> String { format!("order-{}", order_number) }

    async fn query<T: DeserializeOwned>(&self, groq: &str, params: &[(&str, Value)]) -> Result<T> {
        let mut query = vec![("query".to_string(), groq.to_string())];
        query.extend(params.iter().map(|(k, v)| (format!("${}", k), v.to_string())));

        let mut req = self.client.get(format!("{}/query/{}", self.data_url, self.dataset)).query(&query);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(StorefrontError::Upstream(format!("content query failed ({}): {}", status, body)));
        }
        Ok(resp.json::<QueryResponse<T>>().await?.result)
    }

    async fn mutate(&self, mutations: Vec<Value>) -> Result<()> {
        let token = self.token.as_ref()
            .ok_or_else(|| StorefrontError::Upstream("content API token is not configured".into()))?;
        let resp = self.client
            .post(format!("{}/mutate/{}", self.data_url, self.dataset))
            .query(&[("returnIds", "false")])
            .bearer_auth(token)
            .json(&json!({ "mutations": mutations }))
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(StorefrontError::Upstream(format!("content mutation failed ({}): {}", status, body)));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn list_products(&self, q: &ProductQuery) -> Result<ProductPage> {
        let mut filters = vec![r#"_type == "product""#.to_string()];
        let mut params: Vec<(&str, Value)> = vec![];
        if let Some(category) = &q.category {
            filters.push(r#"references(*[_type == "category" && slug.current == $category]._id)"#.into());
            params.push(("category", json!(category)));
        }
        if let Some(search) = &q.search {
            filters.push("(name match $search || pt::text(description) match $search)".into());
            params.push(("search", json!(format!("{}*", search.trim()))));
        }
        if let Some(status) = q.status {
            filters.push("status == $status".into());
            params.push(("status", json!(status.as_str())));
        }
        let filter = filters.join(" && ");
        let groq = format!(
            r#"{{"items": *[{f}] | order(name asc) [{start}...{end}] {proj}, "total": count(*[{f}])}}"#,
            f = filter, start = q.offset, end = u64::from(q.offset) + u64::from(q.limit), proj = PRODUCT_PROJECTION,
        );
        let res: ProductListResult = self.query(&groq, &params).await?;
        Ok(ProductPage { products: res.items, total: res.total })
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let groq = format!(r#"*[_type == "product" && slug.current == $slug][0] {}"#, PRODUCT_PROJECTION);
        self.query(&groq, &[("slug", json!(slug))]).await
    }

    async fn products_by_ids(&self, ids: &[String]) -> Result<Vec<Product>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let groq = format!(r#"*[_type == "product" && _id in $ids] {}"#, PRODUCT_PROJECTION);
        self.query(&groq, &[("ids", json!(ids))]).await
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let groq = format!(r#"*[_type == "category"] | order(title asc) {}"#, CATEGORY_PROJECTION);
        self.query(&groq, &[]).await
    }

    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        self.query(r#"*[_type == "order" && clerkUserId == $userId] | order(orderDate desc)"#, &[("userId", json!(user_id))]).await
    }

    async fn order_by_session(&self, session_id: &str) -> Result<Option<Order>> {
        self.query(r#"*[_type == "order" && stripeCheckoutSessionId == $sessionId][0]"#, &[("sessionId", json!(session_id))]).await
    }

    async fn order_by_number(&self, order_number: &str) -> Result<Option<Order>> {
        self.query(r#"*[_type == "order" && orderNumber == $orderNumber][0]"#, &[("orderNumber", json!(order_number))]).await
    }

    async fn create_order(&self, order: &Order) -> Result<()> {
        let mut doc = serde_json::to_value(order)?;
        if let Value::Object(map) = &mut doc {
            map.insert("_id".into(), json!(Self::order_id(order.order_number().as_str())));
            map.insert("_type".into(), json!("order"));
        }
        // Deterministic id: a replayed webhook cannot create a second document.
        self.mutate(vec![json!({ "createIfNotExists": doc })]).await
    }

    async fn mark_order_paid(&self, order_number: &str) -> Result<()> {
        self.mutate(vec![json!({
            "patch": { "id": Self::order_id(order_number), "set": { "status": "paid" } }
        })]).await
    }

    async fn update_installments_paid(&self, order_number: &str, paid: u32) -> Result<()> {
        let id = Self::order_id(order_number);
        let exists: bool = self.query("defined(*[_id == $id][0]._id)", &[("id", json!(id))]).await?;
        if !exists {
            return Err(StorefrontError::NotFound(format!("Order {}", order_number)));
        }
        self.mutate(vec![json!({
            "patch": { "id": id, "set": { "paymentPlan.paid": paid, "status": "paid" } }
        })]).await
    }

    async fn decrement_stock(&self, product_id: &str, quantity: u32) -> Result<()> {
        self.mutate(vec![json!({
            "patch": { "id": product_id, "setIfMissing": { "stock": 0 }, "dec": { "stock": quantity } }
        })]).await
    }
}
