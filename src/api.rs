//! Blocking REST client for the sales backend.
//!
//! Calls are plain sequential request/response cycles: no retries, no
//! concurrency. Any non-success status becomes [`Error::Status`].

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    BalanceRow, Client, ClientId, NewClient, NewPayment, NewProduct, NewSale, Payment, PaymentId,
    Product, ProductId, Sale, SaleId,
};
use crate::report::SalesFilter;
use log::{debug, warn};
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub struct ApiClient {
    http: HttpClient,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = HttpClient::builder().timeout(config.timeout).build()?;
        Ok(ApiClient {
            http,
            base_url: config.api_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request and turns non-2xx answers into errors.
    fn execute(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        warn!("{} returned {}", url, status);
        Err(Error::Status {
            status: status.as_u16(),
            url: url.to_string(),
            body,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self.execute(self.http.get(&url).query(query), &url)?;
        Ok(response.json()?)
    }

    fn get_bytes(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self.execute(self.http.get(&url).query(query), &url)?;
        Ok(response.bytes()?.to_vec())
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        debug!("POST {}", url);
        let response = self.execute(self.http.post(&url).json(body), &url)?;
        Ok(response.json()?)
    }

    fn put_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        debug!("PUT {}", url);
        let response = self.execute(self.http.put(&url).json(body), &url)?;
        Ok(response.json()?)
    }

    fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        debug!("DELETE {}", url);
        self.execute(self.http.delete(&url), &url)?;
        Ok(())
    }

    // Clients

    pub fn list_clients(&self, name: Option<&str>) -> Result<Vec<Client>> {
        let query: Vec<(&str, String)> = name.map(|n| ("name", n.to_string())).into_iter().collect();
        self.get_json("/clients", &query)
    }

    pub fn create_client(&self, client: &NewClient) -> Result<Client> {
        self.post_json("/clients", client)
    }

    pub fn update_client(&self, id: ClientId, client: &NewClient) -> Result<Client> {
        self.put_json(&format!("/clients/{}", id), client)
    }

    pub fn delete_client(&self, id: ClientId) -> Result<()> {
        self.delete(&format!("/clients/{}", id))
    }

    // Products

    pub fn list_products(&self) -> Result<Vec<Product>> {
        self.get_json("/products", &[])
    }

    pub fn create_product(&self, product: &NewProduct) -> Result<Product> {
        self.post_json("/products", product)
    }

    pub fn update_product(&self, id: ProductId, product: &NewProduct) -> Result<Product> {
        self.put_json(&format!("/products/{}", id), product)
    }

    pub fn delete_product(&self, id: ProductId) -> Result<()> {
        self.delete(&format!("/products/{}", id))
    }

    // Sales

    pub fn list_sales(&self) -> Result<Vec<Sale>> {
        self.get_json("/sales", &[])
    }

    pub fn create_sale(&self, sale: &NewSale) -> Result<Sale> {
        self.post_json("/sales", sale)
    }

    pub fn delete_sale(&self, id: SaleId) -> Result<()> {
        self.delete(&format!("/sales/{}", id))
    }

    // Payments

    pub fn list_payments(&self) -> Result<Vec<Payment>> {
        self.get_json("/payments", &[])
    }

    pub fn create_payment(&self, payment: &NewPayment) -> Result<Payment> {
        self.post_json("/payments", payment)
    }

    pub fn delete_payment(&self, id: PaymentId) -> Result<()> {
        self.delete(&format!("/payments/{}", id))
    }

    // Reports

    /// PDF sales report rendered by the backend.
    pub fn sales_report_pdf(&self, filter: &SalesFilter) -> Result<Vec<u8>> {
        self.get_bytes("/reports/sales", &report_query(filter))
    }

    /// PDF billing summary of one client rendered by the backend.
    pub fn client_report_pdf(&self, id: ClientId) -> Result<Vec<u8>> {
        self.get_bytes(&format!("/reports/client/{}", id), &[])
    }

    /// The backend's own per-sale balance view.
    pub fn balances(&self) -> Result<Vec<BalanceRow>> {
        self.get_json("/reports/balances", &[])
    }
}

fn report_query(filter: &SalesFilter) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(from) = filter.from {
        query.push(("from", from.to_string()));
    }
    if let Some(to) = filter.to {
        query.push(("to", to.to_string()));
    }
    if let Some(kind) = filter.kind {
        query.push(("kind", kind.to_string()));
    }
    if let Some(status) = filter.status {
        query.push(("status", status.to_string()));
    }
    query
}
