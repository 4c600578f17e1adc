//! Entities exchanged with the sales backend.
//!
//! Field names on the wire are English snake_case. The Spanish names used by
//! the backend are accepted as aliases when decoding.

use crate::money::Money;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type ClientId = u32;
pub type ProductId = u32;
pub type SaleId = u32;
pub type PaymentId = u32;

/// Placeholder used in display keys when a client has no phone on record.
pub const NO_PHONE: &str = "no phone";

/// A customer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    #[serde(alias = "id_cliente")]
    pub id: ClientId,

    #[serde(alias = "nombre")]
    pub name: String,

    #[serde(default, alias = "telefono", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, alias = "direccion", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(
        default,
        alias = "fecha_registro",
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub registered_at: Option<NaiveDateTime>,
}

impl Client {
    pub fn new(id: ClientId, name: impl Into<String>) -> Self {
        Client {
            id,
            name: name.into(),
            phone: None,
            email: None,
            address: None,
            registered_at: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Key used to group balances on the dashboard: `"name (phone)"`.
    ///
    /// Two distinct client records with the same name and phone produce the
    /// same key. The phone is used as recorded, so `"555"` and `" 555 "` are
    /// different keys; only an empty phone falls back to [`NO_PHONE`].
    pub fn display_key(&self) -> String {
        let phone = self
            .phone
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(NO_PHONE);
        format!("{} ({})", self.name, phone)
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(alias = "id_producto")]
    pub id: ProductId,

    #[serde(alias = "nombre")]
    pub name: String,

    #[serde(default, alias = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(alias = "precio_unitario")]
    pub unit_price: Money,

    #[serde(default = "default_active", alias = "activo")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// How the sale is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleKind {
    #[serde(rename = "cash", alias = "contado")]
    Cash,
    #[serde(rename = "credit", alias = "credito")]
    Credit,
}

impl fmt::Display for SaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleKind::Cash => f.write_str("cash"),
            SaleKind::Credit => f.write_str("credit"),
        }
    }
}

impl FromStr for SaleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" | "contado" => Ok(SaleKind::Cash),
            "credit" | "credito" => Ok(SaleKind::Credit),
            other => Err(format!("unknown sale kind '{}'", other)),
        }
    }
}

/// Administrative state of a sale as recorded by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SaleStatus {
    #[default]
    #[serde(rename = "pending", alias = "pendiente")]
    Pending,
    #[serde(rename = "paid", alias = "pagada")]
    Paid,
    #[serde(rename = "cancelled", alias = "cancelada")]
    Cancelled,
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleStatus::Pending => f.write_str("pending"),
            SaleStatus::Paid => f.write_str("paid"),
            SaleStatus::Cancelled => f.write_str("cancelled"),
        }
    }
}

impl FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "pendiente" => Ok(SaleStatus::Pending),
            "paid" | "pagada" => Ok(SaleStatus::Paid),
            "cancelled" | "cancelada" => Ok(SaleStatus::Cancelled),
            other => Err(format!("unknown sale status '{}'", other)),
        }
    }
}

/// Settlement state derived from a balance: paid once nothing is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "paid", alias = "Pagado")]
    Paid,
    #[serde(rename = "pending", alias = "Pendiente")]
    Pending,
}

impl PaymentStatus {
    pub fn from_outstanding(outstanding: Money) -> Self {
        if outstanding.is_positive() {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Paid
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Paid => f.write_str("paid"),
            PaymentStatus::Pending => f.write_str("pending"),
        }
    }
}

/// One product line of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(alias = "id_producto")]
    pub product_id: ProductId,

    #[serde(alias = "cantidad")]
    pub quantity: u32,

    #[serde(alias = "precio_unitario")]
    pub unit_price: Money,

    pub subtotal: Money,

    #[serde(default, alias = "fecha_entrega", skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<NaiveDate>,
}

impl LineItem {
    /// Builds a line with `subtotal = quantity * unit_price`.
    pub fn new(product_id: ProductId, quantity: u32, unit_price: Money) -> Self {
        LineItem {
            product_id,
            quantity,
            unit_price,
            subtotal: unit_price.times(quantity),
            delivery_date: None,
        }
    }
}

/// A sale as returned by the backend.
///
/// `total` is taken as supplied; it is never re-derived from `lines`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    #[serde(alias = "id_venta")]
    pub id: SaleId,

    #[serde(alias = "id_cliente")]
    pub client_id: ClientId,

    #[serde(default, alias = "cliente", skip_serializing_if = "Option::is_none")]
    pub client: Option<Client>,

    pub total: Money,

    #[serde(alias = "tipo_venta")]
    pub kind: SaleKind,

    #[serde(default, alias = "estado")]
    pub status: SaleStatus,

    #[serde(alias = "fecha_venta", with = "timestamp")]
    pub date: NaiveDateTime,

    #[serde(default, alias = "detalles")]
    pub lines: Vec<LineItem>,
}

impl Sale {
    pub fn new(
        id: SaleId,
        client_id: ClientId,
        total: Money,
        kind: SaleKind,
        date: NaiveDateTime,
    ) -> Self {
        Sale {
            id,
            client_id,
            client: None,
            total,
            kind,
            status: SaleStatus::Pending,
            date,
            lines: Vec::new(),
        }
    }

    /// Embeds the client record, aligning `client_id` with it.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client_id = client.id;
        self.client = Some(client);
        self
    }

    pub fn client_name(&self) -> Option<&str> {
        self.client.as_ref().map(|c| c.name.as_str())
    }
}

/// An amount applied against one sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(alias = "id_pago")]
    pub id: PaymentId,

    #[serde(alias = "id_venta")]
    pub sale_id: SaleId,

    #[serde(alias = "monto")]
    pub amount: Money,

    #[serde(default, alias = "metodo_pago", skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(alias = "fecha_pago", with = "timestamp")]
    pub date: NaiveDateTime,

    #[serde(default, alias = "observaciones", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Payment {
    pub fn new(id: PaymentId, sale_id: SaleId, amount: Money, date: NaiveDateTime) -> Self {
        Payment {
            id,
            sale_id,
            amount,
            method: None,
            date,
            notes: None,
        }
    }
}

/// Body of `POST /payments`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPayment {
    pub sale_id: SaleId,
    pub amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(with = "timestamp")]
    pub date: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of `POST /sales`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSale {
    pub client_id: ClientId,
    pub kind: SaleKind,
    pub status: SaleStatus,
    pub total: Money,
    pub lines: Vec<LineItem>,
}

/// Body of `POST /clients` and `PUT /clients/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewClient {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Body of `POST /products` and `PUT /products/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub unit_price: Money,
    pub active: bool,
}

/// Row of the backend's `GET /reports/balances` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceRow {
    #[serde(alias = "id_venta")]
    pub sale_id: SaleId,
    #[serde(alias = "id_cliente")]
    pub client_id: ClientId,
    #[serde(alias = "nombre_cliente")]
    pub client_name: String,
    #[serde(alias = "fecha_venta", with = "timestamp")]
    pub sale_date: NaiveDateTime,
    #[serde(alias = "tipo_venta")]
    pub kind: SaleKind,
    #[serde(alias = "total_venta")]
    pub total: Money,
    #[serde(alias = "total_pagado")]
    pub paid: Money,
    #[serde(alias = "saldo_pendiente")]
    pub outstanding: Money,
    #[serde(alias = "estado_pago")]
    pub payment_status: PaymentStatus,
}

/// Lenient timestamp (de)serialization.
///
/// Accepts RFC 3339 (offset converted to UTC), naive ISO date-time, or a bare
/// date at midnight. Always writes `%Y-%m-%dT%H:%M:%S`.
pub mod timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_utc());
        }
        if let Ok(dt) = s.parse::<NaiveDateTime>() {
            return Some(dt);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Some(dt);
        }
        s.parse::<NaiveDate>()
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    pub fn format(dt: &NaiveDateTime) -> String {
        dt.format(FORMAT).to_string()
    }

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<NaiveDateTime>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => super::serialize(dt, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw))),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_key_with_and_without_phone() {
        let ana = Client::new(1, "Ana").with_phone("555-0101");
        assert_eq!(ana.display_key(), "Ana (555-0101)");

        let luis = Client::new(2, "Luis");
        assert_eq!(luis.display_key(), "Luis (no phone)");

        let empty = Client::new(3, "Eva").with_phone("");
        assert_eq!(empty.display_key(), "Eva (no phone)");

        let blank = Client::new(4, "Eva").with_phone("   ");
        assert_eq!(blank.display_key(), "Eva (   )");
    }

    #[test]
    fn test_decode_sale_with_backend_field_names() {
        let json = r#"{
            "id_venta": 7,
            "id_cliente": 3,
            "total": 150.0,
            "tipo_venta": "credito",
            "estado": "pendiente",
            "fecha_venta": "2024-03-05T10:15:00",
            "cliente": {"id_cliente": 3, "nombre": "Marta", "telefono": "555-1234",
                        "fecha_registro": "2024-01-01T09:00:00"},
            "detalles": [
                {"id_producto": 1, "cantidad": 3, "precio_unitario": 50, "subtotal": 150,
                 "fecha_entrega": "2024-03-10"}
            ]
        }"#;

        let sale: Sale = serde_json::from_str(json).unwrap();
        assert_eq!(sale.id, 7);
        assert_eq!(sale.kind, SaleKind::Credit);
        assert_eq!(sale.status, SaleStatus::Pending);
        assert_eq!(sale.total.to_string(), "150.00");
        assert_eq!(sale.client_name(), Some("Marta"));
        assert_eq!(sale.lines.len(), 1);
        assert_eq!(sale.lines[0].quantity, 3);
    }

    #[test]
    fn test_decode_payment_with_english_names_and_offset() {
        let json = r#"{"id": 4, "sale_id": 7, "amount": "20.5",
                       "method": "transfer", "date": "2024-03-06T12:00:00Z"}"#;

        let payment: Payment = serde_json::from_str(json).unwrap();
        assert_eq!(payment.sale_id, 7);
        assert_eq!(payment.amount.to_string(), "20.50");
        assert_eq!(payment.method.as_deref(), Some("transfer"));
        assert_eq!(timestamp::format(&payment.date), "2024-03-06T12:00:00");
        assert!(payment.notes.is_none());
    }

    #[test]
    fn test_timestamp_accepts_bare_date() {
        let dt = timestamp::parse("2024-02-29").unwrap();
        assert_eq!(timestamp::format(&dt), "2024-02-29T00:00:00");
        assert!(timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn test_sale_kind_and_status_from_str() {
        assert_eq!("Contado".parse::<SaleKind>(), Ok(SaleKind::Cash));
        assert_eq!("credit".parse::<SaleKind>(), Ok(SaleKind::Credit));
        assert!("barter".parse::<SaleKind>().is_err());
        assert_eq!("cancelada".parse::<SaleStatus>(), Ok(SaleStatus::Cancelled));
    }

    #[test]
    fn test_payment_status_from_outstanding() {
        assert_eq!(
            PaymentStatus::from_outstanding(Money::from_cents(1)),
            PaymentStatus::Pending
        );
        assert_eq!(
            PaymentStatus::from_outstanding(Money::ZERO),
            PaymentStatus::Paid
        );
        assert_eq!(
            PaymentStatus::from_outstanding(Money::from_cents(-2000)),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_line_item_subtotal() {
        let line = LineItem::new(9, 4, Money::from_cents(1250));
        assert_eq!(line.subtotal.to_string(), "50.00");
    }

    #[test]
    fn test_product_defaults_to_active() {
        let product: Product =
            serde_json::from_str(r#"{"id": 1, "name": "Queso", "unit_price": 12}"#).unwrap();
        assert!(product.active);
    }
}
