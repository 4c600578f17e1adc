//! Superficial validation of form input before it is sent to the backend.
//!
//! Drafts hold raw text as typed by the user. `validate` parses it, checks
//! required fields and, for payments, checks the sale can still be paid.

use crate::balance::is_payable;
use crate::error::{FormError, PaymentError};
use crate::model::{
    timestamp, LineItem, NewClient, NewPayment, NewProduct, NewSale, Payment, ProductId, Sale,
    SaleId, SaleKind, SaleStatus,
};
use crate::money::Money;
use chrono::NaiveDate;
use std::str::FromStr;

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FormError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_id(field: &'static str, value: &str) -> Result<u32, FormError> {
    let raw = required(field, value)?;
    raw.parse().map_err(|_| FormError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

fn parse_money(field: &'static str, value: &str) -> Result<Money, FormError> {
    let raw = required(field, value)?;
    Money::from_str(raw).map_err(|_| FormError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

/// Payment form contents.
#[derive(Debug, Clone, Default)]
pub struct PaymentDraft {
    pub sale_id: String,
    pub amount: String,
    pub method: String,
    pub notes: String,
    pub date: String,
}

impl PaymentDraft {
    /// Validates the draft against the current snapshot.
    ///
    /// Checks run in form order: sale selected, amount, date, sale known,
    /// outstanding balance.
    pub fn validate(&self, sales: &[Sale], payments: &[Payment]) -> Result<NewPayment, FormError> {
        let sale_id: SaleId = parse_id("sale", &self.sale_id)?;

        let amount = parse_money("amount", &self.amount)?;
        if !amount.is_positive() {
            return Err(PaymentError::InvalidAmount.into());
        }

        let raw_date = required("date", &self.date)?;
        let date = timestamp::parse(raw_date).ok_or_else(|| FormError::InvalidDate {
            field: "date",
            value: raw_date.to_string(),
        })?;

        let sale = sales
            .iter()
            .find(|s| s.id == sale_id)
            .ok_or(FormError::UnknownSale(sale_id))?;
        is_payable(sale, payments, amount)?;

        Ok(NewPayment {
            sale_id,
            amount,
            method: optional(&self.method),
            date,
            notes: optional(&self.notes),
        })
    }
}

/// One product row of the sale form.
#[derive(Debug, Clone, Default)]
pub struct LineDraft {
    pub product_id: String,
    pub quantity: String,
    pub unit_price: String,
    pub delivery_date: String,
}

/// Sale form contents.
#[derive(Debug, Clone)]
pub struct SaleDraft {
    pub client_id: String,
    pub kind: SaleKind,
    pub lines: Vec<LineDraft>,
}

impl SaleDraft {
    /// Computes each subtotal as `quantity * unit_price` and the total as
    /// their sum.
    pub fn validate(&self) -> Result<NewSale, FormError> {
        let client_id = parse_id("client", &self.client_id)?;

        let mut lines = Vec::with_capacity(self.lines.len());
        for (idx, draft) in self.lines.iter().enumerate() {
            let line_no = idx + 1;
            let product_id: ProductId = parse_id("product", &draft.product_id)?;

            let quantity: u32 = required("quantity", &draft.quantity)?
                .parse()
                .map_err(|_| FormError::InvalidQuantity { line: line_no })?;
            if quantity < 1 {
                return Err(FormError::InvalidQuantity { line: line_no });
            }

            let unit_price = parse_money("unit_price", &draft.unit_price)?;
            if unit_price.is_negative() {
                return Err(FormError::NegativePrice { field: "unit_price" });
            }

            let mut line = LineItem::new(product_id, quantity, unit_price);
            if let Some(raw) = optional(&draft.delivery_date) {
                let date = NaiveDate::from_str(&raw).map_err(|_| FormError::InvalidDate {
                    field: "delivery_date",
                    value: raw.clone(),
                })?;
                line.delivery_date = Some(date);
            }
            lines.push(line);
        }

        Ok(NewSale {
            client_id,
            kind: self.kind,
            status: SaleStatus::Pending,
            total: lines.iter().map(|l| l.subtotal).sum(),
            lines,
        })
    }
}

/// Client form contents.
#[derive(Debug, Clone, Default)]
pub struct ClientDraft {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl ClientDraft {
    pub fn validate(&self) -> Result<NewClient, FormError> {
        Ok(NewClient {
            name: required("name", &self.name)?.to_string(),
            phone: optional(&self.phone),
            email: optional(&self.email),
            address: optional(&self.address),
        })
    }
}

/// Product form contents.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub unit_price: String,
    pub active: bool,
}

impl ProductDraft {
    pub fn validate(&self) -> Result<NewProduct, FormError> {
        let name = required("name", &self.name)?.to_string();
        let unit_price = parse_money("unit_price", &self.unit_price)?;
        if unit_price.is_negative() {
            return Err(FormError::NegativePrice { field: "unit_price" });
        }

        Ok(NewProduct {
            name,
            description: optional(&self.description),
            unit_price,
            active: self.active,
        })
    }
}

/// Search box over the payments table.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    /// Case-insensitive substring of the client name.
    pub client_name: Option<String>,
    /// Calendar date of the payment.
    pub date: Option<NaiveDate>,
}

/// Payments matching `filter`, in input order.
///
/// The client of a payment is resolved through its sale. Payments whose sale
/// is missing from the snapshot, or carries no client record, never match,
/// even with an empty name filter.
pub fn filter_payments<'a>(
    payments: &'a [Payment],
    sales: &[Sale],
    filter: &PaymentFilter,
) -> Vec<&'a Payment> {
    let needle = filter
        .client_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_lowercase);

    payments
        .iter()
        .filter(|p| {
            let Some(name) = sales
                .iter()
                .find(|s| s.id == p.sale_id)
                .and_then(Sale::client_name)
            else {
                return false;
            };
            let name_ok = needle
                .as_deref()
                .map_or(true, |needle| name.to_lowercase().contains(needle));
            let date_ok = filter.date.map_or(true, |d| p.date.date() == d);
            name_ok && date_ok
        })
        .collect()
}
