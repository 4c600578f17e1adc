//! # Sales Balance
//!
//! Balance reconciliation for a sales-management client: given snapshots of
//! sales and the payments applied against them, derive what each sale and
//! each client still owes.
//!
//! ## Design Principles
//!
//! - **Fixed-point arithmetic**: amounts use 2 decimal places via `rust_decimal`
//! - **Pure reconciliation**: balances are recomputed from the snapshot on
//!   every call, never cached or persisted
//! - **Overpayment is visible**: outstanding amounts may go negative
//! - **Thin plumbing**: the backend owns persistence; this crate only reads
//!   snapshots, validates forms and submits them
//!
//! ## Example
//!
//! ```
//! use sales_balance::{compute_sale_balance, Money, Payment, Sale, SaleKind};
//! use chrono::NaiveDate;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let sale = Sale::new(1, 1, Money::from_cents(20000), SaleKind::Credit, date);
//! let payments = [Payment::new(1, 1, Money::from_cents(5000), date)];
//!
//! let balance = compute_sale_balance(&sale, &payments);
//! assert_eq!(balance.paid.to_string(), "50.00");
//! assert_eq!(balance.outstanding.to_string(), "150.00");
//! ```

pub mod api;
pub mod balance;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod money;
pub mod output;
pub mod report;
pub mod snapshot;
pub mod validation;

pub use api::ApiClient;
pub use balance::{
    compute_client_balances, compute_client_balances_by_id, compute_sale_balance,
    compute_sale_balances, is_payable, paid_by_sale, ClientBalance, ClientBalances, SaleBalance,
};
pub use config::Config;
pub use error::{Error, FormError, PaymentError, Result};
pub use model::{
    Client, ClientId, LineItem, Payment, PaymentId, PaymentStatus, Product, ProductId, Sale,
    SaleId, SaleKind, SaleStatus,
};
pub use money::Money;
pub use report::{
    client_summary, compare_balances, sales_report, BalanceMismatch, ClientSummary, SalesFilter,
    SalesReport,
};
pub use snapshot::Snapshot;
