//! CSV renditions of balances, payments and reports.
//!
//! All monetary values are formatted with exactly 2 decimal places.

use crate::balance::{compute_sale_balances, ClientBalances, SaleBalance};
use crate::error::Result;
use crate::model::{timestamp, ClientId, Payment, Sale};
use crate::report::{BalanceMismatch, ClientSummary, SalesReport};
use std::io::Write;

/// Status column value; overpaid sales are flagged instead of shown as paid.
pub fn status_label(balance: &SaleBalance) -> String {
    if balance.is_overpaid() {
        "overpaid".to_string()
    } else {
        balance.status().to_string()
    }
}

fn client_column(sale: &Sale) -> String {
    match &sale.client {
        Some(client) => client.name.clone(),
        None => format!("#{}", sale.client_id),
    }
}

/// One row per sale, in snapshot order.
pub fn write_sale_balances<W: Write>(writer: W, sales: &[Sale], payments: &[Payment]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["sale", "client", "total", "paid", "outstanding", "status"])?;

    for (sale, balance) in sales.iter().zip(compute_sale_balances(sales, payments)) {
        csv_writer.write_record([
            sale.id.to_string(),
            client_column(sale),
            balance.total.to_string(),
            balance.paid.to_string(),
            balance.outstanding.to_string(),
            status_label(&balance),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// One row per display key, in first-appearance order.
pub fn write_client_balances<W: Write>(writer: W, balances: &ClientBalances<String>) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["client", "outstanding"])?;

    for entry in balances.iter() {
        csv_writer.write_record([entry.key.clone(), entry.outstanding.to_string()])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_client_balances_by_id<W: Write>(
    writer: W,
    balances: &ClientBalances<ClientId>,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["client_id", "outstanding"])?;

    for entry in balances.iter() {
        csv_writer.write_record([entry.key.to_string(), entry.outstanding.to_string()])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Per-sale rows of one client followed by a `total` row.
pub fn write_client_summary<W: Write>(writer: W, summary: &ClientSummary) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["sale", "total", "paid", "outstanding", "status"])?;

    for balance in &summary.sales {
        csv_writer.write_record([
            balance.sale_id.to_string(),
            balance.total.to_string(),
            balance.paid.to_string(),
            balance.outstanding.to_string(),
            status_label(balance),
        ])?;
    }

    csv_writer.write_record([
        "total".to_string(),
        summary.total_purchases.to_string(),
        summary.total_paid.to_string(),
        summary.total_outstanding.to_string(),
        String::new(),
    ])?;

    csv_writer.flush()?;
    Ok(())
}

pub fn write_sales_report<W: Write>(writer: W, report: &SalesReport<'_>) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["metric", "value"])?;
    csv_writer.write_record(["sales".to_string(), report.count().to_string()])?;
    csv_writer.write_record(["total".to_string(), report.total.to_string()])?;
    csv_writer.write_record(["cash_total".to_string(), report.cash_total.to_string()])?;
    csv_writer.write_record(["credit_total".to_string(), report.credit_total.to_string()])?;
    csv_writer.flush()?;
    Ok(())
}

/// Payment rows with the client resolved through the sales snapshot.
pub fn write_payments<W: Write>(writer: W, payments: &[&Payment], sales: &[Sale]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["payment", "sale", "client", "amount", "method", "date"])?;

    for payment in payments {
        let client = sales
            .iter()
            .find(|s| s.id == payment.sale_id)
            .and_then(Sale::client_name)
            .unwrap_or("unknown");
        csv_writer.write_record([
            payment.id.to_string(),
            payment.sale_id.to_string(),
            client.to_string(),
            payment.amount.to_string(),
            payment.method.clone().unwrap_or_default(),
            timestamp::format(&payment.date),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Disagreeing sales; a blank column means that side does not know the sale.
pub fn write_balance_mismatches<W: Write>(writer: W, mismatches: &[BalanceMismatch]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "sale",
        "local_paid",
        "backend_paid",
        "local_outstanding",
        "backend_outstanding",
    ])?;

    for mismatch in mismatches {
        let local = mismatch.local.as_ref();
        let backend = mismatch.backend.as_ref();
        csv_writer.write_record([
            mismatch.sale_id.to_string(),
            local.map(|b| b.paid.to_string()).unwrap_or_default(),
            backend.map(|r| r.paid.to_string()).unwrap_or_default(),
            local.map(|b| b.outstanding.to_string()).unwrap_or_default(),
            backend.map(|r| r.outstanding.to_string()).unwrap_or_default(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
