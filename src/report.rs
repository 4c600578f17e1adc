//! Sales and client summaries computed from local snapshots.

use crate::balance::{compute_sale_balances, SaleBalance};
use crate::model::{BalanceRow, Client, ClientId, Payment, Sale, SaleId, SaleKind, SaleStatus};
use crate::money::Money;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Criteria for [`sales_report`]. Unset fields match everything.
///
/// The date range is inclusive and compares calendar dates only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub kind: Option<SaleKind>,
    pub status: Option<SaleStatus>,
}

impl SalesFilter {
    pub fn matches(&self, sale: &Sale) -> bool {
        let date = sale.date.date();
        self.from.map_or(true, |from| date >= from)
            && self.to.map_or(true, |to| date <= to)
            && self.kind.map_or(true, |kind| sale.kind == kind)
            && self.status.map_or(true, |status| sale.status == status)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesReport<'a> {
    pub sales: Vec<&'a Sale>,
    pub total: Money,
    pub cash_total: Money,
    pub credit_total: Money,
}

impl SalesReport<'_> {
    pub fn count(&self) -> usize {
        self.sales.len()
    }
}

pub fn sales_report<'a>(sales: &'a [Sale], filter: &SalesFilter) -> SalesReport<'a> {
    let matching: Vec<&Sale> = sales.iter().filter(|s| filter.matches(s)).collect();

    let total_of = |kind: SaleKind| {
        matching
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.total)
            .sum::<Money>()
    };
    let cash_total = total_of(SaleKind::Cash);
    let credit_total = total_of(SaleKind::Credit);

    SalesReport {
        total: matching.iter().map(|s| s.total).sum(),
        sales: matching,
        cash_total,
        credit_total,
    }
}

/// Billing summary of one client, keyed strictly by client identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSummary {
    pub client: Client,
    pub sales: Vec<SaleBalance>,
    pub total_purchases: Money,
    pub total_paid: Money,
    pub total_outstanding: Money,
}

/// Summarises every sale of `client_id`.
///
/// The client record comes from `clients` or, failing that, from a sale that
/// embeds it. Returns `None` when neither knows the client.
pub fn client_summary(
    client_id: ClientId,
    sales: &[Sale],
    payments: &[Payment],
    clients: &[Client],
) -> Option<ClientSummary> {
    let client = clients
        .iter()
        .find(|c| c.id == client_id)
        .or_else(|| {
            sales
                .iter()
                .filter_map(|s| s.client.as_ref())
                .find(|c| c.id == client_id)
        })?
        .clone();

    let own: Vec<Sale> = sales
        .iter()
        .filter(|s| s.client_id == client_id)
        .cloned()
        .collect();
    let balances = compute_sale_balances(&own, payments);

    Some(ClientSummary {
        client,
        total_purchases: balances.iter().map(|b| b.total).sum(),
        total_paid: balances.iter().map(|b| b.paid).sum(),
        total_outstanding: balances.iter().map(|b| b.outstanding).sum(),
        sales: balances,
    })
}

/// A sale on which the backend's balance view and the local computation
/// disagree. A side that does not know the sale is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceMismatch {
    pub sale_id: SaleId,
    pub local: Option<SaleBalance>,
    pub backend: Option<BalanceRow>,
}

/// Compares locally computed balances with the backend's `/reports/balances`
/// rows on paid and outstanding amounts.
///
/// Mismatches follow local order, then backend-only rows in backend order.
pub fn compare_balances(local: &[SaleBalance], backend: &[BalanceRow]) -> Vec<BalanceMismatch> {
    let by_sale: HashMap<SaleId, &BalanceRow> = backend.iter().map(|r| (r.sale_id, r)).collect();
    let mut mismatches = Vec::new();

    for balance in local {
        let row = by_sale.get(&balance.sale_id).copied();
        let agrees = row.map_or(false, |r| {
            r.paid == balance.paid && r.outstanding == balance.outstanding
        });
        if !agrees {
            mismatches.push(BalanceMismatch {
                sale_id: balance.sale_id,
                local: Some(*balance),
                backend: row.cloned(),
            });
        }
    }

    for row in backend {
        if !local.iter().any(|b| b.sale_id == row.sale_id) {
            mismatches.push(BalanceMismatch {
                sale_id: row.sale_id,
                local: None,
                backend: Some(row.clone()),
            });
        }
    }

    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap()
    }

    fn sample_sales() -> Vec<Sale> {
        let mut paid = Sale::new(3, 2, Money::from_cents(1000), SaleKind::Cash, at(2024, 2, 1));
        paid.status = SaleStatus::Paid;
        vec![
            Sale::new(1, 1, Money::from_cents(5000), SaleKind::Cash, at(2024, 1, 10)),
            Sale::new(2, 1, Money::from_cents(3000), SaleKind::Credit, at(2024, 1, 31)),
            paid,
        ]
    }

    #[test]
    fn test_unfiltered_report_totals_by_kind() {
        let sales = sample_sales();
        let report = sales_report(&sales, &SalesFilter::default());

        assert_eq!(report.count(), 3);
        assert_eq!(report.total.to_string(), "90.00");
        assert_eq!(report.cash_total.to_string(), "60.00");
        assert_eq!(report.credit_total.to_string(), "30.00");
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let sales = sample_sales();
        let filter = SalesFilter {
            from: NaiveDate::from_ymd_opt(2024, 1, 10),
            to: NaiveDate::from_ymd_opt(2024, 1, 31),
            ..SalesFilter::default()
        };

        let report = sales_report(&sales, &filter);
        let ids: Vec<_> = report.sales.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_kind_and_status_filters() {
        let sales = sample_sales();

        let credit = SalesFilter {
            kind: Some(SaleKind::Credit),
            ..SalesFilter::default()
        };
        assert_eq!(sales_report(&sales, &credit).total.to_string(), "30.00");

        let paid = SalesFilter {
            status: Some(SaleStatus::Paid),
            ..SalesFilter::default()
        };
        let report = sales_report(&sales, &paid);
        assert_eq!(report.count(), 1);
        assert_eq!(report.sales[0].id, 3);
    }

    #[test]
    fn test_client_summary_totals() {
        let sales = sample_sales();
        let payments = [Payment::new(1, 1, Money::from_cents(2000), at(2024, 1, 11))];
        let clients = [Client::new(1, "Ana")];

        let summary = client_summary(1, &sales, &payments, &clients).unwrap();
        assert_eq!(summary.client.name, "Ana");
        assert_eq!(summary.sales.len(), 2);
        assert_eq!(summary.total_purchases.to_string(), "80.00");
        assert_eq!(summary.total_paid.to_string(), "20.00");
        assert_eq!(summary.total_outstanding.to_string(), "60.00");
    }

    #[test]
    fn test_client_summary_uses_embedded_client() {
        let sales = vec![Sale::new(1, 4, Money::from_cents(700), SaleKind::Cash, at(2024, 3, 1))
            .with_client(Client::new(4, "Iker"))];

        let summary = client_summary(4, &sales, &[], &[]).unwrap();
        assert_eq!(summary.client.name, "Iker");
        assert_eq!(summary.total_outstanding.to_string(), "7.00");
    }

    #[test]
    fn test_client_summary_unknown_client() {
        assert!(client_summary(42, &sample_sales(), &[], &[]).is_none());
    }

    fn backend_row(sale_id: SaleId, paid: i64, outstanding: i64) -> BalanceRow {
        BalanceRow {
            sale_id,
            client_id: 1,
            client_name: "Ana".to_string(),
            sale_date: at(2024, 1, 10),
            kind: SaleKind::Cash,
            total: Money::from_cents(paid + outstanding),
            paid: Money::from_cents(paid),
            outstanding: Money::from_cents(outstanding),
            payment_status: crate::model::PaymentStatus::from_outstanding(Money::from_cents(
                outstanding,
            )),
        }
    }

    #[test]
    fn test_compare_balances_reports_only_disagreements() {
        let sales = sample_sales();
        let payments = [Payment::new(1, 1, Money::from_cents(2000), at(2024, 1, 11))];
        let local = compute_sale_balances(&sales, &payments);
        let backend = [
            backend_row(1, 2000, 3000),
            backend_row(2, 500, 2500),
            backend_row(9, 0, 100),
        ];

        let mismatches = compare_balances(&local, &backend);
        let ids: Vec<_> = mismatches.iter().map(|m| m.sale_id).collect();
        assert_eq!(ids, vec![2, 3, 9]);

        assert_eq!(mismatches[0].local.map(|b| b.paid), Some(Money::ZERO));
        assert_eq!(
            mismatches[0].backend.as_ref().map(|r| r.paid),
            Some(Money::from_cents(500))
        );
        assert!(mismatches[1].backend.is_none());
        assert!(mismatches[2].local.is_none());
    }

    #[test]
    fn test_compare_balances_all_agree() {
        let sales = sample_sales();
        let local = compute_sale_balances(&sales, &[]);
        let backend = [
            backend_row(1, 0, 5000),
            backend_row(2, 0, 3000),
            backend_row(3, 0, 1000),
        ];
        assert!(compare_balances(&local, &backend).is_empty());
    }
}
