//! Balance reconciliation between sales and payments.
//!
//! Every function here is pure: inputs are borrowed snapshots, results are
//! freshly computed and never cached. A payment whose sale reference matches
//! no sale in the snapshot simply contributes to no balance.

use crate::error::PaymentError;
use crate::model::{ClientId, Payment, PaymentStatus, Sale, SaleId};
use crate::money::Money;
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

/// Paid and outstanding amounts of a single sale.
///
/// `outstanding` is negative when the sale was overpaid; it is reported as
/// is and never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaleBalance {
    pub sale_id: SaleId,
    pub total: Money,
    pub paid: Money,
    pub outstanding: Money,
}

impl SaleBalance {
    fn from_paid(sale: &Sale, paid: Money) -> Self {
        SaleBalance {
            sale_id: sale.id,
            total: sale.total,
            paid,
            outstanding: sale.total - paid,
        }
    }

    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::from_outstanding(self.outstanding)
    }

    /// `true` when more was paid than the sale total.
    pub fn is_overpaid(&self) -> bool {
        self.outstanding.is_negative()
    }
}

/// Computes how much of `sale` has been paid and how much remains.
pub fn compute_sale_balance(sale: &Sale, payments: &[Payment]) -> SaleBalance {
    let paid = payments
        .iter()
        .filter(|p| p.sale_id == sale.id)
        .map(|p| p.amount)
        .sum();

    SaleBalance::from_paid(sale, paid)
}

/// Sums payment amounts per referenced sale.
pub fn paid_by_sale(payments: &[Payment]) -> HashMap<SaleId, Money> {
    let mut paid: HashMap<SaleId, Money> = HashMap::new();
    for payment in payments {
        *paid.entry(payment.sale_id).or_default() += payment.amount;
    }
    paid
}

/// One balance per sale, in the order of `sales`.
pub fn compute_sale_balances(sales: &[Sale], payments: &[Payment]) -> Vec<SaleBalance> {
    let paid = paid_by_sale(payments);
    sales
        .iter()
        .map(|sale| {
            let sale_paid = paid.get(&sale.id).copied().unwrap_or_default();
            SaleBalance::from_paid(sale, sale_paid)
        })
        .collect()
}

/// Aggregate outstanding amount under one grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientBalance<K> {
    pub key: K,
    pub outstanding: Money,
}

/// Client balances in order of first appearance in the sales snapshot.
#[derive(Debug, Clone)]
pub struct ClientBalances<K = String> {
    entries: Vec<ClientBalance<K>>,
    index: HashMap<K, usize>,
}

impl<K> Default for ClientBalances<K> {
    fn default() -> Self {
        ClientBalances {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Clone + Eq + std::hash::Hash> ClientBalances<K> {
    fn add(&mut self, key: K, amount: Money) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].outstanding += amount,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(ClientBalance {
                    key,
                    outstanding: amount,
                });
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<Money> {
        self.index.get(key).map(|&pos| self.entries[pos].outstanding)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClientBalance<K>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all aggregated balances.
    pub fn total(&self) -> Money {
        self.entries.iter().map(|e| e.outstanding).sum()
    }
}

impl ClientBalances<String> {
    /// Looks up a balance by display key without allocating.
    pub fn get_key(&self, key: &str) -> Option<Money> {
        self.index.get(key).map(|&pos| self.entries[pos].outstanding)
    }
}

/// Aggregates outstanding balances per client display key (`"name (phone)"`).
///
/// Distinct client records that share a display key are summed together.
/// Sales without an embedded client record are skipped.
pub fn compute_client_balances(sales: &[Sale], payments: &[Payment]) -> ClientBalances<String> {
    let paid = paid_by_sale(payments);
    let mut balances = ClientBalances::default();

    for sale in sales {
        let Some(client) = sale.client.as_ref() else {
            debug!("Sale {}: no client record attached, skipping", sale.id);
            continue;
        };
        let sale_paid = paid.get(&sale.id).copied().unwrap_or_default();
        balances.add(client.display_key(), sale.total - sale_paid);
    }

    balances
}

/// Aggregates outstanding balances per client identifier.
///
/// Unlike [`compute_client_balances`], every sale counts, embedded client
/// record or not, and clients sharing a name and phone stay separate.
pub fn compute_client_balances_by_id(
    sales: &[Sale],
    payments: &[Payment],
) -> ClientBalances<ClientId> {
    let paid = paid_by_sale(payments);
    let mut balances = ClientBalances::default();

    for sale in sales {
        let sale_paid = paid.get(&sale.id).copied().unwrap_or_default();
        balances.add(sale.client_id, sale.total - sale_paid);
    }

    balances
}

/// Checks a proposed payment against the sale's current outstanding balance.
///
/// Amounts above the outstanding balance are accepted; the overpayment shows
/// up later as a negative outstanding amount.
pub fn is_payable(
    sale: &Sale,
    payments: &[Payment],
    proposed_amount: Money,
) -> Result<(), PaymentError> {
    if !proposed_amount.is_positive() {
        return Err(PaymentError::InvalidAmount);
    }

    let balance = compute_sale_balance(sale, payments);
    if !balance.outstanding.is_positive() {
        return Err(PaymentError::NoOutstandingBalance {
            sale_id: sale.id,
            outstanding: balance.outstanding,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Client, SaleKind};
    use chrono::NaiveDate;

    fn day(d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn money(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    fn sale(id: SaleId, client: Client, total_cents: i64) -> Sale {
        Sale::new(id, client.id, money(total_cents), SaleKind::Credit, day(1)).with_client(client)
    }

    fn payment(id: u32, sale_id: SaleId, cents: i64) -> Payment {
        Payment::new(id, sale_id, money(cents), day(2))
    }

    #[test]
    fn test_sale_without_payments() {
        let s = sale(1, Client::new(1, "Ana"), 20000);
        let balance = compute_sale_balance(&s, &[]);

        assert_eq!(balance.paid, Money::ZERO);
        assert_eq!(balance.outstanding, money(20000));
        assert_eq!(balance.status(), PaymentStatus::Pending);
    }

    #[test]
    fn test_partial_payment() {
        let s = sale(1, Client::new(1, "Ana"), 20000);
        let balance = compute_sale_balance(&s, &[payment(1, 1, 5000)]);

        assert_eq!(balance.paid.to_string(), "50.00");
        assert_eq!(balance.outstanding.to_string(), "150.00");
    }

    #[test]
    fn test_only_matching_payments_count() {
        let s = sale(1, Client::new(1, "Ana"), 10000);
        let payments = [payment(1, 1, 2500), payment(2, 2, 9999), payment(3, 1, 2500)];

        let balance = compute_sale_balance(&s, &payments);
        assert_eq!(balance.paid, money(5000));
        assert_eq!(balance.outstanding, money(5000));
    }

    #[test]
    fn test_overpayment_is_not_clamped() {
        let s = sale(1, Client::new(1, "Ana"), 10000);
        let balance = compute_sale_balance(&s, &[payment(1, 1, 12000)]);

        assert_eq!(balance.paid.to_string(), "120.00");
        assert_eq!(balance.outstanding.to_string(), "-20.00");
        assert!(balance.is_overpaid());
        assert_eq!(balance.status(), PaymentStatus::Paid);
    }

    #[test]
    fn test_bulk_balances_match_single() {
        let ana = Client::new(1, "Ana");
        let sales = [sale(1, ana.clone(), 5000), sale(2, ana, 3000)];
        let payments = [payment(1, 1, 2000), payment(2, 99, 100)];

        let bulk = compute_sale_balances(&sales, &payments);
        let single: Vec<_> = sales
            .iter()
            .map(|s| compute_sale_balance(s, &payments))
            .collect();
        assert_eq!(bulk, single);
    }

    #[test]
    fn test_client_aggregate() {
        let ana = Client::new(1, "Ana").with_phone("555");
        let sales = [sale(1, ana.clone(), 5000), sale(2, ana, 3000)];
        let payments = [payment(1, 1, 1500), payment(2, 1, 500)];

        let balances = compute_client_balances(&sales, &payments);
        assert_eq!(balances.len(), 1);
        assert_eq!(balances.get_key("Ana (555)"), Some(money(6000)));
    }

    #[test]
    fn test_shared_display_key_merges_distinct_clients() {
        let first = Client::new(1, "Ana").with_phone("555");
        let second = Client::new(2, "Ana").with_phone("555");
        let sales = [sale(1, first, 1000), sale(2, second, 2000)];

        let by_key = compute_client_balances(&sales, &[]);
        assert_eq!(by_key.len(), 1);
        assert_eq!(by_key.get_key("Ana (555)"), Some(money(3000)));

        let by_id = compute_client_balances_by_id(&sales, &[]);
        assert_eq!(by_id.len(), 2);
        assert_eq!(by_id.get(&1), Some(money(1000)));
        assert_eq!(by_id.get(&2), Some(money(2000)));
    }

    #[test]
    fn test_client_order_is_first_appearance() {
        let sales = [
            sale(1, Client::new(2, "Zoe"), 100),
            sale(2, Client::new(1, "Ana"), 100),
            sale(3, Client::new(2, "Zoe"), 100),
        ];

        let keys: Vec<_> = compute_client_balances(&sales, &[])
            .iter()
            .map(|e| e.key.clone())
            .collect();
        assert_eq!(keys, vec!["Zoe (no phone)", "Ana (no phone)"]);
    }

    #[test]
    fn test_sales_without_client_record_are_skipped() {
        let bare = Sale::new(1, 5, money(1000), SaleKind::Cash, day(1));
        let sales = [bare, sale(2, Client::new(1, "Ana"), 500)];

        let balances = compute_client_balances(&sales, &[]);
        assert_eq!(balances.len(), 1);
        assert_eq!(balances.total(), money(500));

        let by_id = compute_client_balances_by_id(&sales, &[]);
        assert_eq!(by_id.get(&5), Some(money(1000)));
    }

    #[test]
    fn test_is_payable_rules() {
        let s = sale(1, Client::new(1, "Ana"), 4000);

        assert_eq!(is_payable(&s, &[], Money::ZERO), Err(PaymentError::InvalidAmount));
        assert_eq!(is_payable(&s, &[], money(-100)), Err(PaymentError::InvalidAmount));
        assert_eq!(is_payable(&s, &[], money(4000)), Ok(()));
        assert_eq!(is_payable(&s, &[], money(10000)), Ok(()));

        let settled = [payment(1, 1, 4000)];
        assert_eq!(
            is_payable(&s, &settled, money(1000)),
            Err(PaymentError::NoOutstandingBalance {
                sale_id: 1,
                outstanding: Money::ZERO,
            })
        );
    }

    #[test]
    fn test_invalid_amount_checked_before_balance() {
        let s = sale(1, Client::new(1, "Ana"), 4000);
        let settled = [payment(1, 1, 5000)];
        assert_eq!(is_payable(&s, &settled, Money::ZERO), Err(PaymentError::InvalidAmount));
    }
}
