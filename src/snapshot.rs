//! Fully materialized collections handed to the balance functions.

use crate::api::ApiClient;
use crate::error::Result;
use crate::model::{Client, Payment, Sale};
use log::info;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub sales: Vec<Sale>,
    pub payments: Vec<Payment>,
    /// Optional; balances only need the clients embedded in sales.
    pub clients: Vec<Client>,
}

impl Snapshot {
    /// Fetches sales and payments (and clients when asked) one call after another.
    pub fn fetch(api: &ApiClient, with_clients: bool) -> Result<Self> {
        let sales = api.list_sales()?;
        let payments = api.list_payments()?;
        let clients = if with_clients {
            api.list_clients(None)?
        } else {
            Vec::new()
        };

        info!(
            "Fetched {} sales, {} payments, {} clients from {}",
            sales.len(),
            payments.len(),
            clients.len(),
            api.base_url()
        );
        Ok(Snapshot {
            sales,
            payments,
            clients,
        })
    }

    /// Loads JSON arrays previously saved from the backend.
    pub fn from_files(
        sales: &Path,
        payments: Option<&Path>,
        clients: Option<&Path>,
    ) -> Result<Self> {
        let snapshot = Snapshot {
            sales: read_json(sales)?,
            payments: payments.map(read_json).transpose()?.unwrap_or_default(),
            clients: clients.map(read_json).transpose()?.unwrap_or_default(),
        };

        info!(
            "Loaded {} sales, {} payments, {} clients from files",
            snapshot.sales.len(),
            snapshot.payments.len(),
            snapshot.clients.len()
        );
        Ok(snapshot)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
