//! Command-line interface of the `sales-balance` binary.

use crate::api::ApiClient;
use crate::balance::{compute_client_balances, compute_client_balances_by_id, compute_sale_balances};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{ClientId, SaleKind, SaleStatus};
use crate::output;
use crate::report::{client_summary, compare_balances, sales_report, SalesFilter};
use crate::snapshot::Snapshot;
use crate::validation::{filter_payments, PaymentDraft, PaymentFilter};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use log::info;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "sales-balance",
    version,
    about = "Sale and client balances for the sales backend"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Read sales from a JSON file instead of the API
    #[arg(long, global = true, value_name = "FILE")]
    pub sales: Option<PathBuf>,

    /// Payments JSON file (requires --sales)
    #[arg(long, global = true, value_name = "FILE")]
    pub payments: Option<PathBuf>,

    /// Clients JSON file (requires --sales)
    #[arg(long, global = true, value_name = "FILE")]
    pub clients: Option<PathBuf>,

    /// Backend base URL, overrides SALES_API_URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Per-sale paid and outstanding amounts
    Sales,
    /// Outstanding amount per client
    Balances {
        /// Group by client id instead of name and phone
        #[arg(long)]
        by_id: bool,
    },
    /// Billing summary of one client
    Client { id: ClientId },
    /// Sales totals by kind
    Report(FilterArgs),
    /// List payments with their client
    Payments {
        /// Case-insensitive part of the client name
        #[arg(long = "client", value_name = "NAME")]
        client_name: Option<String>,
        /// Calendar date of the payment
        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,
    },
    /// Validate a payment and record it through the API
    Pay(PayArgs),
    /// Sales whose backend balance disagrees with the local computation
    Compare,
    /// Save a PDF report rendered by the backend
    Download {
        #[command(subcommand)]
        report: DownloadReport,
    },
}

/// Sales report criteria; unset options match everything.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// First sale date included
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,
    /// Last sale date included
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,
    /// cash or credit
    #[arg(long)]
    pub kind: Option<SaleKind>,
    /// pending, paid or cancelled
    #[arg(long)]
    pub status: Option<SaleStatus>,
}

impl From<FilterArgs> for SalesFilter {
    fn from(args: FilterArgs) -> Self {
        SalesFilter {
            from: args.from,
            to: args.to,
            kind: args.kind,
            status: args.status,
        }
    }
}

/// Raw payment form fields; parsing happens in [`PaymentDraft::validate`].
#[derive(Args, Debug, Clone)]
pub struct PayArgs {
    pub sale: String,
    #[arg(allow_hyphen_values = true)]
    pub amount: String,
    #[arg(long)]
    pub date: Option<String>,
    #[arg(long)]
    pub method: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Only validate; works with --sales files
    #[arg(long)]
    pub dry_run: bool,
}

impl PayArgs {
    fn draft(&self) -> PaymentDraft {
        PaymentDraft {
            sale_id: self.sale.clone(),
            amount: self.amount.clone(),
            method: self.method.clone().unwrap_or_default(),
            notes: self.notes.clone().unwrap_or_default(),
            date: self.date.clone().unwrap_or_default(),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum DownloadReport {
    /// Sales report
    Sales {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
    /// Billing summary of one client
    Client {
        id: ClientId,
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
}

/// Where sales and payments come from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Api,
    Files {
        sales: PathBuf,
        payments: Option<PathBuf>,
        clients: Option<PathBuf>,
    },
}

impl Cli {
    pub fn source(&self) -> Result<Source> {
        match &self.sales {
            Some(sales) => Ok(Source::Files {
                sales: sales.clone(),
                payments: self.payments.clone(),
                clients: self.clients.clone(),
            }),
            None if self.payments.is_some() || self.clients.is_some() => Err(Error::Usage(
                "--payments and --clients require --sales".to_string(),
            )),
            None => Ok(Source::Api),
        }
    }
}

/// Builds the backend client; only commands that talk to the backend call this.
fn api_client(api_url: Option<&str>) -> Result<ApiClient> {
    let mut config = Config::from_env()?;
    if let Some(url) = api_url {
        config = config.with_api_url(url);
    }
    ApiClient::new(&config)
}

fn load_snapshot(source: &Source, api_url: Option<&str>, with_clients: bool) -> Result<Snapshot> {
    match source {
        Source::Api => Snapshot::fetch(&api_client(api_url)?, with_clients),
        Source::Files {
            sales,
            payments,
            clients,
        } => Snapshot::from_files(sales, payments.as_deref(), clients.as_deref()),
    }
}

fn write_file(path: &Path, bytes: &[u8], out: &mut impl Write) -> Result<()> {
    fs::write(path, bytes)?;
    info!("Saved report to {}", path.display());
    writeln!(out, "Wrote {} bytes to {}", bytes.len(), path.display())?;
    Ok(())
}

fn download<W: Write>(report: DownloadReport, api_url: Option<&str>, out: &mut W) -> Result<()> {
    let api = api_client(api_url)?;
    match report {
        DownloadReport::Sales { filter, out: path } => {
            let pdf = api.sales_report_pdf(&filter.into())?;
            write_file(&path, &pdf, out)
        }
        DownloadReport::Client { id, out: path } => {
            let pdf = api.client_report_pdf(id)?;
            write_file(&path, &pdf, out)
        }
    }
}

fn pay<W: Write>(args: PayArgs, source: &Source, api_url: Option<&str>, out: &mut W) -> Result<()> {
    if !args.dry_run && *source != Source::Api {
        return Err(Error::Usage(
            "pay records through the API; use --dry-run to check against --sales files".to_string(),
        ));
    }

    let snapshot = load_snapshot(source, api_url, false)?;
    let payment = args.draft().validate(&snapshot.sales, &snapshot.payments)?;
    if args.dry_run {
        writeln!(
            out,
            "Payment of {} for sale {} is acceptable",
            payment.amount, payment.sale_id
        )?;
        return Ok(());
    }

    let created = api_client(api_url)?.create_payment(&payment)?;
    info!("Recorded payment {} for sale {}", created.id, created.sale_id);
    writeln!(
        out,
        "Recorded payment {} of {} for sale {}",
        created.id, created.amount, created.sale_id
    )?;
    Ok(())
}

/// Executes the parsed command, writing results to `out`.
pub fn run<W: Write>(cli: Cli, mut out: W) -> Result<()> {
    let source = cli.source()?;
    let api_url = cli.api_url.as_deref();

    match cli.command {
        Command::Download { report } => download(report, api_url, &mut out),
        Command::Pay(args) => pay(args, &source, api_url, &mut out),
        Command::Sales => {
            let snapshot = load_snapshot(&source, api_url, false)?;
            output::write_sale_balances(out, &snapshot.sales, &snapshot.payments)
        }
        Command::Balances { by_id: false } => {
            let snapshot = load_snapshot(&source, api_url, false)?;
            let balances = compute_client_balances(&snapshot.sales, &snapshot.payments);
            output::write_client_balances(out, &balances)
        }
        Command::Balances { by_id: true } => {
            let snapshot = load_snapshot(&source, api_url, false)?;
            let balances = compute_client_balances_by_id(&snapshot.sales, &snapshot.payments);
            output::write_client_balances_by_id(out, &balances)
        }
        Command::Client { id } => {
            let snapshot = load_snapshot(&source, api_url, true)?;
            let summary = client_summary(id, &snapshot.sales, &snapshot.payments, &snapshot.clients)
                .ok_or_else(|| Error::Usage(format!("client {} not found", id)))?;
            output::write_client_summary(out, &summary)
        }
        Command::Report(filter) => {
            let snapshot = load_snapshot(&source, api_url, false)?;
            let report = sales_report(&snapshot.sales, &filter.into());
            output::write_sales_report(out, &report)
        }
        Command::Payments { client_name, date } => {
            let snapshot = load_snapshot(&source, api_url, false)?;
            let filter = PaymentFilter { client_name, date };
            let payments = filter_payments(&snapshot.payments, &snapshot.sales, &filter);
            output::write_payments(out, &payments, &snapshot.sales)
        }
        Command::Compare => {
            let snapshot = load_snapshot(&source, api_url, false)?;
            let backend = api_client(api_url)?.balances()?;
            let local = compute_sale_balances(&snapshot.sales, &snapshot.payments);
            let mismatches = compare_balances(&local, &backend);
            info!(
                "{} of {} sales disagree with the backend balance view",
                mismatches.len(),
                local.len()
            );
            output::write_balance_mismatches(out, &mismatches)
        }
    }
}
