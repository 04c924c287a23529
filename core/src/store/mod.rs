//! SQLite persistence layer: the bundled Aggregate Provider backend.
//!
//! RULE: Only the store talks to the database.
//! Analyses pull rows through `provider::AggregateProvider`; they never
//! execute SQL directly. Every read query lives in the submodule named
//! after the analysis it feeds.

use crate::{clock, error::EngineResult, provider::AnalysisFilter};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

mod insight;
mod market_gap;
mod metrics;
mod roi;
mod trend;

pub struct PaymentStore {
    conn: Connection,
}

// ── Write-side records ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryRecord {
    pub code: String,
    pub name: String,
    pub currency: String,
    pub fx_rate_to_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethodRecord {
    pub code: String,
    pub name: String,
    pub pm_type: String,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Approved,
    Declined,
    Pending,
    Refunded,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Declined => "DECLINED",
            Self::Pending  => "PENDING",
            Self::Refunded => "REFUNDED",
        }
    }
}

/// A transaction with its USD amount already converted upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub payment_method_code: String,
    pub country_code: String,
    pub currency: String,
    pub amount: f64,
    pub amount_usd: f64,
    pub status: TransactionStatus,
    pub merchant_id: Option<String>,
    pub customer_id: Option<String>,
    pub transaction_date: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationCostRecord {
    pub payment_method_code: String,
    pub country_code: String,
    pub monthly_fixed_cost_usd: f64,
    pub per_transaction_cost_usd: f64,
    pub percentage_fee: f64,
    pub effective_from: NaiveDate,
    /// `None` while the cost schedule is current.
    pub effective_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub country_code: String,
    pub payment_method_code: String,
    pub market_share_pct: f64,
    pub is_essential: bool,
    pub source: String,
}

// ── Shared query parameters ──────────────────────────────────────────────────

/// Filter selectors rendered as SQL parameters. Empty string = no filter,
/// matching the `(?n = '' OR col = ?n)` pattern every query uses.
///
/// The payment-method-type selector is not rendered: the calculators need
/// the whole portfolio's totals and apply it themselves.
pub(crate) struct FilterParams {
    pub country: String,
    pub date_from: String,
    /// Exclusive upper bound (day after the inclusive `date_to`).
    pub date_to: String,
    pub trailing_start: String,
    pub as_of: String,
}

impl FilterParams {
    pub fn from_filter(filter: &AnalysisFilter) -> Self {
        Self {
            country: filter.country.clone().unwrap_or_default(),
            date_from: filter
                .date_from
                .map(|d| clock::format_timestamp(clock::day_start(d)))
                .unwrap_or_default(),
            date_to: filter
                .date_to
                .map(|d| clock::format_timestamp(clock::day_after(d)))
                .unwrap_or_default(),
            trailing_start: clock::format_timestamp(filter.trailing_start()),
            as_of: clock::format_timestamp(filter.as_of),
        }
    }
}

impl PaymentStore {
    /// Open (or create) the database at `path`. Accepts SQLite URIs.
    pub fn open(path: &str) -> EngineResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order. Safe to call repeatedly.
    pub fn migrate(&self) -> EngineResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_payment_health.sql"))?;
        log::info!("Payment store schema up to date");
        Ok(())
    }

    /// Wrap a batch of writes in one SQLite transaction.
    pub fn write_batch<T>(&self, f: impl FnOnce(&Self) -> EngineResult<T>) -> EngineResult<T> {
        self.conn.execute_batch("BEGIN")?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    // ── Reference data ─────────────────────────────────────────

    pub fn insert_country(&self, c: &CountryRecord) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO country (code, name, currency, fx_rate_to_usd) VALUES (?1, ?2, ?3, ?4)",
            params![c.code, c.name, c.currency, c.fx_rate_to_usd],
        )?;
        Ok(())
    }

    pub fn insert_payment_method(&self, pm: &PaymentMethodRecord) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO payment_method (code, name, type, provider) VALUES (?1, ?2, ?3, ?4)",
            params![pm.code, pm.name, pm.pm_type, pm.provider],
        )?;
        Ok(())
    }

    pub fn link_payment_method_country(&self, pm_code: &str, country_code: &str) -> EngineResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO payment_method_country (payment_method_code, country_code)
             VALUES (?1, ?2)",
            params![pm_code, country_code],
        )?;
        Ok(())
    }

    // ── Transactions ───────────────────────────────────────────

    pub fn insert_transaction(&self, t: &TransactionRecord) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO payment_transaction (
                id, payment_method_code, country_code, currency, amount, amount_usd,
                status, merchant_id, customer_id, transaction_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                t.id,
                t.payment_method_code,
                t.country_code,
                t.currency,
                t.amount,
                t.amount_usd,
                t.status.as_str(),
                t.merchant_id,
                t.customer_id,
                clock::format_timestamp(t.transaction_date),
            ],
        )?;
        Ok(())
    }

    // ── Costs and catalog ──────────────────────────────────────

    pub fn insert_integration_cost(&self, c: &IntegrationCostRecord) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO integration_cost (
                payment_method_code, country_code, monthly_fixed_cost_usd,
                per_transaction_cost_usd, percentage_fee, effective_from, effective_to
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                c.payment_method_code,
                c.country_code,
                c.monthly_fixed_cost_usd,
                c.per_transaction_cost_usd,
                c.percentage_fee,
                c.effective_from.to_string(),
                c.effective_to.map(|d| d.to_string()),
            ],
        )?;
        Ok(())
    }

    pub fn insert_catalog_entry(&self, e: &CatalogEntry) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO country_payment_catalog (
                country_code, payment_method_code, market_share_pct, is_essential, source
            ) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                e.country_code,
                e.payment_method_code,
                e.market_share_pct,
                e.is_essential,
                e.source,
            ],
        )?;
        Ok(())
    }

    // ── Test / summary helpers ─────────────────────────────────

    pub fn country_count(&self) -> EngineResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM country", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn transaction_count(&self) -> EngineResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM payment_transaction", [], |row| row.get(0))?;
        Ok(count)
    }
}
