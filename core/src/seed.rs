//! Demo dataset: six Latin American markets, twenty-odd payment methods.
//!
//! RULES:
//!   - Deterministic: the same (as_of, seed) always writes the same rows.
//!   - Idempotent: a store that already has countries is left untouched.
//!   - Transactions span the six months ending at as_of, with 60% of them
//!     in the last two months, and never fall after as_of.
//!
//! Profiles are chosen so every classifier has something to find: a few
//! high-cost, low-volume methods (zombies), high-ticket wallets (hidden
//! gems) and a card with poor approval in one market (performance alert).

use crate::{
    clock,
    error::EngineResult,
    numeric::round2,
    rng::{SeedRng, SeedStream},
    store::{
        CatalogEntry, CountryRecord, IntegrationCostRecord, PaymentMethodRecord, PaymentStore,
        TransactionRecord, TransactionStatus,
    },
    types::TrendPeriod,
};
use chrono::{Duration, Months, NaiveDate, NaiveDateTime};
use std::collections::HashSet;

const COUNTRY_CATALOG_JSON: &str = include_str!("../../data/country_catalog.json");

/// Months of history generated, counting the as-of month.
pub const HISTORY_MONTHS: u32 = 6;
/// Share of transactions placed in the two most recent months.
const RECENT_WEIGHT: f64 = 0.6;

struct CountryProfile {
    code: &'static str,
    name: &'static str,
    currency: &'static str,
    fx_rate: f64,
}

const COUNTRIES: &[CountryProfile] = &[
    CountryProfile { code: "MX", name: "Mexico",    currency: "MXN", fx_rate: 0.0580 },
    CountryProfile { code: "BR", name: "Brazil",    currency: "BRL", fx_rate: 0.1960 },
    CountryProfile { code: "CO", name: "Colombia",  currency: "COP", fx_rate: 0.000245 },
    CountryProfile { code: "AR", name: "Argentina", currency: "ARS", fx_rate: 0.00115 },
    CountryProfile { code: "CL", name: "Chile",     currency: "CLP", fx_rate: 0.00108 },
    CountryProfile { code: "PE", name: "Peru",      currency: "PEN", fx_rate: 0.2680 },
];

/// Usage profile of one payment method in the markets it serves.
struct MethodProfile {
    code: &'static str,
    name: &'static str,
    pm_type: &'static str,
    provider: &'static str,
    countries: &'static [&'static str],
    txn_range: (i64, i64),
    approval_range: (f64, f64),
    /// Ticket size in local currency.
    amount_range: (f64, f64),
}

#[allow(clippy::too_many_arguments)]
const fn method(
    code: &'static str,
    name: &'static str,
    pm_type: &'static str,
    provider: &'static str,
    countries: &'static [&'static str],
    txn_range: (i64, i64),
    approval_range: (f64, f64),
    amount_range: (f64, f64),
) -> MethodProfile {
    MethodProfile { code, name, pm_type, provider, countries, txn_range, approval_range, amount_range }
}

const METHODS: &[MethodProfile] = &[
    // Champions
    method("PIX", "PIX Instant Payment", "BANK_TRANSFER", "BCB", &["BR"], (60, 80), (0.93, 0.97), (100.0, 500.0)),
    method("VISA_CREDIT", "Visa Credit Card", "CARD", "Visa", &["BR", "CO", "AR", "CL", "PE"], (50, 70), (0.85, 0.95), (200.0, 800.0)),
    method("SPEI", "SPEI Bank Transfer", "BANK_TRANSFER", "Banxico", &["MX"], (55, 75), (0.90, 0.97), (2000.0, 8000.0)),
    method("OXXO", "OXXO Cash Payment", "CASH", "OXXO", &["MX"], (50, 70), (0.85, 0.92), (500.0, 3000.0)),
    // Steady performers
    method("MC_CREDIT", "Mastercard Credit", "CARD", "Mastercard", &["BR", "CO", "AR", "CL"], (25, 40), (0.75, 0.88), (150.0, 600.0)),
    method("PSE", "PSE Bank Transfer", "BANK_TRANSFER", "ACH Colombia", &["CO"], (30, 40), (0.78, 0.85), (200_000.0, 800_000.0)),
    method("BOLETO", "Boleto Bancário", "CASH", "FEBRABAN", &["BR"], (20, 35), (0.70, 0.80), (200.0, 1000.0)),
    method("MERCADOPAGO", "MercadoPago Wallet", "WALLET", "MercadoLibre", &["MX", "AR"], (25, 35), (0.80, 0.88), (500.0, 2000.0)),
    method("NUBANK_CREDIT", "Nubank Credit Card", "CARD", "Nubank", &["BR"], (20, 30), (0.82, 0.88), (150.0, 500.0)),
    method("WEBPAY", "WebPay Plus", "BANK_TRANSFER", "Transbank", &["CL"], (30, 45), (0.80, 0.88), (30_000.0, 120_000.0)),
    method("EFECTY", "Efecty Cash Payment", "CASH", "Efecty", &["CO"], (15, 25), (0.75, 0.82), (100_000.0, 400_000.0)),
    method("VISA_DEBIT", "Visa Debit Card", "CARD", "Visa", &["BR", "MX", "AR"], (20, 35), (0.78, 0.88), (100.0, 400.0)),
    method("PAGOFACIL", "Pago Fácil Cash", "CASH", "PagoFácil", &["AR"], (10, 18), (0.72, 0.80), (8000.0, 25_000.0)),
    // Low usage, still paying monthly
    method("RAPIPAGO", "Rapipago Cash", "CASH", "Rapipago", &["AR"], (3, 8), (0.60, 0.75), (5000.0, 15_000.0)),
    method("DAVIPLATA", "DaviPlata Wallet", "WALLET", "Davivienda", &["CO"], (2, 6), (0.65, 0.78), (100_000.0, 300_000.0)),
    method("KUESKI", "Kueski Pay BNPL", "BNPL", "Kueski", &["MX"], (3, 7), (0.55, 0.70), (2000.0, 6000.0)),
    method("FPAY", "FPAY Wallet", "WALLET", "Falabella", &["CL"], (2, 5), (0.60, 0.72), (20_000.0, 60_000.0)),
    // High ticket, low volume
    method("NEQUI", "Nequi Wallet", "WALLET", "Bancolombia", &["CO"], (15, 25), (0.93, 0.97), (300_000.0, 900_000.0)),
    method("ADDI", "Addi BNPL", "BNPL", "Addi", &["CO"], (12, 20), (0.93, 0.96), (500_000.0, 1_500_000.0)),
    method("YAPE", "Yape Mobile Wallet", "WALLET", "BCP", &["PE"], (15, 22), (0.94, 0.97), (200.0, 600.0)),
];

/// Visa credit in Mexico: same method, poor approval.
const VISA_CREDIT_MX: MethodProfile = method(
    "VISA_CREDIT", "Visa Credit Card", "CARD", "Visa", &["MX"], (50, 65), (0.60, 0.65), (1500.0, 5000.0),
);

/// (method, country, monthly fixed USD, per-transaction USD, percentage fee)
const COSTS: &[(&str, &str, f64, f64, f64)] = &[
    ("PIX", "BR", 50.00, 0.02, 0.0010),
    ("VISA_CREDIT", "BR", 200.00, 0.15, 0.0250),
    ("VISA_CREDIT", "CO", 200.00, 0.15, 0.0250),
    ("VISA_CREDIT", "AR", 200.00, 0.15, 0.0250),
    ("VISA_CREDIT", "CL", 200.00, 0.15, 0.0250),
    ("VISA_CREDIT", "PE", 200.00, 0.15, 0.0250),
    ("VISA_CREDIT", "MX", 200.00, 0.15, 0.0250),
    ("SPEI", "MX", 75.00, 0.03, 0.0015),
    ("OXXO", "MX", 100.00, 0.10, 0.0200),
    ("MC_CREDIT", "BR", 180.00, 0.12, 0.0230),
    ("MC_CREDIT", "CO", 180.00, 0.12, 0.0230),
    ("MC_CREDIT", "AR", 180.00, 0.12, 0.0230),
    ("MC_CREDIT", "CL", 180.00, 0.12, 0.0230),
    ("PSE", "CO", 80.00, 0.05, 0.0020),
    ("BOLETO", "BR", 60.00, 0.08, 0.0015),
    ("MERCADOPAGO", "MX", 100.00, 0.08, 0.0350),
    ("MERCADOPAGO", "AR", 100.00, 0.08, 0.0350),
    ("NUBANK_CREDIT", "BR", 120.00, 0.10, 0.0200),
    ("WEBPAY", "CL", 90.00, 0.06, 0.0180),
    ("EFECTY", "CO", 70.00, 0.07, 0.0015),
    ("VISA_DEBIT", "BR", 150.00, 0.10, 0.0150),
    ("VISA_DEBIT", "MX", 150.00, 0.10, 0.0150),
    ("VISA_DEBIT", "AR", 150.00, 0.10, 0.0150),
    ("PAGOFACIL", "AR", 60.00, 0.06, 0.0012),
    ("RAPIPAGO", "AR", 80.00, 0.08, 0.0015),
    ("DAVIPLATA", "CO", 90.00, 0.06, 0.0020),
    ("KUESKI", "MX", 150.00, 0.20, 0.0300),
    ("FPAY", "CL", 85.00, 0.07, 0.0025),
    ("NEQUI", "CO", 70.00, 0.04, 0.0015),
    ("ADDI", "CO", 120.00, 0.15, 0.0280),
    ("YAPE", "PE", 60.00, 0.03, 0.0012),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub countries: usize,
    pub payment_methods: usize,
    pub transactions: usize,
    pub integration_costs: usize,
    pub catalog_entries: usize,
}

/// Populate an empty store. Returns `None` when data already exists.
pub fn seed_demo_data(
    store: &PaymentStore,
    as_of: NaiveDateTime,
    seed: u64,
) -> EngineResult<Option<SeedSummary>> {
    if store.country_count()? > 0 {
        log::info!("Seed data already present, skipping");
        return Ok(None);
    }
    let catalog: Vec<CatalogEntry> = serde_json::from_str(COUNTRY_CATALOG_JSON)?;

    let summary = store.write_batch(|s| {
        let mut summary = SeedSummary::default();

        for c in COUNTRIES {
            s.insert_country(&CountryRecord {
                code: c.code.to_string(),
                name: c.name.to_string(),
                currency: c.currency.to_string(),
                fx_rate_to_usd: c.fx_rate,
            })?;
        }
        summary.countries = COUNTRIES.len();

        let mut inserted: HashSet<&str> = HashSet::new();
        for pm in METHODS.iter().chain(std::iter::once(&VISA_CREDIT_MX)) {
            if inserted.insert(pm.code) {
                s.insert_payment_method(&PaymentMethodRecord {
                    code: pm.code.to_string(),
                    name: pm.name.to_string(),
                    pm_type: pm.pm_type.to_string(),
                    provider: Some(pm.provider.to_string()),
                })?;
            }
            for cc in pm.countries {
                s.link_payment_method_country(pm.code, cc)?;
            }
        }
        summary.payment_methods = inserted.len();

        summary.transactions = seed_transactions(s, as_of, seed)?;

        let effective_from = clock::truncate_to_period(as_of.date(), TrendPeriod::Mom)
            .checked_sub_months(Months::new(12))
            .unwrap_or(as_of.date());
        for &(pm, cc, monthly, per_txn, pct_fee) in COSTS {
            s.insert_integration_cost(&IntegrationCostRecord {
                payment_method_code: pm.to_string(),
                country_code: cc.to_string(),
                monthly_fixed_cost_usd: monthly,
                per_transaction_cost_usd: per_txn,
                percentage_fee: pct_fee,
                effective_from,
                effective_to: None,
            })?;
        }
        summary.integration_costs = COSTS.len();

        for entry in &catalog {
            s.insert_catalog_entry(entry)?;
        }
        summary.catalog_entries = catalog.len();

        Ok(summary)
    })?;

    log::info!(
        "Seeded {} countries, {} payment methods, {} transactions, {} costs, {} catalog entries",
        summary.countries,
        summary.payment_methods,
        summary.transactions,
        summary.integration_costs,
        summary.catalog_entries
    );
    Ok(Some(summary))
}

fn seed_transactions(store: &PaymentStore, as_of: NaiveDateTime, seed: u64) -> EngineResult<usize> {
    let mut volume_rng = SeedRng::new(seed, SeedStream::Volume);
    let mut txn_rng = SeedRng::new(seed, SeedStream::Transactions);
    let mut id_rng = SeedRng::new(seed, SeedStream::Identities);

    let current_month = clock::truncate_to_period(as_of.date(), TrendPeriod::Mom);
    let base_month = current_month
        .checked_sub_months(Months::new(HISTORY_MONTHS - 1))
        .unwrap_or(current_month);

    let mut total = 0;
    for pm in METHODS.iter().chain(std::iter::once(&VISA_CREDIT_MX)) {
        for cc in pm.countries {
            let Some(country) = COUNTRIES.iter().find(|c| c.code == *cc) else {
                continue;
            };

            let count = volume_rng.range_i64(pm.txn_range.0, pm.txn_range.1);
            for _ in 0..count {
                let month_offset = if txn_rng.chance(RECENT_WEIGHT) {
                    (HISTORY_MONTHS - 2) as u64 + txn_rng.below(2)
                } else {
                    txn_rng.below((HISTORY_MONTHS - 2) as u64)
                };
                let transaction_date = transaction_date(
                    base_month,
                    month_offset as u32,
                    txn_rng.below(28) as i64,
                    txn_rng.below(24) as i64,
                    txn_rng.below(60) as i64,
                    as_of,
                );

                let amount = round2(txn_rng.range_f64(pm.amount_range.0, pm.amount_range.1));
                let amount_usd = round2(amount * country.fx_rate);
                let approval = txn_rng.range_f64(pm.approval_range.0, pm.approval_range.1);
                let status = if txn_rng.next_f64() <= approval {
                    TransactionStatus::Approved
                } else if txn_rng.chance(0.85) {
                    TransactionStatus::Declined
                } else if txn_rng.chance(0.5) {
                    TransactionStatus::Pending
                } else {
                    TransactionStatus::Refunded
                };

                store.insert_transaction(&TransactionRecord {
                    id: uuid::Builder::from_random_bytes(id_rng.bytes16()).into_uuid().to_string(),
                    payment_method_code: pm.code.to_string(),
                    country_code: country.code.to_string(),
                    currency: country.currency.to_string(),
                    amount,
                    amount_usd,
                    status,
                    merchant_id: Some(format!("merchant_{:03}", id_rng.below(50) + 1)),
                    customer_id: Some(format!("customer_{:05}", id_rng.below(5000) + 1)),
                    transaction_date,
                })?;
                total += 1;
            }
        }
    }
    Ok(total)
}

/// A timestamp inside month `base + month_offset`. Dates that would land
/// after `as_of` are pulled back four weeks.
fn transaction_date(
    base_month: NaiveDate,
    month_offset: u32,
    day: i64,
    hour: i64,
    minute: i64,
    as_of: NaiveDateTime,
) -> NaiveDateTime {
    let month = base_month
        .checked_add_months(Months::new(month_offset))
        .unwrap_or(base_month);
    let mut ts = clock::day_start(month)
        + Duration::days(day)
        + Duration::hours(hour)
        + Duration::minutes(minute);
    while ts > as_of {
        ts -= Duration::days(28);
    }
    ts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_never_pass_as_of() {
        let as_of = NaiveDate::from_ymd_opt(2026, 2, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let base = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let ts = transaction_date(base, 5, 27, 23, 59, as_of);
        assert!(ts <= as_of);
        assert!(ts >= base.and_hms_opt(0, 0, 0).unwrap());
    }
}
