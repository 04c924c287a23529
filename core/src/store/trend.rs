//! Store queries feeding the Trend Analyzer.

use super::{FilterParams, PaymentStore};
use crate::{
    aggregate::TrendBucket,
    clock,
    error::EngineResult,
    numeric::{pct_of_counts, round2},
    provider::TrendQuery,
    types::TrendPeriod,
};
use rusqlite::params;

/// SQLite expression bucketing `transaction_date` to its period's first day.
fn period_expr(period: TrendPeriod) -> &'static str {
    match period {
        TrendPeriod::Mom => "strftime('%Y-%m-01', t.transaction_date)",
        // Monday on or before the date.
        TrendPeriod::Wow => "date(t.transaction_date, '-6 days', 'weekday 1')",
    }
}

impl PaymentStore {
    /// Per-period buckets from `periods_back` periods before the as-of
    /// period up to the as-of instant.
    pub fn trend_buckets(&self, query: &TrendQuery) -> EngineResult<Vec<TrendBucket>> {
        let p = FilterParams::from_filter(&query.filter);
        let window_start = clock::day_start(clock::periods_back_start(
            query.filter.as_of,
            query.period,
            query.periods_back.max(1),
        ));
        let period = period_expr(query.period);
        let sql = format!(
            "SELECT {period} AS period, t.payment_method_code, pm.name, t.country_code,
                    COUNT(*) AS txn_count,
                    SUM(CASE WHEN t.status = 'APPROVED' THEN 1 ELSE 0 END) AS approved_count,
                    COALESCE(SUM(CASE WHEN t.status = 'APPROVED' THEN t.amount_usd END), 0.0) AS tpv_usd,
                    COALESCE(AVG(t.amount_usd), 0.0) AS avg_value
             FROM payment_transaction t
             JOIN payment_method pm ON pm.code = t.payment_method_code
             WHERE t.transaction_date >= ?1 AND t.transaction_date <= ?2
               AND (?3 = '' OR t.country_code = ?3)
               AND (?4 = '' OR t.payment_method_code = ?4)
             GROUP BY period, t.payment_method_code, t.country_code
             ORDER BY period, t.payment_method_code, t.country_code"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![
                    clock::format_timestamp(window_start),
                    p.as_of,
                    p.country,
                    query.payment_method.clone().unwrap_or_default(),
                ],
                |row| {
                    let transaction_count: i64 = row.get(4)?;
                    let approved_count: i64 = row.get(5)?;
                    let avg_value: f64 = row.get(7)?;
                    Ok(TrendBucket {
                        period: row.get(0)?,
                        payment_method_code: row.get(1)?,
                        payment_method_name: row.get(2)?,
                        country_code: row.get(3)?,
                        transaction_count,
                        tpv_usd: row.get(6)?,
                        approval_rate: round2(pct_of_counts(approved_count, transaction_count)),
                        avg_transaction_value: round2(avg_value),
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
