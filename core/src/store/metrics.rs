//! Store queries feeding the Metrics Calculator.

use super::{FilterParams, PaymentStore};
use crate::{
    aggregate::MetricRow,
    error::EngineResult,
    numeric::{pct_of_counts, round2},
    provider::AnalysisFilter,
};
use rusqlite::params;

impl PaymentStore {
    /// One row per (payment method, country) with transactions in the date
    /// range. The payment-method-type selector is NOT applied here: the
    /// calculator needs the whole portfolio's TPV to compute contribution.
    pub fn metric_rows(&self, filter: &AnalysisFilter) -> EngineResult<Vec<MetricRow>> {
        let p = FilterParams::from_filter(filter);
        let mut stmt = self.conn.prepare(
            "WITH txn_agg AS (
                SELECT t.payment_method_code, t.country_code,
                       COUNT(*) AS txn_count,
                       SUM(CASE WHEN t.status = 'APPROVED' THEN 1 ELSE 0 END) AS approved_count,
                       SUM(CASE WHEN t.status = 'DECLINED' THEN 1 ELSE 0 END) AS declined_count,
                       COALESCE(SUM(CASE WHEN t.status = 'APPROVED' THEN t.amount_usd END), 0.0) AS tpv_usd,
                       COALESCE(AVG(t.amount_usd), 0.0) AS avg_value
                FROM payment_transaction t
                WHERE (?1 = '' OR t.country_code = ?1)
                  AND (?2 = '' OR t.transaction_date >= ?2)
                  AND (?3 = '' OR t.transaction_date < ?3)
                GROUP BY t.payment_method_code, t.country_code
             ),
             trailing AS (
                SELECT payment_method_code, country_code, COUNT(*) AS cnt
                FROM payment_transaction
                WHERE transaction_date >= ?4 AND transaction_date <= ?5
                  AND (?1 = '' OR country_code = ?1)
                GROUP BY payment_method_code, country_code
             )
             SELECT a.payment_method_code, pm.name, pm.type, a.country_code,
                    a.txn_count, a.approved_count, a.declined_count, a.tpv_usd, a.avg_value,
                    COALESCE(ic.monthly_fixed_cost_usd, 0.0),
                    COALESCE(tr.cnt, 0)
             FROM txn_agg a
             JOIN payment_method pm ON pm.code = a.payment_method_code
             LEFT JOIN integration_cost ic ON ic.payment_method_code = a.payment_method_code
                   AND ic.country_code = a.country_code
                   AND ic.effective_to IS NULL
             LEFT JOIN trailing tr ON tr.payment_method_code = a.payment_method_code
                   AND tr.country_code = a.country_code
             ORDER BY a.payment_method_code, a.country_code",
        )?;
        let rows = stmt
            .query_map(
                params![p.country, p.date_from, p.date_to, p.trailing_start, p.as_of],
                |row| {
                    let transaction_count: i64 = row.get(4)?;
                    let approved_count: i64 = row.get(5)?;
                    let avg_value: f64 = row.get(8)?;
                    Ok(MetricRow {
                        payment_method_code: row.get(0)?,
                        payment_method_name: row.get(1)?,
                        payment_method_type: row.get(2)?,
                        country_code: row.get(3)?,
                        transaction_count,
                        approved_count,
                        declined_count: row.get(6)?,
                        tpv_usd: row.get(7)?,
                        approval_rate: round2(pct_of_counts(approved_count, transaction_count)),
                        avg_transaction_value: round2(avg_value),
                        monthly_cost_usd: row.get(9)?,
                        txn_count_trailing: row.get(10)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
