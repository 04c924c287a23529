//! Store queries feeding the ROI Calculator.

use super::{FilterParams, PaymentStore};
use crate::{aggregate::RoiRow, error::EngineResult, provider::AnalysisFilter};
use rusqlite::params;

impl PaymentStore {
    /// Approved volume and cost parameters per instrument.
    ///
    /// months_in_range spans the requested dates; an open end of the range
    /// falls back to the instrument's own first/last transaction. Never less
    /// than one month.
    pub fn roi_rows(&self, filter: &AnalysisFilter) -> EngineResult<Vec<RoiRow>> {
        let p = FilterParams::from_filter(filter);
        let mut stmt = self.conn.prepare(
            "WITH txn_agg AS (
                SELECT t.payment_method_code, t.country_code,
                       COALESCE(SUM(CASE WHEN t.status = 'APPROVED' THEN t.amount_usd END), 0.0)
                           AS approved_tpv,
                       SUM(CASE WHEN t.status = 'APPROVED' THEN 1 ELSE 0 END) AS approved_count,
                       COUNT(*) AS total_count,
                       MAX(
                           (julianday(COALESCE(NULLIF(?3, ''), MAX(t.transaction_date)))
                            - julianday(COALESCE(NULLIF(?2, ''), MIN(t.transaction_date)))) / 30.0,
                           1.0
                       ) AS months_in_range
                FROM payment_transaction t
                WHERE (?1 = '' OR t.country_code = ?1)
                  AND (?2 = '' OR t.transaction_date >= ?2)
                  AND (?3 = '' OR t.transaction_date < ?3)
                GROUP BY t.payment_method_code, t.country_code
             )
             SELECT a.payment_method_code, pm.name, a.country_code,
                    a.approved_tpv, a.approved_count, a.total_count,
                    COALESCE(ic.monthly_fixed_cost_usd, 0.0),
                    COALESCE(ic.per_transaction_cost_usd, 0.0),
                    COALESCE(ic.percentage_fee, 0.0),
                    a.months_in_range
             FROM txn_agg a
             JOIN payment_method pm ON pm.code = a.payment_method_code
             LEFT JOIN integration_cost ic ON ic.payment_method_code = a.payment_method_code
                   AND ic.country_code = a.country_code
                   AND ic.effective_to IS NULL
             ORDER BY a.payment_method_code, a.country_code",
        )?;
        let rows = stmt
            .query_map(params![p.country, p.date_from, p.date_to], |row| {
                Ok(RoiRow {
                    payment_method_code: row.get(0)?,
                    payment_method_name: row.get(1)?,
                    country_code: row.get(2)?,
                    approved_tpv: row.get(3)?,
                    approved_count: row.get(4)?,
                    total_count: row.get(5)?,
                    monthly_fixed_cost: row.get(6)?,
                    per_transaction_cost: row.get(7)?,
                    percentage_fee: row.get(8)?,
                    months_in_range: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
