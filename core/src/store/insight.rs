//! Store queries feeding the three insight classifiers.

use super::{FilterParams, PaymentStore};
use crate::{
    aggregate::{HiddenGemCandidate, PerformanceAlertCandidate, ZombieCandidate},
    error::EngineResult,
    provider::AnalysisFilter,
};
use rusqlite::params;

impl PaymentStore {
    /// Every instrument with a current integration cost, with its trailing
    /// window volume and its all-time monthly average.
    ///
    /// months_active is the span between first and last transaction in
    /// 30-day months, rounded to the nearest whole month; the monthly
    /// average divides by that span floored at one month.
    pub fn zombie_candidates(&self, filter: &AnalysisFilter) -> EngineResult<Vec<ZombieCandidate>> {
        let p = FilterParams::from_filter(filter);
        let mut stmt = self.conn.prepare(
            "WITH trailing AS (
                SELECT payment_method_code, country_code, COUNT(*) AS cnt
                FROM payment_transaction
                WHERE transaction_date >= ?2 AND transaction_date <= ?3
                GROUP BY payment_method_code, country_code
             ),
             historical AS (
                SELECT payment_method_code, country_code,
                       COUNT(*) AS cnt,
                       (julianday(MAX(transaction_date)) - julianday(MIN(transaction_date))) / 30.0
                           AS months_span
                FROM payment_transaction
                WHERE transaction_date <= ?3
                GROUP BY payment_method_code, country_code
             )
             SELECT ic.payment_method_code, pm.name, pm.type, ic.country_code,
                    COALESCE(tr.cnt, 0),
                    COALESCE(h.cnt / MAX(h.months_span, 1.0), 0.0),
                    COALESCE(h.months_span, 0.0),
                    ic.monthly_fixed_cost_usd
             FROM integration_cost ic
             JOIN payment_method pm ON pm.code = ic.payment_method_code
             LEFT JOIN trailing tr ON tr.payment_method_code = ic.payment_method_code
                   AND tr.country_code = ic.country_code
             LEFT JOIN historical h ON h.payment_method_code = ic.payment_method_code
                   AND h.country_code = ic.country_code
             WHERE ic.effective_to IS NULL
               AND (?1 = '' OR ic.country_code = ?1)
             ORDER BY ic.payment_method_code, ic.country_code",
        )?;
        let rows = stmt
            .query_map(params![p.country, p.trailing_start, p.as_of], |row| {
                let months_span: f64 = row.get(6)?;
                Ok(ZombieCandidate {
                    payment_method_code: row.get(0)?,
                    payment_method_name: row.get(1)?,
                    payment_method_type: row.get(2)?,
                    country_code: row.get(3)?,
                    txn_count_90d: row.get(4)?,
                    historical_monthly_avg: row.get(5)?,
                    months_active: months_span.round() as i64,
                    monthly_cost_usd: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Revenue contribution and volume share of each instrument within the
    /// selected country (or the whole portfolio), all time.
    pub fn hidden_gem_candidates(
        &self,
        filter: &AnalysisFilter,
    ) -> EngineResult<Vec<HiddenGemCandidate>> {
        let p = FilterParams::from_filter(filter);
        let mut stmt = self.conn.prepare(
            "WITH txn_agg AS (
                SELECT payment_method_code, country_code,
                       COUNT(*) AS txn_count,
                       SUM(CASE WHEN status = 'APPROVED' THEN 1 ELSE 0 END) AS approved_count,
                       COALESCE(SUM(CASE WHEN status = 'APPROVED' THEN amount_usd END), 0.0) AS tpv_usd
                FROM payment_transaction
                WHERE (?1 = '' OR country_code = ?1)
                  AND transaction_date <= ?2
                GROUP BY payment_method_code, country_code
             ),
             totals AS (
                SELECT SUM(tpv_usd) AS total_tpv, SUM(txn_count) AS total_txns FROM txn_agg
             )
             SELECT a.payment_method_code, pm.name, a.country_code,
                    CASE WHEN a.txn_count > 0
                         THEN a.approved_count * 100.0 / a.txn_count ELSE 0.0 END,
                    CASE WHEN t.total_tpv > 0
                         THEN a.tpv_usd * 100.0 / t.total_tpv ELSE 0.0 END,
                    CASE WHEN t.total_txns > 0
                         THEN a.txn_count * 100.0 / t.total_txns ELSE 0.0 END,
                    a.tpv_usd,
                    a.txn_count
             FROM txn_agg a
             JOIN payment_method pm ON pm.code = a.payment_method_code
             CROSS JOIN totals t
             ORDER BY a.payment_method_code, a.country_code",
        )?;
        let rows = stmt
            .query_map(params![p.country, p.as_of], |row| {
                Ok(HiddenGemCandidate {
                    payment_method_code: row.get(0)?,
                    payment_method_name: row.get(1)?,
                    country_code: row.get(2)?,
                    approval_rate: row.get(3)?,
                    revenue_contribution_pct: row.get(4)?,
                    volume_share_pct: row.get(5)?,
                    tpv_usd: row.get(6)?,
                    transaction_count: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Each instrument's approval rate next to the mean approval rate of
    /// all methods sharing its type in the same country.
    pub fn performance_alert_candidates(
        &self,
        filter: &AnalysisFilter,
    ) -> EngineResult<Vec<PerformanceAlertCandidate>> {
        let p = FilterParams::from_filter(filter);
        let mut stmt = self.conn.prepare(
            "WITH method_stats AS (
                SELECT t.payment_method_code, t.country_code, pm.type AS pm_type,
                       COUNT(*) AS txn_count,
                       SUM(CASE WHEN t.status = 'APPROVED' THEN 1 ELSE 0 END) * 100.0 / COUNT(*)
                           AS approval_rate
                FROM payment_transaction t
                JOIN payment_method pm ON pm.code = t.payment_method_code
                WHERE (?1 = '' OR t.country_code = ?1)
                  AND t.transaction_date <= ?2
                GROUP BY t.payment_method_code, t.country_code, pm.type
             ),
             type_avgs AS (
                SELECT country_code, pm_type, AVG(approval_rate) AS avg_approval
                FROM method_stats
                GROUP BY country_code, pm_type
             )
             SELECT ms.payment_method_code, pm.name, ms.pm_type, ms.country_code,
                    ms.approval_rate, ta.avg_approval, ms.txn_count
             FROM method_stats ms
             JOIN payment_method pm ON pm.code = ms.payment_method_code
             JOIN type_avgs ta ON ta.country_code = ms.country_code AND ta.pm_type = ms.pm_type
             ORDER BY ms.payment_method_code, ms.country_code",
        )?;
        let rows = stmt
            .query_map(params![p.country, p.as_of], |row| {
                Ok(PerformanceAlertCandidate {
                    payment_method_code: row.get(0)?,
                    payment_method_name: row.get(1)?,
                    payment_method_type: row.get(2)?,
                    country_code: row.get(3)?,
                    approval_rate: row.get(4)?,
                    country_type_avg_approval: row.get(5)?,
                    transaction_count: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
