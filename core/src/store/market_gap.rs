//! Store queries feeding the Market Gap Scorer.

use super::{FilterParams, PaymentStore};
use crate::{
    aggregate::{CatalogGap, CoverageRow},
    error::EngineResult,
    provider::AnalysisFilter,
};
use rusqlite::params;

impl PaymentStore {
    /// Catalog entries with no transaction inside the trailing window,
    /// ordered by country then market share (largest first).
    pub fn market_gaps(
        &self,
        filter: &AnalysisFilter,
        only_essential: bool,
    ) -> EngineResult<Vec<CatalogGap>> {
        let p = FilterParams::from_filter(filter);
        let mut stmt = self.conn.prepare(
            "SELECT c.country_code, c.payment_method_code, COALESCE(c.market_share_pct, 0.0),
                    c.is_essential, COALESCE(c.source, '')
             FROM country_payment_catalog c
             WHERE (?1 = '' OR c.country_code = ?1)
               AND (?4 = 0 OR c.is_essential = 1)
               AND NOT EXISTS (
                   SELECT 1 FROM payment_transaction t
                   WHERE t.payment_method_code = c.payment_method_code
                     AND t.country_code = c.country_code
                     AND t.transaction_date >= ?2 AND t.transaction_date <= ?3
               )
             ORDER BY c.country_code, COALESCE(c.market_share_pct, 0.0) DESC, c.payment_method_code",
        )?;
        let rows = stmt
            .query_map(
                params![p.country, p.trailing_start, p.as_of, only_essential],
                |row| {
                    Ok(CatalogGap {
                        country_code: row.get(0)?,
                        payment_method_code: row.get(1)?,
                        market_share_pct: row.get(2)?,
                        is_essential: row.get(3)?,
                        source: row.get(4)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Catalog size and number of catalog methods active in the trailing
    /// window, per country.
    pub fn coverage(&self, filter: &AnalysisFilter) -> EngineResult<Vec<CoverageRow>> {
        let p = FilterParams::from_filter(filter);
        let mut stmt = self.conn.prepare(
            "SELECT c.country_code,
                    COUNT(DISTINCT c.payment_method_code) AS total_methods,
                    COUNT(DISTINCT t.payment_method_code) AS active_methods
             FROM country_payment_catalog c
             LEFT JOIN payment_transaction t
                    ON t.payment_method_code = c.payment_method_code
                   AND t.country_code = c.country_code
                   AND t.transaction_date >= ?2 AND t.transaction_date <= ?3
             WHERE (?1 = '' OR c.country_code = ?1)
             GROUP BY c.country_code
             ORDER BY c.country_code",
        )?;
        let rows = stmt
            .query_map(params![p.country, p.trailing_start, p.as_of], |row| {
                Ok(CoverageRow {
                    country_code: row.get(0)?,
                    total_catalog_methods: row.get(1)?,
                    active_methods: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
