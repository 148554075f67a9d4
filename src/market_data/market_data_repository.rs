use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::db::get_connection;
use crate::errors::Result;
use crate::schema::{futures_quotes, fx_curve_points, fx_curve_runs, fx_manual_quotes};
use crate::utils::latest_by_key;

use super::market_data_model::{
    FuturesQuote, FuturesQuoteDB, FxCurvePoint, FxCurvePointDB, FxCurveRun, FxCurveRunDB,
    FxCurveSnapshot, FxManualQuote, FxManualQuoteDB,
};
use super::market_data_traits::MarketDataRepositoryTrait;

pub struct MarketDataRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl MarketDataRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl MarketDataRepositoryTrait for MarketDataRepository {
    fn latest_futures_quotes(
        &self,
        farm_id: i64,
        pairs: &HashSet<(String, NaiveDate)>,
    ) -> Result<HashMap<(String, NaiveDate), FuturesQuote>> {
        let pairs: HashSet<(String, NaiveDate)> = pairs
            .iter()
            .filter(|(s, _)| !s.trim().is_empty())
            .map(|(s, rm)| (s.trim().to_string(), *rm))
            .collect();
        if pairs.is_empty() {
            return Ok(HashMap::new());
        }

        // One fetch over the cartesian superset, narrowed to the wanted
        // pairs after the keyed-latest reduction.
        let symbols: Vec<String> = pairs.iter().map(|(s, _)| s.clone()).collect();
        let months: Vec<NaiveDate> = pairs.iter().map(|(_, rm)| *rm).collect();

        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<FuturesQuoteDB> = futures_quotes::table
            .filter(futures_quotes::farm_id.eq(farm_id))
            .filter(futures_quotes::symbol.eq_any(&symbols))
            .filter(futures_quotes::ref_month.eq_any(&months))
            .load::<FuturesQuoteDB>(&mut conn)
            .map_err(super::MarketDataError::from)?;

        let quotes: Vec<FuturesQuote> = rows.into_iter().map(FuturesQuote::from).collect();
        let mut latest = latest_by_key(
            quotes,
            |q| (q.symbol.clone(), q.ref_month),
            |q| (q.captured_at, q.id),
        );
        latest.retain(|key, _| pairs.contains(key));
        Ok(latest)
    }

    fn latest_curve_points(
        &self,
        farm_id: i64,
        ref_months: &HashSet<NaiveDate>,
    ) -> Result<HashMap<NaiveDate, FxCurveSnapshot>> {
        if ref_months.is_empty() {
            return Ok(HashMap::new());
        }
        let months: Vec<NaiveDate> = ref_months.iter().copied().collect();

        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<(FxCurveRunDB, FxCurvePointDB)> = fx_curve_runs::table
            .inner_join(fx_curve_points::table)
            .filter(fx_curve_runs::farm_id.eq(farm_id))
            .filter(fx_curve_points::ref_month.eq_any(&months))
            .load::<(FxCurveRunDB, FxCurvePointDB)>(&mut conn)
            .map_err(super::MarketDataError::from)?;

        let snapshots: Vec<FxCurveSnapshot> = rows
            .into_iter()
            .map(|(run, point)| FxCurveSnapshot {
                run: FxCurveRun::from(run),
                point: FxCurvePoint::from(point),
            })
            .collect();

        // A run holds at most one point per month, so (as_of, run id) fully
        // orders the candidates for a month.
        Ok(latest_by_key(
            snapshots,
            |s| s.point.ref_month,
            |s| (s.run.as_of, s.run.id),
        ))
    }

    fn latest_manual_quotes(
        &self,
        farm_id: i64,
        ref_months: &HashSet<NaiveDate>,
    ) -> Result<HashMap<NaiveDate, FxManualQuote>> {
        if ref_months.is_empty() {
            return Ok(HashMap::new());
        }
        let months: Vec<NaiveDate> = ref_months.iter().copied().collect();

        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<FxManualQuoteDB> = fx_manual_quotes::table
            .filter(fx_manual_quotes::farm_id.eq(farm_id))
            .filter(fx_manual_quotes::ref_month.eq_any(&months))
            .load::<FxManualQuoteDB>(&mut conn)
            .map_err(super::MarketDataError::from)?;

        let quotes: Vec<FxManualQuote> = rows.into_iter().map(FxManualQuote::from).collect();
        Ok(latest_by_key(
            quotes,
            |q| q.ref_month,
            |q| (q.captured_at, q.id),
        ))
    }
}
