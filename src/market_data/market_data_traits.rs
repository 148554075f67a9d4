use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

use crate::errors::Result;

use super::market_data_model::{FuturesQuote, FxCurveSnapshot, FxManualQuote};

/// Batch "latest quote per key" lookups over the keys a valuation run
/// actually needs. Missing keys are simply absent from the result map.
pub trait MarketDataRepositoryTrait: Send + Sync {
    /// Latest capture per (symbol, reference month) pair.
    fn latest_futures_quotes(
        &self,
        farm_id: i64,
        pairs: &HashSet<(String, NaiveDate)>,
    ) -> Result<HashMap<(String, NaiveDate), FuturesQuote>>;

    /// Curve point of the most recent model run, per reference month.
    fn latest_curve_points(
        &self,
        farm_id: i64,
        ref_months: &HashSet<NaiveDate>,
    ) -> Result<HashMap<NaiveDate, FxCurveSnapshot>>;

    /// Latest manual quote per reference month.
    fn latest_manual_quotes(
        &self,
        farm_id: i64,
        ref_months: &HashSet<NaiveDate>,
    ) -> Result<HashMap<NaiveDate, FxManualQuote>>;
}
