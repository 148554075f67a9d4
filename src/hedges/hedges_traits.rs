use std::collections::HashMap;

use crate::errors::Result;

use super::hedges_model::{CurrencyHedge, FuturesHedge, PremiumHedge};

/// Batch "latest hedge per contract" lookups. Absence of an entry means the
/// leg is unhedged for that contract (coverage 0).
pub trait HedgeRepositoryTrait: Send + Sync {
    fn latest_futures_by_contract(
        &self,
        contract_ids: &[i64],
    ) -> Result<HashMap<i64, FuturesHedge>>;

    fn latest_premium_by_contract(
        &self,
        contract_ids: &[i64],
    ) -> Result<HashMap<i64, PremiumHedge>>;

    fn latest_currency_by_contract(
        &self,
        contract_ids: &[i64],
    ) -> Result<HashMap<i64, CurrencyHedge>>;
}
