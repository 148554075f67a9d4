use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::get_connection;
use crate::errors::Result;
use crate::schema::{currency_hedges, futures_hedges, premium_hedges};
use crate::utils::latest_by_key;

use super::hedges_model::{
    CurrencyHedge, CurrencyHedgeDB, FuturesHedge, FuturesHedgeDB, PremiumHedge, PremiumHedgeDB,
};
use super::hedges_traits::HedgeRepositoryTrait;

pub struct HedgeRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl HedgeRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

// Each lookup is a single eq_any fetch over the candidate set, reduced to
// one record per contract in memory. Never one query per contract.
impl HedgeRepositoryTrait for HedgeRepository {
    fn latest_futures_by_contract(
        &self,
        contract_ids: &[i64],
    ) -> Result<HashMap<i64, FuturesHedge>> {
        if contract_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = get_connection(&self.pool)?;

        let rows: Vec<FuturesHedgeDB> = futures_hedges::table
            .filter(futures_hedges::contract_id.eq_any(contract_ids))
            .load::<FuturesHedgeDB>(&mut conn)?;

        let hedges: Vec<FuturesHedge> = rows.into_iter().map(FuturesHedge::from).collect();
        Ok(latest_by_key(
            hedges,
            |h| h.contract_id,
            |h| (h.executed_at, h.id),
        ))
    }

    fn latest_premium_by_contract(
        &self,
        contract_ids: &[i64],
    ) -> Result<HashMap<i64, PremiumHedge>> {
        if contract_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = get_connection(&self.pool)?;

        let rows: Vec<PremiumHedgeDB> = premium_hedges::table
            .filter(premium_hedges::contract_id.eq_any(contract_ids))
            .load::<PremiumHedgeDB>(&mut conn)?;

        let hedges: Vec<PremiumHedge> = rows.into_iter().map(PremiumHedge::from).collect();
        Ok(latest_by_key(
            hedges,
            |h| h.contract_id,
            |h| (h.executed_at, h.id),
        ))
    }

    fn latest_currency_by_contract(
        &self,
        contract_ids: &[i64],
    ) -> Result<HashMap<i64, CurrencyHedge>> {
        if contract_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = get_connection(&self.pool)?;

        let rows: Vec<CurrencyHedgeDB> = currency_hedges::table
            .filter(currency_hedges::contract_id.eq_any(contract_ids))
            .load::<CurrencyHedgeDB>(&mut conn)?;

        let hedges: Vec<CurrencyHedge> = rows.into_iter().map(CurrencyHedge::from).collect();
        Ok(latest_by_key(
            hedges,
            |h| h.contract_id,
            |h| (h.executed_at, h.id),
        ))
    }
}
