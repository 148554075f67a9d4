use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::errors::Result;
use crate::schema::contracts;

use super::contracts_model::{Contract, ContractDB, ContractStatus};
use super::contracts_traits::ContractRepositoryTrait;

/// Product class this engine values.
pub const PRODUCT_SOYBEAN: &str = "SOYBEAN";

pub struct ContractRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl ContractRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl ContractRepositoryTrait for ContractRepository {
    fn list_candidates(&self, farm_id: i64, only_open: bool, limit: i64) -> Result<Vec<Contract>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = contracts::table
            .filter(contracts::farm_id.eq(farm_id))
            .filter(contracts::product.eq(PRODUCT_SOYBEAN))
            .into_boxed();

        if only_open {
            query = query.filter(contracts::status.eq(ContractStatus::Open.as_str()));
        }

        let rows: Vec<ContractDB> = query
            .order(contracts::id.desc())
            .limit(limit)
            .load::<ContractDB>(&mut conn)?;

        Ok(rows.into_iter().map(Contract::from).collect())
    }
}
