use crate::errors::Result;

use super::contracts_model::Contract;

/// Trait defining the contract-loading operations the engine needs.
pub trait ContractRepositoryTrait: Send + Sync {
    /// Candidate contracts for a farm: relevant product class only,
    /// optionally restricted to open contracts, newest first, capped.
    fn list_candidates(&self, farm_id: i64, only_open: bool, limit: i64) -> Result<Vec<Contract>>;
}
