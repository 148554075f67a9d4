use async_trait::async_trait;

use crate::errors::Result;

use super::mtm_model::{MtmQuery, MtmResponse};

/// Trait defining the contract for MTM service operations.
#[async_trait]
pub trait MtmServiceTrait: Send + Sync {
    /// Values a farm's candidate contracts against the freshest hedges and
    /// market data, optionally filtered and sliced by lock state.
    async fn contracts_mtm(&self, query: MtmQuery) -> Result<MtmResponse>;
}
