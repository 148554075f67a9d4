// Module declarations
pub(crate) mod hedges_model;
pub(crate) mod hedges_repository;
pub(crate) mod hedges_traits;

// Re-export the public interface
pub use hedges_model::{CurrencyHedge, FuturesHedge, PremiumHedge, PremiumUnit};
pub use hedges_repository::HedgeRepository;
pub use hedges_traits::HedgeRepositoryTrait;
