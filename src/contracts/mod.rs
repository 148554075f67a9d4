// Module declarations
pub(crate) mod contracts_model;
pub(crate) mod contracts_repository;
pub(crate) mod contracts_traits;

// Re-export the public interface
pub use contracts_model::{Contract, ContractStatus, PricingKind};
pub use contracts_repository::ContractRepository;
pub use contracts_traits::ContractRepositoryTrait;
