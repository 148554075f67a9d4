// Module declarations
pub(crate) mod market_data_errors;
pub(crate) mod market_data_model;
pub(crate) mod market_data_repository;
pub(crate) mod market_data_traits;

// Re-export the public interface
pub use market_data_errors::MarketDataError;
pub use market_data_model::{
    FuturesQuote, FxCurvePoint, FxCurveRun, FxCurveSnapshot, FxManualQuote,
};
pub use market_data_repository::MarketDataRepository;
pub use market_data_traits::MarketDataRepositoryTrait;
