// Module declarations
pub(crate) mod mtm_calculator;
pub(crate) mod mtm_errors;
pub(crate) mod mtm_filter;
pub(crate) mod mtm_model;
pub(crate) mod mtm_service;
pub(crate) mod mtm_traits;

#[cfg(test)]
mod mtm_service_tests;

// Re-export the public interface
pub use mtm_errors::MtmError;
pub use mtm_filter::{FilterOutcome, LegCoverages, LockFilter};
pub use mtm_model::{
    CbotLock, FilterDiagnostics, FilteredView, FuturesQuoteBrief, FxCurveBrief, FxLock,
    FxLockMode, FxManualBrief, LegDiagnostics, LockLeg, LockState, LocksInfo, MtmQuery,
    MtmResponse, MtmRow, PremiumLock, QuotesInfo, SideModes, SideValues, Totals, Valuation,
    ValuationMode,
};
pub use mtm_service::MtmService;
pub use mtm_traits::MtmServiceTrait;
