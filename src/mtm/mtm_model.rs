use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::contracts::Contract;
use crate::hedges::PremiumUnit;

/// Which live-rate side(s) the caller wants valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValuationMode {
    System,
    Manual,
    Both,
}

impl ValuationMode {
    pub fn includes_system(&self) -> bool {
        matches!(self, ValuationMode::System | ValuationMode::Both)
    }

    pub fn includes_manual(&self) -> bool {
        matches!(self, ValuationMode::Manual | ValuationMode::Both)
    }
}

/// One of the three hedge legs, as a filter selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockLeg {
    Cbot,
    Premium,
    Fx,
}

/// Binary lock state of a leg: locked iff coverage > 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    Locked,
    Open,
}

/// How the locked/unlocked USD split of a side was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FxLockMode {
    None,
    UsdAmount,
    Coverage,
}

/// Input to a valuation run. Defaults mirror the HTTP surface that fronts
/// this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MtmQuery {
    pub farm_id: i64,
    pub mode: ValuationMode,
    pub only_open: bool,
    /// Forced FX reference month, `YYYY-MM-30`.
    pub ref_month: Option<String>,
    /// Fallback symbol when a contract has no futures hedge carrying one.
    /// `AUTO` derives the symbol from the reference month.
    pub default_symbol: String,
    pub limit: i64,
    /// CSV of `cbot|premium|fx`.
    pub lock_types: Option<String>,
    /// CSV of `locked|open`.
    pub lock_states: Option<String>,
    /// Restrict the universe to fixed-price contracts, bypassing lock
    /// filtering.
    pub no_locks: bool,
}

impl Default for MtmQuery {
    fn default() -> Self {
        MtmQuery {
            farm_id: 0,
            mode: ValuationMode::Both,
            only_open: true,
            ref_month: None,
            default_symbol: "ZS=F".to_string(),
            limit: 200,
            lock_types: None,
            lock_states: None,
            no_locks: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CbotLock {
    pub locked: bool,
    pub coverage: f64,
    pub locked_cents_per_bu: Option<f64>,
    pub symbol: Option<String>,
    pub ref_month: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumLock {
    pub locked: bool,
    pub coverage: f64,
    pub premium_value: Option<f64>,
    pub premium_unit: Option<PremiumUnit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxLock {
    pub locked: bool,
    pub coverage: f64,
    pub brl_per_usd: Option<f64>,
    pub kind: Option<String>,
    pub usd_amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocksInfo {
    pub cbot: CbotLock,
    pub premium: PremiumLock,
    pub fx: FxLock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesQuoteBrief {
    pub symbol: String,
    pub captured_at: DateTime<Utc>,
    pub cents_per_bu: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxCurveBrief {
    pub captured_at: DateTime<Utc>,
    pub ref_month: NaiveDate,
    pub brl_per_usd: f64,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxManualBrief {
    pub captured_at: DateTime<Utc>,
    pub ref_month: NaiveDate,
    pub brl_per_usd: f64,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotesInfo {
    pub cbot: Option<FuturesQuoteBrief>,
    pub fx_system: Option<FxCurveBrief>,
    pub fx_manual: Option<FxManualBrief>,
}

/// A value carried once per requested side.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideValues {
    pub system: Option<f64>,
    pub manual: Option<f64>,
}

impl SideValues {
    pub fn both(v: Option<f64>) -> Self {
        SideValues { system: v, manual: v }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideModes {
    pub system: FxLockMode,
    pub manual: FxLockMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    pub usd_per_sack: SideValues,
    pub brl_per_sack: SideValues,
    /// Every intermediate rate that fed the valuation, for diagnostics.
    pub components: BTreeMap<String, SideValues>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub ton_total: f64,
    pub sacks_total: f64,
    pub usd_total: Option<f64>,
    pub brl_total: SideValues,
    pub fx_locked_usd: SideValues,
    pub fx_unlocked_usd: SideValues,
    pub fx_lock_mode: SideModes,
    pub fx_locked_pct: SideValues,
    pub fx_unlocked_pct: SideValues,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegDiagnostics {
    pub state: LockState,
    pub coverage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDiagnostics {
    pub cbot: LegDiagnostics,
    pub premium: LegDiagnostics,
    pub fx: LegDiagnostics,
    pub locked_fraction: f64,
    pub open_fraction: f64,
    pub slice: f64,
}

/// Totals scaled to the requested lock-state slice. Percentages describe
/// ratios and are never scaled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredView {
    pub ton_total: f64,
    pub sacks_total: f64,
    pub usd_total: Option<f64>,
    pub brl_total: SideValues,
    pub fx_locked_usd: SideValues,
    pub fx_unlocked_usd: SideValues,
    pub diagnostics: FilterDiagnostics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MtmRow {
    pub contract: Contract,
    pub locks: LocksInfo,
    pub quotes: QuotesInfo,
    pub valuation: Valuation,
    pub totals: Totals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered: Option<FilteredView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MtmResponse {
    pub farm_id: i64,
    pub as_of: DateTime<Utc>,
    pub mode: ValuationMode,
    pub fx_ref_month: Option<NaiveDate>,
    pub rows: Vec<MtmRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fx_lock_mode_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&FxLockMode::None).unwrap(), "\"none\"");
        assert_eq!(
            serde_json::to_string(&FxLockMode::UsdAmount).unwrap(),
            "\"usd_amount\""
        );
        assert_eq!(
            serde_json::to_string(&FxLockMode::Coverage).unwrap(),
            "\"coverage\""
        );
    }

    #[test]
    fn query_fields_serialize_camel_case() {
        let q = MtmQuery {
            farm_id: 7,
            ref_month: Some("2026-06-30".to_string()),
            lock_types: Some("cbot,fx".to_string()),
            ..MtmQuery::default()
        };
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["farmId"], 7);
        assert_eq!(json["mode"], "both");
        assert_eq!(json["refMonth"], "2026-06-30");
        assert_eq!(json["lockTypes"], "cbot,fx");
        assert_eq!(json["defaultSymbol"], "ZS=F");
        assert_eq!(json["onlyOpen"], true);
    }

    #[test]
    fn side_values_serialize_with_explicit_nulls() {
        let v = SideValues {
            system: Some(1.5),
            manual: None,
        };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["system"], 1.5);
        assert!(json["manual"].is_null());
    }
}
