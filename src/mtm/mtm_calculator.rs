use chrono::{Datelike, NaiveDate};

use crate::constants::{
    AUTO_SYMBOL, BUSHELS_PER_SACK, COVERAGE_FULL, COVERAGE_NONE, DIV_EPSILON,
    FUTURES_MONTH_CODES, FUTURES_SYMBOL_ROOT, FUTURES_SYMBOL_SUFFIX, REF_MONTH_DAY, SACKS_PER_TON,
    TONS_PER_BUSHEL,
};
use crate::contracts::Contract;
use crate::errors::{Result, ValidationError};
use crate::hedges::{PremiumHedge, PremiumUnit};

use super::mtm_model::FxLockMode;

/// Canonical reference-month key for a date: day 30 of its month.
/// February has no day 30; it keys on its final day instead.
pub fn ref_month_of(d: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(d.year(), d.month(), REF_MONTH_DAY).unwrap_or_else(|| {
        let first_next = if d.month() == 12 {
            NaiveDate::from_ymd_opt(d.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(d.year(), d.month() + 1, 1)
        };
        first_next.expect("valid first of month") - chrono::Duration::days(1)
    })
}

/// Parses a forced reference month, which must spell the day-30 sentinel.
pub fn parse_ref_month(s: &str) -> Result<NaiveDate> {
    let invalid = || ValidationError::InvalidRefMonth(s.to_string());

    let mut parts = s.trim().splitn(3, '-');
    let year: i32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let month: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let day: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;

    if day != REF_MONTH_DAY {
        return Err(invalid().into());
    }
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid().into())
}

/// Derives the exchange symbol for a reference month:
/// root + month code + two-digit year + exchange suffix, e.g. `ZSM26.CBT`.
pub fn auto_symbol(ref_month: NaiveDate) -> Result<String> {
    let month = ref_month.month();
    let code = FUTURES_MONTH_CODES
        .get(month as usize - 1)
        .ok_or(ValidationError::UnmappedMonth(month))?;
    let yy = ref_month.year().rem_euclid(100);
    Ok(format!(
        "{}{}{:02}{}",
        FUTURES_SYMBOL_ROOT, code, yy, FUTURES_SYMBOL_SUFFIX
    ))
}

/// Resolves the effective futures symbol for a contract's hedge.
pub fn resolve_symbol(
    hedge_symbol: Option<&str>,
    default_symbol: &str,
    ref_month: NaiveDate,
) -> Result<String> {
    let symbol = hedge_symbol
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default_symbol)
        .trim()
        .to_string();

    if symbol.eq_ignore_ascii_case(AUTO_SYMBOL) {
        auto_symbol(ref_month)
    } else {
        Ok(symbol)
    }
}

/// Normalizes a futures price to cents per bushel.
///
/// Hedge records and live quotes historically mix dollars and cents. With a
/// live quote to compare against, the value is rescaled by the power of ten
/// (x1, x100, x1000) that lands closest to the quote, accepted only while
/// the rescaled/quote ratio stays within [0.1, 10]. A lone value below 50
/// is assumed to be dollars and multiplied by 100.
pub fn normalize_futures_cents(value: f64, live_hint: Option<f64>) -> f64 {
    match live_hint {
        Some(hint) if hint.abs() > DIV_EPSILON => {
            let mut best = value;
            let mut best_dist = f64::INFINITY;
            for scale in [1.0, 100.0, 1000.0] {
                let candidate = value * scale;
                let dist = (candidate - hint).abs();
                if dist < best_dist {
                    best = candidate;
                    best_dist = dist;
                }
            }
            let ratio = best / hint;
            if (0.1..=10.0).contains(&ratio) {
                best
            } else {
                value
            }
        }
        _ => {
            if value < 50.0 {
                value * 100.0
            } else {
                value
            }
        }
    }
}

pub fn cents_to_usd_per_bu(cents: Option<f64>) -> Option<f64> {
    cents.map(|c| c / 100.0)
}

/// Premium in USD per bushel; unrecognized units contribute zero.
pub fn premium_usd_per_bu(hedge: &PremiumHedge) -> f64 {
    match hedge.premium_unit {
        PremiumUnit::UsdPerBushel => hedge.premium_value,
        PremiumUnit::UsdPerTon => hedge.premium_value * TONS_PER_BUSHEL,
        PremiumUnit::Unknown => 0.0,
    }
}

/// Fixed BRL price per sack. A per-ton tag converts; anything else is
/// already per sack.
pub fn fixed_price_per_sack(contract: &Contract) -> Option<f64> {
    let value = contract.fixed_price_value?;
    let unit = contract
        .fixed_price_unit
        .as_deref()
        .map(|u| u.trim().to_uppercase())
        .unwrap_or_default();

    match unit.as_str() {
        "BRL_TON" | "BRL/TON" => Some(value / SACKS_PER_TON),
        _ => Some(value),
    }
}

/// Total freight in BRL: flat total, else per-ton rate x volume, else zero.
/// The two fields are mutually exclusive by upstream validation.
pub fn freight_total_brl(contract: &Contract) -> f64 {
    if let Some(total) = contract.freight_total_brl {
        return total;
    }
    if let Some(per_ton) = contract.freight_per_ton_brl {
        return per_ton * contract.volume_ton.max(0.0);
    }
    0.0
}

/// Whole sacks for a tonnage; rounded to dodge float artifacts like
/// 41.999999999 sacks.
pub fn sacks_total(volume_ton: f64) -> f64 {
    (volume_ton.max(0.0) * SACKS_PER_TON).round()
}

pub fn usd_per_bu_to_usd_per_sack(usd_per_bu: Option<f64>) -> Option<f64> {
    usd_per_bu.map(|v| v * BUSHELS_PER_SACK)
}

/// Fraction of the contract volume a hedge covers, clamped to [0, 1].
pub fn coverage(hedge_volume_ton: Option<f64>, contract_volume_ton: f64) -> f64 {
    let hedged = hedge_volume_ton.unwrap_or(0.0);
    if contract_volume_ton <= 0.0 {
        return 0.0;
    }
    (hedged / contract_volume_ton).clamp(0.0, 1.0)
}

/// Coverage-weighted blend of a locked value with a live value.
///
/// Full coverage returns the locked value, zero coverage the live value,
/// and a lone present operand wins outright; only genuine partial coverage
/// with both operands produces the weighted average.
pub fn mix(coverage: f64, locked: Option<f64>, live: Option<f64>) -> Option<f64> {
    let cov = coverage.clamp(0.0, 1.0);

    if cov >= COVERAGE_FULL {
        return locked;
    }
    if cov <= COVERAGE_NONE {
        return live;
    }

    match (locked, live) {
        (None, None) => None,
        (Some(l), None) => Some(l),
        (None, Some(v)) => Some(v),
        (Some(l), Some(v)) => Some(cov * l + (1.0 - cov) * v),
    }
}

pub fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (a, b) = (numerator?, denominator?);
    if b.abs() < DIV_EPSILON {
        return None;
    }
    Some(a / b)
}

/// `part / total` clamped to [0, 1]; None when either is absent or the
/// total is effectively zero.
pub fn safe_pct(part: Option<f64>, total: Option<f64>) -> Option<f64> {
    let (p, t) = (part?, total?);
    if t.abs() < DIV_EPSILON {
        return None;
    }
    Some((p / t).clamp(0.0, 1.0))
}

/// Output-boundary rounding; computation stays unrounded.
pub fn round_opt(value: Option<f64>, decimals: u32) -> Option<f64> {
    value.map(|v| round_to(v, decimals))
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// BRL-per-sack conversion of a USD valuation, with the locked/unlocked
/// USD split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FxBreakdown {
    pub brl_per_sack: Option<f64>,
    pub locked_usd: Option<f64>,
    pub unlocked_usd: Option<f64>,
    pub mode: FxLockMode,
}

impl FxBreakdown {
    fn none(locked_usd: Option<f64>, unlocked_usd: Option<f64>) -> Self {
        FxBreakdown {
            brl_per_sack: None,
            locked_usd,
            unlocked_usd,
            mode: FxLockMode::None,
        }
    }
}

/// Converts a USD/sack valuation to BRL/sack against one live-rate source,
/// splitting the USD total into the portion valued at the locked rate and
/// the portion still exposed.
///
/// The five cases are mutually exclusive; `mode` records which path was
/// taken so callers can assert the `locked + unlocked == total` invariant.
pub fn fx_breakdown(
    usd_per_sack: Option<f64>,
    sacks: f64,
    locked_rate: Option<f64>,
    locked_usd_amount: Option<f64>,
    live_rate: Option<f64>,
    coverage_fallback: f64,
) -> FxBreakdown {
    let usd_per_sack = match usd_per_sack {
        Some(v) if sacks > 0.0 => v,
        _ => return FxBreakdown::none(None, None),
    };
    let usd_total = usd_per_sack * sacks;

    if live_rate.is_none() && locked_rate.is_none() {
        return FxBreakdown::none(Some(0.0), Some(usd_total));
    }

    // Nothing locked: the whole exposure rides the live rate.
    if locked_rate.is_none() && locked_usd_amount.is_none() {
        let live = match live_rate {
            Some(r) => r,
            None => return FxBreakdown::none(Some(0.0), Some(usd_total)),
        };
        return FxBreakdown {
            brl_per_sack: Some(usd_total * live / sacks),
            locked_usd: Some(0.0),
            unlocked_usd: Some(usd_total),
            mode: FxLockMode::None,
        };
    }

    // Capped amount: the cap (clamped to the contract total) converts at
    // the locked rate, the remainder at the live rate.
    if let (Some(amount), Some(locked)) = (locked_usd_amount, locked_rate) {
        if usd_total > 0.0 {
            let locked_usd = amount.min(usd_total).max(0.0);
            let unlocked_usd = usd_total - locked_usd;
            let live = live_rate.unwrap_or(locked);
            let brl_total = locked_usd * locked + unlocked_usd * live;
            return FxBreakdown {
                brl_per_sack: Some(brl_total / sacks),
                locked_usd: Some(locked_usd),
                unlocked_usd: Some(unlocked_usd),
                mode: FxLockMode::UsdAmount,
            };
        }
    }

    let locked = match locked_rate {
        Some(r) => r,
        None => {
            // Amount without a rate cannot be valued as a lock.
            let live = match live_rate {
                Some(r) => r,
                None => return FxBreakdown::none(Some(0.0), Some(usd_total)),
            };
            return FxBreakdown {
                brl_per_sack: Some(usd_total * live / sacks),
                locked_usd: Some(0.0),
                unlocked_usd: Some(usd_total),
                mode: FxLockMode::None,
            };
        }
    };

    // Coverage fallback: blend the rates and split the USD total by the
    // hedged fraction.
    let effective = match mix(coverage_fallback, Some(locked), live_rate) {
        Some(rate) => rate,
        None => return FxBreakdown::none(Some(0.0), Some(usd_total)),
    };

    let cov = coverage_fallback.clamp(0.0, 1.0);
    let locked_usd = usd_total * cov;
    FxBreakdown {
        brl_per_sack: Some(usd_per_sack * effective),
        locked_usd: Some(locked_usd),
        unlocked_usd: Some(usd_total - locked_usd),
        mode: FxLockMode::Coverage,
    }
}
