use crate::errors::Result;

use super::mtm_errors::MtmError;
use super::mtm_model::{
    FilterDiagnostics, FilteredView, LegDiagnostics, LockLeg, LockState, MtmRow, SideValues,
};

/// Parsed lock-state filter: which legs to look at, which binary states to
/// keep, and whether the caller asked for the fixed-price-only universe.
#[derive(Debug, Clone, PartialEq)]
pub struct LockFilter {
    pub legs: Vec<LockLeg>,
    pub states: Vec<LockState>,
    pub no_locks: bool,
}

/// Per-leg coverages of one contract, the filter's only input.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegCoverages {
    pub cbot: f64,
    pub premium: f64,
    pub fx: f64,
}

/// Outcome for a kept contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterOutcome {
    pub locked_fraction: f64,
    pub open_fraction: f64,
    pub slice: f64,
}

impl LockFilter {
    /// Builds a filter from the raw CSV selectors. Returns `None` when no
    /// filter is active. Supplying only one CSV implies the full set for
    /// the other dimension.
    pub fn parse(
        lock_types: Option<&str>,
        lock_states: Option<&str>,
        no_locks: bool,
    ) -> Result<Option<LockFilter>> {
        if lock_types.is_none() && lock_states.is_none() && !no_locks {
            return Ok(None);
        }

        let legs = match lock_types {
            Some(csv) => parse_csv(csv, parse_leg)?,
            None => vec![LockLeg::Cbot, LockLeg::Premium, LockLeg::Fx],
        };
        let states = match lock_states {
            Some(csv) => parse_csv(csv, parse_state)?,
            None => vec![LockState::Locked, LockState::Open],
        };

        Ok(Some(LockFilter {
            legs,
            states,
            no_locks,
        }))
    }

    /// Evaluates one contract against the filter. `None` means excluded.
    ///
    /// Locked-fraction is the intersection of the selected legs' locked
    /// volume (their minimum coverage); open-fraction the intersection of
    /// their open volume (one minus their maximum coverage).
    pub fn evaluate(&self, coverages: LegCoverages) -> Option<FilterOutcome> {
        let selected: Vec<f64> = self
            .legs
            .iter()
            .map(|leg| match leg {
                LockLeg::Cbot => coverages.cbot,
                LockLeg::Premium => coverages.premium,
                LockLeg::Fx => coverages.fx,
            })
            .collect();

        let min_cov = selected.iter().copied().fold(f64::INFINITY, f64::min);
        let max_cov = selected.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let locked_fraction = min_cov.clamp(0.0, 1.0);
        let open_fraction = (1.0 - max_cov).clamp(0.0, 1.0);

        let want_locked = self.states.contains(&LockState::Locked);
        let want_open = self.states.contains(&LockState::Open);

        let slice = match (want_locked, want_open) {
            (true, true) => {
                if locked_fraction > 0.0 || open_fraction > 0.0 {
                    1.0
                } else {
                    return None;
                }
            }
            (true, false) => {
                if locked_fraction > 0.0 {
                    locked_fraction
                } else {
                    return None;
                }
            }
            (false, true) => {
                if open_fraction > 0.0 {
                    open_fraction
                } else {
                    return None;
                }
            }
            // An empty state set matches nothing.
            (false, false) => return None,
        };

        Some(FilterOutcome {
            locked_fraction,
            open_fraction,
            slice,
        })
    }
}

/// Scales a row's monetary and volume totals by the slice. Percentages are
/// ratios and stay as computed.
pub fn filtered_view(row: &MtmRow, coverages: LegCoverages, outcome: FilterOutcome) -> FilteredView {
    let slice = outcome.slice;
    let scale = |v: Option<f64>| v.map(|x| x * slice);
    let scale_side = |s: SideValues| SideValues {
        system: scale(s.system),
        manual: scale(s.manual),
    };

    FilteredView {
        ton_total: row.totals.ton_total * slice,
        sacks_total: row.totals.sacks_total * slice,
        usd_total: scale(row.totals.usd_total),
        brl_total: scale_side(row.totals.brl_total),
        fx_locked_usd: scale_side(row.totals.fx_locked_usd),
        fx_unlocked_usd: scale_side(row.totals.fx_unlocked_usd),
        diagnostics: FilterDiagnostics {
            cbot: leg_diag(coverages.cbot),
            premium: leg_diag(coverages.premium),
            fx: leg_diag(coverages.fx),
            locked_fraction: outcome.locked_fraction,
            open_fraction: outcome.open_fraction,
            slice,
        },
    }
}

fn leg_diag(coverage: f64) -> LegDiagnostics {
    LegDiagnostics {
        state: if coverage > 0.0 {
            LockState::Locked
        } else {
            LockState::Open
        },
        coverage,
    }
}

fn parse_csv<T, F>(csv: &str, parse: F) -> Result<Vec<T>>
where
    T: PartialEq,
    F: Fn(&str) -> Result<T>,
{
    let mut out = Vec::new();
    for token in csv.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let value = parse(token)?;
        if !out.contains(&value) {
            out.push(value);
        }
    }
    if out.is_empty() {
        return Err(MtmError::InvalidLockSelector(csv.to_string()).into());
    }
    Ok(out)
}

fn parse_leg(token: &str) -> Result<LockLeg> {
    match token.to_lowercase().as_str() {
        "cbot" => Ok(LockLeg::Cbot),
        "premium" => Ok(LockLeg::Premium),
        "fx" => Ok(LockLeg::Fx),
        _ => Err(MtmError::InvalidLockSelector(token.to_string()).into()),
    }
}

fn parse_state(token: &str) -> Result<LockState> {
    match token.to_lowercase().as_str() {
        "locked" => Ok(LockState::Locked),
        "open" => Ok(LockState::Open),
        _ => Err(MtmError::InvalidLockSelector(token.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn cov(cbot: f64, premium: f64, fx: f64) -> LegCoverages {
        LegCoverages { cbot, premium, fx }
    }

    fn filter(types: Option<&str>, states: Option<&str>) -> LockFilter {
        LockFilter::parse(types, states, false).unwrap().unwrap()
    }

    #[test]
    fn no_selectors_means_no_filter() {
        assert_eq!(LockFilter::parse(None, None, false).unwrap(), None);
        assert!(LockFilter::parse(None, None, true).unwrap().is_some());
    }

    #[test]
    fn missing_dimension_defaults_to_full_set() {
        let f = filter(Some("cbot"), None);
        assert_eq!(f.legs, vec![LockLeg::Cbot]);
        assert_eq!(f.states, vec![LockState::Locked, LockState::Open]);

        let f = filter(None, Some("locked"));
        assert_eq!(f.legs, vec![LockLeg::Cbot, LockLeg::Premium, LockLeg::Fx]);
        assert_eq!(f.states, vec![LockState::Locked]);
    }

    #[test]
    fn unknown_tokens_are_rejected() {
        assert!(LockFilter::parse(Some("cbot,frete"), None, false).is_err());
        assert!(LockFilter::parse(None, Some("half-locked"), false).is_err());
        assert!(LockFilter::parse(Some(" , "), None, false).is_err());
    }

    #[test]
    fn locked_fraction_is_min_across_selected_legs() {
        // futures fully hedged, premium unhedged: intersection is empty
        let f = filter(Some("cbot,premium"), Some("locked"));
        assert_eq!(f.evaluate(cov(1.0, 0.0, 0.0)), None);

        // futures alone: fully locked
        let f = filter(Some("cbot"), Some("locked"));
        let out = f.evaluate(cov(1.0, 0.0, 0.0)).unwrap();
        assert!((out.slice - 1.0).abs() < EPS);
        assert!((out.locked_fraction - 1.0).abs() < EPS);
    }

    #[test]
    fn open_fraction_is_complement_of_max() {
        let f = filter(Some("cbot,fx"), Some("open"));
        let out = f.evaluate(cov(0.25, 0.0, 0.6)).unwrap();
        assert!((out.open_fraction - 0.4).abs() < EPS);
        assert!((out.slice - 0.4).abs() < EPS);

        // one leg fully hedged: nothing is fully open across the selection
        assert_eq!(f.evaluate(cov(1.0, 0.0, 0.6)), None);
    }

    #[test]
    fn both_states_keep_without_scaling() {
        let f = filter(Some("cbot"), Some("locked,open"));
        let out = f.evaluate(cov(0.3, 0.0, 0.0)).unwrap();
        assert!((out.slice - 1.0).abs() < EPS);
    }

    #[test]
    fn partially_hedged_leg_slices_proportionally() {
        let f = filter(Some("fx"), Some("locked"));
        let out = f.evaluate(cov(0.0, 0.0, 0.35)).unwrap();
        assert!((out.slice - 0.35).abs() < EPS);

        let f = filter(Some("fx"), Some("open"));
        let out = f.evaluate(cov(0.0, 0.0, 0.35)).unwrap();
        assert!((out.slice - 0.65).abs() < EPS);
    }
}
