use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::contracts::{Contract, ContractRepositoryTrait, PricingKind};
use crate::errors::Result;
use crate::hedges::{CurrencyHedge, FuturesHedge, HedgeRepositoryTrait, PremiumHedge};
use crate::market_data::{
    FuturesQuote, FxCurveSnapshot, FxManualQuote, MarketDataRepositoryTrait,
};

use super::mtm_calculator::{
    cents_to_usd_per_bu, coverage, fixed_price_per_sack, freight_total_brl, fx_breakdown, mix,
    normalize_futures_cents, parse_ref_month, premium_usd_per_bu, ref_month_of, resolve_symbol,
    round_opt, round_to, sacks_total, safe_div, safe_pct, usd_per_bu_to_usd_per_sack,
};
use super::mtm_filter::{filtered_view, FilterOutcome, LegCoverages, LockFilter};
use super::mtm_model::{
    CbotLock, FuturesQuoteBrief, FxCurveBrief, FxLock, FxLockMode, FxManualBrief, LocksInfo,
    MtmQuery, MtmResponse, MtmRow, PremiumLock, QuotesInfo, SideModes, SideValues, Totals,
    Valuation, ValuationMode,
};
use super::mtm_traits::MtmServiceTrait;

const MAX_LIMIT: i64 = 2000;

/// Futures symbol and reference months resolved for one contract.
struct ResolvedKeys {
    fx_ref_month: NaiveDate,
    cbot_ref_month: NaiveDate,
    symbol: String,
}

#[derive(Clone)]
pub struct MtmService {
    contracts: Arc<dyn ContractRepositoryTrait>,
    hedges: Arc<dyn HedgeRepositoryTrait>,
    market_data: Arc<dyn MarketDataRepositoryTrait>,
}

impl MtmService {
    pub fn new(
        contracts: Arc<dyn ContractRepositoryTrait>,
        hedges: Arc<dyn HedgeRepositoryTrait>,
        market_data: Arc<dyn MarketDataRepositoryTrait>,
    ) -> Self {
        Self {
            contracts,
            hedges,
            market_data,
        }
    }

    fn build_fixed_row(&self, contract: &Contract, mode: ValuationMode) -> MtmRow {
        let volume_ton = contract.volume_ton.max(0.0);
        let sacks = sacks_total(volume_ton);

        let price_per_sack = fixed_price_per_sack(contract);
        let freight = freight_total_brl(contract);

        let gross_total = match price_per_sack {
            Some(p) if sacks > 0.0 => Some(p * sacks),
            _ => None,
        };
        let net_total = gross_total.map(|g| g - freight);
        let net_per_sack = safe_div(net_total, Some(sacks));

        let mut components = BTreeMap::new();
        components.insert(
            "freight_brl_total".to_string(),
            SideValues::both(Some(round_to(freight, 4))),
        );
        components.insert(
            "gross_brl_total".to_string(),
            SideValues::both(round_opt(gross_total, 4)),
        );

        // A fixed price is rate-independent, so both sides read the same.
        let brl_per_sack = SideValues {
            system: round_opt(net_per_sack, 4).filter(|_| mode.includes_system()),
            manual: round_opt(net_per_sack, 4).filter(|_| mode.includes_manual()),
        };
        let brl_total = SideValues {
            system: round_opt(net_total, 4).filter(|_| mode.includes_system()),
            manual: round_opt(net_total, 4).filter(|_| mode.includes_manual()),
        };

        MtmRow {
            contract: contract.clone(),
            locks: LocksInfo {
                cbot: CbotLock {
                    locked: false,
                    coverage: 0.0,
                    locked_cents_per_bu: None,
                    symbol: None,
                    ref_month: None,
                },
                premium: PremiumLock {
                    locked: false,
                    coverage: 0.0,
                    premium_value: None,
                    premium_unit: None,
                },
                fx: FxLock {
                    locked: false,
                    coverage: 0.0,
                    brl_per_usd: None,
                    kind: None,
                    usd_amount: None,
                },
            },
            quotes: QuotesInfo {
                cbot: None,
                fx_system: None,
                fx_manual: None,
            },
            valuation: Valuation {
                usd_per_sack: SideValues::default(),
                brl_per_sack,
                components,
            },
            totals: Totals {
                ton_total: round_to(volume_ton, 4),
                sacks_total: round_to(sacks, 0),
                usd_total: None,
                brl_total,
                fx_locked_usd: SideValues::default(),
                fx_unlocked_usd: SideValues::default(),
                fx_lock_mode: SideModes {
                    system: FxLockMode::None,
                    manual: FxLockMode::None,
                },
                fx_locked_pct: SideValues::default(),
                fx_unlocked_pct: SideValues::default(),
            },
            filtered: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build_market_row(
        &self,
        contract: &Contract,
        mode: ValuationMode,
        keys: &ResolvedKeys,
        futures_hedge: Option<&FuturesHedge>,
        premium_hedge: Option<&PremiumHedge>,
        currency_hedge: Option<&CurrencyHedge>,
        futures_quote: Option<&FuturesQuote>,
        curve: Option<&FxCurveSnapshot>,
        manual: Option<&FxManualQuote>,
    ) -> (MtmRow, LegCoverages) {
        let volume_ton = contract.volume_ton.max(0.0);
        let sacks = sacks_total(volume_ton);

        let cbot_cov = futures_hedge
            .map(|h| coverage(Some(h.volume_ton), volume_ton))
            .unwrap_or(0.0);
        let prem_cov = premium_hedge
            .map(|h| coverage(Some(h.volume_ton), volume_ton))
            .unwrap_or(0.0);
        let fx_cov = currency_hedge
            .map(|h| coverage(Some(h.volume_ton), volume_ton))
            .unwrap_or(0.0);

        // Futures leg, all in cents/bu until the final division.
        let live_cents = futures_quote.map(|q| q.price_cents_per_bu);
        let locked_cents =
            futures_hedge.map(|h| normalize_futures_cents(h.price_per_bu, live_cents));

        let locked_usd_bu = cents_to_usd_per_bu(locked_cents);
        let live_usd_bu = cents_to_usd_per_bu(live_cents);
        let cbot_effective = mix(cbot_cov, locked_usd_bu, live_usd_bu);

        let premium_locked = premium_hedge.map(premium_usd_per_bu);
        let premium_effective = mix(prem_cov, premium_locked, Some(0.0)).unwrap_or(0.0);

        let usd_per_bu = cbot_effective.map(|v| v + premium_effective);
        let usd_per_sack = usd_per_bu_to_usd_per_sack(usd_per_bu);
        let usd_total = match usd_per_sack {
            Some(v) if sacks > 0.0 => Some(v * sacks),
            _ => None,
        };
        if usd_per_sack.is_none() {
            debug!(
                "Contract {}: no futures price available (symbol {}), USD side degraded to null",
                contract.id, keys.symbol
            );
        }

        // Currency leg, once per live-rate source.
        let fx_locked_rate = currency_hedge.map(|h| h.brl_per_usd);
        let fx_locked_amount = currency_hedge.and_then(|h| h.usd_amount);
        let fx_system_live = curve.map(|s| s.point.brl_per_usd);
        let fx_manual_live = manual.map(|m| m.brl_per_usd);

        let breakdown_system = fx_breakdown(
            usd_per_sack,
            sacks,
            fx_locked_rate,
            fx_locked_amount,
            fx_system_live,
            fx_cov,
        );
        let breakdown_manual = fx_breakdown(
            usd_per_sack,
            sacks,
            fx_locked_rate,
            fx_locked_amount,
            fx_manual_live,
            fx_cov,
        );

        // Freight nets against the gross BRL value.
        let freight = freight_total_brl(contract);
        let gross_total_system = match breakdown_system.brl_per_sack {
            Some(v) if sacks > 0.0 => Some(v * sacks),
            _ => None,
        };
        let gross_total_manual = match breakdown_manual.brl_per_sack {
            Some(v) if sacks > 0.0 => Some(v * sacks),
            _ => None,
        };
        let net_total_system = gross_total_system.map(|g| g - freight);
        let net_total_manual = gross_total_manual.map(|g| g - freight);
        let net_per_sack_system = safe_div(net_total_system, Some(sacks));
        let net_per_sack_manual = safe_div(net_total_manual, Some(sacks));

        let fx_effective_system = safe_div(breakdown_system.brl_per_sack, usd_per_sack);
        let fx_effective_manual = safe_div(breakdown_manual.brl_per_sack, usd_per_sack);

        let locks = LocksInfo {
            cbot: CbotLock {
                locked: futures_hedge.is_some(),
                coverage: round_to(cbot_cov, 6),
                locked_cents_per_bu: round_opt(locked_cents, 4),
                symbol: Some(keys.symbol.clone()),
                ref_month: futures_hedge.and_then(|h| h.ref_month),
            },
            premium: PremiumLock {
                locked: premium_hedge.is_some(),
                coverage: round_to(prem_cov, 6),
                premium_value: round_opt(premium_hedge.map(|h| h.premium_value), 6),
                premium_unit: premium_hedge.map(|h| h.premium_unit),
            },
            fx: FxLock {
                locked: currency_hedge.is_some(),
                coverage: round_to(fx_cov, 6),
                brl_per_usd: round_opt(fx_locked_rate, 6),
                kind: currency_hedge.map(|h| h.kind.clone()),
                usd_amount: round_opt(fx_locked_amount, 4),
            },
        };

        let quotes = QuotesInfo {
            cbot: futures_quote.map(|q| FuturesQuoteBrief {
                symbol: keys.symbol.clone(),
                captured_at: q.captured_at,
                cents_per_bu: round_to(q.price_cents_per_bu, 4),
                unit: "cents/bu".to_string(),
            }),
            fx_system: curve.map(|s| FxCurveBrief {
                captured_at: s.run.as_of,
                ref_month: keys.fx_ref_month,
                brl_per_usd: round_to(s.point.brl_per_usd, 6),
                source: format!("{}:{}", s.run.source, s.run.model_version),
            }),
            fx_manual: manual.map(|m| FxManualBrief {
                captured_at: m.captured_at,
                ref_month: m.ref_month,
                brl_per_usd: round_to(m.brl_per_usd, 6),
                source: "manual".to_string(),
            }),
        };

        let mut components = BTreeMap::new();
        components.insert(
            "cbot_locked_usd_per_bu".to_string(),
            SideValues::both(round_opt(locked_usd_bu, 6)),
        );
        components.insert(
            "cbot_live_usd_per_bu".to_string(),
            SideValues::both(round_opt(live_usd_bu, 6)),
        );
        components.insert(
            "cbot_effective_usd_per_bu".to_string(),
            SideValues::both(round_opt(cbot_effective, 6)),
        );
        components.insert(
            "premium_locked_usd_per_bu".to_string(),
            SideValues::both(round_opt(premium_locked, 6)),
        );
        components.insert(
            "premium_effective_usd_per_bu".to_string(),
            SideValues::both(Some(round_to(premium_effective, 6))),
        );
        components.insert(
            "fx_locked_brl_per_usd".to_string(),
            SideValues::both(round_opt(fx_locked_rate, 6)),
        );
        components.insert(
            "fx_locked_usd_amount".to_string(),
            SideValues::both(round_opt(fx_locked_amount, 4)),
        );
        components.insert(
            "fx_live_brl_per_usd".to_string(),
            SideValues {
                system: round_opt(fx_system_live, 6),
                manual: round_opt(fx_manual_live, 6),
            },
        );
        components.insert(
            "fx_effective_brl_per_usd".to_string(),
            SideValues {
                system: round_opt(fx_effective_system, 6),
                manual: round_opt(fx_effective_manual, 6),
            },
        );
        components.insert(
            "freight_brl_total".to_string(),
            SideValues::both(Some(round_to(freight, 4))),
        );
        components.insert(
            "gross_brl_total".to_string(),
            SideValues {
                system: round_opt(gross_total_system, 4),
                manual: round_opt(gross_total_manual, 4),
            },
        );

        let valuation = Valuation {
            usd_per_sack: SideValues {
                system: round_opt(usd_per_sack, 4).filter(|_| mode.includes_system()),
                manual: round_opt(usd_per_sack, 4).filter(|_| mode.includes_manual()),
            },
            brl_per_sack: SideValues {
                system: round_opt(net_per_sack_system, 4).filter(|_| mode.includes_system()),
                manual: round_opt(net_per_sack_manual, 4).filter(|_| mode.includes_manual()),
            },
            components,
        };

        let totals = Totals {
            ton_total: round_to(volume_ton, 4),
            sacks_total: round_to(sacks, 0),
            usd_total: round_opt(usd_total, 4),
            brl_total: SideValues {
                system: round_opt(net_total_system, 4).filter(|_| mode.includes_system()),
                manual: round_opt(net_total_manual, 4).filter(|_| mode.includes_manual()),
            },
            fx_locked_usd: SideValues {
                system: round_opt(breakdown_system.locked_usd, 4),
                manual: round_opt(breakdown_manual.locked_usd, 4),
            },
            fx_unlocked_usd: SideValues {
                system: round_opt(breakdown_system.unlocked_usd, 4),
                manual: round_opt(breakdown_manual.unlocked_usd, 4),
            },
            fx_lock_mode: SideModes {
                system: breakdown_system.mode,
                manual: breakdown_manual.mode,
            },
            fx_locked_pct: SideValues {
                system: round_opt(safe_pct(breakdown_system.locked_usd, usd_total), 6),
                manual: round_opt(safe_pct(breakdown_manual.locked_usd, usd_total), 6),
            },
            fx_unlocked_pct: SideValues {
                system: round_opt(safe_pct(breakdown_system.unlocked_usd, usd_total), 6),
                manual: round_opt(safe_pct(breakdown_manual.unlocked_usd, usd_total), 6),
            },
        };

        let row = MtmRow {
            contract: contract.clone(),
            locks,
            quotes,
            valuation,
            totals,
            filtered: None,
        };

        let coverages = LegCoverages {
            cbot: cbot_cov,
            premium: prem_cov,
            fx: fx_cov,
        };
        (row, coverages)
    }
}

#[async_trait]
impl MtmServiceTrait for MtmService {
    async fn contracts_mtm(&self, query: MtmQuery) -> Result<MtmResponse> {
        let forced_ref_month = query
            .ref_month
            .as_deref()
            .map(parse_ref_month)
            .transpose()?;
        let filter = LockFilter::parse(
            query.lock_types.as_deref(),
            query.lock_states.as_deref(),
            query.no_locks,
        )?;
        let limit = query.limit.clamp(1, MAX_LIMIT);

        let mut contracts =
            self.contracts
                .list_candidates(query.farm_id, query.only_open, limit)?;

        // Fixed-price contracts have no lock legs: an active filter drops
        // them, except under no_locks which restricts the universe to them.
        if let Some(f) = &filter {
            if f.no_locks {
                contracts.retain(|c| c.pricing_kind == PricingKind::FixedBrl);
            } else {
                contracts.retain(|c| c.pricing_kind != PricingKind::FixedBrl);
            }
        }

        if contracts.is_empty() {
            return Ok(MtmResponse {
                farm_id: query.farm_id,
                as_of: Utc::now(),
                mode: query.mode,
                fx_ref_month: forced_ref_month,
                rows: vec![],
            });
        }

        let contract_ids: Vec<i64> = contracts.iter().map(|c| c.id).collect();
        let last_futures = self.hedges.latest_futures_by_contract(&contract_ids)?;
        let last_premium = self.hedges.latest_premium_by_contract(&contract_ids)?;
        let last_currency = self.hedges.latest_currency_by_contract(&contract_ids)?;

        // Union of quote keys the valuation will touch, resolved once.
        let mut resolved: HashMap<i64, ResolvedKeys> = HashMap::new();
        let mut futures_pairs: HashSet<(String, NaiveDate)> = HashSet::new();
        let mut fx_months: HashSet<NaiveDate> = HashSet::new();

        for contract in &contracts {
            if contract.pricing_kind == PricingKind::FixedBrl {
                continue;
            }
            let fx_ref_month =
                forced_ref_month.unwrap_or_else(|| ref_month_of(contract.delivery_date));
            fx_months.insert(fx_ref_month);

            let hedge = last_futures.get(&contract.id);
            let cbot_ref_month = hedge
                .and_then(|h| h.ref_month)
                .map(ref_month_of)
                .unwrap_or(fx_ref_month);
            let symbol = resolve_symbol(
                hedge.and_then(|h| h.symbol.as_deref()),
                &query.default_symbol,
                cbot_ref_month,
            )?;
            futures_pairs.insert((symbol.clone(), cbot_ref_month));

            resolved.insert(
                contract.id,
                ResolvedKeys {
                    fx_ref_month,
                    cbot_ref_month,
                    symbol,
                },
            );
        }

        let futures_quotes = self
            .market_data
            .latest_futures_quotes(query.farm_id, &futures_pairs)?;
        let curve_points = self.market_data.latest_curve_points(query.farm_id, &fx_months)?;
        let manual_quotes = self
            .market_data
            .latest_manual_quotes(query.farm_id, &fx_months)?;

        let as_of = Utc::now();
        let mut rows: Vec<MtmRow> = Vec::with_capacity(contracts.len());

        for contract in &contracts {
            let (mut row, coverages) = if contract.pricing_kind == PricingKind::FixedBrl {
                (self.build_fixed_row(contract, query.mode), LegCoverages::default())
            } else {
                let keys = &resolved[&contract.id];
                self.build_market_row(
                    contract,
                    query.mode,
                    keys,
                    last_futures.get(&contract.id),
                    last_premium.get(&contract.id),
                    last_currency.get(&contract.id),
                    futures_quotes.get(&(keys.symbol.clone(), keys.cbot_ref_month)),
                    curve_points.get(&keys.fx_ref_month),
                    manual_quotes.get(&keys.fx_ref_month),
                )
            };

            if let Some(f) = &filter {
                let outcome = if f.no_locks {
                    // Universe already restricted; nothing to match on.
                    FilterOutcome {
                        locked_fraction: 0.0,
                        open_fraction: 1.0,
                        slice: 1.0,
                    }
                } else {
                    match f.evaluate(coverages) {
                        Some(outcome) => outcome,
                        None => {
                            debug!(
                                "Contract {} excluded by lock filter (coverages cbot={:.4} premium={:.4} fx={:.4})",
                                contract.id, coverages.cbot, coverages.premium, coverages.fx
                            );
                            continue;
                        }
                    }
                };
                let view = filtered_view(&row, coverages, outcome);
                row.filtered = Some(view);
            }

            rows.push(row);
        }

        Ok(MtmResponse {
            farm_id: query.farm_id,
            as_of,
            mode: query.mode,
            fx_ref_month: forced_ref_month,
            rows,
        })
    }
}
