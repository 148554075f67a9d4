use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::constants::BUSHELS_PER_SACK;
use crate::contracts::{Contract, ContractRepositoryTrait, ContractStatus, PricingKind};
use crate::errors::{Error, Result};
use crate::hedges::{
    CurrencyHedge, FuturesHedge, HedgeRepositoryTrait, PremiumHedge, PremiumUnit,
};
use crate::market_data::{
    FuturesQuote, FxCurvePoint, FxCurveRun, FxCurveSnapshot, FxManualQuote,
    MarketDataRepositoryTrait,
};

use super::mtm_model::{FxLockMode, MtmQuery, ValuationMode};
use super::mtm_service::MtmService;
use super::mtm_traits::MtmServiceTrait;

const EPS: f64 = 1e-3;
const FARM: i64 = 7;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn ts(y: i32, m: u32, day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, day, 12, 0, 0).unwrap()
}

fn market_contract(id: i64, volume_ton: f64) -> Contract {
    Contract {
        id,
        farm_id: FARM,
        product: "SOYBEAN".to_string(),
        pricing_kind: PricingKind::CbotPremium,
        volume_ton,
        delivery_date: d(2026, 6, 15),
        status: ContractStatus::Open,
        fixed_price_value: None,
        fixed_price_unit: None,
        freight_total_brl: None,
        freight_per_ton_brl: None,
        note: None,
    }
}

fn fixed_contract(id: i64, volume_ton: f64, price_per_ton: f64) -> Contract {
    Contract {
        pricing_kind: PricingKind::FixedBrl,
        fixed_price_value: Some(price_per_ton),
        fixed_price_unit: Some("BRL_TON".to_string()),
        ..market_contract(id, volume_ton)
    }
}

fn futures_hedge(contract_id: i64, volume_ton: f64, price: f64) -> FuturesHedge {
    FuturesHedge {
        id: contract_id * 10,
        contract_id,
        executed_at: ts(2026, 1, 10),
        volume_ton,
        price_per_bu: price,
        ref_month: None,
        symbol: None,
        note: None,
    }
}

fn premium_hedge(contract_id: i64, volume_ton: f64, value: f64) -> PremiumHedge {
    PremiumHedge {
        id: contract_id * 10 + 1,
        contract_id,
        executed_at: ts(2026, 1, 11),
        volume_ton,
        premium_value: value,
        premium_unit: PremiumUnit::UsdPerBushel,
        note: None,
    }
}

fn currency_hedge(contract_id: i64, volume_ton: f64, rate: f64) -> CurrencyHedge {
    CurrencyHedge {
        id: contract_id * 10 + 2,
        contract_id,
        executed_at: ts(2026, 1, 12),
        volume_ton,
        brl_per_usd: rate,
        usd_amount: None,
        kind: "NDF".to_string(),
        note: None,
    }
}

fn futures_quote(symbol: &str, ref_month: NaiveDate, cents: f64) -> FuturesQuote {
    FuturesQuote {
        id: 1,
        farm_id: FARM,
        symbol: symbol.to_string(),
        ref_month,
        captured_at: ts(2026, 3, 1),
        price_cents_per_bu: cents,
    }
}

fn curve_snapshot(ref_month: NaiveDate, rate: f64) -> FxCurveSnapshot {
    FxCurveSnapshot {
        run: FxCurveRun {
            id: 1,
            farm_id: FARM,
            as_of: ts(2026, 3, 1),
            source: "bcb".to_string(),
            model_version: "v2".to_string(),
            spot_brl_per_usd: rate,
        },
        point: FxCurvePoint {
            id: 1,
            run_id: 1,
            ref_month,
            brl_per_usd: rate,
        },
    }
}

fn manual_quote(ref_month: NaiveDate, rate: f64) -> FxManualQuote {
    FxManualQuote {
        id: 1,
        farm_id: FARM,
        ref_month,
        captured_at: ts(2026, 3, 2),
        brl_per_usd: rate,
    }
}

#[derive(Default)]
struct MockContractRepository {
    contracts: Vec<Contract>,
}

impl ContractRepositoryTrait for MockContractRepository {
    fn list_candidates(&self, farm_id: i64, only_open: bool, limit: i64) -> Result<Vec<Contract>> {
        Ok(self
            .contracts
            .iter()
            .filter(|c| c.farm_id == farm_id)
            .filter(|c| !only_open || c.status == ContractStatus::Open)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct MockHedgeRepository {
    futures: HashMap<i64, FuturesHedge>,
    premium: HashMap<i64, PremiumHedge>,
    currency: HashMap<i64, CurrencyHedge>,
    calls: AtomicUsize,
}

impl MockHedgeRepository {
    fn pick<T: Clone>(&self, map: &HashMap<i64, T>, ids: &[i64]) -> HashMap<i64, T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ids.iter()
            .filter_map(|id| map.get(id).map(|h| (*id, h.clone())))
            .collect()
    }
}

impl HedgeRepositoryTrait for MockHedgeRepository {
    fn latest_futures_by_contract(
        &self,
        contract_ids: &[i64],
    ) -> Result<HashMap<i64, FuturesHedge>> {
        Ok(self.pick(&self.futures, contract_ids))
    }

    fn latest_premium_by_contract(
        &self,
        contract_ids: &[i64],
    ) -> Result<HashMap<i64, PremiumHedge>> {
        Ok(self.pick(&self.premium, contract_ids))
    }

    fn latest_currency_by_contract(
        &self,
        contract_ids: &[i64],
    ) -> Result<HashMap<i64, CurrencyHedge>> {
        Ok(self.pick(&self.currency, contract_ids))
    }
}

#[derive(Default)]
struct MockMarketDataRepository {
    futures: HashMap<(String, NaiveDate), FuturesQuote>,
    curves: HashMap<NaiveDate, FxCurveSnapshot>,
    manual: HashMap<NaiveDate, FxManualQuote>,
}

impl MarketDataRepositoryTrait for MockMarketDataRepository {
    fn latest_futures_quotes(
        &self,
        _farm_id: i64,
        pairs: &HashSet<(String, NaiveDate)>,
    ) -> Result<HashMap<(String, NaiveDate), FuturesQuote>> {
        Ok(self
            .futures
            .iter()
            .filter(|(k, _)| pairs.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn latest_curve_points(
        &self,
        _farm_id: i64,
        ref_months: &HashSet<NaiveDate>,
    ) -> Result<HashMap<NaiveDate, FxCurveSnapshot>> {
        Ok(self
            .curves
            .iter()
            .filter(|(k, _)| ref_months.contains(*k))
            .map(|(k, v)| (*k, v.clone()))
            .collect())
    }

    fn latest_manual_quotes(
        &self,
        _farm_id: i64,
        ref_months: &HashSet<NaiveDate>,
    ) -> Result<HashMap<NaiveDate, FxManualQuote>> {
        Ok(self
            .manual
            .iter()
            .filter(|(k, _)| ref_months.contains(*k))
            .map(|(k, v)| (*k, v.clone()))
            .collect())
    }
}

fn service(
    contracts: MockContractRepository,
    hedges: MockHedgeRepository,
    market_data: MockMarketDataRepository,
) -> MtmService {
    MtmService::new(Arc::new(contracts), Arc::new(hedges), Arc::new(market_data))
}

fn query() -> MtmQuery {
    MtmQuery {
        farm_id: FARM,
        ..MtmQuery::default()
    }
}

#[tokio::test]
async fn blends_locked_and_live_legs_and_nets_freight() {
    let mut contract = market_contract(1, 120.0);
    contract.freight_per_ton_brl = Some(50.0);

    let contracts = MockContractRepository {
        contracts: vec![contract],
    };
    let hedges = MockHedgeRepository {
        futures: HashMap::from([(1, futures_hedge(1, 60.0, 1250.0))]),
        premium: HashMap::from([(1, premium_hedge(1, 120.0, 0.5))]),
        currency: HashMap::from([(1, currency_hedge(1, 48.0, 5.0))]),
        ..Default::default()
    };
    let rm = d(2026, 6, 30);
    let market_data = MockMarketDataRepository {
        futures: HashMap::from([(("ZS=F".to_string(), rm), futures_quote("ZS=F", rm, 1300.0))]),
        curves: HashMap::from([(rm, curve_snapshot(rm, 5.2))]),
        manual: HashMap::from([(rm, manual_quote(rm, 5.3))]),
    };

    let response = service(contracts, hedges, market_data)
        .contracts_mtm(query())
        .await
        .unwrap();
    assert_eq!(response.rows.len(), 1);
    let row = &response.rows[0];

    // 50% futures coverage blends 12.50 locked with 13.00 live; the fully
    // covered premium adds 0.50 USD/bu on top.
    let usd_per_bu = 0.5 * 12.5 + 0.5 * 13.0 + 0.5;
    let usd_per_sack = usd_per_bu * BUSHELS_PER_SACK;
    let usd_total = usd_per_sack * 2000.0;
    assert!((row.valuation.usd_per_sack.system.unwrap() - usd_per_sack).abs() < EPS);
    assert!((row.totals.usd_total.unwrap() - usd_total).abs() < EPS);
    assert_eq!(row.totals.sacks_total, 2000.0);

    // 40% currency coverage blends the 5.0 lock with each live source, and
    // the 6000 BRL freight nets off the gross.
    let freight = 50.0 * 120.0;
    let expect_system = usd_total * (0.4 * 5.0 + 0.6 * 5.2) - freight;
    let expect_manual = usd_total * (0.4 * 5.0 + 0.6 * 5.3) - freight;
    assert!((row.totals.brl_total.system.unwrap() - expect_system).abs() < EPS);
    assert!((row.totals.brl_total.manual.unwrap() - expect_manual).abs() < EPS);

    assert_eq!(row.totals.fx_lock_mode.system, FxLockMode::Coverage);
    let locked = row.totals.fx_locked_usd.system.unwrap();
    let unlocked = row.totals.fx_unlocked_usd.system.unwrap();
    assert!((locked - 0.4 * usd_total).abs() < EPS);
    assert!((locked + unlocked - usd_total).abs() < EPS);
    assert!((row.totals.fx_locked_pct.system.unwrap() - 0.4).abs() < 1e-6);

    assert!(row.locks.cbot.locked);
    assert!((row.locks.cbot.coverage - 0.5).abs() < 1e-6);
    assert_eq!(row.locks.cbot.symbol.as_deref(), Some("ZS=F"));
    assert_eq!(row.quotes.cbot.as_ref().unwrap().unit, "cents/bu");
    assert_eq!(row.quotes.fx_system.as_ref().unwrap().source, "bcb:v2");
    assert_eq!(row.quotes.fx_manual.as_ref().unwrap().source, "manual");
    assert!(row.filtered.is_none());
}

#[tokio::test]
async fn unhedged_contract_rides_live_quotes() {
    let contracts = MockContractRepository {
        contracts: vec![market_contract(1, 120.0)],
    };
    let rm = d(2026, 6, 30);
    let market_data = MockMarketDataRepository {
        futures: HashMap::from([(("ZS=F".to_string(), rm), futures_quote("ZS=F", rm, 1300.0))]),
        curves: HashMap::from([(rm, curve_snapshot(rm, 5.2))]),
        ..Default::default()
    };

    let response = service(contracts, MockHedgeRepository::default(), market_data)
        .contracts_mtm(query())
        .await
        .unwrap();
    let row = &response.rows[0];

    let usd_per_sack = 13.0 * BUSHELS_PER_SACK;
    assert!((row.valuation.usd_per_sack.system.unwrap() - usd_per_sack).abs() < EPS);
    assert_eq!(row.totals.fx_lock_mode.system, FxLockMode::None);
    assert_eq!(row.totals.fx_locked_usd.system, Some(0.0));
    assert!(!row.locks.cbot.locked);
    assert!(!row.locks.fx.locked);
    // no manual quote loaded: manual BRL side cannot be valued
    assert_eq!(row.totals.brl_total.manual, None);
    assert!((row.totals.brl_total.system.unwrap() - usd_per_sack * 2000.0 * 5.2).abs() < EPS);
}

#[tokio::test]
async fn missing_futures_quote_degrades_usd_side_to_null() {
    let contracts = MockContractRepository {
        contracts: vec![market_contract(1, 120.0)],
    };

    let response = service(
        contracts,
        MockHedgeRepository::default(),
        MockMarketDataRepository::default(),
    )
    .contracts_mtm(query())
    .await
    .unwrap();
    let row = &response.rows[0];

    assert_eq!(row.valuation.usd_per_sack.system, None);
    assert_eq!(row.totals.usd_total, None);
    assert_eq!(row.totals.brl_total.system, None);
    // the row itself survives with volumes and lock info intact
    assert_eq!(row.totals.sacks_total, 2000.0);
    assert!(!row.locks.cbot.locked);
}

#[tokio::test]
async fn fixed_price_contract_values_without_market_data() {
    let mut contract = fixed_contract(1, 60.0, 1500.0);
    contract.freight_total_brl = Some(2000.0);

    let contracts = MockContractRepository {
        contracts: vec![contract],
    };
    let response = service(
        contracts,
        MockHedgeRepository::default(),
        MockMarketDataRepository::default(),
    )
    .contracts_mtm(query())
    .await
    .unwrap();
    let row = &response.rows[0];

    // 1500 BRL/ton over 60 t is 90_000 gross, 1000 sacks, minus freight
    assert_eq!(row.totals.sacks_total, 1000.0);
    assert!((row.totals.brl_total.system.unwrap() - 88_000.0).abs() < EPS);
    assert!((row.valuation.brl_per_sack.system.unwrap() - 88.0).abs() < EPS);
    assert_eq!(row.totals.usd_total, None);
    assert!(row.quotes.cbot.is_none());
    assert!(row.quotes.fx_system.is_none());
    assert!(!row.locks.cbot.locked && !row.locks.premium.locked && !row.locks.fx.locked);
}

#[tokio::test]
async fn forced_ref_month_overrides_delivery_month() {
    let contracts = MockContractRepository {
        contracts: vec![market_contract(1, 120.0)],
    };
    let forced = d(2026, 9, 30);
    let market_data = MockMarketDataRepository {
        futures: HashMap::from([(
            ("ZS=F".to_string(), forced),
            futures_quote("ZS=F", forced, 1300.0),
        )]),
        curves: HashMap::from([(forced, curve_snapshot(forced, 5.4))]),
        ..Default::default()
    };

    let mut q = query();
    q.ref_month = Some("2026-09-30".to_string());
    let response = service(contracts, MockHedgeRepository::default(), market_data)
        .contracts_mtm(q)
        .await
        .unwrap();

    assert_eq!(response.fx_ref_month, Some(forced));
    let row = &response.rows[0];
    assert_eq!(row.quotes.fx_system.as_ref().unwrap().ref_month, forced);
    assert!(row.totals.brl_total.system.is_some());
}

#[tokio::test]
async fn forced_ref_month_must_spell_day_30() {
    let contracts = MockContractRepository {
        contracts: vec![market_contract(1, 120.0)],
    };
    let mut q = query();
    q.ref_month = Some("2026-09-01".to_string());

    let err = service(
        contracts,
        MockHedgeRepository::default(),
        MockMarketDataRepository::default(),
    )
    .contracts_mtm(q)
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn hedge_ref_month_drives_the_futures_quote_month() {
    let contracts = MockContractRepository {
        contracts: vec![market_contract(1, 120.0)],
    };
    let mut hedge = futures_hedge(1, 120.0, 1250.0);
    hedge.ref_month = Some(d(2026, 7, 1));
    let hedges = MockHedgeRepository {
        futures: HashMap::from([(1, hedge)]),
        ..Default::default()
    };

    // the quote lives under the hedge's July month, not delivery's June
    let july = d(2026, 7, 30);
    let market_data = MockMarketDataRepository {
        futures: HashMap::from([(("ZS=F".to_string(), july), futures_quote("ZS=F", july, 1280.0))]),
        ..Default::default()
    };

    let response = service(contracts, hedges, market_data)
        .contracts_mtm(query())
        .await
        .unwrap();
    let row = &response.rows[0];
    assert!(row.quotes.cbot.is_some());
    // fully hedged: valuation uses the locked price regardless of the quote
    assert!((row.valuation.usd_per_sack.system.unwrap() - 12.5 * BUSHELS_PER_SACK).abs() < EPS);
}

#[tokio::test]
async fn auto_default_symbol_derives_from_ref_month() {
    let contracts = MockContractRepository {
        contracts: vec![market_contract(1, 120.0)],
    };
    let rm = d(2026, 6, 30);
    let market_data = MockMarketDataRepository {
        futures: HashMap::from([(
            ("ZSM26.CBT".to_string(), rm),
            futures_quote("ZSM26.CBT", rm, 1300.0),
        )]),
        ..Default::default()
    };

    let mut q = query();
    q.default_symbol = "AUTO".to_string();
    let response = service(contracts, MockHedgeRepository::default(), market_data)
        .contracts_mtm(q)
        .await
        .unwrap();
    let row = &response.rows[0];
    assert_eq!(row.quotes.cbot.as_ref().unwrap().symbol, "ZSM26.CBT");
    assert_eq!(row.locks.cbot.symbol.as_deref(), Some("ZSM26.CBT"));
}

#[tokio::test]
async fn system_mode_suppresses_the_manual_side() {
    let contracts = MockContractRepository {
        contracts: vec![market_contract(1, 120.0)],
    };
    let rm = d(2026, 6, 30);
    let market_data = MockMarketDataRepository {
        futures: HashMap::from([(("ZS=F".to_string(), rm), futures_quote("ZS=F", rm, 1300.0))]),
        curves: HashMap::from([(rm, curve_snapshot(rm, 5.2))]),
        manual: HashMap::from([(rm, manual_quote(rm, 5.3))]),
    };

    let mut q = query();
    q.mode = ValuationMode::System;
    let response = service(contracts, MockHedgeRepository::default(), market_data)
        .contracts_mtm(q)
        .await
        .unwrap();
    let row = &response.rows[0];

    assert!(row.totals.brl_total.system.is_some());
    assert_eq!(row.totals.brl_total.manual, None);
    assert_eq!(row.valuation.brl_per_sack.manual, None);
    assert_eq!(row.valuation.usd_per_sack.manual, None);
    // the manual quote is still reported for diagnostics
    assert!(row.quotes.fx_manual.is_some());
}

#[tokio::test]
async fn lock_filter_slices_kept_rows_and_drops_the_rest() {
    // contract 1: 40% fx hedged; contract 2: no fx hedge at all
    let contracts = MockContractRepository {
        contracts: vec![market_contract(1, 120.0), market_contract(2, 120.0)],
    };
    let hedges = MockHedgeRepository {
        currency: HashMap::from([(1, currency_hedge(1, 48.0, 5.0))]),
        ..Default::default()
    };
    let rm = d(2026, 6, 30);
    let market_data = MockMarketDataRepository {
        futures: HashMap::from([(("ZS=F".to_string(), rm), futures_quote("ZS=F", rm, 1300.0))]),
        curves: HashMap::from([(rm, curve_snapshot(rm, 5.2))]),
        ..Default::default()
    };

    let mut q = query();
    q.lock_types = Some("fx".to_string());
    q.lock_states = Some("locked".to_string());
    let response = service(contracts, hedges, market_data)
        .contracts_mtm(q)
        .await
        .unwrap();

    assert_eq!(response.rows.len(), 1);
    let row = &response.rows[0];
    assert_eq!(row.contract.id, 1);
    let view = row.filtered.as_ref().unwrap();
    assert!((view.diagnostics.slice - 0.4).abs() < 1e-6);
    assert!((view.ton_total - 48.0).abs() < 1e-6);
    assert!((view.sacks_total - 800.0).abs() < 1e-6);
    let full = row.totals.usd_total.unwrap();
    assert!((view.usd_total.unwrap() - full * 0.4).abs() < EPS);
}

#[tokio::test]
async fn no_locks_restricts_the_universe_to_fixed_contracts() {
    let contracts = MockContractRepository {
        contracts: vec![market_contract(1, 120.0), fixed_contract(2, 60.0, 1500.0)],
    };

    let mut q = query();
    q.no_locks = true;
    let response = service(
        contracts,
        MockHedgeRepository::default(),
        MockMarketDataRepository::default(),
    )
    .contracts_mtm(q)
    .await
    .unwrap();

    assert_eq!(response.rows.len(), 1);
    let row = &response.rows[0];
    assert_eq!(row.contract.id, 2);
    // lock filtering is bypassed: the whole row is kept
    let view = row.filtered.as_ref().unwrap();
    assert!((view.diagnostics.slice - 1.0).abs() < 1e-6);
    assert!((view.brl_total.system.unwrap() - row.totals.brl_total.system.unwrap()).abs() < EPS);
}

#[tokio::test]
async fn active_lock_filter_drops_fixed_price_contracts() {
    let contracts = MockContractRepository {
        contracts: vec![fixed_contract(1, 60.0, 1500.0)],
    };
    let mut q = query();
    q.lock_states = Some("open".to_string());

    let response = service(
        contracts,
        MockHedgeRepository::default(),
        MockMarketDataRepository::default(),
    )
    .contracts_mtm(q)
    .await
    .unwrap();
    assert!(response.rows.is_empty());
}

#[tokio::test]
async fn invalid_lock_selector_is_rejected() {
    let contracts = MockContractRepository {
        contracts: vec![market_contract(1, 120.0)],
    };
    let mut q = query();
    q.lock_types = Some("cbot,frete".to_string());

    let err = service(
        contracts,
        MockHedgeRepository::default(),
        MockMarketDataRepository::default(),
    )
    .contracts_mtm(q)
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Mtm(_)));
}

#[tokio::test]
async fn empty_candidate_set_short_circuits() {
    let hedges = Arc::new(MockHedgeRepository::default());
    let svc = MtmService::new(
        Arc::new(MockContractRepository::default()),
        hedges.clone(),
        Arc::new(MockMarketDataRepository::default()),
    );

    let response = svc.contracts_mtm(query()).await.unwrap();
    assert!(response.rows.is_empty());
    assert_eq!(response.farm_id, FARM);
    // no hedge or market-data loads happen for an empty universe
    assert_eq!(hedges.calls.load(Ordering::SeqCst), 0);
}
