use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Unit a basis premium is quoted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PremiumUnit {
    #[serde(rename = "USD_BU")]
    UsdPerBushel,
    #[serde(rename = "USD_TON")]
    UsdPerTon,
    /// Anything else; contributes zero to the valuation.
    #[serde(other, rename = "UNKNOWN")]
    Unknown,
}

impl PremiumUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            PremiumUnit::UsdPerBushel => "USD_BU",
            PremiumUnit::UsdPerTon => "USD_TON",
            PremiumUnit::Unknown => "UNKNOWN",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "USD_BU" => PremiumUnit::UsdPerBushel,
            "USD_TON" => PremiumUnit::UsdPerTon,
            _ => PremiumUnit::Unknown,
        }
    }
}

/// Exchange-futures hedge leg. `price_per_bu` is stored as captured, which
/// historically mixes cents and dollars; the calculator normalizes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesHedge {
    pub id: i64,
    pub contract_id: i64,
    pub executed_at: DateTime<Utc>,
    pub volume_ton: f64,
    pub price_per_bu: f64,
    pub ref_month: Option<NaiveDate>,
    pub symbol: Option<String>,
    pub note: Option<String>,
}

/// Basis-premium hedge leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumHedge {
    pub id: i64,
    pub contract_id: i64,
    pub executed_at: DateTime<Utc>,
    pub volume_ton: f64,
    pub premium_value: f64,
    pub premium_unit: PremiumUnit,
    pub note: Option<String>,
}

/// Currency hedge leg. `usd_amount`, when present, caps the USD exposure
/// converted at the locked rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyHedge {
    pub id: i64,
    pub contract_id: i64,
    pub executed_at: DateTime<Utc>,
    pub volume_ton: f64,
    pub brl_per_usd: f64,
    pub usd_amount: Option<f64>,
    pub kind: String,
    pub note: Option<String>,
}

#[derive(Queryable, Debug, Clone)]
#[diesel(table_name = crate::schema::futures_hedges)]
pub struct FuturesHedgeDB {
    pub id: i64,
    pub contract_id: i64,
    pub executed_at: DateTime<Utc>,
    pub volume_ton: f64,
    pub price_per_bu: f64,
    pub ref_month: Option<NaiveDate>,
    pub symbol: Option<String>,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Debug, Clone)]
#[diesel(table_name = crate::schema::premium_hedges)]
pub struct PremiumHedgeDB {
    pub id: i64,
    pub contract_id: i64,
    pub executed_at: DateTime<Utc>,
    pub volume_ton: f64,
    pub premium_value: f64,
    pub premium_unit: String,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Debug, Clone)]
#[diesel(table_name = crate::schema::currency_hedges)]
pub struct CurrencyHedgeDB {
    pub id: i64,
    pub contract_id: i64,
    pub executed_at: DateTime<Utc>,
    pub volume_ton: f64,
    pub brl_per_usd: f64,
    pub usd_amount: Option<f64>,
    pub kind: String,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<FuturesHedgeDB> for FuturesHedge {
    fn from(db: FuturesHedgeDB) -> Self {
        FuturesHedge {
            id: db.id,
            contract_id: db.contract_id,
            executed_at: db.executed_at,
            volume_ton: db.volume_ton,
            price_per_bu: db.price_per_bu,
            ref_month: db.ref_month,
            symbol: db.symbol,
            note: db.note,
        }
    }
}

impl From<PremiumHedgeDB> for PremiumHedge {
    fn from(db: PremiumHedgeDB) -> Self {
        PremiumHedge {
            id: db.id,
            contract_id: db.contract_id,
            executed_at: db.executed_at,
            volume_ton: db.volume_ton,
            premium_value: db.premium_value,
            premium_unit: PremiumUnit::from_str(&db.premium_unit),
            note: db.note,
        }
    }
}

impl From<CurrencyHedgeDB> for CurrencyHedge {
    fn from(db: CurrencyHedgeDB) -> Self {
        CurrencyHedge {
            id: db.id,
            contract_id: db.contract_id,
            executed_at: db.executed_at,
            volume_ton: db.volume_ton,
            brl_per_usd: db.brl_per_usd,
            usd_amount: db.usd_amount,
            kind: db.kind,
            note: db.note,
        }
    }
}
