use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Captured exchange futures price for a (symbol, reference month) pair.
/// Prices are stored in cents per bushel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesQuote {
    pub id: i64,
    pub farm_id: i64,
    pub symbol: String,
    pub ref_month: NaiveDate,
    pub captured_at: DateTime<Utc>,
    pub price_cents_per_bu: f64,
}

/// One execution of the FX forward-curve model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxCurveRun {
    pub id: i64,
    pub farm_id: i64,
    pub as_of: DateTime<Utc>,
    pub source: String,
    pub model_version: String,
    pub spot_brl_per_usd: f64,
}

/// Forward rate the curve model produced for one reference month.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxCurvePoint {
    pub id: i64,
    pub run_id: i64,
    pub ref_month: NaiveDate,
    pub brl_per_usd: f64,
}

/// A curve point together with the run that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxCurveSnapshot {
    pub run: FxCurveRun,
    pub point: FxCurvePoint,
}

/// Human-entered forward rate for a reference month.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxManualQuote {
    pub id: i64,
    pub farm_id: i64,
    pub ref_month: NaiveDate,
    pub captured_at: DateTime<Utc>,
    pub brl_per_usd: f64,
}

#[derive(Queryable, Debug, Clone)]
#[diesel(table_name = crate::schema::futures_quotes)]
pub struct FuturesQuoteDB {
    pub id: i64,
    pub farm_id: i64,
    pub symbol: String,
    pub ref_month: NaiveDate,
    pub captured_at: DateTime<Utc>,
    pub price_cents_per_bu: f64,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Debug, Clone)]
#[diesel(table_name = crate::schema::fx_curve_runs)]
pub struct FxCurveRunDB {
    pub id: i64,
    pub farm_id: i64,
    pub as_of: DateTime<Utc>,
    pub source: String,
    pub model_version: String,
    pub spot_brl_per_usd: f64,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Debug, Clone)]
#[diesel(table_name = crate::schema::fx_curve_points)]
pub struct FxCurvePointDB {
    pub id: i64,
    pub run_id: i64,
    pub ref_month: NaiveDate,
    pub brl_per_usd: f64,
}

#[derive(Queryable, Debug, Clone)]
#[diesel(table_name = crate::schema::fx_manual_quotes)]
pub struct FxManualQuoteDB {
    pub id: i64,
    pub farm_id: i64,
    pub ref_month: NaiveDate,
    pub captured_at: DateTime<Utc>,
    pub brl_per_usd: f64,
    pub created_at: NaiveDateTime,
}

impl From<FuturesQuoteDB> for FuturesQuote {
    fn from(db: FuturesQuoteDB) -> Self {
        FuturesQuote {
            id: db.id,
            farm_id: db.farm_id,
            symbol: db.symbol,
            ref_month: db.ref_month,
            captured_at: db.captured_at,
            price_cents_per_bu: db.price_cents_per_bu,
        }
    }
}

impl From<FxCurveRunDB> for FxCurveRun {
    fn from(db: FxCurveRunDB) -> Self {
        FxCurveRun {
            id: db.id,
            farm_id: db.farm_id,
            as_of: db.as_of,
            source: db.source,
            model_version: db.model_version,
            spot_brl_per_usd: db.spot_brl_per_usd,
        }
    }
}

impl From<FxCurvePointDB> for FxCurvePoint {
    fn from(db: FxCurvePointDB) -> Self {
        FxCurvePoint {
            id: db.id,
            run_id: db.run_id,
            ref_month: db.ref_month,
            brl_per_usd: db.brl_per_usd,
        }
    }
}

impl From<FxManualQuoteDB> for FxManualQuote {
    fn from(db: FxManualQuoteDB) -> Self {
        FxManualQuote {
            id: db.id,
            farm_id: db.farm_id,
            ref_month: db.ref_month,
            captured_at: db.captured_at,
            brl_per_usd: db.brl_per_usd,
        }
    }
}
