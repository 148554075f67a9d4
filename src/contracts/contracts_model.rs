use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// How a contract's price is formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingKind {
    /// Flat BRL price agreed up front; no exchange exposure.
    #[serde(rename = "FIXED_BRL")]
    FixedBrl,
    /// Futures price plus basis premium, settled through FX.
    #[serde(rename = "CBOT_PREMIUM")]
    CbotPremium,
}

impl PricingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingKind::FixedBrl => "FIXED_BRL",
            PricingKind::CbotPremium => "CBOT_PREMIUM",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "FIXED_BRL" => PricingKind::FixedBrl,
            _ => PricingKind::CbotPremium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Open,
    Settled,
    Cancelled,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Open => "OPEN",
            ContractStatus::Settled => "SETTLED",
            ContractStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "SETTLED" => ContractStatus::Settled,
            "CANCELLED" => ContractStatus::Cancelled,
            _ => ContractStatus::Open,
        }
    }
}

/// Domain model for a forward-sale contract.
///
/// Snapshots handed to the engine are already validated upstream; in
/// particular `freight_total_brl` and `freight_per_ton_brl` are mutually
/// exclusive by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: i64,
    pub farm_id: i64,
    pub product: String,
    pub pricing_kind: PricingKind,
    pub volume_ton: f64,
    pub delivery_date: NaiveDate,
    pub status: ContractStatus,
    pub fixed_price_value: Option<f64>,
    pub fixed_price_unit: Option<String>,
    pub freight_total_brl: Option<f64>,
    pub freight_per_ton_brl: Option<f64>,
    pub note: Option<String>,
}

/// Database row for a contract
#[derive(Queryable, Debug, Clone)]
#[diesel(table_name = crate::schema::contracts)]
pub struct ContractDB {
    pub id: i64,
    pub farm_id: i64,
    pub product: String,
    pub pricing_kind: String,
    pub volume_ton: f64,
    pub delivery_date: NaiveDate,
    pub status: String,
    pub fixed_price_value: Option<f64>,
    pub fixed_price_unit: Option<String>,
    pub freight_total_brl: Option<f64>,
    pub freight_per_ton_brl: Option<f64>,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<ContractDB> for Contract {
    fn from(db: ContractDB) -> Self {
        Contract {
            id: db.id,
            farm_id: db.farm_id,
            product: db.product,
            pricing_kind: PricingKind::from_str(&db.pricing_kind),
            volume_ton: db.volume_ton,
            delivery_date: db.delivery_date,
            status: ContractStatus::from_str(&db.status),
            fixed_price_value: db.fixed_price_value,
            fixed_price_unit: db.fixed_price_unit,
            freight_total_brl: db.freight_total_brl,
            freight_per_ton_brl: db.freight_per_ton_brl,
            note: db.note,
        }
    }
}
