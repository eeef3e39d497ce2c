//! `SeaORM` Entity for the open-interest / price time series

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "oi_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Futures symbol, e.g. "BTCUSDT"
    pub symbol: String,
    /// Snapshot time (timezone-aware)
    pub timestamp: DateTimeWithTimeZone,
    /// Outstanding open interest in contracts
    pub open_interest: f64,
    /// Last price at snapshot time
    pub price: f64,
    /// Notional value (open_interest * price) at write time
    pub value_usdt: Option<f64>,
    /// When the record was created
    pub created_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
