//! `SeaORM` Entity for dispatched alert records

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "alerts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub symbol: String,
    /// Signed open-interest change, in percent
    pub oi_change_percent: f64,
    /// Signed price change, in percent
    pub price_change_percent: f64,
    pub current_oi: f64,
    pub old_oi: f64,
    pub current_price: f64,
    pub old_price: f64,
    pub total_value_usdt: Option<f64>,
    /// Severity tier: "low" | "medium" | "high" | "critical"
    pub alert_level: String,
    pub alert_time: DateTimeWithTimeZone,
    pub created_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
