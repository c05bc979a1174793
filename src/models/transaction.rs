use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A posted transaction. `amount` is signed: positive is an inflow, negative
/// an outflow. `date` is stored as `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub amount: i64,
    pub description: String,
    pub date: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Transaction {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub amount: i64,
    pub description: String,
    pub date: NaiveDate,
}
