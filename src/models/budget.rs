use serde::{Deserialize, Serialize};

use crate::models::Category;

/// Per-user container of category allocations for one calendar month.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetMonth {
    pub id: i64,
    pub user_id: i64,
    pub month: String,
    /// Set the first time the month is rolled over into the next one.
    pub rolled_over_at: Option<String>,
    pub created_at: String,
}

/// Allocation record for one category within a [`BudgetMonth`].
///
/// `available` is persisted and kept equal to `amount + carryover - spent` by
/// every write. `carryover` is only ever raised by rollover, so for months that
/// never received one `available == amount - spent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItem {
    pub id: i64,
    pub budget_month_id: i64,
    pub category_id: i64,
    pub amount: i64,
    pub spent: i64,
    pub carryover: i64,
    pub available: i64,
    pub updated_at: String,
}

impl BudgetItem {
    pub fn figures(&self) -> BudgetFigures {
        BudgetFigures {
            amount: self.amount,
            spent: self.spent,
            carryover: self.carryover,
            available: self.available,
        }
    }
}

/// The numeric part of a budget item. The default value stands in for an item
/// that has not been written yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetFigures {
    pub amount: i64,
    pub spent: i64,
    pub carryover: i64,
    pub available: i64,
}

impl BudgetFigures {
    pub fn is_consistent(&self) -> bool {
        self.available == self.amount + self.carryover - self.spent
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItemWithCategory {
    #[serde(flatten)]
    pub item: BudgetItem,
    pub category: Category,
}

/// One category's share of a rollover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarriedAmount {
    pub category_id: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloverSummary {
    pub from: String,
    pub to: String,
    pub carried: Vec<CarriedAmount>,
    pub total: i64,
    /// True when the source month had already been rolled over before this call.
    pub repeated: bool,
}
