pub mod account;
pub mod budget;
pub mod category;
pub mod transaction;
pub mod user;

pub use account::{Account, AccountType, NewAccount};
pub use budget::{
    BudgetFigures, BudgetItem, BudgetItemWithCategory, BudgetMonth, CarriedAmount,
    RolloverSummary,
};
pub use category::{Category, NewCategory};
pub use transaction::{NewTransaction, Transaction};
pub use user::{NewUser, RefreshToken, User};
