pub mod accounts;
pub mod budget;
pub mod categories;
pub mod transactions;
pub mod users;
