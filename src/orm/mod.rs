//! SeaORM entities. The web layer goes through `crate::repository` instead
//! of querying these directly.

pub mod admin_users;
pub mod choices;
pub mod polls;
