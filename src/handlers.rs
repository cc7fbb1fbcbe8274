pub mod adjustments;
pub mod auth;
pub mod directory;
pub mod dispatch;
pub mod documents;
pub mod finance;
pub mod identity;
pub mod inventory;
pub mod production;
pub mod sales;
pub mod settings;
