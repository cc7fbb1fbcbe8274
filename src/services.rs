pub mod adjustment_service;
pub mod auth;
pub mod costing;
pub mod directory_service;
pub mod dispatch_service;
pub mod document_service;
pub mod finance_service;
pub mod identity_service;
pub mod inventory_service;
pub mod production_service;
pub mod sales_service;
pub mod settings_service;

#[cfg(test)]
pub mod fixtures;
