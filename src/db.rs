pub mod user_repo;
pub use user_repo::UserRepository;
pub mod directory_repo;
pub use directory_repo::DirectoryRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod adjustment_repo;
pub use adjustment_repo::AdjustmentRepository;
pub mod production_repo;
pub use production_repo::ProductionRepository;
pub mod sales_repo;
pub use sales_repo::SalesRepository;
pub mod dispatch_repo;
pub use dispatch_repo::DispatchRepository;
pub mod finance_repo;
pub use finance_repo::FinanceRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
