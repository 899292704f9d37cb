pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod requests_repo;
pub use requests_repo::RequestRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
