pub mod inventory_service;
pub mod request_service;
pub mod rbac_service;
