pub mod health;
pub mod inventory;
pub mod requests;
pub mod rbac;
