pub mod branch_scope;
pub mod models;
pub mod ports;
pub mod reshape;
pub mod services;
