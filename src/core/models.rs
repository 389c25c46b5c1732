pub mod attendance;
pub mod branch;
pub mod common;
pub mod contributor;
pub mod expense;
pub mod filter;
pub mod group;
pub mod income;
pub mod pledge;
pub mod summary;
