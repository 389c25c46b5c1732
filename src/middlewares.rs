pub mod jwt;
pub mod membership;
