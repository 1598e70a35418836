pub mod jwt;
pub mod password;
pub mod session;
pub mod store;
pub mod verification;
