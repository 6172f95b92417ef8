pub mod driver;
pub mod error;
pub mod session;
