pub mod dispatch;
pub mod error;
pub mod navigator;
pub mod step;
pub mod trace;
