pub mod catalog;
pub mod page_model;
pub mod params;
