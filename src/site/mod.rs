pub mod site_model;
pub mod site_page;
