pub mod alerts;
pub mod app_error;
pub mod exposure;
pub mod jwt;
pub mod price_map;
pub mod use_cases;
