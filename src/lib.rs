pub mod db;

pub mod contracts;
pub mod hedges;
pub mod market_data;
pub mod mtm;

pub mod constants;
pub mod errors;
pub mod schema;
pub mod utils;

pub use mtm::*;
