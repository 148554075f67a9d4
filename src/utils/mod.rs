pub mod latest;

pub use latest::latest_by_key;
