pub mod comparator;
pub mod engine;
pub mod scorer;
pub mod shipping;
pub mod types;
