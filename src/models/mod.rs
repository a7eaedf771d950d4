pub mod base_model;
pub mod ema;
pub mod ensemble_outlier;
pub mod iforest;
pub mod seasonal;
