pub mod admin;
pub mod contribute;
pub mod funding;
pub mod lifecycle;
pub mod migrate;
pub mod reward;
