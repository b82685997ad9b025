pub mod collector;
pub mod sources;
