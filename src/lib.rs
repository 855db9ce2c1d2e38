pub mod catalog;
pub mod classify;
pub mod fetch;
pub mod filter;
pub mod model;
pub mod parser;
pub mod pass;
pub mod resolve;
pub mod zones;
