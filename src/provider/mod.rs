pub mod factory;
pub mod traits;
pub mod types;

pub mod hermes;
pub mod simulated;

#[cfg(test)]
mod hermes_tests;
