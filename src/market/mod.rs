pub mod generator;
pub mod projector;
pub mod roster;

#[cfg(test)]
mod roster_tests;
