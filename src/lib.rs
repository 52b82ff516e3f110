pub mod behavior;
pub mod collision;
pub mod config;
pub mod constants;
pub mod driver;
pub mod error;
pub mod grid;
pub mod level;
pub mod navigation;
pub mod scheduler;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;
