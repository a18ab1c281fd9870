pub mod config;
pub mod paths;
pub mod state;
pub mod validation;
