pub mod config;
pub mod display;
pub mod errors;
pub mod generate;
pub mod harness;
pub mod logging;
pub mod reference;
pub mod subjects;
pub mod types;
pub mod ulp;
