//! Integration test modules

mod collector_tests;
mod config_tests;
mod stub;
