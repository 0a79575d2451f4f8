//! Property test modules

mod retry_tests;
mod summary_tests;
mod text_tests;
