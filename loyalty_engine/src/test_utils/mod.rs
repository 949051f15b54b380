//! Helpers for tests that need a real, throwaway database.
pub mod prepare_env;

pub use prepare_env::{prepare_test_db, prepare_test_env, random_db_path};
