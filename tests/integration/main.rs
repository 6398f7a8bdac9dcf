//! Integration tests for the trigger runtime.

mod helpers;

mod config_test;
mod failure_test;
mod isolation_test;
