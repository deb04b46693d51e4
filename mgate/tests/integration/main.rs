//! Binary-level tests: spawn `mgate` inside a temporary git repository.

#[path = "../common/mod.rs"]
mod common;

mod advise_tests;
mod command_tests;
mod config_tests;
mod hook_tests;
