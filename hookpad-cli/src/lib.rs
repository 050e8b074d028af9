// ABOUTME: Library exports for hookpad CLI modules for testing and external use
// ABOUTME: Makes internal modules available to integration tests and benchmarks

pub mod artifact;
pub mod cli;
pub mod cli_output;
pub mod completions;
pub mod config;
pub mod constants;
pub mod debounce;
pub mod fitting;
pub mod flow;
pub mod normalize;
pub mod output;
pub mod session;
pub mod signature;
