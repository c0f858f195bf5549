// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod catalog;
pub mod checker;
pub mod config;
pub mod evaluator;
pub mod history;
pub mod logging;
pub mod resolver;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod stats;
pub mod ui;
pub mod util;
