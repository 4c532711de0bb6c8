// Library surface for the binary and the integration tests in tests/.
pub mod answers;
pub mod app;
pub mod app_dirs;
pub mod bank;
pub mod calculator;
pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod navigation;
pub mod palette;
pub mod runtime;
pub mod session;
pub mod store;
pub mod submission;
pub mod timer;
pub mod ui;
pub mod util;
