// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod frame_loop;
pub mod history;
pub mod input;
pub mod logging;
pub mod runtime;
pub mod scramble;
pub mod session;
pub mod timer;
pub mod ui;
pub mod util;
