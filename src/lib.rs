pub mod app;
pub mod shutdown;

pub use app::{build_scheduler, load_config, Application, CliOverrides};
pub use shutdown::ShutdownManager;
