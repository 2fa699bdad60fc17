pub mod config;
pub mod run;
pub mod status;

pub use config::{init_config, show_config};
pub use run::run_load;
pub use status::show_status;
