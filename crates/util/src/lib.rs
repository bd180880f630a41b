//! Small helpers shared by the api, engine, tui and cli crates.

pub mod date_handling;
pub mod path_processing;
pub mod text_processing;

pub use date_handling::{format_date, format_optional_date, format_timestamp};
pub use path_processing::{CONFIG_PATH_ENV, default_config_dir, default_config_path, expand_tilde};
pub use text_processing::{mask_secret, redact_sensitive};
