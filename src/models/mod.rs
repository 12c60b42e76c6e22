pub mod config;
pub mod grid_spec;
pub mod page_format;

pub use config::{AppConfig, GridDefaults};
pub use grid_spec::{GridSpec, Orientation};
pub use page_format::PageFormat;
