// UI and formatting module

pub mod dashboard_tui;
pub mod formatters;
pub mod prompts;

// Re-export commonly used items for cleaner imports
pub use formatters::{capacity_bar, format_age, format_since, format_time};
pub use prompts::{confirm, dimmed, error, info, select_from_list, success, warn};
