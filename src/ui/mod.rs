// UI and formatting module

pub mod console;
pub mod formatters;
pub mod labels;

// Re-export commonly used items for cleaner imports
pub use console::{error, info, print_labels, print_plans, print_settings, print_snapshot, success, warn};
pub use formatters::{format_clock, format_minutes, size_suffix, size_suffix_u64};
pub use labels::{LabelBoard, Labels};
