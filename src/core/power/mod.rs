//! Power plan management and AC/DC transition handling.

pub mod plan;
pub mod watcher;

pub use plan::{
    parse_powercfg_list, ActivateOutcome, PowerBackend, PowerPlan, PowerPlanManager,
    PowercfgBackend, BALANCED_SCHEME,
};
pub use watcher::{
    watch_power_source, AcLineSource, BatteryAcLine, PowerSourceEvent, TransitionTracker,
    POWER_SOURCE_POLL,
};
