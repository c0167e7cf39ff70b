use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tokio::sync::watch;

use super::watcher::PowerSourceEvent;
use crate::error::{MonError, Result};
use crate::platform::windows::power as powercfg;

/// Windows "Balanced" scheme, applied when the machine goes on battery.
pub const BALANCED_SCHEME: &str = "381b4222-f694-41f0-9685-ff5bb260df2e";

/// `Power Scheme GUID: <guid>  (<name>) *`. Only the GUID, the parenthesised
/// name and the trailing star are matched, so localized labels still parse.
static SCHEME_LINE: Lazy<std::result::Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})\b\s*\((.*)\)\s*(\*)?\s*$",
    )
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PowerPlan {
    /// Lowercase GUID
    pub id: String,
    pub display_name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivateOutcome {
    AlreadyActive,
    Switched,
}

/// Parses `powercfg /list` output. Lines that are not scheme lines are
/// ignored.
pub fn parse_powercfg_list(output: &str) -> Result<Vec<PowerPlan>> {
    let scheme_line = SCHEME_LINE
        .as_ref()
        .map_err(|e| MonError::power_plan(format!("Invalid scheme pattern: {}", e)))?;

    Ok(output
        .lines()
        .filter_map(|line| scheme_line.captures(line.trim_end()))
        .map(|caps| PowerPlan {
            id: caps[1].to_lowercase(),
            display_name: caps[2].trim().to_string(),
            is_active: caps.get(3).is_some(),
        })
        .collect())
}

/// OS side of plan management.
pub trait PowerBackend: Send + Sync {
    fn list(&self) -> Result<Vec<PowerPlan>>;
    fn set_active(&self, id: &str) -> Result<()>;
}

/// Backend that shells out to `powercfg`.
#[derive(Debug, Default)]
pub struct PowercfgBackend;

impl PowerBackend for PowercfgBackend {
    fn list(&self) -> Result<Vec<PowerPlan>> {
        parse_powercfg_list(&powercfg::list_schemes()?)
    }

    fn set_active(&self, id: &str) -> Result<()> {
        powercfg::set_active_scheme(id)
    }
}

/// Lists and switches power plans, and publishes the list after every
/// change it makes.
pub struct PowerPlanManager {
    backend: Arc<dyn PowerBackend>,
    plans: watch::Sender<Vec<PowerPlan>>,
}

impl PowerPlanManager {
    pub fn new(backend: Arc<dyn PowerBackend>) -> Self {
        Self {
            backend,
            plans: watch::channel(Vec::new()).0,
        }
    }

    pub fn system() -> Self {
        Self::new(Arc::new(PowercfgBackend))
    }

    /// Latest published plan list.
    pub fn subscribe(&self) -> watch::Receiver<Vec<PowerPlan>> {
        self.plans.subscribe()
    }

    pub fn list_plans(&self) -> Result<Vec<PowerPlan>> {
        self.backend.list()
    }

    pub fn active_plan(&self) -> Result<Option<PowerPlan>> {
        Ok(self.list_plans()?.into_iter().find(|p| p.is_active))
    }

    /// Makes `plan_id` the active scheme. Activating the current plan is a
    /// successful no-op.
    pub fn activate(&self, plan_id: &str) -> Result<ActivateOutcome> {
        let id = plan_id.trim().to_lowercase();
        let plans = self.list_plans()?;

        let plan = plans
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| MonError::PlanNotFound(plan_id.to_string()))?;

        if plan.is_active {
            log::debug!("Power plan {} already active", plan.display_name);
            return Ok(ActivateOutcome::AlreadyActive);
        }

        self.backend.set_active(&id)?;
        log::info!("Activated power plan {} ({})", plan.display_name, id);
        self.refresh();
        Ok(ActivateOutcome::Switched)
    }

    /// Activates the plan whose display name matches `name` (trimmed,
    /// case-insensitive).
    pub fn activate_by_name(&self, name: &str) -> Result<ActivateOutcome> {
        let wanted = name.trim();
        let folded = wanted.to_lowercase();
        let matches: Vec<PowerPlan> = self
            .list_plans()?
            .into_iter()
            .filter(|p| p.display_name.trim().to_lowercase() == folded)
            .collect();

        match matches.as_slice() {
            [] => Err(MonError::PlanNotFound(wanted.to_string())),
            [plan] => self.activate(&plan.id),
            _ => Err(MonError::AmbiguousPlan {
                name: wanted.to_string(),
                ids: matches.into_iter().map(|p| p.id).collect(),
            }),
        }
    }

    /// Accepts either a GUID or a display name.
    pub fn activate_by_id_or_name(&self, target: &str) -> Result<ActivateOutcome> {
        if looks_like_guid(target.trim()) {
            self.activate(target)
        } else {
            self.activate_by_name(target)
        }
    }

    /// On battery, falls back to Balanced. Plugging in leaves the current
    /// plan alone.
    pub fn on_power_source_changed(&self, event: PowerSourceEvent) -> Result<()> {
        if event.on_ac_power {
            log::info!("AC power connected, keeping current power plan");
            return Ok(());
        }

        log::info!("Running on battery, switching to Balanced");
        match self.activate(BALANCED_SCHEME)? {
            ActivateOutcome::Switched => {}
            // activate only refreshes after a switch
            ActivateOutcome::AlreadyActive => self.refresh(),
        }
        Ok(())
    }

    fn refresh(&self) {
        match self.list_plans() {
            Ok(plans) => {
                self.plans.send_replace(plans);
            }
            Err(e) => log::warn!("Failed to re-list power plans: {}", e),
        }
    }
}

fn looks_like_guid(s: &str) -> bool {
    s.len() == 36
        && s.char_indices().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        })
}
