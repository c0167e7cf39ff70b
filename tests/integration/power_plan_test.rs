use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use g14mon::core::power::{
    parse_powercfg_list, watch_power_source, AcLineSource, ActivateOutcome, PowerBackend,
    PowerPlan, PowerPlanManager, BALANCED_SCHEME,
};
use g14mon::MonError;

const LISTING: &str = "\
Existing Power Schemes (* Active)
-----------------------------------
Power Scheme GUID: 381b4222-f694-41f0-9685-ff5bb260df2e  (Balanced)
Power Scheme GUID: 8c5e7fda-e8bf-4a96-9a85-a6e23a8c635c  (High performance) *
Power Scheme GUID: a1841308-3541-4fab-bc81-f71556f20b4a  (Power saver)
";

/// In-memory scheme table standing in for powercfg.
struct SchemeTable {
    plans: Mutex<Vec<PowerPlan>>,
    switches: Mutex<Vec<String>>,
}

impl SchemeTable {
    fn new() -> Self {
        Self {
            plans: Mutex::new(parse_powercfg_list(LISTING).unwrap()),
            switches: Mutex::new(Vec::new()),
        }
    }
}

impl PowerBackend for SchemeTable {
    fn list(&self) -> g14mon::Result<Vec<PowerPlan>> {
        Ok(self.plans.lock().clone())
    }

    fn set_active(&self, id: &str) -> g14mon::Result<()> {
        let mut plans = self.plans.lock();
        if !plans.iter().any(|p| p.id == id) {
            return Err(MonError::PlanNotFound(id.to_string()));
        }
        for plan in plans.iter_mut() {
            plan.is_active = plan.id == id;
        }
        self.switches.lock().push(id.to_string());
        Ok(())
    }
}

struct Unplugging(Mutex<VecDeque<Option<bool>>>);

impl AcLineSource for Unplugging {
    fn on_ac_power(&self) -> Option<bool> {
        self.0.lock().pop_front().unwrap_or(Some(false))
    }
}

#[test]
fn test_exactly_one_plan_active_after_every_switch() {
    let backend = Arc::new(SchemeTable::new());
    let manager = PowerPlanManager::new(backend.clone());

    for target in ["Power saver", "balanced", "HIGH PERFORMANCE", "Balanced"] {
        manager.activate_by_id_or_name(target).unwrap();
        let plans = manager.list_plans().unwrap();
        let active: Vec<_> = plans.iter().filter(|p| p.is_active).collect();
        assert_eq!(active.len(), 1);
        assert!(active[0].display_name.eq_ignore_ascii_case(target));
    }
    assert_eq!(backend.switches.lock().len(), 4);
}

#[test]
fn test_activating_active_plan_by_guid_is_a_no_op() {
    let backend = Arc::new(SchemeTable::new());
    let manager = PowerPlanManager::new(backend.clone());

    let outcome = manager
        .activate_by_id_or_name("8C5E7FDA-E8BF-4A96-9A85-A6E23A8C635C")
        .unwrap();

    assert_eq!(outcome, ActivateOutcome::AlreadyActive);
    assert!(backend.switches.lock().is_empty());
}

#[test]
fn test_unknown_name_leaves_active_plan_alone() {
    let manager = PowerPlanManager::new(Arc::new(SchemeTable::new()));

    assert!(matches!(
        manager.activate_by_id_or_name("Ultimate Performance"),
        Err(MonError::PlanNotFound(_))
    ));
    assert_eq!(
        manager.active_plan().unwrap().unwrap().display_name,
        "High performance"
    );
}

#[tokio::test(start_paused = true)]
async fn test_unplugging_switches_to_balanced() {
    let backend = Arc::new(SchemeTable::new());
    let manager = Arc::new(PowerPlanManager::new(backend.clone()));
    let mut published = manager.subscribe();

    let source = Arc::new(Unplugging(Mutex::new(VecDeque::from(vec![
        Some(true),
        None,
        Some(true),
        Some(false),
    ]))));
    let (tx, mut rx) = mpsc::channel(8);
    let (stop, stopped) = watch::channel(false);
    let watcher = tokio::spawn(watch_power_source(source, Duration::from_secs(5), tx, stopped));

    let event = rx.recv().await.unwrap();
    assert!(!event.on_ac_power);
    manager.on_power_source_changed(event).unwrap();

    assert_eq!(*backend.switches.lock(), vec![BALANCED_SCHEME.to_string()]);
    assert!(published.has_changed().unwrap());
    let plans = published.borrow_and_update().clone();
    let active: Vec<_> = plans.iter().filter(|p| p.is_active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, BALANCED_SCHEME);

    stop.send(true).unwrap();
    watcher.await.unwrap();
}

#[test]
fn test_plugging_in_does_not_restore_previous_plan() {
    let backend = Arc::new(SchemeTable::new());
    let manager = PowerPlanManager::new(backend.clone());

    manager
        .on_power_source_changed(g14mon::core::power::PowerSourceEvent { on_ac_power: false })
        .unwrap();
    manager
        .on_power_source_changed(g14mon::core::power::PowerSourceEvent { on_ac_power: true })
        .unwrap();

    assert_eq!(manager.active_plan().unwrap().unwrap().id, BALANCED_SCHEME);
    assert_eq!(backend.switches.lock().len(), 1);
}
