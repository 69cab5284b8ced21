//! Task catalog, scheduler tuning and scenario loading.
//!
//! All of these are injected once per run and treated as immutable while the
//! run lasts.  Without a file the built-in greenhouse catalog is used.
//!
//! The expected YAML structure is (every section is optional, unknown keys
//! are rejected):
//! ```yaml
//! profiles:
//!   MONITOR_WATER_LEVEL: { processing_cost: 8.5, memory_cost: 120.0 }
//!   CAPTURE_TIMELAPSE_IMAGE: { processing_cost: 95.0, memory_cost: 950.0 }
//! priorities:
//!   MONITOR_WATER_LEVEL: 10
//!   CAPTURE_TIMELAPSE_IMAGE: 1
//! scheduler:
//!   breadth: 3
//!   horizon: 5
//!   decay: 0.4
//!   emergency_threshold: 9
//! scenarios:
//!   - name: "Camera Trap"
//!     pool: [CAPTURE_TIMELAPSE_IMAGE, MONITOR_WATER_LEVEL]
//!     length: 10
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::scheduler::SchedulerError;
use crate::task::TaskProfile;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Number of leading queue positions considered as candidates (K).
pub const DEFAULT_BREADTH: usize = 3;

/// Maximum lookahead depth of a rollout (H).
pub const DEFAULT_HORIZON: usize = 5;

/// Fraction both resource fields shrink by after every step (D).
pub const DEFAULT_DECAY: f64 = 0.40;

/// Candidates at or above this priority count as high-priority work.
pub const DEFAULT_EMERGENCY_THRESHOLD: i32 = 9;

/// Processing load above this value (percent) is an overload.
pub const PROCESSING_LIMIT: f64 = 100.0;

/// Memory load above this value (bytes) is an overload.
pub const MEMORY_CAPACITY: f64 = 2048.0;

pub const WEIGHT_LOAD: f64 = 1.0;
pub const WEIGHT_MEMORY: f64 = 0.005;
pub const WEIGHT_WAIT: f64 = 10.0;

/// Priority for task types missing from the priority table.
pub const DEFAULT_PRIORITY: i32 = 1;

// ── SchedulerConfig ───────────────────────────────────────────────────────────

/// Fixed policy parameters of the predictive scheduler.
///
/// `Default` yields the reference policy; a YAML `scheduler:` section may
/// override individual fields.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    pub breadth: usize,
    pub horizon: usize,
    pub decay: f64,
    pub emergency_threshold: i32,
    pub processing_limit: f64,
    pub memory_capacity: f64,
    pub weight_load: f64,
    pub weight_memory: f64,
    pub weight_wait: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            breadth: DEFAULT_BREADTH,
            horizon: DEFAULT_HORIZON,
            decay: DEFAULT_DECAY,
            emergency_threshold: DEFAULT_EMERGENCY_THRESHOLD,
            processing_limit: PROCESSING_LIMIT,
            memory_capacity: MEMORY_CAPACITY,
            weight_load: WEIGHT_LOAD,
            weight_memory: WEIGHT_MEMORY,
            weight_wait: WEIGHT_WAIT,
        }
    }
}

impl SchedulerConfig {
    /// Reject parameter sets under which the policy is meaningless.
    ///
    /// # Errors
    /// [`SchedulerError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        let invalid = |field: &'static str, reason: &str| {
            Err(SchedulerError::InvalidConfig {
                field,
                reason: reason.to_string(),
            })
        };

        if self.breadth == 0 {
            return invalid("breadth", "must be at least 1");
        }
        if self.horizon == 0 {
            return invalid("horizon", "must be at least 1");
        }
        if !(0.0..1.0).contains(&self.decay) {
            return invalid("decay", "must be in [0, 1)");
        }
        // Written so that NaN fails every check.
        let positive = |x: f64| x.is_finite() && x > 0.0;
        let non_negative = |x: f64| x.is_finite() && x >= 0.0;

        if !positive(self.processing_limit) {
            return invalid("processing_limit", "must be positive");
        }
        if !positive(self.memory_capacity) {
            return invalid("memory_capacity", "must be positive");
        }
        if ![self.weight_load, self.weight_memory, self.weight_wait]
            .into_iter()
            .all(non_negative)
        {
            return invalid("weights", "cost weights must be finite and not negative");
        }
        Ok(())
    }
}

// ── TaskCatalog ───────────────────────────────────────────────────────────────

/// Task-type name → resource cost, and task-type name → priority.
#[derive(Debug, Clone, Default)]
pub struct TaskCatalog {
    profiles: HashMap<String, TaskProfile>,
    priorities: HashMap<String, i32>,
}

impl TaskCatalog {
    pub fn new(profiles: HashMap<String, TaskProfile>, priorities: HashMap<String, i32>) -> Self {
        Self {
            profiles,
            priorities,
        }
    }

    /// The five-sensor greenhouse catalog used when no file is supplied.
    pub fn greenhouse() -> Self {
        let profiles = [
            ("MONITOR_WATER_LEVEL", 8.5, 120.0),
            ("MONITOR_NUTRIENT_LEVEL", 8.5, 120.0),
            ("READ_AMBIENT_TEMP_HUMIDITY", 18.0, 250.0),
            ("CHECK_WATER_PH", 35.0, 310.0),
            ("CAPTURE_TIMELAPSE_IMAGE", 95.0, 950.0),
        ]
        .into_iter()
        .map(|(name, cpu, mem)| (name.to_string(), TaskProfile::new(cpu, mem)))
        .collect();

        let priorities = [
            ("MONITOR_WATER_LEVEL", 10),
            ("MONITOR_NUTRIENT_LEVEL", 10),
            ("CHECK_WATER_PH", 9),
            ("READ_AMBIENT_TEMP_HUMIDITY", 5),
            ("CAPTURE_TIMELAPSE_IMAGE", 1),
            ("UNKNOWN_TASK", 1),
        ]
        .into_iter()
        .map(|(name, p)| (name.to_string(), p))
        .collect();

        Self::new(profiles, priorities)
    }

    /// Builder used by tests and embedders to register one task type.
    pub fn with_task(mut self, name: impl Into<String>, profile: TaskProfile, priority: i32) -> Self {
        let name = name.into();
        self.profiles.insert(name.clone(), profile);
        self.priorities.insert(name, priority);
        self
    }

    /// Resource cost for `name`; unknown types cost nothing.
    pub fn profile(&self, name: &str) -> TaskProfile {
        self.profiles.get(name).copied().unwrap_or_default()
    }

    /// Priority for `name`; unknown types get [`DEFAULT_PRIORITY`].
    pub fn priority(&self, name: &str) -> i32 {
        self.priorities.get(name).copied().unwrap_or(DEFAULT_PRIORITY)
    }

    /// Names with a resource profile, sorted for deterministic output.
    pub fn task_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.keys().cloned().collect();
        names.sort();
        names
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

/// A named workload shape: which task types may appear and how many.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    pub name: String,
    pub pool: Vec<String>,
    pub length: usize,
}

impl ScenarioConfig {
    /// The three greenhouse scenarios.
    pub fn defaults() -> Vec<Self> {
        fn owned(names: &[&str]) -> Vec<String> {
            names.iter().map(|n| n.to_string()).collect()
        }

        vec![
            Self {
                name: "Routine Day".into(),
                pool: TaskCatalog::greenhouse().task_names(),
                length: 20,
            },
            Self {
                name: "Drought Alert".into(),
                pool: owned(&[
                    "MONITOR_WATER_LEVEL",
                    "CHECK_WATER_PH",
                    "MONITOR_NUTRIENT_LEVEL",
                ]),
                length: 15,
            },
            Self {
                name: "The Camera Trap".into(),
                pool: owned(&["READ_AMBIENT_TEMP_HUMIDITY", "CAPTURE_TIMELAPSE_IMAGE"]),
                length: 10,
            },
        ]
    }
}

// ── Private YAML deserialization types ────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    profiles: Option<HashMap<String, TaskProfile>>,
    priorities: Option<HashMap<String, i32>>,
    scheduler: Option<SchedulerConfig>,
    scenarios: Option<Vec<ScenarioConfig>>,
}

// ── CatalogManager ────────────────────────────────────────────────────────────

/// Holds the catalog, tuning and scenarios for one process.
///
/// Starts out with the built-in defaults; [`load_from_file`](Self::load_from_file)
/// replaces each section present in the file.
#[derive(Debug)]
pub struct CatalogManager {
    catalog: TaskCatalog,
    scheduler: SchedulerConfig,
    scenarios: Vec<ScenarioConfig>,
    loaded: bool,
}

impl Default for CatalogManager {
    fn default() -> Self {
        Self {
            catalog: TaskCatalog::greenhouse(),
            scheduler: SchedulerConfig::default(),
            scenarios: ScenarioConfig::defaults(),
            loaded: false,
        }
    }
}

impl CatalogManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `path` and replaces the sections it contains.
    ///
    /// Absent sections keep the built-in defaults.  On error the manager is
    /// left unchanged.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, the YAML is structurally
    /// invalid or contains unknown keys, or the `scheduler` section fails
    /// validation.
    pub fn load_from_file(&mut self, path: &Path) -> Result<()> {
        info!("Loading task catalog from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let file: CatalogFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        let scheduler = file.scheduler.unwrap_or_default();
        scheduler
            .validate()
            .with_context(|| format!("Invalid scheduler section in {}", path.display()))?;

        let defaults = TaskCatalog::greenhouse();
        let profiles = file.profiles.unwrap_or(defaults.profiles);
        let priorities = file.priorities.unwrap_or(defaults.priorities);

        for (name, profile) in &profiles {
            debug!(
                "  Task: {} | CPU: {:.1}% | Memory: {:.1} bytes | Priority: {}",
                name,
                profile.processing_cost,
                profile.memory_cost,
                priorities.get(name).copied().unwrap_or(DEFAULT_PRIORITY),
            );
        }

        let scenarios = match file.scenarios {
            Some(s) if s.is_empty() => {
                warn!("No scenarios found in configuration file, using default scenarios");
                ScenarioConfig::defaults()
            }
            Some(s) => s,
            None => ScenarioConfig::defaults(),
        };

        self.catalog = TaskCatalog::new(profiles, priorities);
        self.scheduler = scheduler;
        self.scenarios = scenarios;
        self.loaded = true;

        info!(
            task_types = self.catalog.profiles.len(),
            scenarios = self.scenarios.len(),
            breadth = self.scheduler.breadth,
            horizon = self.scheduler.horizon,
            "Task catalog loaded"
        );

        Ok(())
    }

    pub fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    pub fn scheduler_config(&self) -> &SchedulerConfig {
        &self.scheduler
    }

    pub fn scenarios(&self) -> &[ScenarioConfig] {
        &self.scenarios
    }

    /// Case-insensitive scenario lookup by name.
    pub fn scenario(&self, name: &str) -> Option<&ScenarioConfig> {
        self.scenarios
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Returns `true` after a successful [`load_from_file`](Self::load_from_file).
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    // ── SchedulerConfig ───────────────────────────────────────────────────────

    #[test]
    fn default_config_matches_reference_policy() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.breadth, 3);
        assert_eq!(cfg.horizon, 5);
        assert_eq!(cfg.decay, 0.40);
        assert_eq!(cfg.emergency_threshold, 9);
        assert_eq!(cfg.processing_limit, 100.0);
        assert_eq!(cfg.memory_capacity, 2048.0);
        assert_eq!(cfg.weight_load, 1.0);
        assert_eq!(cfg.weight_memory, 0.005);
        assert_eq!(cfg.weight_wait, 10.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_breadth() {
        let cfg = SchedulerConfig {
            breadth: 0,
            ..Default::default()
        };
        match cfg.validate() {
            Err(SchedulerError::InvalidConfig { field, .. }) => assert_eq!(field, "breadth"),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_decay_of_one() {
        let cfg = SchedulerConfig {
            decay: 1.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_nan_limits_and_weights() {
        let nan_limit = SchedulerConfig {
            processing_limit: f64::NAN,
            ..Default::default()
        };
        match nan_limit.validate() {
            Err(SchedulerError::InvalidConfig { field, .. }) => assert_eq!(field, "processing_limit"),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }

        let nan_capacity = SchedulerConfig {
            memory_capacity: f64::NAN,
            ..Default::default()
        };
        assert!(nan_capacity.validate().is_err());

        let nan_weight = SchedulerConfig {
            weight_wait: f64::NAN,
            ..Default::default()
        };
        match nan_weight.validate() {
            Err(SchedulerError::InvalidConfig { field, .. }) => assert_eq!(field, "weights"),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    // ── TaskCatalog ───────────────────────────────────────────────────────────

    #[test]
    fn unknown_task_has_zero_cost_and_default_priority() {
        let catalog = TaskCatalog::greenhouse();
        assert_eq!(catalog.profile("NOPE"), TaskProfile::default());
        assert_eq!(catalog.priority("NOPE"), DEFAULT_PRIORITY);
    }

    #[test]
    fn greenhouse_catalog_has_five_profiled_tasks() {
        let catalog = TaskCatalog::greenhouse();
        assert_eq!(catalog.task_names().len(), 5);
        assert_eq!(catalog.priority("MONITOR_WATER_LEVEL"), 10);
        assert_eq!(catalog.priority("CHECK_WATER_PH"), 9);
        assert_eq!(catalog.profile("CAPTURE_TIMELAPSE_IMAGE").processing_cost, 95.0);
    }

    #[test]
    fn with_task_registers_profile_and_priority() {
        let catalog = TaskCatalog::default().with_task("Heavy", TaskProfile::new(200.0, 0.0), 1);
        assert_eq!(catalog.profile("Heavy").processing_cost, 200.0);
        assert_eq!(catalog.priority("Heavy"), 1);
    }

    // ── CatalogManager: load_from_file ────────────────────────────────────────

    #[test]
    fn load_full_yaml() {
        let yaml = r#"
profiles:
  VIBRATION: { processing_cost: 7.0, memory_cost: 90.0 }
  CAMERA: { processing_cost: 20.0, memory_cost: 800.0 }
priorities:
  VIBRATION: 10
scheduler:
  breadth: 2
  horizon: 4
scenarios:
  - name: "Factory Floor A"
    pool: [VIBRATION, CAMERA]
    length: 12
"#;
        let f = yaml_tempfile(yaml);
        let mut mgr = CatalogManager::new();
        mgr.load_from_file(f.path()).unwrap();

        assert!(mgr.is_loaded());
        assert_eq!(mgr.catalog().profile("CAMERA").memory_cost, 800.0);
        assert_eq!(mgr.catalog().priority("VIBRATION"), 10);
        assert_eq!(mgr.catalog().priority("CAMERA"), DEFAULT_PRIORITY);
        assert_eq!(mgr.scheduler_config().breadth, 2);
        assert_eq!(mgr.scheduler_config().horizon, 4);
        // Fields absent from the section keep their defaults
        assert_eq!(mgr.scheduler_config().decay, DEFAULT_DECAY);
        assert_eq!(mgr.scenarios().len(), 1);
        assert_eq!(mgr.scenario("factory floor a").unwrap().length, 12);
    }

    #[test]
    fn absent_sections_fall_back_to_defaults() {
        let f = yaml_tempfile("scheduler:\n  horizon: 3\n");
        let mut mgr = CatalogManager::new();
        mgr.load_from_file(f.path()).unwrap();

        assert_eq!(mgr.catalog().task_names().len(), 5);
        assert_eq!(mgr.scenarios().len(), 3);
        assert_eq!(mgr.scheduler_config().horizon, 3);
    }

    #[test]
    fn empty_scenario_list_uses_default_scenarios() {
        let f = yaml_tempfile("scenarios: []\n");
        let mut mgr = CatalogManager::new();
        mgr.load_from_file(f.path()).unwrap();
        assert!(mgr.scenario("Routine Day").is_some());
    }

    #[test]
    fn invalid_scheduler_section_is_rejected_and_state_kept() {
        let f = yaml_tempfile("scheduler:\n  breadth: 0\n");
        let mut mgr = CatalogManager::new();
        assert!(mgr.load_from_file(f.path()).is_err());
        assert!(!mgr.is_loaded());
        assert_eq!(mgr.scheduler_config().breadth, DEFAULT_BREADTH);
    }

    #[test]
    fn nan_in_yaml_is_rejected() {
        let f = yaml_tempfile("scheduler:\n  memory_capacity: .nan\n");
        let mut mgr = CatalogManager::new();
        assert!(mgr.load_from_file(f.path()).is_err());
        assert_eq!(mgr.scheduler_config().memory_capacity, MEMORY_CAPACITY);
    }

    #[test]
    fn misspelled_keys_are_rejected() {
        for yaml in [
            "scheduler:\n  breath: 2\n",
            "profile:\n  CAMERA: { processing_cost: 20.0 }\n",
            "profiles:\n  CAMERA: { procesing_cost: 20.0 }\n",
            "scenarios:\n  - name: X\n    pool: [A]\n    lenght: 3\n",
        ] {
            let f = yaml_tempfile(yaml);
            let mut mgr = CatalogManager::new();
            assert!(mgr.load_from_file(f.path()).is_err(), "accepted: {yaml}");
            assert!(!mgr.is_loaded());
            assert_eq!(mgr.scheduler_config().breadth, DEFAULT_BREADTH);
        }
    }

    #[test]
    fn missing_file_returns_error() {
        let mut mgr = CatalogManager::new();
        let result = mgr.load_from_file(Path::new("/nonexistent/path/catalog.yaml"));
        assert!(result.is_err());
        assert!(!mgr.is_loaded());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        let mut mgr = CatalogManager::new();
        assert!(mgr.load_from_file(f.path()).is_err());
        assert!(!mgr.is_loaded());
    }

    // ── Scenarios ─────────────────────────────────────────────────────────────

    #[test]
    fn default_scenarios_match_greenhouse_setups() {
        let scenarios = ScenarioConfig::defaults();
        let lengths: Vec<_> = scenarios.iter().map(|s| s.length).collect();
        assert_eq!(lengths, vec![20, 15, 10]);
        assert_eq!(scenarios[0].pool.len(), 5);
    }
}
