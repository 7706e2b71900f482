//! Logging for the simulation.
//!
//! The crate logs through the `log` facade and this module re-exports its five macros: `error!`,
//! `warn!`, `info!`, `debug!` and `trace!`. Census lines are printed by the runner and are not log
//! messages; logs go to stderr so the two never interleave on the same stream.
//!
//! Logging is _disabled_ by default. The runner enables it with `--log-level <level>`. It can also
//! be controlled from code:
//!
//!  - `enable_logging()`: turns on all log messages
//!  - `disable_logging()`: turns off all log messages
//!  - `set_log_level(level: LevelFilter)`: enables only log messages with priority at least `level`
//!
//! Per-module filters narrow or widen the global level for one module path:
//!
//! ```rust
//! use outbreak::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! // Tick summaries, but every bite and placement in the population.
//! set_log_level(LevelFilter::Info);
//! set_module_filter("outbreak::population", LevelFilter::Trace);
//! ```
mod console_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};
use std::collections::hash_map::Entry;

use crate::hashing::HashMap;
use log4rs::Handle;
use std::sync::LazyLock;
use std::sync::{Mutex, MutexGuard};

// Logging disabled
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;
// Default module specific filters
const DEFAULT_MODULE_FILTERS: [(&str, LevelFilter); 1] = [
    // One trace line per scheduled plan drowns everything else.
    ("outbreak::plan", LevelFilter::Debug),
];

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// A level filter for one module path (e.g. `"outbreak::agent"`).
#[derive(Debug, PartialEq)]
struct ModuleLogConfiguration {
    module: String,
    level: LevelFilter,
}

impl From<(&str, LevelFilter)> for ModuleLogConfiguration {
    fn from((module, level): (&str, LevelFilter)) -> Self {
        Self {
            module: module.to_string(),
            level,
        }
    }
}

/// The process-wide logging state: the global level, the module filters,
/// and the handle to the installed `log4rs` logger.
///
/// Only the singleton behind `LOG_CONFIGURATION` exists. The public API is
/// the free functions below.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// Level for modules without their own filter. `LevelFilter::Off`
    /// disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_configurations: HashMap<String, ModuleLogConfiguration>,
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        let module_configurations = DEFAULT_MODULE_FILTERS
            .map(|(module, level)| (module.to_string(), (module, level).into()));
        let module_configurations = HashMap::from_iter(module_configurations);
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations,
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    pub(in crate::log) fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the configuration was mutated, false otherwise.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_configurations.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                let module_config = entry.get_mut();
                if module_config.level == level {
                    return false;
                }
                module_config.level = level;
            }
            Entry::Vacant(entry) => {
                entry.insert((module, level).into());
            }
        }
        true
    }

    pub(in crate::log) fn set_module_filter(&mut self, module: &str, level: LevelFilter) {
        if self.insert_module_filter(module, level) {
            self.set_config();
        }
    }

    pub(in crate::log) fn set_module_filters(&mut self, module_filters: &[(&str, LevelFilter)]) {
        let mut mutated = false;
        for (module, level) in module_filters {
            mutated |= self.insert_module_filter(module, *level);
        }
        if mutated {
            self.set_config();
        }
    }

    pub(in crate::log) fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }
}

/// Enables every log message. Equivalent to `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Disables logging completely. Equivalent to `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the global log level.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    get_log_configuration().set_module_filter(module_path, level_filter);
}

/// Removes the filter for `module_path`; the global level applies to it again.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

/// Sets several module filters at once, rebuilding the logger only once.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    get_log_configuration().set_module_filters(module_filters);
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}
