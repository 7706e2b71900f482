//! Run parameters, loaded from JSON.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "width": 120, "height": 90, "entity_count": 800, "layout": { "rooms": 20 } }
//! ```
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OutbreakError;
use crate::layout::WorldLayout;
use crate::population::{PopulationBounds, DEFAULT_PANIC_THRESHOLD, MAX_ENTITIES, MIN_ENTITIES};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    pub width: usize,
    pub height: usize,
    pub panic_threshold: u32,
    /// Requested initial population; capped at `width * height - 2`.
    pub entity_count: usize,
    pub min_entities: usize,
    pub max_entities: usize,
    /// Ticks to run before stopping.
    pub ticks: u64,
    /// Ticks between census lines.
    pub report_period: u64,
    pub layout: WorldLayout,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            width: 200,
            height: 150,
            panic_threshold: DEFAULT_PANIC_THRESHOLD,
            entity_count: 2000,
            min_entities: MIN_ENTITIES,
            max_entities: MAX_ENTITIES,
            ticks: 1000,
            report_period: 100,
            layout: WorldLayout::default(),
        }
    }
}

impl Parameters {
    /// Reads parameters from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be opened or isn't valid JSON for
    /// this struct.
    pub fn from_file(path: &Path) -> Result<Parameters, OutbreakError> {
        let reader = BufReader::new(File::open(path)?);
        let parameters = serde_json::from_reader(reader)?;
        Ok(parameters)
    }

    /// Checks the values are usable together.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDimension` for a grid smaller than 2x2, and
    /// `InvalidParameter` for inconsistent bounds, a zero report period, or
    /// oversized layout shapes.
    pub fn validate(&self) -> Result<(), OutbreakError> {
        if self.width < 2 || self.height < 2 {
            return Err(OutbreakError::InvalidDimension {
                width: self.width,
                height: self.height,
            });
        }
        if self.min_entities > self.max_entities {
            return Err(format!(
                "min_entities ({}) exceeds max_entities ({})",
                self.min_entities, self.max_entities
            )
            .into());
        }
        if self.report_period == 0 {
            return Err("report_period must be at least 1".into());
        }
        self.layout.validate()
    }

    #[must_use]
    pub fn bounds(&self) -> PopulationBounds {
        PopulationBounds {
            min: self.min_entities,
            max: self.max_entities,
        }
    }
}
