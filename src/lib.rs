//! A grid simulation of a zombie outbreak.
//!
//! Humans and zombies live on an occupancy grid, a 2D array with one
//! category per cell. Each tick every agent looks along its facing, decides
//! whether to move or turn, and redraws itself. Zombies that see a human in
//! the adjacent cell bite it; bitten humans become zombies. The first agent
//! created is patient zero and can never be cured.
//!
//! The simulation is driven by a `Context`, which holds module data as type
//! keyed data plugins and runs timed plans in order:
//! * `random` derives independent, reproducible random streams from one seed
//! * `layout` carves streets and rooms out of a solid world
//! * `population` owns the grid and the agents and steps them each tick
//! * `runner` wires these together behind a command line
//!
//! The core pieces (`grid`, `sensing`, `agent`) work on plain values and a
//! [`random::RandomSource`], so they can be driven directly:
//!
//! ```rust
//! use outbreak::prelude::*;
//!
//! let grid = OccupancyGrid::walled(30, 20).unwrap();
//! let mut population = PopulationState::initialize(grid, 5, 40, Box::new(SeededRandom::new(7)));
//! for _ in 0..10 {
//!     population.step();
//! }
//! assert_eq!(population.census().total(), 40);
//! ```
pub mod agent;
pub mod context;
pub mod error;
pub mod facing;
pub mod grid;
pub mod hashing;
pub mod layout;
pub mod log;
pub mod parameters;
pub mod plan;
pub mod population;
pub mod prelude;
pub mod random;
pub mod runner;
pub mod sensing;

pub use crate::context::Context;
pub use crate::error::OutbreakError;
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::population::initialize;
