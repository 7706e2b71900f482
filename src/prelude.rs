pub use crate::agent::{Agent, AgentId, AgentKind};
pub use crate::context::Context;
pub use crate::error::OutbreakError;
pub use crate::facing::Facing;
pub use crate::grid::{Category, OccupancyGrid, Position, Rgb};
pub use crate::layout::{generate_world, WorldLayout};
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::parameters::Parameters;
pub use crate::population::{
    AgentSnapshot, Census, ContextPopulationExt, PopulationBounds, PopulationState,
};
pub use crate::random::{ContextRandomExt, RandomSource, ScriptedRandom, SeededRandom};
pub use crate::runner::{run_with_args, BaseArgs};
pub use crate::sensing::{far_look, near_look, Target};
pub use crate::define_data_plugin;
