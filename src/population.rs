//! The population: every agent, the grid they share, and the rules for
//! growing and shrinking the crowd.
//!
//! A tick steps every agent exactly once, strictly in population order, and
//! applies each agent's effects before the next agent moves. Nothing is
//! snapshotted, so later agents in a tick react to earlier ones.
//!
//! Adding, removing, infecting, curing and restarting are only meaningful
//! between ticks. `PopulationState` is driven through `&mut self`, so a tick
//! in progress cannot be interleaved with them.
use log::{debug, info, trace, warn};
use serde::Serialize;

use crate::agent::{Agent, AgentId, AgentKind};
use crate::context::Context;
use crate::define_data_plugin;
use crate::error::OutbreakError;
use crate::facing::Facing;
use crate::grid::{Category, OccupancyGrid, Position};
use crate::layout::{generate_world, WorldLayout};
use crate::parameters::Parameters;
use crate::random::{ContextRandomExt, RandomSource};

/// Default floor for `remove_entities`.
pub const MIN_ENTITIES: usize = 100;
/// Default ceiling for `add_entities`.
pub const MAX_ENTITIES: usize = 4000;
/// The most agents a single add or remove call touches.
pub const BATCH_LIMIT: usize = 100;
/// Panic threshold used when none is configured.
pub const DEFAULT_PANIC_THRESHOLD: u32 = 5;

/// The range `add_entities` and `remove_entities` keep the population in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PopulationBounds {
    pub min: usize,
    pub max: usize,
}

impl Default for PopulationBounds {
    fn default() -> Self {
        PopulationBounds {
            min: MIN_ENTITIES,
            max: MAX_ENTITIES,
        }
    }
}

/// What a renderer needs to know about one agent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub position: Position,
    pub facing: Facing,
    pub kind: AgentKind,
    pub activity: u32,
}

impl From<&Agent> for AgentSnapshot {
    fn from(agent: &Agent) -> Self {
        AgentSnapshot {
            id: agent.id(),
            position: agent.position(),
            facing: agent.facing(),
            kind: agent.kind(),
            activity: agent.activity(),
        }
    }
}

/// Head counts by drawn category.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Census {
    pub humans: usize,
    pub panicked: usize,
    pub zombies: usize,
}

impl Census {
    #[must_use]
    pub fn total(&self) -> usize {
        self.humans + self.panicked + self.zombies
    }

    /// Humans in either state.
    #[must_use]
    pub fn survivors(&self) -> usize {
        self.humans + self.panicked
    }
}

pub struct PopulationState {
    grid: OccupancyGrid,
    agents: Vec<Agent>,
    patient_zero: Option<AgentId>,
    next_id: u64,
    panic_threshold: u32,
    bounds: PopulationBounds,
    random: Box<dyn RandomSource>,
    ticks: u64,
}

impl PopulationState {
    /// A population with no agents on `grid`.
    #[must_use]
    pub fn empty(grid: OccupancyGrid, random: Box<dyn RandomSource>) -> Self {
        PopulationState {
            grid,
            agents: Vec::new(),
            patient_zero: None,
            next_id: 0,
            panic_threshold: DEFAULT_PANIC_THRESHOLD,
            bounds: PopulationBounds::default(),
            random,
            ticks: 0,
        }
    }

    /// Creates `min(width * height - 2, entity_count)` agents, places each on
    /// the grid, and infects the first one, who becomes patient zero.
    #[must_use]
    pub fn initialize(
        grid: OccupancyGrid,
        panic_threshold: u32,
        entity_count: usize,
        random: Box<dyn RandomSource>,
    ) -> Self {
        let mut state = PopulationState::empty(grid, random);
        state.panic_threshold = panic_threshold;

        let capacity = state.grid.width() * state.grid.height() - 2;
        let count = capacity.min(entity_count);
        for _ in 0..count {
            let facing = Facing::random(state.random.as_mut());
            let id = state.next_agent_id();
            state.agents.push(Agent::new(id, facing));
        }
        for agent in &mut state.agents {
            agent.place(&mut state.grid, state.random.as_mut());
        }

        if let Some(first) = state.agents.first_mut() {
            first.infect(&mut state.grid);
            state.patient_zero = Some(first.id());
            debug!("patient zero is {:?} at {:?}", first.id(), first.position());
        }
        info!(
            "initialized population of {} on a {}x{} grid",
            state.agents.len(),
            state.grid.width(),
            state.grid.height()
        );
        state
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: PopulationBounds) -> Self {
        self.bounds = bounds;
        self
    }

    fn next_agent_id(&mut self) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Adds an agent with the given state at the end of the population order
    /// and draws it. Bounds are not checked.
    pub fn spawn(
        &mut self,
        position: Position,
        facing: Facing,
        kind: AgentKind,
        activity: u32,
    ) -> AgentId {
        let id = self.next_agent_id();
        let agent = Agent::with_state(id, position, facing, kind, activity);
        agent.draw(&mut self.grid);
        self.agents.push(agent);
        id
    }

    #[must_use]
    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id() == id)
    }

    fn agent_mut(&mut self, id: AgentId) -> Result<&mut Agent, OutbreakError> {
        self.agents
            .iter_mut()
            .find(|agent| agent.id() == id)
            .ok_or(OutbreakError::UnknownAgent { id: id.0 })
    }

    #[must_use]
    pub fn patient_zero(&self) -> Option<AgentId> {
        self.patient_zero
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    #[must_use]
    pub fn bounds(&self) -> PopulationBounds {
        self.bounds
    }

    /// Ticks stepped since the population was created.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn panic_threshold(&self) -> u32 {
        self.panic_threshold
    }

    /// Humans move unprompted when their movement roll exceeds this value.
    pub fn set_panic_threshold(&mut self, value: u32) {
        debug!("panic threshold {} -> {}", self.panic_threshold, value);
        self.panic_threshold = value;
    }

    /// Advances every agent by one tick, in population order.
    pub fn step(&mut self) {
        for index in 0..self.agents.len() {
            let bite = self.agents[index].step(
                &mut self.grid,
                self.random.as_mut(),
                self.panic_threshold,
            );
            if let Some(cell) = bite {
                self.bite(self.agents[index].id(), cell);
            }
        }
        self.ticks += 1;
    }

    /// Infects every human standing exactly on `cell`, whatever the grid
    /// currently shows there.
    fn bite(&mut self, biter: AgentId, cell: Position) {
        for victim in self
            .agents
            .iter_mut()
            .filter(|agent| agent.is_human() && agent.position() == cell)
        {
            trace!("{:?} bit {:?} at {:?}", biter, victim.id(), cell);
            victim.infect(&mut self.grid);
        }
    }

    /// Appends up to `n` new humans (at most `BATCH_LIMIT` per call), stopping
    /// once the population reaches its maximum. Returns how many were added.
    pub fn add_entities(&mut self, n: usize) -> usize {
        let mut added = 0;
        for _ in 0..n.min(BATCH_LIMIT) {
            if self.agents.len() >= self.bounds.max {
                break;
            }
            let facing = Facing::random(self.random.as_mut());
            let mut agent = Agent::new(self.next_agent_id(), facing);
            agent.place(&mut self.grid, self.random.as_mut());
            self.agents.push(agent);
            added += 1;
        }
        debug!(
            "added {added} of {n} requested agents, population {}",
            self.len()
        );
        added
    }

    /// Removes up to `n` agents (at most `BATCH_LIMIT` per call) from the end
    /// of the population order, clearing their cells. Stops at the minimum
    /// and never removes patient zero. Returns how many were removed.
    pub fn remove_entities(&mut self, n: usize) -> usize {
        let mut removed = 0;
        for _ in 0..n.min(BATCH_LIMIT) {
            if self.agents.len() <= self.bounds.min {
                break;
            }
            match self.agents.last() {
                Some(last) if Some(last.id()) != self.patient_zero => {}
                _ => break,
            }
            if let Some(agent) = self.agents.pop() {
                agent.clear(&mut self.grid);
                removed += 1;
            }
        }
        debug!(
            "removed {removed} of {n} requested agents, population {}",
            self.len()
        );
        removed
    }

    /// Turns the agent into a zombie.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAgent` if no agent has this id.
    pub fn infect(&mut self, id: AgentId) -> Result<(), OutbreakError> {
        let Self { agents, grid, .. } = self;
        let agent = agents
            .iter_mut()
            .find(|agent| agent.id() == id)
            .ok_or(OutbreakError::UnknownAgent { id: id.0 })?;
        agent.infect(grid);
        trace!("infected {id:?}");
        Ok(())
    }

    /// Turns the agent back into a calm human at a fresh position. Patient
    /// zero stays infected; curing it only logs a warning.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAgent` if no agent has this id.
    pub fn cure(&mut self, id: AgentId) -> Result<(), OutbreakError> {
        if Some(id) == self.patient_zero {
            self.agent_mut(id)?;
            warn!("refusing to cure patient zero {id:?}");
            return Ok(());
        }
        let Self {
            agents,
            grid,
            random,
            ..
        } = self;
        let agent = agents
            .iter_mut()
            .find(|agent| agent.id() == id)
            .ok_or(OutbreakError::UnknownAgent { id: id.0 })?;
        agent.cure(grid, random.as_mut());
        trace!("cured {id:?}");
        Ok(())
    }

    /// Cures and re-places every agent, then infects patient zero again.
    pub fn restart(&mut self) {
        for agent in &mut self.agents {
            agent.cure(&mut self.grid, self.random.as_mut());
        }
        if let Some(id) = self.patient_zero {
            if let Some(agent) = self.agents.iter_mut().find(|agent| agent.id() == id) {
                agent.infect(&mut self.grid);
            }
        }
        info!("restarted population of {}", self.len());
    }

    /// The state of every agent, in population order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<AgentSnapshot> {
        self.agents.iter().map(AgentSnapshot::from).collect()
    }

    #[must_use]
    pub fn census(&self) -> Census {
        let mut census = Census::default();
        for agent in &self.agents {
            match agent.category() {
                Category::Human => census.humans += 1,
                Category::HumanPanic => census.panicked += 1,
                _ => census.zombies += 1,
            }
        }
        census
    }
}

/// Builds a world with the default layout and populates it. The world and
/// the population draw from the same `random` source, world first.
///
/// # Errors
///
/// Returns `InvalidDimension` if either side is shorter than 2.
pub fn initialize(
    width: usize,
    height: usize,
    panic_threshold: u32,
    entity_count: usize,
    mut random: Box<dyn RandomSource>,
) -> Result<PopulationState, OutbreakError> {
    let grid = generate_world(width, height, &WorldLayout::default(), random.as_mut())?;
    let state = PopulationState::initialize(grid, panic_threshold, entity_count, random);
    Ok(state)
}

define_data_plugin!(PopulationPlugin, Option<PopulationState>, None);

pub trait ContextPopulationExt {
    /// Generates the world and the initial population from `parameters`.
    /// The world is laid out with the `"world"` random stream and the
    /// population uses the `"population"` stream.
    ///
    /// # Errors
    ///
    /// Returns an error if `parameters` fail validation.
    fn init_population(&mut self, parameters: &Parameters) -> Result<(), OutbreakError>;

    fn population(&self) -> Option<&PopulationState>;

    fn population_mut(&mut self) -> Option<&mut PopulationState>;
}

impl ContextPopulationExt for Context {
    fn init_population(&mut self, parameters: &Parameters) -> Result<(), OutbreakError> {
        parameters.validate()?;
        let mut world_random = self.random_stream("world");
        let grid = generate_world(
            parameters.width,
            parameters.height,
            &parameters.layout,
            &mut world_random,
        )?;
        let random = Box::new(self.random_stream("population"));
        let state = PopulationState::initialize(
            grid,
            parameters.panic_threshold,
            parameters.entity_count,
            random,
        )
        .with_bounds(parameters.bounds());
        *self.get_data_mut(PopulationPlugin) = Some(state);
        Ok(())
    }

    fn population(&self) -> Option<&PopulationState> {
        self.get_data(PopulationPlugin).and_then(Option::as_ref)
    }

    fn population_mut(&mut self) -> Option<&mut PopulationState> {
        self.get_data_mut(PopulationPlugin).as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ACTIVE_AMOUNT;
    use crate::random::{ScriptedRandom, SeededRandom};

    fn seeded(seed: u64) -> Box<dyn RandomSource> {
        Box::new(SeededRandom::new(seed))
    }

    fn open_population(size: usize, seed: u64) -> PopulationState {
        PopulationState::initialize(
            OccupancyGrid::walled(60, 60).unwrap(),
            DEFAULT_PANIC_THRESHOLD,
            size,
            seeded(seed),
        )
    }

    fn assert_drawn_categories_match(state: &PopulationState) {
        // Overlapping agents hide each other, so only check unshared cells.
        for agent in state.agents() {
            let shared = state
                .agents()
                .iter()
                .filter(|other| other.position() == agent.position())
                .count()
                > 1;
            if !shared {
                assert_eq!(
                    state.grid().get(agent.position()).unwrap(),
                    agent.category()
                );
            }
        }
    }

    #[test]
    fn initialize_infects_patient_zero() {
        let state = open_population(50, 1);
        assert_eq!(state.len(), 50);
        let patient_zero = state.patient_zero().unwrap();
        assert_eq!(state.agents()[0].id(), patient_zero);
        assert_eq!(state.agents()[0].kind(), AgentKind::Zombie);
        assert_eq!(state.census().zombies, 1);
        assert_eq!(state.census().humans, 49);
        assert_drawn_categories_match(&state);
    }

    #[test]
    fn initialize_caps_population_to_grid_size() {
        let grid = OccupancyGrid::walled(3, 3).unwrap();
        let state = PopulationState::initialize(grid, 5, 50, seeded(3));
        assert_eq!(state.len(), 7);
    }

    #[test]
    fn empty_population_has_no_patient_zero() {
        let state = open_population(0, 1);
        assert!(state.is_empty());
        assert_eq!(state.patient_zero(), None);
    }

    #[test]
    fn add_entities_respects_batch_and_ceiling() {
        let bounds = PopulationBounds { min: 5, max: 150 };
        let mut state = open_population(10, 2).with_bounds(bounds);
        assert_eq!(state.add_entities(500), BATCH_LIMIT);
        assert_eq!(state.len(), 110);
        assert_eq!(state.add_entities(100), 40);
        assert_eq!(state.len(), 150);
        assert_eq!(state.add_entities(1), 0);
        assert!(state.agents()[10..].iter().all(Agent::is_human));
    }

    #[test]
    fn remove_entities_respects_batch_and_floor() {
        let bounds = PopulationBounds {
            min: 120,
            max: 4000,
        };
        let mut state = open_population(300, 4).with_bounds(bounds);
        let removed_ids: Vec<_> = state.agents()[200..].iter().map(Agent::id).collect();
        let removed_cells: Vec<_> = state.agents()[200..].iter().map(Agent::position).collect();
        assert_eq!(state.remove_entities(250), BATCH_LIMIT);
        assert_eq!(state.len(), 200);
        for id in removed_ids {
            assert!(state.agent(id).is_none());
        }
        for cell in removed_cells {
            if state.agents().iter().all(|agent| agent.position() != cell) {
                assert_eq!(state.grid().get(cell).unwrap(), Category::Empty);
            }
        }
        assert_eq!(state.remove_entities(100), 80);
        assert_eq!(state.len(), 120);
        assert_eq!(state.remove_entities(100), 0);
    }

    #[test]
    fn bounds_hold_over_mixed_requests() {
        let bounds = PopulationBounds { min: 20, max: 260 };
        let mut state = open_population(100, 5).with_bounds(bounds);
        let mut random = SeededRandom::new(99);
        for _ in 0..60 {
            let n = random.below(250) as usize;
            if random.below(2) == 0 {
                state.add_entities(n);
            } else {
                state.remove_entities(n);
            }
            assert!(state.len() >= bounds.min && state.len() <= bounds.max);
            assert_eq!(state.agents()[0].id(), state.patient_zero().unwrap());
        }
    }

    #[test]
    fn patient_zero_survives_removal_with_low_floor() {
        let bounds = PopulationBounds { min: 0, max: 10 };
        let mut state = open_population(5, 6).with_bounds(bounds);
        assert_eq!(state.remove_entities(100), 4);
        assert_eq!(state.len(), 1);
        assert_eq!(state.agents()[0].id(), state.patient_zero().unwrap());
    }

    #[test]
    fn zombie_bites_every_human_on_the_cell() {
        let grid = OccupancyGrid::walled(20, 20).unwrap();
        let mut state = PopulationState::empty(grid, Box::new(ScriptedRandom::default()));
        let zombie = state.spawn(Position::new(5, 5), Facing::East, AgentKind::Zombie, 0);
        let first = state.spawn(Position::new(6, 5), Facing::East, AgentKind::Human, 3);
        let second = state.spawn(Position::new(6, 5), Facing::East, AgentKind::Human, 0);
        state.step();
        for id in [first, second] {
            let victim = state.agent(id).unwrap();
            assert_eq!(victim.kind(), AgentKind::Zombie);
        }
        assert_eq!(state.agent(zombie).unwrap().activity(), ACTIVE_AMOUNT);
        assert_eq!(state.ticks(), 1);
    }

    #[test]
    fn later_agents_see_earlier_moves_in_same_tick() {
        let grid = OccupancyGrid::walled(20, 20).unwrap();
        // First agent: panicked human moves East into (6,5). Second agent: a
        // zombie at (7,5) facing West sees it there and bites.
        let random = ScriptedRandom::new([0, 0, 0]);
        let mut state = PopulationState::empty(grid, Box::new(random));
        let human = state.spawn(Position::new(5, 5), Facing::East, AgentKind::Human, 2);
        state.spawn(Position::new(7, 5), Facing::West, AgentKind::Zombie, 0);
        state.step();
        let human = state.agent(human).unwrap();
        assert_eq!(human.position(), Position::new(6, 5));
        assert_eq!(human.kind(), AgentKind::Zombie);
    }

    #[test]
    fn infection_only_reverts_by_cure() {
        let mut state = open_population(200, 7);
        let mut zombies = Vec::new();
        for _ in 0..100 {
            state.step();
            for agent in state.agents() {
                if agent.kind() == AgentKind::Zombie && !zombies.contains(&agent.id()) {
                    zombies.push(agent.id());
                }
            }
            for id in &zombies {
                assert_eq!(state.agent(*id).unwrap().kind(), AgentKind::Zombie);
            }
            for agent in state.agents() {
                assert!(agent.activity() <= ACTIVE_AMOUNT);
            }
        }
        assert_drawn_categories_match(&state);
    }

    #[test]
    fn cure_is_idempotent_in_outcome() {
        let mut state = open_population(30, 8);
        let id = state.agents()[5].id();
        state.infect(id).unwrap();
        state.cure(id).unwrap();
        state.cure(id).unwrap();
        let agent = state.agent(id).unwrap();
        assert_eq!(agent.kind(), AgentKind::Human);
        assert_eq!(agent.activity(), 0);
        assert!(state.grid().in_interior(agent.position()));
        assert_eq!(state.grid().get(agent.position()).unwrap(), Category::Human);
    }

    #[test]
    fn patient_zero_cannot_be_cured() {
        let mut state = open_population(10, 9);
        let patient_zero = state.patient_zero().unwrap();
        state.cure(patient_zero).unwrap();
        assert_eq!(state.agent(patient_zero).unwrap().kind(), AgentKind::Zombie);
    }

    #[test]
    fn unknown_agents_are_reported() {
        let mut state = open_population(3, 10);
        let missing = AgentId(1_000);
        assert!(matches!(
            state.infect(missing),
            Err(OutbreakError::UnknownAgent { id: 1_000 })
        ));
        assert!(state.cure(missing).is_err());
    }

    #[test]
    fn restart_leaves_only_patient_zero_infected() {
        let mut state = open_population(100, 11);
        for _ in 0..50 {
            state.step();
        }
        state.restart();
        let census = state.census();
        assert_eq!(census.zombies, 1);
        assert_eq!(census.humans, 99);
        let patient_zero = state.patient_zero().unwrap();
        assert_eq!(state.agent(patient_zero).unwrap().kind(), AgentKind::Zombie);
    }

    #[test]
    fn snapshot_mirrors_agents() {
        let state = open_population(4, 12);
        let snapshot = state.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot[0].kind, AgentKind::Zombie);
        for (entry, agent) in snapshot.iter().zip(state.agents()) {
            assert_eq!(entry.id, agent.id());
            assert_eq!(entry.position, agent.position());
            assert_eq!(entry.facing, agent.facing());
        }
    }

    #[test]
    fn set_panic_threshold_updates_state() {
        let mut state = open_population(4, 13);
        state.set_panic_threshold(0);
        assert_eq!(state.panic_threshold(), 0);
    }

    #[test]
    fn initialize_builds_world_and_population() {
        let state = initialize(120, 90, 5, 300, seeded(21)).unwrap();
        assert_eq!(state.len(), 300);
        let corner = state.grid().get(Position::new(0, 0)).unwrap();
        assert_eq!(corner, Category::Wall);
        assert!(initialize(1, 90, 5, 10, seeded(21)).is_err());
    }

    #[test]
    fn context_builds_population_from_parameters() {
        let mut context = Context::new();
        context.init_random(42);
        assert!(context.population().is_none());
        let parameters = Parameters {
            width: 40,
            height: 30,
            entity_count: 25,
            ..Parameters::default()
        };
        context.init_population(&parameters).unwrap();
        let state = context.population().unwrap();
        assert_eq!(state.len(), 25);
        assert_eq!(state.grid().width(), 40);
        context.population_mut().unwrap().step();
        assert_eq!(context.population().unwrap().ticks(), 1);
    }

    #[test]
    fn context_rejects_invalid_dimensions() {
        let mut context = Context::new();
        let parameters = Parameters {
            width: 1,
            ..Parameters::default()
        };
        assert!(matches!(
            context.init_population(&parameters),
            Err(OutbreakError::InvalidDimension { .. })
        ));
    }
}
