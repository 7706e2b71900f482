//! Agents and the per-tick behavior that moves them.
//!
//! An agent reads the world only through the occupancy grid. It relocates
//! itself on the grid as it moves, so agents stepped later in the same tick
//! see where earlier ones ended up. Biting is the one effect an agent has on
//! others, and it is resolved by the population, which knows every agent's
//! exact position.
use log::{trace, warn};
use serde::Serialize;
use strum::Display;

use crate::facing::Facing;
use crate::grid::{Category, OccupancyGrid, Position};
use crate::random::{retry, RandomSource, Retry};
use crate::sensing::{far_look, near_look, Target};

/// Ticks of alertness granted when an agent becomes active.
pub const ACTIVE_AMOUNT: u32 = 10;
/// The movement roll is uniform in `[0, MOVE_ROLL_SIDES)`.
pub const MOVE_ROLL_SIDES: u32 = 10;
/// A zombie moves when its movement roll lands on this value.
pub const ZOMBIE_MOVE_ROLL: u32 = 1;
/// The human turn roll is uniform in `[0, TURN_ROLL_SIDES)`.
pub const TURN_ROLL_SIDES: u32 = 8;
/// A human turns at random when its turn roll lands on this value.
pub const HUMAN_TURN_ROLL: u32 = 1;
/// How many cells placement samples before settling for the last one.
pub const PLACEMENT_ATTEMPTS: usize = 100;

/// A stable handle to an agent, independent of where it sits in the
/// population order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AgentId(pub(crate) u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
pub enum AgentKind {
    Human,
    Zombie,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Agent {
    id: AgentId,
    position: Position,
    facing: Facing,
    kind: AgentKind,
    activity: u32,
}

impl Agent {
    /// A human with the given facing, not yet placed on the grid.
    #[must_use]
    pub fn new(id: AgentId, facing: Facing) -> Self {
        Agent {
            id,
            position: Position::new(0, 0),
            facing,
            kind: AgentKind::Human,
            activity: 0,
        }
    }

    /// An agent with fully specified state, not yet drawn. Activity is
    /// clamped to `ACTIVE_AMOUNT`.
    #[must_use]
    pub fn with_state(
        id: AgentId,
        position: Position,
        facing: Facing,
        kind: AgentKind,
        activity: u32,
    ) -> Self {
        Agent {
            id,
            position,
            facing,
            kind,
            activity: activity.min(ACTIVE_AMOUNT),
        }
    }

    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub fn facing(&self) -> Facing {
        self.facing
    }

    #[must_use]
    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    #[must_use]
    pub fn activity(&self) -> u32 {
        self.activity
    }

    #[must_use]
    pub fn is_human(&self) -> bool {
        self.kind == AgentKind::Human
    }

    /// The category this agent shows on the grid.
    #[must_use]
    pub fn category(&self) -> Category {
        match self.kind {
            AgentKind::Zombie => Category::Zombie,
            AgentKind::Human if self.activity > 0 => Category::HumanPanic,
            AgentKind::Human => Category::Human,
        }
    }

    /// Writes this agent's category at its position.
    pub fn draw(&self, grid: &mut OccupancyGrid) {
        if grid.set(self.position, self.category()).is_err() {
            warn!("{:?} is off the grid at {:?}", self.id, self.position);
        }
    }

    /// Empties this agent's cell, whatever is drawn there.
    pub fn clear(&self, grid: &mut OccupancyGrid) {
        if grid.set(self.position, Category::Empty).is_err() {
            warn!("{:?} is off the grid at {:?}", self.id, self.position);
        }
    }

    /// Moves the agent to a randomly chosen empty cell and draws it there.
    ///
    /// Samples up to `PLACEMENT_ATTEMPTS` interior cells. If none of them is
    /// empty the last sample is used anyway, so the agent may end up sharing
    /// a cell with something else.
    pub fn place(&mut self, grid: &mut OccupancyGrid, random: &mut dyn RandomSource) {
        // Fall back to the whole grid when there is no interior to sample.
        let (min_x, max_x) = sample_span(grid.width());
        let (min_y, max_y) = sample_span(grid.height());
        let placement = retry(
            PLACEMENT_ATTEMPTS,
            || {
                let x = min_x + random.below(max_x - min_x + 1);
                let y = min_y + random.below(max_y - min_y + 1);
                Position::new(x as i32, y as i32)
            },
            |candidate| matches!(grid.get(*candidate), Ok(Category::Empty)),
        );
        if let Retry::Exhausted(position) = placement {
            warn!(
                "no empty cell found for {:?} after {PLACEMENT_ATTEMPTS} attempts, using {:?}",
                self.id, position
            );
        }
        self.position = placement.into_inner();
        trace!("placed {:?} at {:?}", self.id, self.position);
        self.draw(grid);
    }

    /// Turns the agent into a zombie in place and redraws it.
    pub fn infect(&mut self, grid: &mut OccupancyGrid) {
        self.kind = AgentKind::Zombie;
        self.activity = 0;
        self.draw(grid);
    }

    /// Turns the agent back into a calm human and re-places it somewhere
    /// empty.
    pub fn cure(&mut self, grid: &mut OccupancyGrid, random: &mut dyn RandomSource) {
        self.kind = AgentKind::Human;
        self.activity = 0;
        self.clear(grid);
        self.place(grid, random);
    }

    fn wants_to_move(&self, roll: u32, panic_threshold: u32) -> bool {
        match self.kind {
            AgentKind::Human => self.activity > 0 || roll > panic_threshold,
            AgentKind::Zombie => roll == ZOMBIE_MOVE_ROLL,
        }
    }

    /// Advances the agent by one tick.
    ///
    /// Returns the cell a zombie bites this tick, if any. Every human whose
    /// exact position is that cell must then be infected.
    pub fn step(
        &mut self,
        grid: &mut OccupancyGrid,
        random: &mut dyn RandomSource,
        panic_threshold: u32,
    ) -> Option<Position> {
        let drawn = self.category();
        let roll = random.below(MOVE_ROLL_SIDES);
        let mut redraw = false;

        if self.wants_to_move(roll, panic_threshold) {
            if near_look(grid, self.position, self.facing) == Target::Nothing {
                self.clear(grid);
                self.position = self.position.step(self.facing);
            } else {
                self.facing = Facing::random(random);
            }
            self.activity = self.activity.saturating_sub(1);
            redraw = true;
        }

        let target = far_look(grid, self.position, self.facing);
        let bite = match self.kind {
            AgentKind::Zombie => self.hunt(grid, random, target),
            AgentKind::Human => {
                self.flee(random, target);
                None
            }
        };

        if redraw || self.category() != drawn {
            self.draw(grid);
        }
        bite
    }

    fn hunt(
        &mut self,
        grid: &OccupancyGrid,
        random: &mut dyn RandomSource,
        target: Target,
    ) -> Option<Position> {
        if target.is_human() {
            self.activity = ACTIVE_AMOUNT;
        }
        // Idle zombies wander unless they can see another zombie to follow.
        if self.activity == 0 && target != Target::Zombie {
            self.facing = Facing::random(random);
        }
        near_look(grid, self.position, self.facing)
            .is_human()
            .then(|| self.position.step(self.facing))
    }

    fn flee(&mut self, random: &mut dyn RandomSource, target: Target) {
        if matches!(target, Target::Zombie | Target::HumanPanic) {
            self.activity = ACTIVE_AMOUNT;
        }
        if target == Target::Zombie {
            self.facing = self.facing.opposite();
        }
        if random.below(TURN_ROLL_SIDES) == HUMAN_TURN_ROLL {
            self.facing = Facing::random(random);
        }
    }
}

/// The inclusive coordinate range placement samples along an axis of `len`
/// cells: the interior when there is one, the whole axis otherwise.
fn sample_span(len: usize) -> (u32, u32) {
    let len = u32::try_from(len).unwrap_or(u32::MAX);
    if len >= 3 {
        (1, len - 2)
    } else {
        (0, len - 1)
    }
}
