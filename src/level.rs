use tracing::{debug, info, warn};

use crate::behavior::Agent;
use crate::collision::{resolve, CollisionPolicy, Effect, PlayerCollisions};
use crate::config::{Difficulty, EngineConfig};
use crate::error::LevelError;
use crate::grid::Grid;
use crate::scheduler::Scheduler;
use crate::types::{
    Coord, Direction, EntityClass, EntityId, EntityKind, GhostView, LevelEvent, LevelSnapshot,
    MoveOutcome, PlayerView, RunState,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerStatus {
    pub entity: EntityId,
    pub score: u32,
    pub alive: bool,
    pub killer: Option<EntityId>,
}

pub struct Level {
    grid: Grid,
    config: EngineConfig,
    agents: Vec<Agent>,
    players: Vec<PlayerStatus>,
    start_cells: Vec<Coord>,
    next_start: usize,
    scheduler: Scheduler,
    collisions: Box<dyn CollisionPolicy>,
    state: RunState,
    events: Vec<LevelEvent>,
    won_reported: bool,
    lost_reported: bool,
}

impl Level {
    /// Builds a level from an already populated grid. `ghosts` lists the
    /// placed ghost entities in the order their moves are processed.
    pub fn new(
        grid: Grid,
        ghosts: Vec<EntityId>,
        start_cells: Vec<Coord>,
        config: EngineConfig,
    ) -> Result<Self, LevelError> {
        if start_cells.is_empty() {
            return Err(LevelError::NoStartCells);
        }
        for cell in &start_cells {
            grid.cell(*cell)?;
        }

        let mut scheduler = Scheduler::new(config.interval_variation_ms, config.seed);
        let mut agents = Vec::with_capacity(ghosts.len());
        for id in ghosts {
            let EntityKind::Ghost(kind) = grid.entity(id)?.kind else {
                return Err(LevelError::NotAGhost(id));
            };
            scheduler.register(id, config.interval_for(kind));
            agents.push(Agent::new(id, kind, &config));
        }

        let collisions = Box::new(PlayerCollisions {
            pellet_points: config.pellet_points,
        });
        Ok(Self {
            grid,
            config,
            agents,
            players: Vec::new(),
            start_cells,
            next_start: 0,
            scheduler,
            collisions,
            state: RunState::NotStarted,
            events: Vec::new(),
            won_reported: false,
            lost_reported: false,
        })
    }

    pub fn with_collisions(mut self, policy: impl CollisionPolicy + 'static) -> Self {
        self.collisions = Box::new(policy);
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    pub fn is_in_progress(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn start(&mut self) {
        if self.state == RunState::Running {
            return;
        }
        self.state = RunState::Running;
        self.scheduler.arm();
        self.events.push(LevelEvent::Started);
        info!(ghosts = self.agents.len(), players = self.players.len(), "level started");
    }

    pub fn stop(&mut self) {
        if self.state == RunState::Stopped {
            return;
        }
        let was_running = self.state == RunState::Running;
        self.state = RunState::Stopped;
        self.scheduler.disarm();
        if was_running {
            self.events.push(LevelEvent::Stopped);
            info!("level stopped");
        }
    }

    /// Creates an unplaced player entity, ready for [`Level::register_player`].
    pub fn create_player(&mut self) -> EntityId {
        self.grid.add_entity(EntityKind::Player)
    }

    /// Places the player on the next start cell. Start cells are handed out
    /// in order and reused once exhausted. Registering twice does nothing.
    pub fn register_player(&mut self, player: EntityId) -> Result<(), LevelError> {
        if self.grid.entity(player)?.kind != EntityKind::Player {
            return Err(LevelError::NotAPlayer(player));
        }
        if self.players.iter().any(|status| status.entity == player) {
            return Ok(());
        }
        let at = self.start_cells[self.next_start];
        self.grid.place(player, at)?;
        self.next_start = (self.next_start + 1) % self.start_cells.len();
        self.players.push(PlayerStatus {
            entity: player,
            score: 0,
            alive: true,
            killer: None,
        });
        info!(player = player.0, x = at.x, y = at.y, "player registered");
        Ok(())
    }

    pub fn players(&self) -> &[PlayerStatus] {
        &self.players
    }

    pub fn player(&self, id: EntityId) -> Option<&PlayerStatus> {
        self.players.iter().find(|status| status.entity == id)
    }

    pub fn remaining_pellets(&self) -> usize {
        self.grid.count(EntityClass::Pellet)
    }

    pub fn is_cleared(&self) -> bool {
        self.remaining_pellets() == 0
    }

    pub fn is_any_player_alive(&self) -> bool {
        self.players.iter().any(|status| status.alive)
    }

    /// Moves one cell. Requests that arrive while the level is not running,
    /// or for dead or unplaced entities, are dropped. A blocked move still
    /// turns the entity.
    pub fn move_entity(
        &mut self,
        entity: EntityId,
        dir: Direction,
    ) -> Result<MoveOutcome, LevelError> {
        if !self.is_in_progress() {
            debug!(entity = entity.0, ?dir, "move ignored, level not running");
            return Ok(MoveOutcome::Ignored);
        }
        let current = match self.grid.entity(entity) {
            Ok(current) => current,
            Err(error) => {
                warn!(entity = entity.0, "move requested for unknown entity");
                return Err(error.into());
            }
        };
        let Some(from) = current.cell else {
            return Ok(MoveOutcome::Ignored);
        };
        match current.kind {
            EntityKind::Pellet => return Ok(MoveOutcome::Ignored),
            EntityKind::Player if !self.player(entity).is_some_and(|p| p.alive) => {
                return Ok(MoveOutcome::Ignored);
            }
            _ => {}
        }

        self.grid.set_facing(entity, dir)?;
        let destination = match self.grid.neighbor(from, dir) {
            Some(to) if self.grid.is_passable(to) => to,
            _ => return Ok(MoveOutcome::Blocked),
        };

        let occupants = self.grid.occupants_at(destination)?.to_vec();
        self.grid.remove(entity)?;
        self.grid.place(entity, destination)?;
        debug!(entity = entity.0, ?dir, x = destination.x, y = destination.y, "moved");

        let effects = resolve(self.collisions.as_ref(), &self.grid, entity, &occupants);
        for effect in effects {
            self.apply_effect(effect)?;
        }
        self.check_outcome();
        Ok(MoveOutcome::Moved)
    }

    fn apply_effect(&mut self, effect: Effect) -> Result<(), LevelError> {
        debug!(?effect, "collision");
        match effect {
            Effect::Consume {
                consumer,
                pellet,
                points,
            } => {
                if self.grid.position(pellet).is_none() {
                    return Ok(());
                }
                self.grid.remove(pellet)?;
                if let Some(status) = self.players.iter_mut().find(|p| p.entity == consumer) {
                    status.score = status.score.saturating_add(points);
                }
                self.events.push(LevelEvent::PelletEaten {
                    player_id: consumer,
                    pellet_id: pellet,
                    points,
                });
            }
            Effect::Kill { victim, killer } => {
                let victim_kind = self.grid.entity(victim)?.kind;
                self.apply_kill(victim, victim_kind, killer)?;
            }
        }
        Ok(())
    }

    fn apply_kill(
        &mut self,
        victim: EntityId,
        victim_kind: EntityKind,
        killer: EntityId,
    ) -> Result<(), LevelError> {
        match victim_kind {
            EntityKind::Player => {
                let Some(status) = self.players.iter_mut().find(|p| p.entity == victim) else {
                    return Ok(());
                };
                if !status.alive {
                    return Ok(());
                }
                status.alive = false;
                status.killer = Some(killer);
                self.events.push(LevelEvent::PlayerKilled {
                    player_id: victim,
                    by: killer,
                });
            }
            EntityKind::Ghost(_) => {
                if self.grid.position(victim).is_some() {
                    self.grid.remove(victim)?;
                }
                self.scheduler.unregister(victim);
                self.agents.retain(|agent| agent.entity != victim);
                self.events.push(LevelEvent::GhostKilled {
                    ghost_id: victim,
                    by: killer,
                });
            }
            EntityKind::Pellet => {}
        }
        Ok(())
    }

    fn check_outcome(&mut self) {
        if !self.won_reported && self.is_cleared() {
            self.won_reported = true;
            self.events.push(LevelEvent::LevelWon);
            info!("all pellets eaten");
        }
        if !self.lost_reported && !self.players.is_empty() && !self.is_any_player_alive() {
            self.lost_reported = true;
            self.events.push(LevelEvent::LevelLost);
            info!("no players left alive");
        }
    }

    /// Advances the ghost clocks by `dt_ms` and moves every ghost that is
    /// due, in registration order. Returns how many ghosts changed cell.
    pub fn tick(&mut self, dt_ms: u64) -> Result<usize, LevelError> {
        if !self.is_in_progress() {
            return Ok(0);
        }
        let mut moved = 0;
        for ghost in self.scheduler.advance(dt_ms) {
            let prey: Vec<EntityId> = self
                .players
                .iter()
                .filter(|status| status.alive)
                .map(|status| status.entity)
                .collect();
            let dir = match self.agents.iter().find(|agent| agent.entity == ghost) {
                Some(agent) => agent.next_direction(&self.grid, &prey),
                None => continue,
            };
            let Some(dir) = dir else {
                continue;
            };
            if self.move_entity(ghost, dir)? == MoveOutcome::Moved {
                moved += 1;
            }
        }
        Ok(moved)
    }

    pub fn move_interval(&self, ghost: EntityId) -> Option<u64> {
        self.scheduler.interval_of(ghost)
    }

    pub fn set_move_interval(
        &mut self,
        ghost: EntityId,
        interval_ms: u64,
    ) -> Result<(), LevelError> {
        if !self.scheduler.set_interval(ghost, interval_ms) {
            return Err(LevelError::NotAGhost(ghost));
        }
        Ok(())
    }

    /// Rescales every ghost interval from the configured base, replacing
    /// any per-ghost override.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.config.difficulty = difficulty;
        for agent in &self.agents {
            self.scheduler
                .set_interval(agent.entity, self.config.interval_for(agent.kind));
        }
        info!(?difficulty, "difficulty changed");
    }

    pub fn drain_events(&mut self) -> Vec<LevelEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> LevelSnapshot {
        let players = self
            .players
            .iter()
            .filter_map(|status| {
                let entity = self.grid.entity(status.entity).ok()?;
                Some(PlayerView {
                    id: status.entity,
                    x: entity.cell.map(|c| c.x),
                    y: entity.cell.map(|c| c.y),
                    dir: entity.facing,
                    score: status.score,
                    alive: status.alive,
                })
            })
            .collect();
        let ghosts = self
            .agents
            .iter()
            .filter_map(|agent| {
                let entity = self.grid.entity(agent.entity).ok()?;
                Some(GhostView {
                    id: agent.entity,
                    ghost_kind: agent.kind,
                    x: entity.cell.map(|c| c.x),
                    y: entity.cell.map(|c| c.y),
                    dir: entity.facing,
                    interval_ms: self.scheduler.interval_of(agent.entity).unwrap_or_default(),
                })
            })
            .collect();
        LevelSnapshot {
            state: self.state,
            remaining_pellets: self.remaining_pellets(),
            players,
            ghosts,
        }
    }
}
