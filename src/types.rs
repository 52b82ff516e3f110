use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Fixed expansion order shared by every breadth-first search.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "north" | "up" => Some(Self::North),
            "south" | "down" => Some(Self::South),
            "east" | "right" => Some(Self::East),
            "west" | "left" => Some(Self::West),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn manhattan(self, other: Coord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Opaque handle into the grid's entity registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostKind {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl GhostKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "blinky" => Some(Self::Blinky),
            "pinky" => Some(Self::Pinky),
            "inky" => Some(Self::Inky),
            "clyde" => Some(Self::Clyde),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "ghost")]
pub enum EntityKind {
    Player,
    Ghost(GhostKind),
    Pellet,
}

impl EntityKind {
    pub fn class(self) -> EntityClass {
        match self {
            Self::Player => EntityClass::Player,
            Self::Ghost(_) => EntityClass::Ghost,
            Self::Pellet => EntityClass::Pellet,
        }
    }
}

/// Coarse entity category used by nearest-entity queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityClass {
    Player,
    Ghost,
    Pellet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Running,
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOutcome {
    Moved,
    Blocked,
    Ignored,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LevelEvent {
    Started,
    Stopped,
    PelletEaten {
        #[serde(rename = "playerId")]
        player_id: EntityId,
        #[serde(rename = "pelletId")]
        pellet_id: EntityId,
        points: u32,
    },
    PlayerKilled {
        #[serde(rename = "playerId")]
        player_id: EntityId,
        by: EntityId,
    },
    GhostKilled {
        #[serde(rename = "ghostId")]
        ghost_id: EntityId,
        by: EntityId,
    },
    LevelWon,
    LevelLost,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub id: EntityId,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub dir: Direction,
    pub score: u32,
    pub alive: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: EntityId,
    #[serde(rename = "kind")]
    pub ghost_kind: GhostKind,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub dir: Direction,
    #[serde(rename = "intervalMs")]
    pub interval_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct LevelSnapshot {
    pub state: RunState,
    #[serde(rename = "remainingPellets")]
    pub remaining_pellets: usize,
    pub players: Vec<PlayerView>,
    pub ghosts: Vec<GhostView>,
}
