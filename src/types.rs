use serde::Serialize;

/// Cardinal directions, declared in wire-code order (`'0'` = Up .. `'3'` = Down).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Left,
    Right,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Left,
        Direction::Right,
        Direction::Down,
    ];

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            '0' => Some(Self::Up),
            '1' => Some(Self::Left),
            '2' => Some(Self::Right),
            '3' => Some(Self::Down),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Self::Up => '0',
            Self::Left => '1',
            Self::Right => '2',
            Self::Down => '3',
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Left => 1,
            Self::Right => 2,
            Self::Down => 3,
        }
    }

    pub fn velocity(self) -> Velocity {
        match self {
            Self::Up => Velocity { dx: 0, dy: -1 },
            Self::Left => Velocity { dx: -1, dy: 0 },
            Self::Right => Velocity { dx: 1, dy: 0 },
            Self::Down => Velocity { dx: 0, dy: 1 },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    Empty,
    Wall,
    Point,
    Spawn,
    EnemySpawn,
    ConsumedPoint,
}

impl Tile {
    pub fn parse(symbol: char) -> Option<Self> {
        match symbol {
            ' ' => Some(Self::Empty),
            '#' => Some(Self::Wall),
            '.' => Some(Self::Point),
            'S' => Some(Self::Spawn),
            'E' => Some(Self::EnemySpawn),
            'o' => Some(Self::ConsumedPoint),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Velocity {
    pub dx: i32,
    pub dy: i32,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity { dx: 0, dy: 0 };

    pub fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Color(pub u16);

/// Up/Left/Right/Down flags, indexed by [`Direction::index`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidMoves(pub [bool; 4]);

impl ValidMoves {
    pub fn allows(self, dir: Direction) -> bool {
        self.0[dir.index()]
    }

    pub fn count(self) -> usize {
        self.0.iter().filter(|open| **open).count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Title,
    Start,
    Playing,
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    Caught,
    Cleared,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Publish,
    Poll,
}

impl SyncPhase {
    pub fn next(self) -> Self {
        match self {
            Self::Publish => Self::Poll,
            Self::Poll => Self::Publish,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub score: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: usize,
    pub x: i32,
    pub y: i32,
    pub queued: usize,
    pub ready: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct SyncView {
    pub phase: SyncPhase,
    #[serde(rename = "responsePending")]
    pub response_pending: bool,
    #[serde(rename = "selectedGhost")]
    pub selected_ghost: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSnapshot {
    pub tick: u64,
    pub phase: GamePhase,
    #[serde(rename = "remainingPoints")]
    pub remaining_points: usize,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub sync: SyncView,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    PhaseChanged {
        from: GamePhase,
        to: GamePhase,
    },
    PointEaten {
        x: usize,
        y: usize,
        remaining: usize,
    },
    PlayerCaught {
        ghost: usize,
    },
    LevelCleared {
        score: u32,
    },
    QueueAccepted {
        ghost: usize,
        length: usize,
    },
    ExchangeStarted {
        phase: SyncPhase,
    },
    ExchangeResolved {
        phase: SyncPhase,
        entries: usize,
    },
    ExchangeTimedOut {
        phase: SyncPhase,
    },
    SendRejected {
        phase: SyncPhase,
    },
}
