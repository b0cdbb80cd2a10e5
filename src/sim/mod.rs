//! Frame-driven simulation
//!
//! All gameplay logic lives here:
//! - Entities are owned by their managers and addressed by id
//! - Game phases own the managers they need
//! - Randomness comes from the seeded RNG in [`SimContext`]
//! - No rendering or platform dependencies

pub mod areas;
pub mod collision;
pub mod context;
pub mod geometry;
pub mod input;
pub mod obstacle;
pub mod player;
pub mod state;
pub mod tick;
pub mod tracking;
pub mod turtle;

pub use areas::{ObjectiveArea, StartingArea};
pub use collision::{CollisionHandler, CollisionReport};
pub use context::{DebugCounters, SimContext};
pub use geometry::{HitBox, SpawnArea};
pub use input::{Frame, InputRecord, InputSource};
pub use obstacle::{Obstacle, ObstacleManager};
pub use player::{Player, PlayerManager, Trail, TrailPoint};
pub use state::{
    FinishedPhase, GamePhase, GameState, IdlePhase, ResetPhase, RunningPhase, StartPhase,
};
pub use tick::{Transition, tick};
pub use tracking::{PersonTracker, TrackedPerson};
pub use turtle::{DeathAnimation, Turtle, TurtleBody, TurtleManager, TurtleState, TurtleStateKind};
