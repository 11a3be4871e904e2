// Domain model and configuration shared by every squadcast crate.

pub mod config;
pub mod fixture;
pub mod formation;
pub mod player;
pub mod price;
pub mod squad;
pub mod weights;

pub use fixture::{Fixture, Team, TeamFixture};
pub use formation::{Formation, VALID_FORMATIONS};
pub use player::{Availability, Player, PlayerHistory, PlayerId, Position, SeasonSummary, TeamId};
pub use price::Price;
pub use squad::{Squad, SquadError};
pub use weights::{ScoringPreset, SubScore, WeightVector};
