// Gameweek decisions for an existing squad.

pub mod captain;
pub mod chips;
pub mod health;
pub mod transfers;

pub use captain::{CaptainChoice, CaptainSelector, CaptaincyPick};
pub use chips::{Chip, ChipContext, ChipRecommendation, ChipStrategy, ChipUsage};
pub use health::{assess_squad, SquadIssue};
pub use transfers::{TransferEngine, TransferPlan, TransferSuggestion};
