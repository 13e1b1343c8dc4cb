pub mod api;
pub mod config;
pub mod domain;
pub mod infra;
pub mod startup;

pub use config::*;
pub use domain::{
    AchievementBus, AchievementTracker, BetRequest, Caller, CharacterCache, Error, FightService,
    ProgressBook, ProgressEvent, ProgressKind, VoteRequest,
};
pub use infra::backend::{BackendClient, BetReceipt, Character, GeekFightsApi};
pub use startup::*;
