//! fight-core: derived vote, odds and eligibility values for fight posts
//!
//! Everything in this crate is pure and synchronous. Callers fetch the fight
//! snapshot and supply the current time; nothing here touches the network or a clock.

pub mod errors;
pub mod odds;
pub mod tally;
pub mod teams;
pub mod types;
pub mod validation;
pub mod view;
pub mod vote_key;
pub mod window;

pub use errors::*;
pub use odds::*;
pub use tally::*;
pub use teams::*;
pub use types::*;
pub use validation::*;
pub use view::*;
pub use vote_key::*;
pub use window::*;
