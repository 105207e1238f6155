// Blood on the Clocktower rules engine.
//
// Runs one game as a phase state machine: characters are dealt, nights wake
// players in order, days count chat down to nominations and votes, and every
// death is followed by a victory check. The engine only validates and applies
// events; deciding what players do is left to whoever drives it. Start with
// `Game::configure` or `Game::from_grimoire` and feed it `Event`s.

pub mod ability;
pub mod config;
pub mod error;
pub mod event;
pub mod game;
pub mod grimoire;
pub mod meta;
pub mod player;
pub mod roles;
pub mod setup;
pub mod victory;
pub mod view;

pub use ability::{AbilityOutcome, Information};
pub use config::{Deal, GameConfig};
pub use error::{ConfigError, GameError};
pub use event::{Event, EventReply, PlayerEvent, StorytellerCommand, Tally, VoteOutcome};
pub use game::{Game, Phase};
pub use grimoire::{parse_grimoire, Grimoire, GrimoireEntry};
pub use player::{Death, PlayerId, Status};
pub use roles::{Alignment, Role, Script, Team};
pub use victory::Victory;
pub use view::{Announcement, PrivateState, PublicState};
