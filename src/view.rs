// What the engine shows to the table and to individual players.

use serde::{Deserialize, Serialize};

use crate::ability::Information;
use crate::game::Phase;
use crate::grimoire::Grimoire;
use crate::player::{LedgerEntry, PlayerId};
use crate::roles::{Alignment, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: PlayerId,
    pub name: String,
    pub alive: bool,
    pub ghost_vote: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastVote {
    pub voter: PlayerId,
    pub in_favor: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotView {
    pub nominator: PlayerId,
    pub nominee: PlayerId,
    pub votes: Vec<CastVote>,
}

/// Everything every player may see. Never carries characters or reminders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicState {
    pub phase: Phase,
    pub day: u32,
    pub night: u32,
    pub seats: Vec<Seat>,
    pub discussion_timer: u32,
    pub nominated_today: Vec<PlayerId>,
    pub ballot: Option<BallotView>,
    pub last_execution: Option<PlayerId>,
    pub winner: Option<Alignment>,
}

impl PublicState {
    pub fn living(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(|s| s.alive)
    }

    pub fn dead(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(|s| !s.alive)
    }
}

/// One player's own sheet.
///
/// `character` is what the player was shown, which for the Drunk is not their
/// real character. Poison and drunkenness are never reported here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateState {
    pub player: PlayerId,
    pub name: String,
    pub character: Role,
    pub alive: bool,
    pub ghost_vote: bool,
    pub ability_used: bool,
    pub information: Vec<LedgerEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grimoire: Option<Grimoire>,
}

impl PrivateState {
    pub fn latest(&self) -> Option<&Information> {
        self.information.last().map(|entry| &entry.information)
    }
}

/// Public announcements, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Announcement {
    NightFalls { night: u32 },
    DawnBreaks { day: u32, died: Vec<PlayerId> },
    NominationsOpen { day: u32 },
    Nominated { nominator: PlayerId, nominee: PlayerId },
    Executed { player: PlayerId },
    NoExecution { day: u32 },
    SlayerShot { slayer: PlayerId, target: PlayerId, died: bool },
    Died { player: PlayerId },
    GameOver { winner: Alignment },
}
