// Player state store: per-seat status, deaths and the private information ledger.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ability::Information;
use crate::error::GameError;
use crate::roles::{Alignment, Role};

/// Seat index. Seating order is the order players were given at setup and is circular.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub usize);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat {}", self.0)
    }
}

/// Reminder tokens the storyteller keeps next to a player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Poisoned,
    Drunk,
    RedHerring,
    /// Safe from the Demon until dawn.
    Protected,
    Reminder(String),
}

impl Status {
    /// Token text used by the grimoire notation.
    pub fn token(&self) -> String {
        match self {
            Status::Poisoned => "poisoned".to_string(),
            Status::Drunk => "drunk".to_string(),
            Status::RedHerring => "red_herring".to_string(),
            Status::Protected => "safe".to_string(),
            Status::Reminder(text) => text.clone(),
        }
    }

    pub fn from_token(token: &str) -> Status {
        match token.trim().to_lowercase().as_str() {
            "poisoned" | "poi" => Status::Poisoned,
            "drunk" => Status::Drunk,
            "red_herring" | "redherring" => Status::RedHerring,
            "safe" | "protected" => Status::Protected,
            _ => Status::Reminder(token.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum Death {
    Executed { day: u32 },
    Demon { night: u32 },
    Slayer { day: u32 },
    Storyteller,
}

/// One piece of private information a player learned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub night: u32,
    pub information: Information,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub(crate) id: PlayerId,
    pub(crate) name: String,
    pub(crate) role: Role,
    pub(crate) token: Role,
    pub(crate) death: Option<Death>,
    pub(crate) ghost_vote: bool,
    pub(crate) statuses: Vec<Status>,
    pub(crate) ability_used: bool,
    pub(crate) ledger: Vec<LedgerEntry>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, role: Role) -> Self {
        Player {
            id,
            name: name.into(),
            role,
            token: role,
            death: None,
            ghost_vote: true,
            statuses: Vec::new(),
            ability_used: false,
            ledger: Vec::new(),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The character this player actually is.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The character this player believes they are. Differs from `role` only for the Drunk.
    pub fn token(&self) -> Role {
        self.token
    }

    pub fn alignment(&self) -> Alignment {
        self.role.alignment()
    }

    pub fn is_alive(&self) -> bool {
        self.death.is_none()
    }

    pub fn death(&self) -> Option<Death> {
        self.death
    }

    pub fn has_ghost_vote(&self) -> bool {
        self.ghost_vote
    }

    pub fn statuses(&self) -> &[Status] {
        &self.statuses
    }

    pub fn has_status(&self, status: &Status) -> bool {
        self.statuses.contains(status)
    }

    /// Poisoned or drunk: abilities silently fail.
    pub fn is_suppressed(&self) -> bool {
        self.has_status(&Status::Poisoned) || self.has_status(&Status::Drunk)
    }

    pub fn ability_used(&self) -> bool {
        self.ability_used
    }

    pub fn ledger(&self) -> &[LedgerEntry] {
        &self.ledger
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStore {
    players: Vec<Player>,
}

impl PlayerStore {
    pub fn new(players: Vec<Player>) -> Self {
        PlayerStore { players }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn living(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_alive())
    }

    pub fn living_count(&self) -> usize {
        self.living().count()
    }

    pub fn living_count_by(&self, alignment: Alignment) -> usize {
        self.living().filter(|p| p.alignment() == alignment).count()
    }

    pub fn living_demon(&self) -> Option<&Player> {
        self.living().find(|p| p.role.is_demon())
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.0)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Looks up someone submitting an event.
    pub fn require(&self, id: PlayerId) -> Result<&Player, GameError> {
        self.get(id).ok_or(GameError::UnknownPlayer(id))
    }

    /// Looks up the target of an ability or nomination, which must be alive.
    pub fn require_living_target(&self, id: PlayerId) -> Result<&Player, GameError> {
        match self.get(id) {
            None => Err(GameError::invalid_target(id, "no such player")),
            Some(p) if !p.is_alive() => Err(GameError::invalid_target(id, "player is dead")),
            Some(p) => Ok(p),
        }
    }

    fn get_mut(&mut self, id: PlayerId) -> Result<&mut Player, GameError> {
        self.players
            .get_mut(id.0)
            .ok_or(GameError::UnknownPlayer(id))
    }

    /// Marks a player dead. Returns `false` if they were already dead.
    pub fn kill(&mut self, id: PlayerId, death: Death) -> Result<bool, GameError> {
        let player = self.get_mut(id)?;
        if !player.is_alive() {
            return Ok(false);
        }
        player.death = Some(death);
        Ok(true)
    }

    /// Adds a status. No-op on dead players and on statuses already present.
    pub fn apply_status(&mut self, id: PlayerId, status: Status) -> Result<bool, GameError> {
        let player = self.get_mut(id)?;
        if !player.is_alive() || player.statuses.contains(&status) {
            return Ok(false);
        }
        player.statuses.push(status);
        Ok(true)
    }

    /// Removes a status. No-op on dead players, whose tokens are frozen.
    pub fn remove_status(&mut self, id: PlayerId, status: &Status) -> Result<bool, GameError> {
        let player = self.get_mut(id)?;
        if !player.is_alive() {
            return Ok(false);
        }
        let before = player.statuses.len();
        player.statuses.retain(|s| s != status);
        Ok(player.statuses.len() != before)
    }

    /// Removes a status from every living player.
    pub fn clear_status(&mut self, status: &Status) {
        for player in self.players.iter_mut().filter(|p| p.is_alive()) {
            player.statuses.retain(|s| s != status);
        }
    }

    /// Flags a one-shot ability as spent.
    pub fn use_ability(&mut self, id: PlayerId) -> Result<(), GameError> {
        let player = self.get_mut(id)?;
        if player.ability_used {
            return Err(GameError::AbilityExhausted { player: id });
        }
        player.ability_used = true;
        Ok(())
    }

    pub fn spend_ghost_vote(&mut self, id: PlayerId) -> Result<bool, GameError> {
        let player = self.get_mut(id)?;
        if player.is_alive() || !player.ghost_vote {
            return Ok(false);
        }
        player.ghost_vote = false;
        Ok(true)
    }

    /// Changes a player's character, as when a Minion takes over as Demon.
    pub(crate) fn set_character(&mut self, id: PlayerId, role: Role) -> Result<(), GameError> {
        let player = self.get_mut(id)?;
        player.role = role;
        player.token = role;
        Ok(())
    }

    pub(crate) fn record(
        &mut self,
        id: PlayerId,
        night: u32,
        information: Information,
    ) -> Result<(), GameError> {
        self.get_mut(id)?
            .ledger
            .push(LedgerEntry { night, information });
        Ok(())
    }

    /// Replaces the most recent ledger entry. Returns `false` if the ledger is empty.
    pub(crate) fn amend_latest(
        &mut self,
        id: PlayerId,
        information: Information,
    ) -> Result<bool, GameError> {
        match self.get_mut(id)?.ledger.last_mut() {
            Some(entry) => {
                entry.information = information;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Nearest living player on each side, in seat order. A lone neighbour is listed once.
    pub fn living_neighbours(&self, id: PlayerId) -> Vec<PlayerId> {
        let n = self.players.len();
        if id.0 >= n {
            return Vec::new();
        }

        let clockwise = (1..n)
            .map(|step| (id.0 + step) % n)
            .find(|&idx| self.players[idx].is_alive());
        let counter = (1..n)
            .map(|step| (id.0 + n - step) % n)
            .find(|&idx| self.players[idx].is_alive());

        let mut neighbours = Vec::new();
        if let Some(idx) = counter {
            neighbours.push(PlayerId(idx));
        }
        if let Some(idx) = clockwise {
            if Some(idx) != counter {
                neighbours.push(PlayerId(idx));
            }
        }
        neighbours
    }
}
