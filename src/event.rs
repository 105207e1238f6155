// Inputs the engine accepts and the replies it gives back.
//
// Events are plain data so a controller can read them off the wire:
//
// ```json
// {"source": "player", "event": "vote", "voter": 3, "nominee": 0, "in_favor": true}
// {"source": "storyteller", "command": "force_advance"}
// ```

use serde::{Deserialize, Serialize};

use crate::ability::{AbilityOutcome, Information};
use crate::player::{PlayerId, Status};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlayerEvent {
    Chat {
        player: PlayerId,
        text: String,
    },
    Nominate {
        nominator: PlayerId,
        nominee: PlayerId,
    },
    Vote {
        voter: PlayerId,
        nominee: PlayerId,
        in_favor: bool,
    },
    Ability {
        player: PlayerId,
        #[serde(default)]
        target: Option<PlayerId>,
    },
}

/// Overrides only the storyteller may issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum StorytellerCommand {
    /// Moves past whatever the current phase is waiting for.
    ForceAdvance,
    SetDiscussionTimer { turns: u32 },
    AddReminder { player: PlayerId, status: Status },
    RemoveReminder { player: PlayerId, status: Status },
    /// Replaces the most recent thing a player learned.
    AmendInformation {
        player: PlayerId,
        information: Information,
    },
    Kill { player: PlayerId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Event {
    Player(PlayerEvent),
    Storyteller(StorytellerCommand),
}

impl PlayerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerEvent::Chat { .. } => "chat",
            PlayerEvent::Nominate { .. } => "nomination",
            PlayerEvent::Vote { .. } => "vote",
            PlayerEvent::Ability { .. } => "ability",
        }
    }
}

impl StorytellerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            StorytellerCommand::ForceAdvance => "force_advance",
            StorytellerCommand::SetDiscussionTimer { .. } => "set_discussion_timer",
            StorytellerCommand::AddReminder { .. } => "add_reminder",
            StorytellerCommand::RemoveReminder { .. } => "remove_reminder",
            StorytellerCommand::AmendInformation { .. } => "amend_information",
            StorytellerCommand::Kill { .. } => "kill",
        }
    }
}

impl Event {
    /// Short name used in error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Player(event) => event.name(),
            Event::Storyteller(command) => command.name(),
        }
    }
}

impl From<PlayerEvent> for Event {
    fn from(event: PlayerEvent) -> Self {
        Event::Player(event)
    }
}

impl From<StorytellerCommand> for Event {
    fn from(command: StorytellerCommand) -> Self {
        Event::Storyteller(command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub in_favor: usize,
    pub against: usize,
    /// Votes in favour needed to execute: a strict majority of the living.
    pub needed: usize,
}

impl Tally {
    pub fn passes(&self) -> bool {
        self.in_favor >= self.needed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum VoteOutcome {
    /// Ballot still open.
    Pending { tally: Tally },
    Executed { player: PlayerId, tally: Tally },
    NotExecuted { tally: Tally },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum EventReply {
    TimerRemaining { remaining: u32 },
    Nominated,
    Vote { outcome: VoteOutcome },
    Ability { outcome: AbilityOutcome },
    Acknowledged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event: Event = serde_json::from_str(
            r#"{"source": "player", "event": "vote", "voter": 3, "nominee": 0, "in_favor": true}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            Event::Player(PlayerEvent::Vote {
                voter: PlayerId(3),
                nominee: PlayerId(0),
                in_favor: true
            })
        );

        let event: Event =
            serde_json::from_str(r#"{"source": "storyteller", "command": "force_advance"}"#).unwrap();
        assert_eq!(event.name(), "force_advance");
    }

    #[test]
    fn test_ability_target_is_optional() {
        let event: Event =
            serde_json::from_str(r#"{"source": "player", "event": "ability", "player": 2}"#).unwrap();
        assert_eq!(
            event,
            Event::Player(PlayerEvent::Ability {
                player: PlayerId(2),
                target: None
            })
        );
    }

    #[test]
    fn test_tally_majority() {
        let tally = Tally {
            in_favor: 3,
            against: 1,
            needed: 4,
        };
        assert!(!tally.passes());
        assert!(Tally { in_favor: 4, ..tally }.passes());
    }
}
