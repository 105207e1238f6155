// Win condition evaluation.

use serde::{Deserialize, Serialize};

use crate::player::PlayerStore;
use crate::roles::Alignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Victory {
    None,
    GoodWins,
    EvilWins,
}

impl Victory {
    pub fn winner(self) -> Option<Alignment> {
        match self {
            Victory::None => None,
            Victory::GoodWins => Some(Alignment::Good),
            Victory::EvilWins => Some(Alignment::Evil),
        }
    }
}

/// Checks the board for a winner.
///
/// Good wins once no Demon is alive and at least one good player is. Evil wins
/// when it is at parity with good, or when a working Saint was executed. The
/// good check runs first, so a Demon killed down to parity still loses.
pub fn evaluate(players: &PlayerStore, saint_executed: bool) -> Victory {
    let good = players.living_count_by(Alignment::Good);
    let evil = players.living_count_by(Alignment::Evil);

    if players.living_demon().is_none() && good > 0 {
        return Victory::GoodWins;
    }
    if saint_executed || evil >= good {
        return Victory::EvilWins;
    }
    Victory::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{Death, Player, PlayerId};
    use crate::roles::Role;

    fn store(roles: &[Role]) -> PlayerStore {
        PlayerStore::new(
            roles
                .iter()
                .enumerate()
                .map(|(i, role)| Player::new(PlayerId(i), format!("P{}", i), *role))
                .collect(),
        )
    }

    #[test]
    fn test_no_winner_at_start() {
        let players = store(&[Role::Imp, Role::Poisoner, Role::Empath, Role::Chef, Role::Villager]);
        assert_eq!(evaluate(&players, false), Victory::None);
    }

    #[test]
    fn test_good_wins_when_demon_dead() {
        let mut players = store(&[Role::Imp, Role::Poisoner, Role::Empath, Role::Chef]);
        players.kill(PlayerId(0), Death::Executed { day: 1 }).unwrap();
        assert_eq!(evaluate(&players, false), Victory::GoodWins);
    }

    #[test]
    fn test_good_check_precedes_parity() {
        // One Minion, one good player, no Demon: good still wins.
        let mut players = store(&[Role::Imp, Role::Poisoner, Role::Empath]);
        players.kill(PlayerId(0), Death::Slayer { day: 2 }).unwrap();
        assert_eq!(evaluate(&players, false), Victory::GoodWins);
    }

    #[test]
    fn test_evil_wins_at_parity() {
        let mut players = store(&[Role::Imp, Role::Poisoner, Role::Empath, Role::Chef, Role::Villager]);
        players.kill(PlayerId(4), Death::Demon { night: 2 }).unwrap();
        assert_eq!(evaluate(&players, false), Victory::EvilWins);
    }

    #[test]
    fn test_saint_execution() {
        let players = store(&[Role::Imp, Role::Empath, Role::Chef, Role::Villager]);
        assert_eq!(evaluate(&players, true), Victory::EvilWins);
        assert_eq!(Victory::EvilWins.winner(), Some(Alignment::Evil));
    }
}
