// Role registry: the static catalogue of characters this engine knows how to run.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Townsfolk,
    Outsider,
    Minion,
    Demon,
}

impl Team {
    pub fn from_str_or_shorthand(s: &str) -> Option<Team> {
        match s.to_lowercase().as_str() {
            "townsfolk" | "tf" => Some(Team::Townsfolk),
            "outsider" | "os" => Some(Team::Outsider),
            "minion" | "mn" => Some(Team::Minion),
            "demon" | "dm" => Some(Team::Demon),
            _ => None,
        }
    }

    pub const fn alignment(self) -> Alignment {
        match self {
            Team::Townsfolk | Team::Outsider => Alignment::Good,
            Team::Minion | Team::Demon => Alignment::Evil,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Good,
    Evil,
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alignment::Good => write!(f, "Good"),
            Alignment::Evil => write!(f, "Evil"),
        }
    }
}

/// What a character's ability does when the resolver dispatches it.
///
/// Passive characters (Soldier, Saint, Scarlet Woman, ...) are `None` here;
/// their effects are rule hooks inside the state machine, not invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    None,
    DemonKill,
    Poison,
    Protect,
    EmpathPing,
    EvilPairs,
    UndertakerReveal,
    SlayerShot,
}

impl AbilityKind {
    /// Night abilities that wait for the player to pick a target.
    pub const fn needs_night_target(self) -> bool {
        matches!(
            self,
            AbilityKind::DemonKill | AbilityKind::Poison | AbilityKind::Protect
        )
    }

    pub const fn is_day_ability(self) -> bool {
        matches!(self, AbilityKind::SlayerShot)
    }
}

macro_rules! define_roles {
    (
        $(
            $role:ident: $name:literal => {
                team: $team:ident,
                kind: $kind:ident,
                ability: $ability:literal
                $(, all_nights: $all_nights:expr)?
                $(, first_night: $first_night:expr)?
                $(, other_nights: $other_nights:expr)?
                $(, one_shot: $one_shot:expr)?
            }
        ),* $(,)?
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Role {
            $($role,)*
        }

        impl Role {
            pub const fn name(&self) -> &'static str {
                match self {
                    $(Role::$role => $name,)*
                }
            }

            pub const fn team(&self) -> Team {
                match self {
                    $(Role::$role => Team::$team,)*
                }
            }

            pub const fn kind(&self) -> AbilityKind {
                match self {
                    $(Role::$role => AbilityKind::$kind,)*
                }
            }

            pub const fn ability(&self) -> &'static str {
                match self {
                    $(Role::$role => $ability,)*
                }
            }

            /// Wake rank on the first night, lower wakes first.
            pub const fn first_night(&self) -> Option<u8> {
                match self {
                    $(Role::$role => define_roles!(@rank $($all_nights)? $($first_night)?),)*
                }
            }

            /// Wake rank on every night after the first.
            pub const fn other_nights(&self) -> Option<u8> {
                match self {
                    $(Role::$role => define_roles!(@rank $($all_nights)? $($other_nights)?),)*
                }
            }

            pub const fn one_shot(&self) -> bool {
                match self {
                    $(Role::$role => define_roles!(@flag $($one_shot)?),)*
                }
            }

            pub const fn all() -> &'static [Role] {
                &[$(Role::$role,)*]
            }

            /// Maximum number of times this role can appear in a game
            pub const fn max_count(&self) -> u8 {
                match self {
                    Role::Villager => 16,
                    _ => 1,
                }
            }
        }
    };

    // Helper: rank - handles all_nights shorthand
    (@rank $rank:expr) => { Some($rank) };
    (@rank) => { None };

    (@flag $flag:expr) => { $flag };
    (@flag) => { false };
}

define_roles! {
    // Townsfolk
    Chef: "Chef" => {
        team: Townsfolk,
        kind: EvilPairs,
        ability: "You start knowing how many pairs of evil players there are.",
        first_night: 40
    },
    Empath: "Empath" => {
        team: Townsfolk,
        kind: EmpathPing,
        ability: "Each night, you learn how many of your 2 alive neighbours are evil.",
        all_nights: 50
    },
    Undertaker: "Undertaker" => {
        team: Townsfolk,
        kind: UndertakerReveal,
        ability: "Each night*, you learn which character died by execution today.",
        other_nights: 60
    },
    Monk: "Monk" => {
        team: Townsfolk,
        kind: Protect,
        ability: "Each night*, choose a player (not yourself): they are safe from the Demon tonight.",
        other_nights: 20
    },
    Slayer: "Slayer" => {
        team: Townsfolk,
        kind: SlayerShot,
        ability: "Once per game, during the day, publicly choose a player: if they are the Demon, they die.",
        one_shot: true
    },
    Soldier: "Soldier" => {
        team: Townsfolk,
        kind: None,
        ability: "You are safe from the Demon."
    },
    Villager: "Villager" => {
        team: Townsfolk,
        kind: None,
        ability: "You have no ability."
    },

    // Outsiders
    Drunk: "Drunk" => {
        team: Outsider,
        kind: None,
        ability: "You do not know you are the Drunk. You think you are a Townsfolk character, but you are not."
    },
    Saint: "Saint" => {
        team: Outsider,
        kind: None,
        ability: "If you die by execution, your team loses."
    },
    Recluse: "Recluse" => {
        team: Outsider,
        kind: None,
        ability: "You might register as evil & as a Minion or Demon, even if dead."
    },

    // Minions
    Poisoner: "Poisoner" => {
        team: Minion,
        kind: Poison,
        ability: "Each night, choose a player: they are poisoned tonight and tomorrow day.",
        all_nights: 10
    },
    ScarletWoman: "Scarlet Woman" => {
        team: Minion,
        kind: None,
        ability: "If there are 5 or more players alive & the Demon dies, you become the Demon."
    },
    Spy: "Spy" => {
        team: Minion,
        kind: None,
        ability: "Each night, you see the Grimoire. You might register as good & as a Townsfolk or Outsider, even if dead."
    },

    // Demon
    Imp: "Imp" => {
        team: Demon,
        kind: DemonKill,
        ability: "Each night, choose a player: they die.",
        all_nights: 30
    },
}

impl Role {
    pub const fn alignment(&self) -> Alignment {
        self.team().alignment()
    }

    pub const fn is_demon(&self) -> bool {
        matches!(self.team(), Team::Demon)
    }

    /// Wake rank for the given night number (1-based).
    pub const fn wake_rank(&self, night: u32) -> Option<u8> {
        if night <= 1 {
            self.first_night()
        } else {
            self.other_nights()
        }
    }

    /// Lowercase, underscore-separated name used by the bag and grimoire notations.
    pub fn slug(&self) -> String {
        self.name().to_lowercase().replace(' ', "_")
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Script: a named collection of roles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub title: String,
    pub roles: Vec<Role>,
}

impl Script {
    pub fn trouble_brewing() -> Self {
        Script {
            title: "Trouble Brewing".to_string(),
            roles: Role::all().to_vec(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace(&[' ', '-', '_'][..], "").as_str() {
            "troublebrewing" | "tb" => Some(Script::trouble_brewing()),
            _ => None,
        }
    }

    pub fn contains(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// The wake order sheet for the first night or for the other nights.
    pub fn night_order(&self, first_night: bool) -> Vec<(u8, Role)> {
        let night = if first_night { 1 } else { 2 };
        let mut order: Vec<(u8, Role)> = self
            .roles
            .iter()
            .filter_map(|role| role.wake_rank(night).map(|rank| (rank, *role)))
            .collect();
        order.sort_by_key(|(rank, _)| *rank);
        order
    }
}

impl Default for Script {
    fn default() -> Self {
        Script::trouble_brewing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teams_map_to_alignment() {
        assert_eq!(Role::Imp.alignment(), Alignment::Evil);
        assert_eq!(Role::Poisoner.alignment(), Alignment::Evil);
        assert_eq!(Role::Saint.alignment(), Alignment::Good);
        assert_eq!(Role::Villager.alignment(), Alignment::Good);
        assert!(Role::Imp.is_demon());
        assert!(!Role::ScarletWoman.is_demon());
    }

    #[test]
    fn test_night_ranks() {
        // Chef only wakes on the first night, Undertaker and Monk never do.
        assert_eq!(Role::Chef.wake_rank(1), Some(40));
        assert_eq!(Role::Chef.wake_rank(2), None);
        assert_eq!(Role::Undertaker.wake_rank(1), None);
        assert_eq!(Role::Undertaker.wake_rank(3), Some(60));
        assert_eq!(Role::Imp.wake_rank(1), Some(30));
        assert_eq!(Role::Villager.wake_rank(1), None);
    }

    #[test]
    fn test_night_order_sheet() {
        let script = Script::trouble_brewing();
        let first: Vec<Role> = script.night_order(true).into_iter().map(|(_, r)| r).collect();
        assert_eq!(first, vec![Role::Poisoner, Role::Imp, Role::Chef, Role::Empath]);

        let other: Vec<Role> = script.night_order(false).into_iter().map(|(_, r)| r).collect();
        assert_eq!(
            other,
            vec![Role::Poisoner, Role::Monk, Role::Imp, Role::Empath, Role::Undertaker]
        );
    }

    #[test]
    fn test_slug_and_shorthand() {
        assert_eq!(Role::ScarletWoman.slug(), "scarlet_woman");
        assert_eq!(Team::from_str_or_shorthand("mn"), Some(Team::Minion));
        assert_eq!(Team::from_str_or_shorthand("wizard"), None);
        assert!(Script::from_name("Trouble-Brewing").is_some());
        assert!(Role::Slayer.one_shot());
        assert!(!Role::Empath.one_shot());
    }
}
