// Setup: player-count distribution, bag parsing and dealing characters to seats.

use std::collections::HashMap;
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::Deal;
use crate::error::ConfigError;
use crate::meta::Meta;
use crate::player::{Player, PlayerId};
use crate::roles::{Alignment, Role, Script, Team};

pub const MIN_PLAYERS: usize = 6;
pub const MAX_PLAYERS: usize = 16;

/// Deck of good characters that are not in play.
pub const BLUFFS_DECK: &str = "bluffs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleDistribution {
    pub townsfolk: u8,
    pub outsider: u8,
    pub minion: u8,
    pub demon: u8,
}

impl RoleDistribution {
    pub fn total(&self) -> u8 {
        self.townsfolk + self.outsider + self.minion + self.demon
    }

    pub fn count(&self, team: Team) -> u8 {
        match team {
            Team::Townsfolk => self.townsfolk,
            Team::Outsider => self.outsider,
            Team::Minion => self.minion,
            Team::Demon => self.demon,
        }
    }

    // Standard distribution for N players
    pub fn base_setup(player_count: usize) -> Result<Self, ConfigError> {
        let dist = match player_count {
            6 => RoleDistribution {
                townsfolk: 3,
                outsider: 1,
                minion: 1,
                demon: 1,
            },
            n @ 7..=15 => {
                let past_four = (n - 4) as u8;
                let minion = past_four / 3;
                let outsider = past_four % 3;
                let townsfolk = 3 + (minion * 2);
                RoleDistribution {
                    townsfolk,
                    outsider,
                    minion,
                    demon: 1,
                }
            }
            // Past fifteen the extra seat goes to the town.
            16 => RoleDistribution {
                townsfolk: 10,
                outsider: 2,
                minion: 3,
                demon: 1,
            },
            count => {
                return Err(ConfigError::PlayerCount {
                    count,
                    min: MIN_PLAYERS,
                    max: MAX_PLAYERS,
                })
            }
        };
        Ok(dist)
    }

    pub fn from_roles(roles: &[Role]) -> Self {
        let mut actual = RoleDistribution::default();
        for role in roles {
            match role.team() {
                Team::Townsfolk => actual.townsfolk += 1,
                Team::Outsider => actual.outsider += 1,
                Team::Minion => actual.minion += 1,
                Team::Demon => actual.demon += 1,
            }
        }
        actual
    }
}

impl fmt::Display for RoleDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}T/{}O/{}M/{}D",
            self.townsfolk, self.outsider, self.minion, self.demon
        )
    }
}

pub struct DistributionAnalysis {
    pub expected: RoleDistribution,
    pub actual: RoleDistribution,
}

impl DistributionAnalysis {
    pub fn is_valid(&self) -> bool {
        self.expected == self.actual
    }

    /// One line per team whose count is off, e.g. "Missing 2 Townsfolk".
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (team, label) in [
            (Team::Townsfolk, "Townsfolk"),
            (Team::Outsider, "Outsider"),
            (Team::Minion, "Minion"),
            (Team::Demon, "Demon"),
        ] {
            let diff = self.expected.count(team) as i16 - self.actual.count(team) as i16;
            if diff == 0 {
                continue;
            }
            let plural = if diff.abs() != 1 && team != Team::Townsfolk {
                "s"
            } else {
                ""
            };
            if diff > 0 {
                problems.push(format!("Missing {} {}{}", diff, label, plural));
            } else {
                problems.push(format!("{} too many {}{}", -diff, label, plural));
            }
        }
        problems
    }
}

pub fn analyze_distribution(player_count: usize, roles: &[Role]) -> Result<DistributionAnalysis, ConfigError> {
    Ok(DistributionAnalysis {
        expected: RoleDistribution::base_setup(player_count)?,
        actual: RoleDistribution::from_roles(roles),
    })
}

/// Checks that a pool of characters is a legal setup for `player_count` seats.
pub fn validate_distribution(player_count: usize, roles: &[Role]) -> Result<RoleDistribution, ConfigError> {
    let expected = RoleDistribution::base_setup(player_count)?;
    if roles.len() != player_count {
        return Err(ConfigError::PoolSize {
            players: player_count,
            roles: roles.len(),
        });
    }

    let mut role_counts: HashMap<Role, usize> = HashMap::new();
    for role in roles {
        let count = role_counts.entry(*role).or_insert(0);
        *count += 1;
        if *count > role.max_count() as usize {
            return Err(ConfigError::TooManyCopies {
                role: *role,
                max: role.max_count(),
                found: *count,
            });
        }
    }

    let analysis = DistributionAnalysis {
        expected,
        actual: RoleDistribution::from_roles(roles),
    };
    if !analysis.is_valid() {
        return Err(ConfigError::Distribution {
            expected: analysis.expected,
            actual: analysis.actual,
            problems: analysis.problems(),
        });
    }
    Ok(analysis.expected)
}

// Bag parsing: parse textual representation "{role1 role2 ...}"
pub fn parse_bag(input: &str, script: Option<&Script>) -> Result<Vec<Role>, ConfigError> {
    let trimmed = input.trim();

    if !trimmed.starts_with('{') || !trimmed.ends_with('}') || trimmed.len() < 2 {
        return Err(ConfigError::MalformedBag(format!(
            "bag must be enclosed in curly braces: {}",
            input
        )));
    }

    let content = trimmed[1..trimmed.len() - 1].trim();

    // Split by whitespace and commas (Clojure-style)
    content
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|token| match_role_name(token, script))
        .collect()
}

pub fn format_bag(roles: &[Role]) -> String {
    let role_names: Vec<String> = roles.iter().map(Role::slug).collect();
    format!("{{{}}}", role_names.join(" "))
}

pub fn match_role_name(name: &str, script: Option<&Script>) -> Result<Role, ConfigError> {
    let normalized_input = name.to_lowercase().replace(&['-', ' '][..], "_");

    let roles_to_search = match script {
        Some(script) => script.roles.as_slice(),
        None => Role::all(),
    };

    if let Some(role) = roles_to_search
        .iter()
        .find(|role| role.slug() == normalized_input)
    {
        return Ok(*role);
    }

    // No exact match - find close suggestions using Jaro-Winkler similarity
    let mut suggestions: Vec<(Role, f64)> = roles_to_search
        .iter()
        .map(|role| (*role, strsim::jaro_winkler(&normalized_input, &role.slug())))
        .filter(|(_, sim)| *sim >= 0.7)
        .collect();
    suggestions.sort_by(|(_, a), (_, b)| b.total_cmp(a));

    let hint = match suggestions.first() {
        Some((closest, similarity)) if *similarity >= 0.85 => {
            format!("; did you mean: {}?", closest.slug())
        }
        Some(_) => {
            let names: Vec<String> = suggestions.iter().take(3).map(|(r, _)| r.slug()).collect();
            format!("; did you mean one of: {}?", names.join(", "))
        }
        None => String::new(),
    };

    Err(ConfigError::UnknownRole {
        name: name.to_string(),
        hint,
    })
}

pub fn validate_names(names: &[String]) -> Result<(), ConfigError> {
    for (i, name) in names.iter().enumerate() {
        let name = name.trim();
        let duplicate = names[..i].iter().any(|n| n.trim().eq_ignore_ascii_case(name));
        if name.is_empty() || duplicate {
            return Err(ConfigError::DuplicateName(name.to_string()));
        }
    }
    Ok(())
}

/// Hands out the pool to seats. The pool must already be validated.
pub fn deal_seats(names: &[String], pool: &[Role], deal: Deal, rng: &mut StdRng) -> Vec<Player> {
    let mut characters = pool.to_vec();
    if deal == Deal::Shuffled {
        characters.shuffle(rng);
    }

    names
        .iter()
        .zip(characters)
        .enumerate()
        .map(|(seat, (name, role))| Player::new(PlayerId(seat), name.trim(), role))
        .collect()
}

/// Fills the bluffs deck with good, unique characters from the script that nobody holds.
pub fn seed_bluffs(meta: &mut Meta, script: &Script, in_play: &[Role], rng: Option<&mut StdRng>) {
    let cards: Vec<Role> = script
        .roles
        .iter()
        .copied()
        .filter(|role| {
            role.alignment() == Alignment::Good
                && role.max_count() == 1
                && *role != Role::Drunk
                && !in_play.contains(role)
        })
        .collect();
    meta.init_deck(BLUFFS_DECK, cards, rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    /// A legal pool for any supported table size, built from the engine's roster.
    fn legal_pool(player_count: usize) -> Vec<Role> {
        let dist = RoleDistribution::base_setup(player_count).unwrap();
        let mut pool = Vec::new();
        let townsfolk = [
            Role::Chef,
            Role::Empath,
            Role::Undertaker,
            Role::Monk,
            Role::Slayer,
            Role::Soldier,
        ];
        for i in 0..dist.townsfolk as usize {
            pool.push(*townsfolk.get(i).unwrap_or(&Role::Villager));
        }
        pool.extend([Role::Saint, Role::Recluse].iter().take(dist.outsider as usize));
        pool.extend(
            [Role::Poisoner, Role::ScarletWoman, Role::Spy]
                .iter()
                .take(dist.minion as usize),
        );
        pool.push(Role::Imp);
        pool
    }

    #[test]
    fn test_valid_7_player_base_setup() {
        // 7 players base setup: 5T/0O/1M/1D
        let roles = vec![
            Role::Imp,
            Role::Poisoner,
            Role::Empath,
            Role::Undertaker,
            Role::Slayer,
            Role::Villager,
            Role::Villager,
        ];
        let dist = validate_distribution(7, &roles).unwrap();
        assert_eq!(dist.to_string(), "5T/0O/1M/1D");
    }

    #[test]
    fn test_invalid_7_player_wrong_counts() {
        // 7 players requires 5T/0O/1M/1D, this bag is 4T/1O/1M/1D
        let roles = vec![
            Role::Chef,
            Role::Empath,
            Role::Monk,
            Role::Slayer,
            Role::Saint,
            Role::Poisoner,
            Role::Imp,
        ];
        match validate_distribution(7, &roles) {
            Err(ConfigError::Distribution { problems, .. }) => {
                assert_eq!(problems, vec!["Missing 1 Townsfolk", "1 too many Outsider"]);
            }
            other => panic!("expected a distribution error, got {:?}", other),
        }
    }

    #[test]
    fn test_team_counts_for_every_supported_size() {
        for n in MIN_PLAYERS..=MAX_PLAYERS {
            let dist = RoleDistribution::base_setup(n).unwrap();
            assert_eq!(dist.total() as usize, n, "distribution for {} must fill every seat", n);
            assert_eq!(dist.demon, 1);
            assert_eq!(
                dist.townsfolk as usize,
                n - (dist.demon + dist.minion + dist.outsider) as usize
            );

            let pool = legal_pool(n);
            assert_eq!(validate_distribution(n, &pool).unwrap(), dist);
        }
    }

    #[test]
    fn test_player_count_out_of_range() {
        assert!(matches!(
            RoleDistribution::base_setup(5),
            Err(ConfigError::PlayerCount { count: 5, .. })
        ));
        assert!(matches!(
            validate_distribution(17, &[Role::Villager; 17]),
            Err(ConfigError::PlayerCount { count: 17, .. })
        ));
    }

    #[test]
    fn test_pool_size_mismatch() {
        let pool = legal_pool(7);
        assert_eq!(
            validate_distribution(8, &pool),
            Err(ConfigError::PoolSize { players: 8, roles: 7 })
        );
    }

    #[test]
    fn test_duplicate_unique_role_rejected() {
        let mut pool = legal_pool(7);
        pool[0] = Role::Empath;
        pool[1] = Role::Empath;
        assert!(matches!(
            validate_distribution(7, &pool),
            Err(ConfigError::TooManyCopies { role: Role::Empath, max: 1, found: 2 })
        ));
    }

    #[test]
    fn test_parse_bag_basic() {
        let roles = parse_bag("{chef empath, scarlet_woman imp}", None).unwrap();
        assert_eq!(
            roles,
            vec![Role::Chef, Role::Empath, Role::ScarletWoman, Role::Imp]
        );
        assert!(parse_bag("{}", None).unwrap().is_empty());
        assert!(matches!(
            parse_bag("chef imp", None),
            Err(ConfigError::MalformedBag(_))
        ));
    }

    #[test]
    fn test_unknown_role_suggestion() {
        match match_role_name("empth", None) {
            Err(ConfigError::UnknownRole { hint, .. }) => {
                assert!(hint.contains("empath"), "hint was: {}", hint);
            }
            other => panic!("expected an unknown role error, got {:?}", other),
        }
        match match_role_name("zzzz", None) {
            Err(ConfigError::UnknownRole { hint, .. }) => assert!(hint.is_empty()),
            other => panic!("expected an unknown role error, got {:?}", other),
        }
    }

    #[test]
    fn test_format_bag_round_trips() {
        let roles = vec![Role::ScarletWoman, Role::Imp, Role::Villager];
        assert_eq!(format_bag(&roles), "{scarlet_woman imp villager}");
        assert_eq!(parse_bag(&format_bag(&roles), None).unwrap(), roles);
    }

    #[test]
    fn test_validate_names() {
        let names: Vec<String> = ["Ann", "Bo", "ann"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            validate_names(&names),
            Err(ConfigError::DuplicateName("ann".to_string()))
        );
        let names: Vec<String> = ["Ann", " "].iter().map(|s| s.to_string()).collect();
        assert!(validate_names(&names).is_err());

        // Seats are named after the trimmed name, so padding is not a new name.
        let names: Vec<String> = [" Ann", "Bo", "Ann "].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            validate_names(&names),
            Err(ConfigError::DuplicateName("Ann".to_string()))
        );
    }

    #[test]
    fn test_deal_in_order_and_shuffled() {
        let names: Vec<String> = (0..7).map(|i| format!("P{}", i)).collect();
        let pool = legal_pool(7);
        let mut rng = StdRng::seed_from_u64(1);

        let seats = deal_seats(&names, &pool, Deal::InOrder, &mut rng);
        let dealt: Vec<Role> = seats.iter().map(|p| p.role()).collect();
        assert_eq!(dealt, pool);

        let seats = deal_seats(&names, &pool, Deal::Shuffled, &mut rng);
        let mut dealt: Vec<Role> = seats.iter().map(|p| p.role()).collect();
        let mut expected = pool.clone();
        dealt.sort_by_key(|r| r.slug());
        expected.sort_by_key(|r| r.slug());
        assert_eq!(dealt, expected, "shuffling keeps the same characters");
    }

    #[test]
    fn test_bluffs_exclude_in_play_and_generic_roles() {
        let mut meta = Meta::new(5);
        let in_play = legal_pool(7);
        seed_bluffs(&mut meta, &Script::trouble_brewing(), &in_play, None);
        let bluffs = meta.peek(BLUFFS_DECK);
        assert!(!bluffs.is_empty());
        for role in bluffs {
            assert_eq!(role.alignment(), Alignment::Good);
            assert!(!in_play.contains(role));
            assert_ne!(*role, Role::Villager);
            assert_ne!(*role, Role::Drunk);
        }
    }
}
