// Ability resolution.
//
// Every character ability goes through `resolve`, which dispatches on the
// `AbilityKind` of the token the actor *believes* they hold. Poisoned and
// drunk actors are handled here and nowhere else: their abilities change
// nothing, but the outcome they see has the same shape as a working one.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GameError;
use crate::player::{PlayerId, PlayerStore, Status};
use crate::roles::{AbilityKind, Alignment, Role, Script};

/// Private information handed to a single player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Information {
    /// Empath: evil players among the two living neighbours.
    EvilNeighbours { count: u8 },
    /// Chef: adjacent pairs of evil players.
    EvilPairs { count: u8 },
    /// Undertaker: the character of yesterday's executee.
    ExecutedCharacter { player: PlayerId, character: Role },
    /// Minion: who the Demon is.
    DemonIs { player: PlayerId },
    /// Demon: who the Minions are, and three characters not in play.
    EvilTeam { minions: Vec<PlayerId>, bluffs: Vec<Role> },
}

/// What the acting player is told happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AbilityOutcome {
    Acted,
    Learned { information: Information },
    NothingToLearn,
    Shot { target: PlayerId, died: bool },
}

/// Follow-up the state machine has to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Dies at dawn unless protected.
    PendingKill(PlayerId),
    /// Dies right now.
    Death(PlayerId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: AbilityOutcome,
    pub effect: Effect,
}

impl Resolution {
    fn acted() -> Self {
        Resolution {
            outcome: AbilityOutcome::Acted,
            effect: Effect::None,
        }
    }
}

pub struct AbilityContext<'a> {
    pub players: &'a mut PlayerStore,
    pub night: u32,
    /// Player executed on the day before this night, if any.
    pub executed_yesterday: Option<PlayerId>,
    pub script: &'a Script,
    pub rng: &'a mut StdRng,
}

pub fn resolve(
    ctx: &mut AbilityContext<'_>,
    actor: PlayerId,
    target: Option<PlayerId>,
) -> Result<Resolution, GameError> {
    let player = ctx.players.require(actor)?;
    if !player.is_alive() {
        return Err(GameError::ineligible(actor, "dead players do not act"));
    }
    let kind = player.token().kind();
    let suppressed = player.is_suppressed();
    debug!(%actor, ?kind, ?target, suppressed, "resolving ability");

    match kind {
        AbilityKind::None => Ok(Resolution::acted()),
        AbilityKind::DemonKill => demon_kill(ctx, actor, required(actor, target)?, suppressed),
        AbilityKind::Poison => poison(ctx, required(actor, target)?, suppressed),
        AbilityKind::Protect => protect(ctx, actor, required(actor, target)?, suppressed),
        AbilityKind::EmpathPing => {
            let truth = Information::EvilNeighbours {
                count: empath_ping(ctx.players, actor),
            };
            learn(ctx, actor, truth, suppressed)
        }
        AbilityKind::EvilPairs => {
            let truth = Information::EvilPairs {
                count: evil_pairs(ctx.players),
            };
            learn(ctx, actor, truth, suppressed)
        }
        AbilityKind::UndertakerReveal => match undertaker_reveal(ctx) {
            Some(truth) => learn(ctx, actor, truth, suppressed),
            None => Ok(Resolution {
                outcome: AbilityOutcome::NothingToLearn,
                effect: Effect::None,
            }),
        },
        AbilityKind::SlayerShot => slayer_shot(ctx, actor, required(actor, target)?, suppressed),
    }
}

fn required(actor: PlayerId, target: Option<PlayerId>) -> Result<PlayerId, GameError> {
    target.ok_or(GameError::ineligible(actor, "this ability needs a target"))
}

fn demon_kill(
    ctx: &mut AbilityContext<'_>,
    actor: PlayerId,
    target: PlayerId,
    suppressed: bool,
) -> Result<Resolution, GameError> {
    ctx.players.require_living_target(target)?;
    if target == actor && ctx.players.living_count() > 1 {
        return Err(GameError::invalid_target(target, "the Demon must choose another player"));
    }
    if suppressed {
        return Ok(Resolution::acted());
    }
    Ok(Resolution {
        outcome: AbilityOutcome::Acted,
        effect: Effect::PendingKill(target),
    })
}

fn poison(
    ctx: &mut AbilityContext<'_>,
    target: PlayerId,
    suppressed: bool,
) -> Result<Resolution, GameError> {
    ctx.players.require_living_target(target)?;
    if !suppressed {
        // A new dose replaces last night's.
        ctx.players.clear_status(&Status::Poisoned);
        ctx.players.apply_status(target, Status::Poisoned)?;
    }
    Ok(Resolution::acted())
}

fn protect(
    ctx: &mut AbilityContext<'_>,
    actor: PlayerId,
    target: PlayerId,
    suppressed: bool,
) -> Result<Resolution, GameError> {
    ctx.players.require_living_target(target)?;
    if target == actor {
        return Err(GameError::invalid_target(target, "cannot choose yourself"));
    }
    if !suppressed {
        ctx.players.apply_status(target, Status::Protected)?;
    }
    Ok(Resolution::acted())
}

fn slayer_shot(
    ctx: &mut AbilityContext<'_>,
    actor: PlayerId,
    target: PlayerId,
    suppressed: bool,
) -> Result<Resolution, GameError> {
    if ctx.players.require(actor)?.ability_used() {
        return Err(GameError::AbilityExhausted { player: actor });
    }
    let is_demon = ctx.players.require_living_target(target)?.role().is_demon();
    ctx.players.use_ability(actor)?;

    let died = is_demon && !suppressed;
    Ok(Resolution {
        outcome: AbilityOutcome::Shot { target, died },
        effect: if died { Effect::Death(target) } else { Effect::None },
    })
}

/// Records what the actor learns, swapping in a plausible lie when suppressed.
fn learn(
    ctx: &mut AbilityContext<'_>,
    actor: PlayerId,
    truth: Information,
    suppressed: bool,
) -> Result<Resolution, GameError> {
    let information = if suppressed {
        fabricate(&truth, &*ctx.players, actor, ctx.script, ctx.rng)
    } else {
        truth
    };
    ctx.players.record(actor, ctx.night, information.clone())?;
    Ok(Resolution {
        outcome: AbilityOutcome::Learned { information },
        effect: Effect::None,
    })
}

pub fn empath_ping(players: &PlayerStore, actor: PlayerId) -> u8 {
    players
        .living_neighbours(actor)
        .into_iter()
        .filter_map(|id| players.get(id))
        .filter(|p| p.alignment() == Alignment::Evil)
        .count() as u8
}

/// Adjacent evil pairs among living players, going round the circle once.
pub fn evil_pairs(players: &PlayerStore) -> u8 {
    let living: Vec<Alignment> = players.living().map(|p| p.alignment()).collect();
    let edges = match living.len() {
        0 | 1 => 0,
        2 => 1,
        n => n,
    };
    (0..edges)
        .filter(|&i| {
            living[i] == Alignment::Evil && living[(i + 1) % living.len()] == Alignment::Evil
        })
        .count() as u8
}

fn undertaker_reveal(ctx: &AbilityContext<'_>) -> Option<Information> {
    let executed = ctx.executed_yesterday?;
    let player = ctx.players.get(executed)?;
    Some(Information::ExecutedCharacter {
        player: executed,
        character: player.role(),
    })
}

/// Most evil pairs the living circle could show with this many evil players.
fn max_evil_pairs(players: &PlayerStore) -> u8 {
    let living = players.living().count();
    let evil = players
        .living()
        .filter(|p| p.alignment() == Alignment::Evil)
        .count();
    let most = match (evil, living) {
        (0, _) | (_, 0 | 1) => 0,
        (2, 2) => 1,
        (e, n) if e == n => n,
        (e, _) => e - 1,
    };
    most as u8
}

/// Any other count in `0..=max`, or the truth when there is no other.
fn other_count(count: u8, max: u8, rng: &mut StdRng) -> u8 {
    let choices: Vec<u8> = (0..=max).filter(|&c| c != count).collect();
    choices.choose(rng).copied().unwrap_or(count)
}

/// Default storyteller misinformation: same kind of answer, different value,
/// and never a number the table could not produce.
pub fn fabricate(
    truth: &Information,
    players: &PlayerStore,
    actor: PlayerId,
    script: &Script,
    rng: &mut StdRng,
) -> Information {
    match truth {
        Information::EvilNeighbours { count } => {
            let max = players.living_neighbours(actor).len() as u8;
            Information::EvilNeighbours {
                count: other_count(*count, max, rng),
            }
        }
        Information::EvilPairs { count } => Information::EvilPairs {
            count: other_count(*count, max_evil_pairs(players), rng),
        },
        Information::ExecutedCharacter { player, character } => {
            let others: Vec<Role> = script
                .roles
                .iter()
                .copied()
                .filter(|r| r != character)
                .collect();
            Information::ExecutedCharacter {
                player: *player,
                character: *others.choose(rng).unwrap_or(character),
            }
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{Death, Player};
    use rand::SeedableRng;

    fn store(roles: &[Role]) -> PlayerStore {
        PlayerStore::new(
            roles
                .iter()
                .enumerate()
                .map(|(i, role)| Player::new(PlayerId(i), format!("P{}", i), *role))
                .collect(),
        )
    }

    fn run(
        players: &mut PlayerStore,
        night: u32,
        executed: Option<PlayerId>,
        actor: usize,
        target: Option<usize>,
    ) -> Result<Resolution, GameError> {
        let script = Script::trouble_brewing();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = AbilityContext {
            players,
            night,
            executed_yesterday: executed,
            script: &script,
            rng: &mut rng,
        };
        resolve(&mut ctx, PlayerId(actor), target.map(PlayerId))
    }

    // Seats: 0 Imp, 1 Poisoner, 2 Empath, 3 Undertaker, 4 Slayer, 5 Villager, 6 Monk
    fn table() -> PlayerStore {
        store(&[
            Role::Imp,
            Role::Poisoner,
            Role::Empath,
            Role::Undertaker,
            Role::Slayer,
            Role::Villager,
            Role::Monk,
        ])
    }

    #[test]
    fn test_empath_counts_living_neighbours() {
        let mut players = table();
        let res = run(&mut players, 1, None, 2, None).unwrap();
        assert_eq!(
            res.outcome,
            AbilityOutcome::Learned {
                information: Information::EvilNeighbours { count: 1 }
            }
        );
        assert_eq!(players.get(PlayerId(2)).unwrap().ledger().len(), 1);

        // With the Undertaker dead, the Empath's right neighbour becomes the Slayer.
        players.kill(PlayerId(3), Death::Storyteller).unwrap();
        players.kill(PlayerId(1), Death::Storyteller).unwrap();
        assert_eq!(empath_ping(&players, PlayerId(2)), 1, "left neighbour is now the Imp");
    }

    #[test]
    fn test_poisoned_empath_gets_wrong_number_and_no_marker() {
        let mut players = table();
        players.apply_status(PlayerId(2), Status::Poisoned).unwrap();
        let res = run(&mut players, 1, None, 2, None).unwrap();
        match res.outcome {
            AbilityOutcome::Learned {
                information: Information::EvilNeighbours { count },
            } => {
                assert_ne!(count, 1, "poisoned Empath must not see the true count");
                assert!(count <= 2);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_poison_replaces_previous_dose() {
        let mut players = table();
        run(&mut players, 1, None, 1, Some(2)).unwrap();
        assert!(players.get(PlayerId(2)).unwrap().has_status(&Status::Poisoned));
        run(&mut players, 2, None, 1, Some(4)).unwrap();
        assert!(!players.get(PlayerId(2)).unwrap().has_status(&Status::Poisoned));
        assert!(players.get(PlayerId(4)).unwrap().has_status(&Status::Poisoned));
    }

    #[test]
    fn test_suppressed_poisoner_changes_nothing() {
        let mut players = table();
        players.apply_status(PlayerId(1), Status::Drunk).unwrap();
        let before = players.clone();
        let res = run(&mut players, 1, None, 1, Some(2)).unwrap();
        assert_eq!(res.outcome, AbilityOutcome::Acted);
        assert_eq!(players, before);
    }

    #[test]
    fn test_demon_kill_is_pending_and_validated() {
        let mut players = table();
        let res = run(&mut players, 1, None, 0, Some(5)).unwrap();
        assert_eq!(res.effect, Effect::PendingKill(PlayerId(5)));
        assert!(players.get(PlayerId(5)).unwrap().is_alive(), "death waits for dawn");

        assert!(matches!(
            run(&mut players, 1, None, 0, Some(0)),
            Err(GameError::InvalidTarget { .. })
        ));
        assert!(matches!(
            run(&mut players, 1, None, 0, Some(42)),
            Err(GameError::InvalidTarget { .. })
        ));
        assert!(matches!(
            run(&mut players, 1, None, 0, None),
            Err(GameError::IneligibleActor { .. })
        ));
    }

    #[test]
    fn test_poisoned_demon_kills_nobody() {
        let mut players = table();
        players.apply_status(PlayerId(0), Status::Poisoned).unwrap();
        let res = run(&mut players, 1, None, 0, Some(5)).unwrap();
        assert_eq!(res, Resolution::acted());
    }

    #[test]
    fn test_monk_protects_other_player_only() {
        let mut players = table();
        run(&mut players, 2, None, 6, Some(5)).unwrap();
        assert!(players.get(PlayerId(5)).unwrap().has_status(&Status::Protected));
        assert!(matches!(
            run(&mut players, 2, None, 6, Some(6)),
            Err(GameError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_undertaker_reveal() {
        let mut players = table();
        assert_eq!(
            run(&mut players, 2, None, 3, None).unwrap().outcome,
            AbilityOutcome::NothingToLearn
        );

        players.kill(PlayerId(1), Death::Executed { day: 1 }).unwrap();
        let res = run(&mut players, 2, Some(PlayerId(1)), 3, None).unwrap();
        assert_eq!(
            res.outcome,
            AbilityOutcome::Learned {
                information: Information::ExecutedCharacter {
                    player: PlayerId(1),
                    character: Role::Poisoner
                }
            }
        );
    }

    #[test]
    fn test_slayer_shot_once() {
        let mut players = table();
        let res = run(&mut players, 1, None, 4, Some(0)).unwrap();
        assert_eq!(
            res.outcome,
            AbilityOutcome::Shot {
                target: PlayerId(0),
                died: true
            }
        );
        assert_eq!(res.effect, Effect::Death(PlayerId(0)));

        let before = players.clone();
        assert_eq!(
            run(&mut players, 1, None, 4, Some(0)),
            Err(GameError::AbilityExhausted { player: PlayerId(4) })
        );
        assert_eq!(players, before, "second shot must not mutate anything");
    }

    #[test]
    fn test_poisoned_slayer_misses_but_spends_shot() {
        let mut players = table();
        players.apply_status(PlayerId(4), Status::Poisoned).unwrap();
        let res = run(&mut players, 1, None, 4, Some(0)).unwrap();
        assert_eq!(
            res.outcome,
            AbilityOutcome::Shot {
                target: PlayerId(0),
                died: false
            }
        );
        assert_eq!(res.effect, Effect::None);
        assert!(players.get(PlayerId(4)).unwrap().ability_used());
    }

    #[test]
    fn test_villager_is_noop() {
        let mut players = table();
        let before = players.clone();
        assert_eq!(run(&mut players, 1, None, 5, Some(0)).unwrap(), Resolution::acted());
        assert_eq!(players, before);
    }

    #[test]
    fn test_evil_pairs() {
        let players = store(&[
            Role::Imp,
            Role::Poisoner,
            Role::Chef,
            Role::Spy,
            Role::Villager,
            Role::Villager,
            Role::ScarletWoman,
        ]);
        // Imp-Poisoner and ScarletWoman-Imp (wrapping round) are adjacent.
        assert_eq!(evil_pairs(&players), 2);
    }

    #[test]
    fn test_fabricate_keeps_shape() {
        let script = Script::trouble_brewing();
        let players = table();
        let chef = PlayerId(5);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let lie = fabricate(&Information::EvilPairs { count: 0 }, &players, chef, &script, &mut rng);
            assert_eq!(lie, Information::EvilPairs { count: 1 });

            let truth = Information::ExecutedCharacter {
                player: PlayerId(3),
                character: Role::Imp,
            };
            match fabricate(&truth, &players, chef, &script, &mut rng) {
                Information::ExecutedCharacter { player, character } => {
                    assert_eq!(player, PlayerId(3));
                    assert_ne!(character, Role::Imp);
                }
                other => panic!("wrong shape {:?}", other),
            }
        }
    }

    #[test]
    fn test_fabricate_stays_within_what_the_table_allows() {
        let script = Script::trouble_brewing();
        let mut rng = StdRng::seed_from_u64(5);

        // Two evil players can sit in at most one pair.
        let players = table();
        for _ in 0..20 {
            let lie = fabricate(&Information::EvilPairs { count: 1 }, &players, PlayerId(5), &script, &mut rng);
            assert_eq!(lie, Information::EvilPairs { count: 0 });
        }

        // Seats: 0 Imp, 1 Empath, 2 Villager. With the Villager dead the Empath
        // has a single living neighbour.
        let mut players = store(&[Role::Imp, Role::Empath, Role::Villager]);
        players.kill(PlayerId(2), Death::Storyteller).unwrap();
        assert_eq!(players.living_neighbours(PlayerId(1)).len(), 1);
        for _ in 0..20 {
            let lie = fabricate(&Information::EvilNeighbours { count: 1 }, &players, PlayerId(1), &script, &mut rng);
            assert_eq!(lie, Information::EvilNeighbours { count: 0 });
        }

        // Nobody left to sit next to: nothing else to say.
        let mut players = store(&[Role::Empath, Role::Villager]);
        players.kill(PlayerId(1), Death::Storyteller).unwrap();
        let lie = fabricate(&Information::EvilNeighbours { count: 0 }, &players, PlayerId(0), &script, &mut rng);
        assert_eq!(lie, Information::EvilNeighbours { count: 0 });
    }
}
