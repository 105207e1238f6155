// Phase state machine.
//
// A `Game` owns everything about one table: seats, the clock, decks, the
// wake queue and its own RNG. It is driven one event at a time, either
// through the typed `submit_*` methods or through `Game::apply`. An event
// that is rejected leaves the game exactly as it was.
//
// The day loop runs Night → Discussion → Nomination ⇄ Vote → Night, with
// Execution and VictoryCheck passed through on the way.

use std::collections::VecDeque;
use std::fmt;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ability::{self, AbilityContext, AbilityOutcome, Effect, Information, Resolution};
use crate::config::{Deal, GameConfig};
use crate::error::{ConfigError, GameError};
use crate::event::{Event, EventReply, PlayerEvent, StorytellerCommand, Tally, VoteOutcome};
use crate::grimoire::{parse_grimoire, Grimoire};
use crate::meta::Meta;
use crate::player::{Death, Player, PlayerId, PlayerStore, Status};
use crate::roles::{AbilityKind, Alignment, Role, Script, Team};
use crate::setup::{deal_seats, seed_bluffs, validate_distribution, validate_names, BLUFFS_DECK};
use crate::victory;
use crate::view::{Announcement, BallotView, CastVote, PrivateState, PublicState, Seat};

/// Characters the Demon is told are not in play.
const BLUFF_COUNT: usize = 3;
/// Living players needed, before the Demon dies, for the Scarlet Woman to take over.
const SCARLET_WOMAN_MIN_ALIVE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Night,
    Discussion,
    Nomination,
    Vote,
    Execution,
    VictoryCheck,
    Terminal(Alignment),
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Terminal(_))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Setup => write!(f, "setup"),
            Phase::Night => write!(f, "night"),
            Phase::Discussion => write!(f, "discussion"),
            Phase::Nomination => write!(f, "nomination"),
            Phase::Vote => write!(f, "vote"),
            Phase::Execution => write!(f, "execution"),
            Phase::VictoryCheck => write!(f, "victory check"),
            Phase::Terminal(winner) => write!(f, "game over ({} wins)", winner),
        }
    }
}

#[derive(Debug, Clone)]
struct Ballot {
    nominator: PlayerId,
    nominee: PlayerId,
    votes: Vec<CastVote>,
}

impl Ballot {
    fn has_voted(&self, voter: PlayerId) -> bool {
        self.votes.iter().any(|v| v.voter == voter)
    }
}

#[derive(Debug, Clone)]
pub struct Game {
    config: GameConfig,
    script: Script,
    players: PlayerStore,
    phase: Phase,
    night: u32,
    day: u32,
    meta: Meta,
    wake_queue: VecDeque<PlayerId>,
    pending_kill: Option<PlayerId>,
    /// Today's nominations, nominator first.
    nominations: Vec<(PlayerId, PlayerId)>,
    ballot: Option<Ballot>,
    /// Execution on the most recent day. Read by the Undertaker the night after.
    executed_today: Option<PlayerId>,
    last_execution: Option<PlayerId>,
    saint_executed: bool,
    winner: Option<Alignment>,
    announcements: Vec<Announcement>,
    rng: StdRng,
}

impl Game {
    /// Seats `names` in order and deals them the characters in `pool`.
    pub fn configure(config: GameConfig, names: &[String], pool: &[Role]) -> Result<Game, GameError> {
        config.validate()?;
        validate_distribution(names.len(), pool)?;
        validate_names(names)?;

        let mut rng = config.rng();
        let seats = deal_seats(names, pool, config.deal, &mut rng);
        Game::assemble(config, Script::default(), seats, rng)
    }

    /// Sets up a game from grimoire notation. Every entry must be alive.
    pub fn from_grimoire(config: GameConfig, notation: &str) -> Result<Game, GameError> {
        config.validate()?;
        let script = Script::default();
        let grimoire = parse_grimoire(notation, Some(&script))?;

        if let Some(dead) = grimoire.players.iter().find(|e| !e.alive) {
            return Err(ConfigError::MalformedGrimoire(format!(
                "{} is dead; a new game starts with everyone alive",
                dead.name
            ))
            .into());
        }
        if let Some(entry) = grimoire
            .players
            .iter()
            .find(|e| e.token().team() != Team::Townsfolk && e.role == Role::Drunk && e.thinks.is_some())
        {
            return Err(ConfigError::MalformedGrimoire(format!(
                "{} is the Drunk and must think they are a Townsfolk",
                entry.name
            ))
            .into());
        }

        let roles = grimoire.roles();
        if let Some(entry) = grimoire
            .players
            .iter()
            .find(|e| e.thinks.is_some_and(|token| roles.contains(&token)))
        {
            return Err(ConfigError::MalformedGrimoire(format!(
                "{} is the Drunk but {} is already in play",
                entry.name,
                entry.token()
            ))
            .into());
        }

        let names = grimoire.names();
        validate_distribution(names.len(), &roles)?;
        validate_names(&names)?;

        let seats = grimoire
            .players
            .iter()
            .enumerate()
            .map(|(seat, entry)| {
                let mut player = Player::new(PlayerId(seat), entry.name.clone(), entry.role);
                player.token = entry.token();
                for status in &entry.reminders {
                    if !player.statuses.contains(status) {
                        player.statuses.push(status.clone());
                    }
                }
                player
            })
            .collect();

        let rng = config.rng();
        Game::assemble(config, script, seats, rng)
    }

    fn assemble(
        config: GameConfig,
        script: Script,
        mut seats: Vec<Player>,
        mut rng: StdRng,
    ) -> Result<Game, GameError> {
        let in_play: Vec<Role> = seats.iter().flat_map(|p| [p.role, p.token]).collect();
        let mut meta = Meta::new(config.discussion_timer);
        let shuffle = if config.deal == Deal::Shuffled {
            Some(&mut rng)
        } else {
            None
        };
        seed_bluffs(&mut meta, &script, &in_play, shuffle);

        for player in seats.iter_mut().filter(|p| p.role == Role::Drunk) {
            if player.token == Role::Drunk {
                player.token = meta
                    .take_first(BLUFFS_DECK, |r| r.team() == Team::Townsfolk)
                    .ok_or(ConfigError::NoDrunkToken {
                        team: Team::Townsfolk,
                    })?;
            }
            if !player.statuses.contains(&Status::Drunk) {
                player.statuses.push(Status::Drunk);
            }
        }

        let mut game = Game {
            config,
            script,
            players: PlayerStore::new(seats),
            phase: Phase::Setup,
            night: 0,
            day: 0,
            meta,
            wake_queue: VecDeque::new(),
            pending_kill: None,
            nominations: Vec::new(),
            ballot: None,
            executed_today: None,
            last_execution: None,
            saint_executed: false,
            winner: None,
            announcements: Vec::new(),
            rng,
        };
        info!(
            players = game.players.len(),
            script = %game.script.title,
            "game configured"
        );
        game.begin_night()?;
        Ok(game)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn night(&self) -> u32 {
        self.night
    }

    pub fn winner(&self) -> Option<Alignment> {
        self.winner
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn players(&self) -> &PlayerStore {
        &self.players
    }

    pub fn announcements(&self) -> &[Announcement] {
        &self.announcements
    }

    pub fn player_id(&self, name: &str) -> Option<PlayerId> {
        self.players.find_by_name(name).map(Player::id)
    }

    /// The player whose night action the game is waiting on.
    pub fn awaiting(&self) -> Option<PlayerId> {
        match self.phase {
            Phase::Night => self.wake_queue.front().copied(),
            _ => None,
        }
    }

    /// Single entry point for any event.
    pub fn apply(&mut self, event: Event) -> Result<EventReply, GameError> {
        debug!(event = event.name(), phase = %self.phase, "applying event");
        match event {
            Event::Player(PlayerEvent::Chat { player, text }) => Ok(EventReply::TimerRemaining {
                remaining: self.submit_chat_message(player, &text)?,
            }),
            Event::Player(PlayerEvent::Nominate { nominator, nominee }) => {
                self.submit_nomination(nominator, nominee)?;
                Ok(EventReply::Nominated)
            }
            Event::Player(PlayerEvent::Vote {
                voter,
                nominee,
                in_favor,
            }) => Ok(EventReply::Vote {
                outcome: self.submit_vote(voter, nominee, in_favor)?,
            }),
            Event::Player(PlayerEvent::Ability { player, target }) => Ok(EventReply::Ability {
                outcome: self.invoke_ability(player, target)?,
            }),
            Event::Storyteller(command) => self.storyteller(command),
        }
    }

    /// Counts one chat message against the discussion clock.
    pub fn submit_chat_message(&mut self, player: PlayerId, text: &str) -> Result<u32, GameError> {
        self.expect_phase("chat", &[Phase::Discussion])?;
        self.players.require(player)?;

        let remaining = self.meta.timer.tick();
        debug!(%player, text, remaining, "chat");
        if remaining == 0 {
            self.open_nominations();
        }
        Ok(remaining)
    }

    pub fn submit_nomination(&mut self, nominator: PlayerId, nominee: PlayerId) -> Result<(), GameError> {
        self.expect_phase("nomination", &[Phase::Nomination])?;
        if !self.players.require(nominator)?.is_alive() {
            return Err(GameError::ineligible(nominator, "dead players cannot nominate"));
        }
        if self.nominations.iter().any(|(n, _)| *n == nominator) {
            return Err(GameError::DuplicateNomination { nominator });
        }
        self.players.require_living_target(nominee)?;

        info!(%nominator, %nominee, day = self.day, "nomination");
        self.nominations.push((nominator, nominee));
        self.ballot = Some(Ballot {
            nominator,
            nominee,
            votes: Vec::new(),
        });
        self.announce(Announcement::Nominated { nominator, nominee });
        self.set_phase(Phase::Vote);
        Ok(())
    }

    pub fn submit_vote(
        &mut self,
        voter: PlayerId,
        nominee: PlayerId,
        in_favor: bool,
    ) -> Result<VoteOutcome, GameError> {
        self.expect_phase("vote", &[Phase::Vote])?;
        let ballot = self
            .ballot
            .as_ref()
            .ok_or(GameError::invalid_phase("vote", self.phase))?;
        if nominee != ballot.nominee {
            return Err(GameError::invalid_target(nominee, "not the player on the block"));
        }
        let player = self.players.require(voter)?;
        if ballot.has_voted(voter) {
            return Err(GameError::DuplicateVote { voter });
        }
        let ghost = !player.is_alive() && in_favor;
        if ghost && !player.has_ghost_vote() {
            return Err(GameError::ineligible(voter, "ghost vote already spent"));
        }

        if ghost {
            self.players.spend_ghost_vote(voter)?;
        }
        if let Some(ballot) = self.ballot.as_mut() {
            ballot.votes.push(CastVote { voter, in_favor });
        }
        debug!(%voter, %nominee, in_favor, ghost, "vote");

        if self.all_living_voted() {
            self.close_ballot()
        } else {
            Ok(VoteOutcome::Pending { tally: self.tally() })
        }
    }

    /// Night: acts for the player at the head of the wake queue.
    /// Day: fires a day ability such as the Slayer's shot.
    pub fn invoke_ability(
        &mut self,
        player: PlayerId,
        target: Option<PlayerId>,
    ) -> Result<AbilityOutcome, GameError> {
        let actor = self.players.require(player)?;
        let kind = actor.token().kind();
        let alive = actor.is_alive();

        match self.phase {
            Phase::Night => {
                if self.wake_queue.front() != Some(&player) {
                    return Err(GameError::invalid_phase("ability", self.phase));
                }
                let resolution = self.resolve_ability(player, target)?;
                self.wake_queue.pop_front();
                if let Effect::PendingKill(victim) = resolution.effect {
                    self.pending_kill = Some(victim);
                }
                self.wake_next()?;
                Ok(resolution.outcome)
            }
            Phase::Discussion | Phase::Nomination if kind.is_day_ability() => {
                let resolution = self.resolve_ability(player, target)?;
                if let AbilityOutcome::Shot { target, died } = resolution.outcome {
                    info!(slayer = %player, %target, died, "slayer shot");
                    self.announce(Announcement::SlayerShot {
                        slayer: player,
                        target,
                        died,
                    });
                }
                if let Effect::Death(victim) = resolution.effect {
                    self.kill(victim, Death::Slayer { day: self.day })?;
                    self.check_victory();
                }
                Ok(resolution.outcome)
            }
            Phase::Discussion | Phase::Nomination if kind == AbilityKind::None => {
                if !alive {
                    return Err(GameError::ineligible(player, "dead players do not act"));
                }
                Ok(AbilityOutcome::Acted)
            }
            phase => Err(GameError::invalid_phase("ability", phase)),
        }
    }

    pub fn storyteller(&mut self, command: StorytellerCommand) -> Result<EventReply, GameError> {
        if self.phase.is_terminal() {
            return Err(GameError::invalid_phase(command.name(), self.phase));
        }

        match command {
            StorytellerCommand::ForceAdvance => match self.phase {
                Phase::Night => {
                    if let Some(skipped) = self.wake_queue.pop_front() {
                        info!(player = %skipped, "night action skipped");
                    }
                    self.wake_next()?;
                    Ok(EventReply::Acknowledged)
                }
                Phase::Discussion => {
                    self.open_nominations();
                    Ok(EventReply::Acknowledged)
                }
                Phase::Nomination => {
                    self.end_day()?;
                    Ok(EventReply::Acknowledged)
                }
                Phase::Vote => Ok(EventReply::Vote {
                    outcome: self.close_ballot()?,
                }),
                phase => Err(GameError::invalid_phase("force_advance", phase)),
            },
            StorytellerCommand::SetDiscussionTimer { turns } => {
                if turns == 0 {
                    return Err(ConfigError::InvalidTimer(turns).into());
                }
                self.meta.timer.set(turns);
                Ok(EventReply::Acknowledged)
            }
            StorytellerCommand::AddReminder { player, status } => {
                self.players.apply_status(player, status)?;
                Ok(EventReply::Acknowledged)
            }
            StorytellerCommand::RemoveReminder { player, status } => {
                self.players.remove_status(player, &status)?;
                Ok(EventReply::Acknowledged)
            }
            StorytellerCommand::AmendInformation {
                player,
                information,
            } => {
                self.players.require(player)?;
                if !self.players.amend_latest(player, information.clone())? {
                    self.players.record(player, self.night, information)?;
                }
                Ok(EventReply::Acknowledged)
            }
            StorytellerCommand::Kill { player } => {
                self.players.require(player)?;
                if self.kill(player, Death::Storyteller)? {
                    self.announce(Announcement::Died { player });
                    if self.check_victory() {
                        return Ok(EventReply::Acknowledged);
                    }
                    match self.phase {
                        Phase::Night => self.wake_next()?,
                        Phase::Vote => self.ballot_death(player)?,
                        _ => {}
                    }
                }
                Ok(EventReply::Acknowledged)
            }
        }
    }

    pub fn public_state(&self) -> PublicState {
        PublicState {
            phase: self.phase,
            day: self.day,
            night: self.night,
            seats: self
                .players
                .iter()
                .map(|p| Seat {
                    id: p.id(),
                    name: p.name().to_string(),
                    alive: p.is_alive(),
                    ghost_vote: p.has_ghost_vote(),
                })
                .collect(),
            discussion_timer: self.meta.timer.remaining(),
            nominated_today: self.nominations.iter().map(|(n, _)| *n).collect(),
            ballot: self.ballot.as_ref().map(|b| BallotView {
                nominator: b.nominator,
                nominee: b.nominee,
                votes: b.votes.clone(),
            }),
            last_execution: self.last_execution,
            winner: self.winner,
        }
    }

    pub fn private_state(&self, player: PlayerId) -> Result<PrivateState, GameError> {
        let p = self.players.require(player)?;
        let grimoire = (p.role() == Role::Spy).then(|| {
            let mut grimoire = self.grimoire();
            if let Some(own) = grimoire.players.get_mut(player.0) {
                own.reminders
                    .retain(|s| !matches!(s, Status::Poisoned | Status::Drunk));
            }
            grimoire
        });

        Ok(PrivateState {
            player,
            name: p.name().to_string(),
            character: p.token(),
            alive: p.is_alive(),
            ghost_vote: p.has_ghost_vote(),
            ability_used: p.ability_used(),
            information: p.ledger().to_vec(),
            grimoire,
        })
    }

    /// The storyteller's full view of the table.
    pub fn grimoire(&self) -> Grimoire {
        Grimoire::from_players(&self.players)
    }

    /// Characters still in the bluffs deck.
    pub fn remaining_bluffs(&self) -> &[Role] {
        self.meta.peek(BLUFFS_DECK)
    }

    fn expect_phase(&self, event: &'static str, allowed: &[Phase]) -> Result<(), GameError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(GameError::invalid_phase(event, self.phase))
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            info!(from = %self.phase, to = %phase, day = self.day, night = self.night, "phase change");
            self.phase = phase;
        }
    }

    fn announce(&mut self, announcement: Announcement) {
        self.announcements.push(announcement);
    }

    fn resolve_ability(
        &mut self,
        actor: PlayerId,
        target: Option<PlayerId>,
    ) -> Result<Resolution, GameError> {
        let mut ctx = AbilityContext {
            players: &mut self.players,
            night: self.night,
            executed_yesterday: self.executed_today,
            script: &self.script,
            rng: &mut self.rng,
        };
        ability::resolve(&mut ctx, actor, target)
    }

    fn begin_night(&mut self) -> Result<(), GameError> {
        self.night += 1;
        self.ballot = None;
        self.set_phase(Phase::Night);
        if self.night > 1 {
            // Last night's poison wears off at dusk.
            self.players.clear_status(&Status::Poisoned);
        }

        let night = self.night;
        let mut order: Vec<(u8, PlayerId)> = self
            .players
            .living()
            .filter_map(|p| p.token().wake_rank(night).map(|rank| (rank, p.id())))
            .collect();
        order.sort();
        self.wake_queue = order.into_iter().map(|(_, id)| id).collect();
        self.announce(Announcement::NightFalls { night });

        if night == 1 && self.players.len() >= self.config.evil_info_min_players {
            self.share_evil_info()?;
        }
        self.wake_next()
    }

    fn share_evil_info(&mut self) -> Result<(), GameError> {
        let Some(demon) = self.players.living_demon().map(Player::id) else {
            return Ok(());
        };
        let minions: Vec<PlayerId> = self
            .players
            .living()
            .filter(|p| p.role().team() == Team::Minion)
            .map(Player::id)
            .collect();
        let bluffs = self.meta.draw(BLUFFS_DECK, BLUFF_COUNT);

        self.players.record(
            demon,
            self.night,
            Information::EvilTeam {
                minions: minions.clone(),
                bluffs,
            },
        )?;
        for minion in minions {
            self.players
                .record(minion, self.night, Information::DemonIs { player: demon })?;
        }
        Ok(())
    }

    /// Resolves untargeted abilities until someone has to choose, or the night is over.
    fn wake_next(&mut self) -> Result<(), GameError> {
        while let Some(&actor) = self.wake_queue.front() {
            if self.phase != Phase::Night {
                return Ok(());
            }
            let Some(player) = self.players.get(actor).filter(|p| p.is_alive()) else {
                self.wake_queue.pop_front();
                continue;
            };
            if player.token().kind().needs_night_target() {
                debug!(%actor, character = %player.token(), "waiting for night action");
                return Ok(());
            }

            self.wake_queue.pop_front();
            let resolution = self.resolve_ability(actor, None)?;
            debug!(%actor, outcome = ?resolution.outcome, "night ability resolved");
        }

        if self.phase == Phase::Night {
            self.dawn()?;
        }
        Ok(())
    }

    fn dawn(&mut self) -> Result<(), GameError> {
        self.wake_queue.clear();

        let mut died = Vec::new();
        if let Some(target) = self.pending_kill.take() {
            if self.safe_from_demon(target) {
                info!(%target, "demon kill prevented");
            } else if self.kill(target, Death::Demon { night: self.night })? {
                died.push(target);
            }
        }
        self.players.clear_status(&Status::Protected);

        self.day = self.night;
        self.executed_today = None;
        self.nominations.clear();
        self.announce(Announcement::DawnBreaks {
            day: self.day,
            died,
        });
        if self.check_victory() {
            return Ok(());
        }

        self.meta.timer.reset();
        self.set_phase(Phase::Discussion);
        Ok(())
    }

    fn safe_from_demon(&self, target: PlayerId) -> bool {
        self.players.get(target).is_some_and(|p| {
            p.has_status(&Status::Protected) || (p.role() == Role::Soldier && !p.is_suppressed())
        })
    }

    fn open_nominations(&mut self) {
        self.meta.timer.expire();
        self.announce(Announcement::NominationsOpen { day: self.day });
        self.set_phase(Phase::Nomination);
    }

    fn tally(&self) -> Tally {
        let votes = self.ballot.as_ref().map(|b| b.votes.as_slice()).unwrap_or(&[]);
        let in_favor = votes.iter().filter(|v| v.in_favor).count();
        Tally {
            in_favor,
            against: votes.len() - in_favor,
            needed: self.players.living_count() / 2 + 1,
        }
    }

    fn all_living_voted(&self) -> bool {
        match &self.ballot {
            Some(ballot) => self.players.living().all(|p| ballot.has_voted(p.id())),
            None => false,
        }
    }

    fn close_ballot(&mut self) -> Result<VoteOutcome, GameError> {
        let tally = self.tally();
        let ballot = self
            .ballot
            .take()
            .ok_or(GameError::invalid_phase("vote", self.phase))?;
        info!(
            nominee = %ballot.nominee,
            in_favor = tally.in_favor,
            needed = tally.needed,
            "ballot closed"
        );

        if tally.passes() && self.execute(ballot.nominee)? {
            return Ok(VoteOutcome::Executed {
                player: ballot.nominee,
                tally,
            });
        }

        self.resume_nominations()?;
        Ok(VoteOutcome::NotExecuted { tally })
    }

    /// Back to nominations, or on to night when nobody is left to nominate.
    fn resume_nominations(&mut self) -> Result<(), GameError> {
        self.set_phase(Phase::Nomination);
        let can_still_nominate = self
            .players
            .living()
            .any(|p| !self.nominations.iter().any(|(n, _)| *n == p.id()));
        if !can_still_nominate {
            self.end_day()?;
        }
        Ok(())
    }

    /// Someone died while a ballot was open.
    fn ballot_death(&mut self, dead: PlayerId) -> Result<(), GameError> {
        if self.ballot.as_ref().is_some_and(|b| b.nominee == dead) {
            info!(nominee = %dead, "nominee died, ballot dropped");
            self.ballot = None;
            self.resume_nominations()
        } else if self.all_living_voted() {
            self.close_ballot().map(|_| ())
        } else {
            Ok(())
        }
    }

    /// Executes the nominee. Returns false, recording nothing, if they are already dead.
    fn execute(&mut self, nominee: PlayerId) -> Result<bool, GameError> {
        let player = self.players.require(nominee)?;
        let working_saint = player.role() == Role::Saint && !player.is_suppressed();

        self.set_phase(Phase::Execution);
        if !self.kill(nominee, Death::Executed { day: self.day })? {
            info!(%nominee, "nominee already dead, no execution");
            return Ok(false);
        }
        self.last_execution = Some(nominee);
        self.executed_today = Some(nominee);
        if working_saint {
            self.saint_executed = true;
        }
        self.announce(Announcement::Executed { player: nominee });

        self.set_phase(Phase::VictoryCheck);
        if !self.check_victory() {
            self.begin_night()?;
        }
        Ok(true)
    }

    fn end_day(&mut self) -> Result<(), GameError> {
        info!(day = self.day, "day ends without an execution");
        self.ballot = None;
        self.announce(Announcement::NoExecution { day: self.day });
        self.set_phase(Phase::VictoryCheck);
        if self.check_victory() {
            return Ok(());
        }
        self.begin_night()
    }

    /// Kills a player and hands the Demon on to the Scarlet Woman if she qualifies.
    fn kill(&mut self, id: PlayerId, death: Death) -> Result<bool, GameError> {
        let alive_before = self.players.living_count();
        let was_demon = self.players.require(id)?.role().is_demon();
        if !self.players.kill(id, death)? {
            return Ok(false);
        }
        info!(player = %id, ?death, "player died");

        if was_demon && alive_before >= SCARLET_WOMAN_MIN_ALIVE {
            let heir = self
                .players
                .living()
                .find(|p| p.role() == Role::ScarletWoman && !p.is_suppressed())
                .map(Player::id);
            if let Some(heir) = heir {
                info!(player = %heir, "scarlet woman becomes the demon");
                self.players.set_character(heir, Role::Imp)?;
            }
        }
        Ok(true)
    }

    /// Ends the game if someone has won. Returns whether it did.
    fn check_victory(&mut self) -> bool {
        let Some(winner) = victory::evaluate(&self.players, self.saint_executed).winner() else {
            return false;
        };
        self.winner = Some(winner);
        self.pending_kill = None;
        self.wake_queue.clear();
        self.ballot = None;
        self.announce(Announcement::GameOver { winner });
        self.set_phase(Phase::Terminal(winner));
        true
    }
}
