// Grimoire notation: the storyteller's single-line view of the table.
//
//   [Alice:imp Bob:empath(poisoned) *Cid:saint* *~~Dee~~:chef* Eve:drunk(thinks:monk)]
//
// `*name:role*` is a dead player, `~~name~~` marks a spent ghost vote and the
// parenthesised list holds reminder tokens. `thinks:<role>` gives the Drunk's token.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::player::{PlayerStore, Status};
use crate::roles::{Role, Script};
use crate::setup::match_role_name;

const THINKS_PREFIX: &str = "thinks:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrimoireEntry {
    pub name: String,
    pub role: Role,
    /// The character the player was shown, if different from `role`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinks: Option<Role>,
    pub alive: bool,
    pub ghost_vote: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reminders: Vec<Status>,
}

impl GrimoireEntry {
    pub fn token(&self) -> Role {
        self.thinks.unwrap_or(self.role)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grimoire {
    pub players: Vec<GrimoireEntry>,
}

impl Grimoire {
    /// Snapshot of the true state of every seat.
    pub fn from_players(players: &PlayerStore) -> Self {
        Grimoire {
            players: players
                .iter()
                .map(|p| GrimoireEntry {
                    name: p.name().to_string(),
                    role: p.role(),
                    thinks: (p.token() != p.role()).then_some(p.token()),
                    alive: p.is_alive(),
                    ghost_vote: p.has_ghost_vote(),
                    reminders: p.statuses().to_vec(),
                })
                .collect(),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.players.iter().map(|e| e.name.clone()).collect()
    }

    pub fn roles(&self) -> Vec<Role> {
        self.players.iter().map(|e| e.role).collect()
    }
}

impl fmt::Display for Grimoire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, entry) in self.players.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", entry)?;
        }
        write!(f, "]")
    }
}

impl fmt::Display for GrimoireEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if !self.alive && !self.ghost_vote {
            format!("~~{}~~", self.name)
        } else {
            self.name.clone()
        };

        let mut tokens: Vec<String> = self.reminders.iter().map(Status::token).collect();
        if let Some(thinks) = self.thinks {
            tokens.push(format!("{}{}", THINKS_PREFIX, thinks.slug()));
        }

        let mut body = format!("{}:{}", name, self.role.slug());
        if !tokens.is_empty() {
            body.push_str(&format!("({})", tokens.join(",")));
        }

        if self.alive {
            write!(f, "{}", body)
        } else {
            write!(f, "*{}*", body)
        }
    }
}

fn malformed(message: String) -> ConfigError {
    ConfigError::MalformedGrimoire(message)
}

/// Parses `[Alice:imp *Bob:empath(poisoned)* ...]`.
pub fn parse_grimoire(input: &str, script: Option<&Script>) -> Result<Grimoire, ConfigError> {
    let trimmed = input.trim();

    if !trimmed.starts_with('[') || !trimmed.ends_with(']') || trimmed.len() < 2 {
        return Err(malformed(format!(
            "grimoire must be enclosed in square brackets: {}",
            input
        )));
    }

    let content = trimmed[1..trimmed.len() - 1].trim();
    let players = split_player_entries(content)
        .into_iter()
        .map(|entry| parse_player_entry(entry, script))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Grimoire { players })
}

/// Splits on whitespace and commas outside parentheses.
fn split_player_entries(content: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;

    for (i, ch) in content.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 && (ch.is_whitespace() || ch == ',') => {
                let entry = content[start..i].trim();
                if !entry.is_empty() {
                    entries.push(entry);
                }
                start = i + ch.len_utf8();
            }
            _ => {}
        }
    }

    let entry = content[start..].trim();
    if !entry.is_empty() {
        entries.push(entry);
    }
    entries
}

fn parse_player_entry(entry: &str, script: Option<&Script>) -> Result<GrimoireEntry, ConfigError> {
    let entry = entry.trim();

    if entry.len() >= 2 && entry.starts_with('*') && entry.ends_with('*') {
        let inner = &entry[1..entry.len() - 1];

        if let Some(rest) = inner.strip_prefix("~~") {
            let end = rest.find("~~").ok_or_else(|| {
                malformed(format!("missing closing ~~ in dead player: {}", entry))
            })?;
            let name = &rest[..end];
            let after = rest[end + 2..].strip_prefix(':').ok_or_else(|| {
                malformed(format!("expected ':' after ~~name~~: {}", entry))
            })?;
            parse_player_parts(&format!("{}:{}", name, after), false, false, script)
        } else {
            parse_player_parts(inner, false, true, script)
        }
    } else {
        parse_player_parts(entry, true, true, script)
    }
}

/// Parses `name:role` or `name:role(token,token)`.
fn parse_player_parts(
    input: &str,
    alive: bool,
    ghost_vote: bool,
    script: Option<&Script>,
) -> Result<GrimoireEntry, ConfigError> {
    let (name_role, tokens) = match input.find('(') {
        Some(idx) => {
            if !input.ends_with(')') {
                return Err(malformed(format!("missing closing paren: {}", input)));
            }
            (&input[..idx], Some(&input[idx + 1..input.len() - 1]))
        }
        None => (input, None),
    };

    let (name, role) = match name_role.split(':').collect::<Vec<_>>().as_slice() {
        [name, role] => (name.trim(), role.trim()),
        _ => {
            return Err(malformed(format!("expected name:role, got {}", name_role)));
        }
    };
    if name.is_empty() {
        return Err(malformed(format!("player name cannot be empty: {}", input)));
    }
    if role.is_empty() {
        return Err(malformed(format!("player role cannot be empty: {}", input)));
    }
    let role = match_role_name(role, script)?;

    let mut thinks = None;
    let mut reminders = Vec::new();
    for token in tokens
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        match token.strip_prefix(THINKS_PREFIX) {
            Some(shown) => thinks = Some(match_role_name(shown, script)?),
            None => reminders.push(Status::from_token(token)),
        }
    }

    if thinks.is_some() && role != Role::Drunk {
        return Err(malformed(format!(
            "only the Drunk can think they are someone else: {}",
            input
        )));
    }

    Ok(GrimoireEntry {
        name: name.to_string(),
        role,
        thinks,
        alive,
        ghost_vote,
        reminders,
    })
}
