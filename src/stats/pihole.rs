/*
 *  stats/pihole.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Appliance counters scraped from `pihole -c -e`
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};

use super::StatError;

/// Command and arguments producing the chronometer dump
pub const CHRONOMETER: (&str, &[&str]) = ("pihole", &["-c", "-e"]);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PiholeStats {
    /// DHCP leases, used as the number of known devices
    pub known_client_count: u32,
    pub blocked: u64,
    pub total: u64,
    /// Client id as the appliance reports it, `.lan` suffix included
    pub top_client: String,
}

impl PiholeStats {
    /// blocked / total in 0..=1, 0 when nothing was queried
    pub fn blocked_ratio(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.blocked as f32 / self.total as f32).clamp(0.0, 1.0)
    }
}

/// Token `offset` places after the first occurrence of `key`
fn after<'a>(tokens: &[&'a str], key: &str, offset: usize) -> Option<&'a str> {
    let idx = tokens.iter().position(|t| *t == key)?;
    tokens.get(idx + offset).copied()
}

fn required<'a>(tokens: &[&'a str], key: &str, offset: usize) -> Result<&'a str, StatError> {
    after(tokens, key, offset).ok_or_else(|| StatError::Parse(format!("`{}` missing from chronometer output", key)))
}

fn number<T: std::str::FromStr>(token: &str, what: &str) -> Result<T, StatError> {
    token
        .trim_matches(|c: char| !c.is_ascii_digit() && c != '.')
        .replace(',', "")
        .parse::<T>()
        .map_err(|_| StatError::Parse(format!("{} is not a number: {}", what, token)))
}

/// Parse the whitespace separated chronometer dump.
///
/// The query counters and top client are required; the lease count falls
/// back to 0 when DHCP is not served by the appliance.
pub fn parse(output: &str) -> Result<PiholeStats, StatError> {
    let tokens: Vec<&str> = output.split_whitespace().collect();

    let blocked = number(required(&tokens, "(Total:", 1)?, "blocked queries")?;
    let total = number(required(&tokens, "(Total:", 3)?, "total queries")?;
    let top_client = required(&tokens, "Client:", 1)?.to_string();

    let known_client_count = match after(&tokens, "(Leased:", 1) {
        Some(token) => number(token, "leased clients")?,
        None => 0,
    };

    Ok(PiholeStats { known_client_count, blocked, total, top_client })
}

pub fn strip_lan(client: &str) -> &str {
    client.strip_suffix(".lan").unwrap_or(client)
}

/// Friendly names for client ids, one `<id> <display name...>` per line
#[derive(Debug, Default, Clone)]
pub struct KnownClients {
    names: HashMap<String, String>,
}

impl KnownClients {
    /// Load the mapping; a missing or unreadable file gives an empty one
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => {
                let clients = Self::parse(&content);
                debug!("Loaded {} known clients from {}", clients.len(), path.display());
                clients
            }
            Err(e) => {
                warn!("Known clients file {} not read: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Self {
        let names = content
            .lines()
            .filter_map(|line| {
                let mut words = line.split_whitespace();
                let id = words.next()?;
                let name = words.collect::<Vec<_>>().join(" ");
                Some((id.to_string(), name))
            })
            .collect();
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Display name for `client`, the client itself when unknown
    pub fn resolve<'a>(&'a self, client: &'a str) -> &'a str {
        self.names.get(client).map(String::as_str).unwrap_or(client)
    }

    /// What the clients view shows: the mapped name, else the raw id
    /// without its `.lan` suffix
    pub fn label<'a>(&'a self, client: &'a str) -> &'a str {
        strip_lan(self.resolve(client))
    }
}
