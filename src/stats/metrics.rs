/*
 *  stats/metrics.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Machine metrics gathered from /proc
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
//! CPU, memory and neighbour table figures from /proc.

use std::fs;

use super::StatError;

const PROC_STAT: &str = "/proc/stat";
const PROC_MEMINFO: &str = "/proc/meminfo";
const PROC_ARP: &str = "/proc/net/arp";

/// Jiffy counters from the aggregate `cpu` line of /proc/stat
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CpuTimes {
    pub busy: u64,
    pub total: u64,
}

impl CpuTimes {
    /// Load in percent over the interval since `earlier`
    pub fn load_since(&self, earlier: &CpuTimes) -> f32 {
        let total = self.total.saturating_sub(earlier.total);
        if total == 0 {
            return 0.0;
        }
        let busy = self.busy.saturating_sub(earlier.busy);
        (busy as f32 * 100.0 / total as f32).clamp(0.0, 100.0)
    }
}

/// Parse the `cpu` line: user nice system idle iowait irq softirq steal
pub fn parse_cpu_times(stat: &str) -> Option<CpuTimes> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .take(8)
        .map(|f| f.parse::<u64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if fields.len() < 4 {
        return None;
    }
    let total: u64 = fields.iter().sum();
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Some(CpuTimes { busy: total - idle, total })
}

/// Memory in use as a percentage, from MemTotal and MemAvailable
pub fn parse_mem_used_percent(meminfo: &str) -> Option<f32> {
    let mut total = None;
    let mut available = None;
    for line in meminfo.lines() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("MemTotal:") => total = parts.next().and_then(|v| v.parse::<u64>().ok()),
            Some("MemAvailable:") => available = parts.next().and_then(|v| v.parse::<u64>().ok()),
            _ => {}
        }
    }
    let (total, available) = (total?, available?);
    if total == 0 {
        return None;
    }
    let used = total.saturating_sub(available);
    Some(used as f32 * 100.0 / total as f32)
}

/// Rows in the neighbour table, the header line excluded
pub fn count_neighbours(arp: &str) -> u32 {
    arp.lines().skip(1).filter(|l| !l.trim().is_empty()).count() as u32
}

/// Keeps the previous CPU sample so each read reports load since the last one
#[derive(Debug, Default)]
pub struct MachineMetrics {
    previous: Option<CpuTimes>,
}

impl MachineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// CPU load since the previous call; since boot on the first one
    pub fn cpu_load(&mut self) -> Result<f32, StatError> {
        let content = fs::read_to_string(PROC_STAT)?;
        self.cpu_load_from(&content)
    }

    fn cpu_load_from(&mut self, stat: &str) -> Result<f32, StatError> {
        let now = parse_cpu_times(stat)
            .ok_or_else(|| StatError::Parse("no cpu line in /proc/stat".to_string()))?;
        let earlier = self.previous.replace(now).unwrap_or_default();
        Ok(now.load_since(&earlier))
    }

    pub fn memory_used(&self) -> Result<f32, StatError> {
        let content = fs::read_to_string(PROC_MEMINFO)?;
        parse_mem_used_percent(&content)
            .ok_or_else(|| StatError::Parse("MemTotal/MemAvailable missing".to_string()))
    }

    pub fn neighbours(&self) -> Result<u32, StatError> {
        let content = fs::read_to_string(PROC_ARP)?;
        Ok(count_neighbours(&content))
    }
}
