//! Host metrics reported with each heartbeat.
//!
//! Reads `/proc` directly so the daemon carries no system-probe
//! dependency. Every field is best-effort: a missing or unreadable file
//! produces `null` for that field, never a failed heartbeat.

use serde_json::json;

/// Collect the heartbeat metrics payload.
pub fn collect() -> serde_json::Value {
    json!({
        "loadavg_1m": read_loadavg(),
        "mem_total_kb": read_meminfo_field("MemTotal"),
        "mem_available_kb": read_meminfo_field("MemAvailable"),
        "uptime_secs": read_uptime(),
    })
}

fn read_loadavg() -> Option<f64> {
    let raw = std::fs::read_to_string("/proc/loadavg").ok()?;
    parse_loadavg(&raw)
}

fn read_uptime() -> Option<u64> {
    let raw = std::fs::read_to_string("/proc/uptime").ok()?;
    parse_uptime(&raw)
}

fn read_meminfo_field(field: &str) -> Option<u64> {
    let raw = std::fs::read_to_string("/proc/meminfo").ok()?;
    parse_meminfo_field(&raw, field)
}

/// First column of `/proc/loadavg` is the 1-minute average.
fn parse_loadavg(raw: &str) -> Option<f64> {
    raw.split_whitespace().next()?.parse().ok()
}

/// First column of `/proc/uptime` is seconds since boot, fractional.
fn parse_uptime(raw: &str) -> Option<u64> {
    let secs: f64 = raw.split_whitespace().next()?.parse().ok()?;
    Some(secs as u64)
}

/// `/proc/meminfo` lines look like `MemTotal:  16316412 kB`.
fn parse_meminfo_field(raw: &str, field: &str) -> Option<u64> {
    for line in raw.lines() {
        let Some(rest) = line.strip_prefix(field) else {
            continue;
        };
        let Some(rest) = rest.strip_prefix(':') else {
            continue;
        };
        return rest.split_whitespace().next()?.parse().ok();
    }
    None
}
