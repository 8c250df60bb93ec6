//! Store statistics taken from the `INFO` command

use queuedeck_core::{StoreClient, StoreError};
use std::collections::{BTreeMap, HashMap};

/// Metrics copied from `INFO` into the snapshot
pub const STATS_KEYS: [&str; 5] = [
    "redis_version",
    "used_memory",
    "mem_fragmentation_ratio",
    "connected_clients",
    "blocked_clients",
];

pub const TOTAL_SYSTEM_MEMORY: &str = "total_system_memory";
const MAXMEMORY: &str = "maxmemory";

/// Metric name to raw value
pub type StoreStats = BTreeMap<String, String>;

/// Split `INFO` output into `key:value` pairs, skipping section headers
pub fn parse_info(info: &str) -> HashMap<&str, &str> {
    info.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .collect()
}

/// Reduce parsed `INFO` output to the reported metrics
pub fn filter_stats(info: &str) -> StoreStats {
    let parsed = parse_info(info);

    let mut stats: StoreStats = STATS_KEYS
        .iter()
        .filter_map(|key| parsed.get(key).map(|v| (key.to_string(), v.to_string())))
        .collect();

    let total = parsed
        .get(TOTAL_SYSTEM_MEMORY)
        .or_else(|| parsed.get(MAXMEMORY));
    if let Some(total) = total {
        stats.insert(TOTAL_SYSTEM_MEMORY.to_string(), total.to_string());
    }

    stats
}

pub async fn collect_stats(client: &dyn StoreClient) -> Result<StoreStats, StoreError> {
    let info = client.info().await?;
    Ok(filter_stats(&info))
}
