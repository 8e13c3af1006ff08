//! Client configuration read from the process environment.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tower_runtime::{RuntimeConfig, StairsBehaviour};

/// Terminal client configuration.
///
/// Content paths follow the data directory layout: `levels/<name>.json`,
/// `story/<id>.json` and an optional `config.toml`.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub data_dir: PathBuf,
    /// Level name under `levels/`, without the extension.
    pub level: String,
    pub seed: u64,
    /// `None` waits for the player forever.
    pub battle_timeout: Option<Duration>,
    pub equipment_rewards: bool,
    /// Stairs move between `levels/floor_<n>.json` files.
    pub floors: bool,
    /// Ask before every fight instead of resolving it by formula.
    pub interactive_battles: bool,
    /// Write logs to this directory instead of stderr.
    pub log_dir: Option<PathBuf>,
    pub message_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("assets"),
            level: "floor_1".to_string(),
            seed: 0,
            battle_timeout: RuntimeConfig::default().battle_timeout,
            equipment_rewards: false,
            floors: false,
            interactive_battles: false,
            log_dir: None,
            message_capacity: 64,
        }
    }
}

impl ClientConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TOWER_DATA_DIR` - Content directory (default: `assets`)
    /// - `TOWER_LEVEL` - Starting level name (default: `floor_1`)
    /// - `TOWER_SEED` - RNG seed for battles and equipment (default: 0)
    /// - `TOWER_BATTLE_TIMEOUT_MS` - Interactive battle timeout, 0 disables (default: 60000)
    /// - `TOWER_EQUIPMENT_REWARDS` - Grant equipment on monster defeat (default: false)
    /// - `TOWER_FLOORS` - Multi-floor progression (default: false)
    /// - `TOWER_INTERACTIVE_BATTLES` - Prompt before each fight (default: false)
    /// - `TOWER_LOG_DIR` - Log to a file in this directory (default: stderr)
    /// - `TOWER_MESSAGE_CAPACITY` - Message log capacity (default: 64)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = read_env::<PathBuf>("TOWER_DATA_DIR") {
            config.data_dir = dir;
        }
        if let Some(level) = read_env::<String>("TOWER_LEVEL").filter(|l| !l.trim().is_empty()) {
            config.level = level.trim().to_string();
        }
        if let Some(seed) = read_env::<u64>("TOWER_SEED") {
            config.seed = seed;
        }
        if let Some(ms) = read_env::<u64>("TOWER_BATTLE_TIMEOUT_MS") {
            config.battle_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(enabled) = read_env_bool("TOWER_EQUIPMENT_REWARDS") {
            config.equipment_rewards = enabled;
        }
        if let Some(enabled) = read_env_bool("TOWER_FLOORS") {
            config.floors = enabled;
        }
        if let Some(enabled) = read_env_bool("TOWER_INTERACTIVE_BATTLES") {
            config.interactive_battles = enabled;
        }
        config.log_dir = read_env::<PathBuf>("TOWER_LOG_DIR");
        if let Some(capacity) = read_env::<usize>("TOWER_MESSAGE_CAPACITY") {
            config.message_capacity = capacity.max(1);
        }

        config
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            battle_timeout: self.battle_timeout,
            equipment_rewards: self.equipment_rewards,
            seed: self.seed,
            stairs: if self.floors {
                StairsBehaviour::Floors
            } else {
                StairsBehaviour::CompleteLevel
            },
            ..RuntimeConfig::default()
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_env_bool(key: &str) -> Option<bool> {
    parse_bool(&env::var(key).ok()?)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_values_accept_common_spellings() {
        assert_eq!(parse_bool(" Yes "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn floors_switch_stairs_behaviour() {
        let config = ClientConfig {
            floors: true,
            seed: 9,
            ..ClientConfig::default()
        };
        let runtime = config.runtime_config();
        assert_eq!(runtime.stairs, StairsBehaviour::Floors);
        assert_eq!(runtime.seed, 9);
        assert_eq!(runtime.command_buffer_size, RuntimeConfig::default().command_buffer_size);
    }
}
