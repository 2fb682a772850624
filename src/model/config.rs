use serde::{Deserialize, Serialize};

use super::level::LevelRules;

/// Configuration from config.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub levels: LevelRules,
    #[serde(default)]
    pub points: PointPolicy,
    #[serde(default)]
    pub history: HistoryConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        self.levels.validate()?;
        self.points.validate()?;
        if self.history.window == 0 {
            return Err("history.window must be at least 1".into());
        }
        Ok(())
    }
}

/// Allowed point values for custom tasks: `min, min + step, ..., <= max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointPolicy {
    #[serde(default = "default_points_min")]
    pub min: u32,
    #[serde(default = "default_points_max")]
    pub max: u32,
    #[serde(default = "default_points_step")]
    pub step: u32,
}

impl Default for PointPolicy {
    fn default() -> Self {
        PointPolicy {
            min: default_points_min(),
            max: default_points_max(),
            step: default_points_step(),
        }
    }
}

impl PointPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.min == 0 {
            return Err("points.min must be at least 1".into());
        }
        if self.step == 0 {
            return Err("points.step must be at least 1".into());
        }
        if self.min > self.max {
            return Err(format!(
                "points.min ({}) is greater than points.max ({})",
                self.min, self.max
            ));
        }
        Ok(())
    }

    pub fn allows(&self, points: u32) -> bool {
        points >= self.min && points <= self.max && (points - self.min) % self.step == 0
    }

    /// Default value offered for new tasks: 10 when allowed, otherwise `min`
    pub fn suggested(&self) -> u32 {
        if self.allows(10) { 10 } else { self.min }
    }
}

fn default_points_min() -> u32 {
    5
}

fn default_points_max() -> u32 {
    30
}

fn default_points_step() -> u32 {
    5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// How many days `history` shows by default
    #[serde(default = "default_history_window")]
    pub window: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            window: default_history_window(),
        }
    }
}

fn default_history_window() -> usize {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::level::LevelRule;

    #[test]
    fn empty_toml_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.levels.for_level(1), LevelRule::new(60, 7));
        assert_eq!(config.history.window, 30);
    }

    #[test]
    fn partial_points_section() {
        let config: Config = toml::from_str("[points]\nmax = 50\n").unwrap();
        assert_eq!(config.points.min, 5);
        assert_eq!(config.points.max, 50);
        assert_eq!(config.points.step, 5);
    }

    #[test]
    fn levels_from_array_of_tables() {
        let config: Config = toml::from_str(
            r#"
[[levels]]
daily_min_points = 30
days_to_promote = 2

[[levels]]
daily_min_points = 45
days_to_promote = 3
"#,
        )
        .unwrap();
        assert_eq!(config.levels.len(), 2);
        assert_eq!(config.levels.for_level(5), LevelRule::new(45, 3));
    }

    #[test]
    fn policy_allows_steps_only() {
        let policy = PointPolicy::default();
        assert!(policy.allows(5));
        assert!(policy.allows(30));
        assert!(!policy.allows(0));
        assert!(!policy.allows(12));
        assert!(!policy.allows(35));
    }

    #[test]
    fn suggested_falls_back_to_min() {
        let policy = PointPolicy {
            min: 3,
            max: 9,
            step: 3,
        };
        assert_eq!(policy.suggested(), 3);
        assert_eq!(PointPolicy::default().suggested(), 10);
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let config = Config {
            points: PointPolicy {
                min: 40,
                max: 30,
                step: 5,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_window() {
        let config = Config {
            history: HistoryConfig { window: 0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
