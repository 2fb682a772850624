use serde::{Deserialize, Serialize};

/// Difficulty and promotion speed for one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRule {
    /// Minimum daily score for a day to count
    pub daily_min_points: u32,
    /// On-target days needed to advance to the next level
    pub days_to_promote: u32,
}

impl LevelRule {
    pub const fn new(daily_min_points: u32, days_to_promote: u32) -> Self {
        LevelRule {
            daily_min_points,
            days_to_promote,
        }
    }
}

/// Default table: levels 1 through 4.
pub const DEFAULT_LEVEL_RULES: [LevelRule; 4] = [
    LevelRule::new(60, 7),
    LevelRule::new(70, 7),
    LevelRule::new(75, 7),
    LevelRule::new(80, 7),
];

/// Ordered level table, level 1 first.
///
/// Levels past the end of the table reuse the last rule, so every level
/// has a reachable, non-zero requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelRules(Vec<LevelRule>);

impl Default for LevelRules {
    fn default() -> Self {
        LevelRules(DEFAULT_LEVEL_RULES.to_vec())
    }
}

impl LevelRules {
    /// Build a table, rejecting empty tables and zero requirements.
    pub fn new(rules: Vec<LevelRule>) -> Result<Self, String> {
        let table = LevelRules(rules);
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.0.is_empty() {
            return Err("level table must define at least one level".into());
        }
        for (i, rule) in self.0.iter().enumerate() {
            let level = i + 1;
            if rule.days_to_promote == 0 {
                return Err(format!("level {}: days_to_promote must be at least 1", level));
            }
            if rule.daily_min_points == 0 {
                return Err(format!("level {}: daily_min_points must be at least 1", level));
            }
        }
        Ok(())
    }

    /// Rule for `level`. Level 0 is treated as level 1.
    pub fn for_level(&self, level: u32) -> LevelRule {
        let idx = (level.max(1) - 1) as usize;
        match self.0.get(idx) {
            Some(rule) => *rule,
            // validate() guarantees a last rule; the default covers hand-built tables
            None => self.0.last().copied().unwrap_or(DEFAULT_LEVEL_RULES[3]),
        }
    }

    pub fn daily_min_points(&self, level: u32) -> u32 {
        self.for_level(level).daily_min_points
    }

    pub fn days_needed(&self, level: u32) -> u32 {
        self.for_level(level).days_to_promote
    }

    /// Number of explicitly configured levels
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelRule> {
        self.0.iter()
    }
}
