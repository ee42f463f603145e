//! Engine configuration
//!
//! Loaded from TOML, then overridden from the environment. Every field has a
//! default so an absent file simply means the standard plan.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fs, path::Path};
use tracing::warn;

use crate::constants::{
    CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, DEFAULT_MAX_LEVELS, DEFAULT_RATES, DOWNLINE_MAX_CHILDREN,
    DOWNLINE_MAX_DEPTH, MAX_LEVELS_ENV, STRICT_ENV,
};
use crate::money::Rate;
use crate::rates::{CommissionPlan, RateTable};
use crate::report::TreeBounds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upline depth. Zero or negative disables commissions.
    #[serde(default = "default_max_levels")]
    pub max_levels: i64,

    /// Refuse to compute over data with dangling references
    #[serde(default)]
    pub strict: bool,

    #[serde(default = "default_downline_max_depth")]
    pub downline_max_depth: usize,

    #[serde(default = "default_downline_max_children")]
    pub downline_max_children: usize,

    /// Level -> fraction. TOML keys are strings, so levels are parsed in
    /// `validate`.
    #[serde(default = "default_rates")]
    pub rates: BTreeMap<String, f64>,
}

fn default_max_levels() -> i64 {
    DEFAULT_MAX_LEVELS as i64
}
fn default_downline_max_depth() -> usize {
    DOWNLINE_MAX_DEPTH
}
fn default_downline_max_children() -> usize {
    DOWNLINE_MAX_CHILDREN
}
fn default_rates() -> BTreeMap<String, f64> {
    DEFAULT_RATES
        .iter()
        .map(|(level, rate)| (level.to_string(), *rate))
        .collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_levels: default_max_levels(),
            strict: false,
            downline_max_depth: default_downline_max_depth(),
            downline_max_children: default_downline_max_children(),
            rates: default_rates(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.rate_table().map(|_| ())
    }

    pub fn rate_table(&self) -> Result<RateTable> {
        let mut pairs = Vec::with_capacity(self.rates.len());
        for (key, fraction) in &self.rates {
            let level: u32 = key
                .trim()
                .parse()
                .map_err(|_| anyhow!("rate level {:?} is not a positive integer", key))?;
            if level == 0 {
                return Err(anyhow!("rate level must be >= 1, got 0"));
            }
            let rate = Rate::from_fraction(*fraction)
                .with_context(|| format!("rate for level {}", level))?;
            pairs.push((level, rate));
        }
        Ok(RateTable::from_pairs(pairs))
    }

    /// Effective upline depth. Non-positive values clamp to 0.
    pub fn effective_max_levels(&self) -> usize {
        usize::try_from(self.max_levels).unwrap_or(0)
    }

    pub fn plan(&self) -> Result<CommissionPlan> {
        if self.max_levels <= 0 {
            warn!(
                max_levels = self.max_levels,
                "non-positive max_levels; no commissions will be produced"
            );
        }
        Ok(CommissionPlan::new(self.rate_table()?, self.effective_max_levels()))
    }

    pub fn tree_bounds(&self) -> TreeBounds {
        TreeBounds {
            max_depth: self.downline_max_depth,
            max_children: self.downline_max_children,
        }
    }

    /// Load from `path`, falling back to defaults when the file is missing.
    /// A file that exists but does not parse or validate is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        load_engine_config(path)
    }

    /// Apply `REFERRAL_MAX_LEVELS` / `REFERRAL_STRICT` if set.
    pub fn apply_env(&mut self) -> Result<()> {
        let max_levels = std::env::var(MAX_LEVELS_ENV).ok();
        let strict = std::env::var(STRICT_ENV).ok();
        self.apply_overrides(max_levels.as_deref(), strict.as_deref())
    }

    /// Raw override values as they come from the environment.
    pub fn apply_overrides(
        &mut self,
        max_levels: Option<&str>,
        strict: Option<&str>,
    ) -> Result<()> {
        if let Some(raw) = max_levels {
            self.max_levels = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be an integer, got {:?}", MAX_LEVELS_ENV, raw))?;
        }
        if let Some(raw) = strict {
            self.strict = parse_flag(raw)
                .ok_or_else(|| anyhow!("{} must be a boolean, got {:?}", STRICT_ENV, raw))?;
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

pub fn load_engine_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig> {
    let p = path.as_ref();
    let raw = fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&raw).with_context(|| format!("parsing {}", p.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Config path from `REFERRAL_CONFIG_PATH`, else `config/referral.toml`.
pub fn config_path_from_env() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_give_standard_plan() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.plan().unwrap(), CommissionPlan::standard());
        assert_eq!(cfg.tree_bounds(), TreeBounds::default());
    }

    #[test]
    fn test_parse_partial_toml() {
        let cfg: EngineConfig = toml::from_str(
            r#"
            max_levels = 3
            strict = true
            [rates]
            1 = 0.05
            2 = 0.01
            "#,
        )
        .unwrap();
        let plan = cfg.plan().unwrap();
        assert_eq!(plan.max_levels, 3);
        assert_eq!(plan.rates.len(), 2);
        assert_eq!(plan.rates.rate_for(1).ppm(), 50_000);
        assert_eq!(plan.rates.rate_for(3), Rate::ZERO);
        assert!(cfg.strict);
        assert_eq!(cfg.downline_max_children, DOWNLINE_MAX_CHILDREN);
    }

    #[test]
    fn test_non_positive_max_levels_is_not_an_error() {
        let cfg: EngineConfig = toml::from_str("max_levels = -2").unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.plan().unwrap().max_levels, 0);
    }

    #[test]
    fn test_rejects_bad_rates() {
        let bad_level: EngineConfig = toml::from_str("[rates]\nfirst = 0.02").unwrap();
        assert!(bad_level.validate().is_err());

        let zero_level: EngineConfig = toml::from_str("[rates]\n0 = 0.02").unwrap();
        assert!(zero_level.validate().is_err());

        let negative: EngineConfig = toml::from_str("[rates]\n1 = -0.02").unwrap();
        assert!(negative.validate().is_err());

        let sub_ppm: EngineConfig = toml::from_str("[rates]\n1 = 0.0000004").unwrap();
        let err = sub_ppm.validate().unwrap_err();
        assert!(format!("{:#}", err).contains("not representable in ppm"));
    }

    #[test]
    fn test_overrides() {
        let mut cfg = EngineConfig::default();
        cfg.apply_overrides(Some(" 3 "), Some("TRUE")).unwrap();
        assert_eq!(cfg.max_levels, 3);
        assert!(cfg.strict);

        cfg.apply_overrides(None, Some("Off")).unwrap();
        assert_eq!(cfg.max_levels, 3);
        assert!(!cfg.strict);

        assert!(cfg.apply_overrides(Some("three"), None).is_err());
        assert!(cfg.apply_overrides(None, Some("maybe")).is_err());
        assert!(!cfg.strict);

        cfg.apply_overrides(None, None).unwrap();
        assert_eq!(cfg.max_levels, 3);
    }

    #[test]
    fn test_apply_env_reads_variables() {
        // the only test touching these variables
        std::env::set_var(MAX_LEVELS_ENV, "2");
        std::env::set_var(STRICT_ENV, "Yes");
        let mut cfg = EngineConfig::default();
        let res = cfg.apply_env();
        std::env::remove_var(MAX_LEVELS_ENV);
        std::env::remove_var(STRICT_ENV);

        res.unwrap();
        assert_eq!(cfg.effective_max_levels(), 2);
        assert!(cfg.strict);
    }
}
