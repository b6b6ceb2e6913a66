//! Runtime configuration read from the environment.
//!
//! | Variable               | Meaning                                   | Default |
//! |------------------------|-------------------------------------------|---------|
//! | `ORRERY_TIME_SCALE`    | multiplier applied to every frame delta   | `1.0`   |
//! | `ORRERY_PAUSED`        | start with the animation paused           | `false` |
//! | `ORRERY_FRAMES`        | number of frames the headless run steps   | `600`   |
//! | `ORRERY_FIXED_STEP_MS` | fixed frame delta; wall clock when unset  | unset   |

use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};

const TIME_SCALE: &str = "ORRERY_TIME_SCALE";
const PAUSED: &str = "ORRERY_PAUSED";
const FRAMES: &str = "ORRERY_FRAMES";
const FIXED_STEP_MS: &str = "ORRERY_FIXED_STEP_MS";

/// Settings for a simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Multiplier applied to every frame delta.
    pub time_scale: f32,
    /// Whether the animation starts paused.
    pub paused: bool,
    /// How many frames to step before exiting.
    pub frames: u32,
    /// Fixed frame delta. `None` means the wall-clock timer drives the run.
    pub fixed_step: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            paused: false,
            frames: 600,
            fixed_step: None,
        }
    }
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup.
    ///
    /// Unset keys keep their default; set but malformed keys are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let lookup = |key: &'static str| {
            let raw = lookup(key);
            if let Some(raw) = &raw {
                debug!(key, value = %raw, "config override");
            }
            raw
        };

        if let Some(raw) = lookup(TIME_SCALE) {
            let time_scale: f32 = parse(TIME_SCALE, &raw)?;
            if !time_scale.is_finite() || time_scale < 0.0 {
                return Err(Error::config(
                    TIME_SCALE,
                    format!("expected a finite, non-negative number, got {time_scale}"),
                ));
            }
            config.time_scale = time_scale;
        }

        if let Some(raw) = lookup(PAUSED) {
            config.paused = parse_bool(PAUSED, &raw)?;
        }

        if let Some(raw) = lookup(FRAMES) {
            config.frames = parse(FRAMES, &raw)?;
        }

        if let Some(raw) = lookup(FIXED_STEP_MS) {
            let millis: u64 = parse(FIXED_STEP_MS, &raw)?;
            if millis == 0 {
                return Err(Error::config(FIXED_STEP_MS, "must be at least 1 ms"));
            }
            config.fixed_step = Some(Duration::from_millis(millis));
        }

        Ok(config)
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::config(key, format!("cannot parse {raw:?}: {e}")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::config(key, format!("expected a boolean, got {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parses_all_keys() {
        let config = Config::from_lookup(lookup_from(&[
            (TIME_SCALE, "2.5"),
            (PAUSED, "yes"),
            (FRAMES, "10"),
            (FIXED_STEP_MS, "16"),
        ]))
        .unwrap();

        assert_eq!(config.time_scale, 2.5);
        assert!(config.paused);
        assert_eq!(config.frames, 10);
        assert_eq!(config.fixed_step, Some(Duration::from_millis(16)));
    }

    #[test]
    fn test_rejects_negative_time_scale() {
        let err = Config::from_lookup(lookup_from(&[(TIME_SCALE, "-1")])).unwrap_err();
        assert!(matches!(err, Error::Config { ref key, .. } if key == TIME_SCALE));
    }

    #[test]
    fn test_rejects_malformed_values() {
        assert!(Config::from_lookup(lookup_from(&[(FRAMES, "many")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[(PAUSED, "maybe")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[(FIXED_STEP_MS, "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[(TIME_SCALE, "NaN")])).is_err());
    }
}
