//! Scenario configuration loaded from TOML.
//!
//! A scenario is an optional seed plus an array of `[[radar]]` tables. Radar
//! ids are assigned by position in that array. Parameter values may be a
//! number, a list of numbers, or a `{ start, end, step }` range table.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::emitter::RadarEmitter;
use crate::merger::PulseMerger;
use crate::parameter::{ParameterError, ParameterSpec, ParameterValue};
use crate::rng::SeedSequence;

/// Errors raised while loading or validating a scenario.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file does not exist
    #[error("Configuration file not found: {}", .path.display())]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// Configuration file could not be read or written
    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML or wrongly typed field
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration could not be rendered back to TOML
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Required field absent
    #[error("Missing field `{field}`{}", radar_suffix(.radar))]
    MissingField {
        /// Radar index, `None` for top-level fields
        radar: Option<usize>,
        /// Name of the missing field
        field: &'static str,
    },

    /// Radar list present but empty
    #[error("Configuration contains no radars")]
    EmptyConfig,

    /// Field not supported on this parameter
    #[error("Field `{field}` is not supported on `{parameter}` of radar {radar}")]
    UnsupportedField {
        /// Radar index
        radar: usize,
        /// Parameter name
        parameter: &'static str,
        /// Offending field
        field: &'static str,
    },

    /// Loss probability outside `[0, 1)`
    #[error("Loss rate of radar {radar} must be in [0, 1), got {value}")]
    InvalidLossRate {
        /// Radar index
        radar: usize,
        /// Rejected rate
        value: f64,
    },

    /// Parameter failed validation
    #[error("Invalid `{parameter}` of radar {radar}: {source}")]
    InvalidParameter {
        /// Radar index
        radar: usize,
        /// Parameter name
        parameter: &'static str,
        /// Underlying validation failure
        #[source]
        source: ParameterError,
    },
}

fn radar_suffix(radar: &Option<usize>) -> String {
    radar.map(|id| format!(" in radar {id}")).unwrap_or_default()
}

/// Complete scenario: seed and radar list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Master seed for reproducible runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Radar records in id order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radar: Option<Vec<RadarConfig>>,
}

/// One `[[radar]]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RadarConfig {
    /// Clock offset before the first PRI
    #[serde(default)]
    pub start_toa: f64,
    /// Probability of suppressing each pulse
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_rate: Option<f64>,
    /// Pulse repetition interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pri: Option<ParameterConfig>,
    /// Direction of arrival
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doa: Option<ParameterConfig>,
    /// Carrier frequency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rf: Option<ParameterConfig>,
    /// Pulse width
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pw: Option<ParameterConfig>,
    /// Pulse amplitude
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pa: Option<ParameterConfig>,
}

/// Parameter record shared by PRI, DOA, RF, PW and PA.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterConfig {
    /// Number, list of numbers, or `{ start, end, step }` table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<toml::Value>,
    /// Gaussian noise standard deviation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    /// Consecutive repeats per list entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_size: Option<usize>,
    /// Uniform jitter fraction (PRI only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter_rate: Option<f64>,
    /// Random choice among list values (RF only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random: Option<bool>,
}

impl ScenarioConfig {
    /// Parses a scenario from TOML text.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Parse` - Malformed TOML or unknown fields
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// - `ConfigError::NotFound` - File does not exist
    /// - `ConfigError::Io` - File could not be read
    /// - `ConfigError::Parse` - Malformed TOML or unknown fields
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(
            path = %path.display(),
            radars = config.radar.as_ref().map_or(0, Vec::len),
            "Loaded scenario configuration"
        );
        Ok(config)
    }

    /// Renders the scenario as TOML.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Serialize` - Value cannot be represented in TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Writes the scenario to a TOML file.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Serialize` - Value cannot be represented in TOML
    /// - `ConfigError::Io` - File could not be written
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path.as_ref(), self.to_toml_string()?)?;
        tracing::debug!(path = %path.as_ref().display(), "Saved scenario configuration");
        Ok(())
    }

    /// Returns the radar list after checking it is present and non-empty.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingField` - No `radar` array
    /// - `ConfigError::EmptyConfig` - Empty `radar` array
    pub fn radars(&self) -> Result<&[RadarConfig], ConfigError> {
        let radars = self.radar.as_deref().ok_or(ConfigError::MissingField {
            radar: None,
            field: "radar",
        })?;
        if radars.is_empty() {
            return Err(ConfigError::EmptyConfig);
        }
        Ok(radars)
    }

    /// Builds one emitter per radar record.
    ///
    /// # Errors
    ///
    /// - `ConfigError` - Any missing field or failed validation
    pub fn build_emitters(
        &self,
        seeds: &mut SeedSequence,
    ) -> Result<Vec<RadarEmitter>, ConfigError> {
        self.radars()?
            .iter()
            .enumerate()
            .map(|(id, radar)| radar.build_emitter(id, seeds))
            .collect()
    }

    /// Builds a merger over every configured radar.
    ///
    /// # Errors
    ///
    /// - `ConfigError` - Any missing field or failed validation
    pub fn build_merger(&self, seeds: &mut SeedSequence) -> Result<PulseMerger, ConfigError> {
        Ok(PulseMerger::from_emitters(self.build_emitters(seeds)?))
    }
}

impl RadarConfig {
    /// Validates the record and builds its emitter.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingField` - PRI, DOA, RF, PW or a `value` absent
    /// - `ConfigError::UnsupportedField` - `jitter_rate` off PRI or `random` off RF
    /// - `ConfigError::InvalidParameter` - Value failed validation
    /// - `ConfigError::InvalidLossRate` - Loss rate outside `[0, 1)`
    pub fn build_emitter(
        &self,
        id: usize,
        seeds: &mut SeedSequence,
    ) -> Result<RadarEmitter, ConfigError> {
        let required = |field: &'static str, config: &Option<ParameterConfig>| {
            config
                .as_ref()
                .ok_or(ConfigError::MissingField {
                    radar: Some(id),
                    field,
                })
                .and_then(|config| config.to_spec(id, field))
        };

        // Check presence of every required table before building any stream.
        let pri = required("pri", &self.pri)?;
        let doa = required("doa", &self.doa)?;
        let rf = required("rf", &self.rf)?;
        let pw = required("pw", &self.pw)?;

        let mut builder = RadarEmitter::builder(id)
            .start_toa(self.start_toa)
            .loss_rate(self.loss_rate)
            .pri(pri)
            .doa(doa)
            .rf(rf)
            .pw(pw);
        if let Some(pa) = &self.pa {
            builder = builder.pa(pa.to_spec(id, "pa")?);
        }
        builder.build(seeds)
    }
}

impl ParameterConfig {
    /// Converts the record into a parameter specification.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingField` - No `value`
    /// - `ConfigError::UnsupportedField` - `jitter_rate` off PRI or `random` off RF
    /// - `ConfigError::InvalidParameter` - Value of an unsupported type
    pub fn to_spec(
        &self,
        radar: usize,
        parameter: &'static str,
    ) -> Result<ParameterSpec, ConfigError> {
        if self.jitter_rate.is_some() && parameter != "pri" {
            return Err(ConfigError::UnsupportedField {
                radar,
                parameter,
                field: "jitter_rate",
            });
        }
        if self.random.is_some() && parameter != "rf" {
            return Err(ConfigError::UnsupportedField {
                radar,
                parameter,
                field: "random",
            });
        }

        let raw = self.value.as_ref().ok_or(ConfigError::MissingField {
            radar: Some(radar),
            field: "value",
        })?;
        let value = parse_value(raw).map_err(|source| ConfigError::InvalidParameter {
            radar,
            parameter,
            source,
        })?;

        Ok(ParameterSpec {
            value,
            std: self.std,
            group_size: self.group_size,
            jitter_rate: self.jitter_rate,
            random: self.random.unwrap_or(false),
        })
    }
}

fn parse_number(value: &toml::Value) -> Result<f64, ParameterError> {
    match value {
        toml::Value::Float(number) => Ok(*number),
        toml::Value::Integer(number) => Ok(*number as f64),
        other => Err(ParameterError::UnsupportedValue {
            found: other.type_str().to_string(),
        }),
    }
}

fn parse_value(value: &toml::Value) -> Result<ParameterValue, ParameterError> {
    match value {
        toml::Value::Array(items) => {
            if items.is_empty() {
                return Err(ParameterError::EmptyList);
            }
            items
                .iter()
                .map(parse_number)
                .collect::<Result<Vec<_>, _>>()
                .map(ParameterValue::List)
        }
        toml::Value::Table(table) => {
            let field = |name: &str| table.get(name).map(parse_number).transpose();
            if let Some(unknown) = table
                .keys()
                .find(|key| !matches!(key.as_str(), "start" | "end" | "step"))
            {
                return Err(ParameterError::InvalidRange {
                    reason: format!("unknown key `{unknown}`"),
                });
            }
            let (Some(start), Some(end)) = (field("start")?, field("end")?) else {
                return Err(ParameterError::InvalidRange {
                    reason: "range needs `start` and `end`".to_string(),
                });
            };
            ParameterValue::range(start, end, field("step")?.unwrap_or(1.0))
        }
        scalar => parse_number(scalar).map(ParameterValue::Scalar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterKind;

    const SAMPLE: &str = r#"
seed = 7

[[radar]]
start_toa = 5
loss_rate = 0.2
pri = { value = 10, jitter_rate = 0.05 }
doa = { value = 30.5, std = 0.5 }
rf = { value = [1000, 1500.5, 2000], random = true, group_size = 4 }
pw = { value = { start = 1, end = 4 } }

[[radar]]
pri = { value = [10, 30, 20], group_size = 3 }
doa = { value = 120 }
rf = { value = 9000 }
pw = { value = 2.5 }
pa = { value = -30 }
"#;

    #[test]
    fn test_parse_sample() {
        let config = ScenarioConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.seed, Some(7));

        let radars = config.radars().unwrap();
        assert_eq!(radars.len(), 2);
        assert_eq!(radars[0].start_toa, 5.0);
        assert_eq!(radars[1].start_toa, 0.0);
        assert_eq!(radars[0].loss_rate, Some(0.2));

        let rf = radars[0].rf.as_ref().unwrap().to_spec(0, "rf").unwrap();
        assert_eq!(rf.value, ParameterValue::List(vec![1000.0, 1500.5, 2000.0]));
        assert!(rf.random);
        assert_eq!(rf.group_size, Some(4));

        let pw = radars[0].pw.as_ref().unwrap().to_spec(0, "pw").unwrap();
        assert_eq!(pw.value, ParameterValue::List(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_build_emitters() {
        let config = ScenarioConfig::from_toml_str(SAMPLE).unwrap();
        let mut seeds = SeedSequence::from_seed(config.seed.unwrap());
        let mut emitters = config.build_emitters(&mut seeds).unwrap();

        assert_eq!(emitters.len(), 2);
        assert_eq!(emitters[1].id(), 1);

        let pulses: Vec<_> = emitters[1].by_ref().take(4).collect();
        let toas: Vec<f64> = pulses.iter().map(|p| p.toa).collect();
        assert_eq!(toas, vec![10.0, 20.0, 30.0, 60.0]);
        assert!(pulses.iter().all(|p| p.pa == -30.0 && p.rf == 9000.0));
    }

    #[test]
    fn test_missing_radar_array() {
        let config = ScenarioConfig::from_toml_str("seed = 1").unwrap();
        assert!(matches!(
            config.radars(),
            Err(ConfigError::MissingField {
                radar: None,
                field: "radar"
            })
        ));
    }

    #[test]
    fn test_empty_radar_array() {
        let config = ScenarioConfig::from_toml_str("radar = []").unwrap();
        let mut seeds = SeedSequence::from_seed(0);
        assert!(matches!(
            config.build_merger(&mut seeds),
            Err(ConfigError::EmptyConfig)
        ));
    }

    #[test]
    fn test_missing_required_parameter() {
        let text = r#"
[[radar]]
pri = { value = 10 }
doa = { value = 1 }
pw = { value = 1 }
"#;
        let config = ScenarioConfig::from_toml_str(text).unwrap();
        let mut seeds = SeedSequence::from_seed(0);
        let error = config.build_emitters(&mut seeds).unwrap_err();

        assert!(matches!(
            error,
            ConfigError::MissingField {
                radar: Some(0),
                field: "rf"
            }
        ));
        assert_eq!(error.to_string(), "Missing field `rf` in radar 0");
    }

    #[test]
    fn test_missing_value() {
        let record = ParameterConfig {
            std: Some(1.0),
            ..Default::default()
        };
        assert!(matches!(
            record.to_spec(3, "doa"),
            Err(ConfigError::MissingField {
                radar: Some(3),
                field: "value"
            })
        ));
    }

    #[test]
    fn test_unsupported_value_type() {
        let record = ParameterConfig {
            value: Some(toml::Value::String("fast".to_string())),
            ..Default::default()
        };
        let error = record.to_spec(0, "pri").unwrap_err();
        assert!(matches!(
            error,
            ConfigError::InvalidParameter {
                source: ParameterError::UnsupportedValue { .. },
                ..
            }
        ));

        let nested = ParameterConfig {
            value: Some(toml::Value::Array(vec![toml::Value::Boolean(true)])),
            ..Default::default()
        };
        assert!(nested.to_spec(0, "pri").is_err());

        let empty = ParameterConfig {
            value: Some(toml::Value::Array(Vec::new())),
            ..Default::default()
        };
        assert!(matches!(
            empty.to_spec(0, "pri"),
            Err(ConfigError::InvalidParameter {
                source: ParameterError::EmptyList,
                ..
            })
        ));
    }

    #[test]
    fn test_field_restrictions() {
        let jitter_on_rf = ParameterConfig {
            value: Some(toml::Value::Float(1.0)),
            jitter_rate: Some(0.1),
            ..Default::default()
        };
        assert!(matches!(
            jitter_on_rf.to_spec(0, "rf"),
            Err(ConfigError::UnsupportedField {
                field: "jitter_rate",
                ..
            })
        ));

        let random_on_pri = ParameterConfig {
            value: Some(toml::Value::Float(1.0)),
            random: Some(true),
            ..Default::default()
        };
        assert!(matches!(
            random_on_pri.to_spec(0, "pri"),
            Err(ConfigError::UnsupportedField { field: "random", .. })
        ));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let text = r#"
[[radar]]
pri = { value = 10, wobble = 3 }
"#;
        assert!(matches!(
            ScenarioConfig::from_toml_str(text),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_range_errors() {
        let missing_end = toml::Value::Table(toml::map::Map::from_iter([(
            "start".to_string(),
            toml::Value::Integer(1),
        )]));
        assert!(matches!(
            parse_value(&missing_end),
            Err(ParameterError::InvalidRange { .. })
        ));

        let with_step = toml::Value::Table(toml::map::Map::from_iter([
            ("start".to_string(), toml::Value::Integer(10)),
            ("end".to_string(), toml::Value::Integer(50)),
            ("step".to_string(), toml::Value::Integer(10)),
        ]));
        assert_eq!(
            parse_value(&with_step).unwrap(),
            ParameterValue::List(vec![10.0, 20.0, 30.0, 40.0])
        );
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_streams() {
        let config = ScenarioConfig::from_toml_str(SAMPLE).unwrap();
        let reloaded = ScenarioConfig::from_toml_str(&config.to_toml_string().unwrap()).unwrap();
        assert_eq!(config, reloaded);

        let mut seeds = SeedSequence::from_seed(1);
        let emitters = reloaded.build_emitters(&mut seeds).unwrap();
        assert_eq!(emitters.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let result = ScenarioConfig::load("/nonexistent/radars.toml");
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radars.toml");

        let config = ScenarioConfig::from_toml_str(SAMPLE).unwrap();
        config.save(&path).unwrap();

        assert_eq!(ScenarioConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_parameter_kinds_from_config() {
        let config = ScenarioConfig::from_toml_str(SAMPLE).unwrap();
        let radars = config.radars().unwrap();
        let rf = radars[0].rf.as_ref().unwrap().to_spec(0, "rf").unwrap();
        let mut seeds = SeedSequence::from_seed(0);

        assert_eq!(
            rf.build(seeds.derive_rng()).unwrap().kind(),
            ParameterKind::RandomChoice
        );
    }
}
