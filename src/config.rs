//! Parses the single configuration string a process-level caller reads
//! from its environment (conventionally under a `RC_PARAMS`-style
//! variable) into overrides for [`TestParams`].
//!
//! Reading the environment itself is left to the caller — this module
//! only turns a string into structured overrides, the way the teacher's
//! own environment-variable layer turns `CHECKITO_*` strings into
//! `FromStr` values.

use crate::driver::TestParams;
use crate::error::ConfigurationError;
use crate::reproduce::Reproduce;
use std::collections::HashMap;

/// Overrides parsed out of a configuration string; every field is
/// optional since unmentioned keys leave the corresponding default
/// untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Configuration {
    pub seed: Option<u64>,
    pub max_success: Option<u32>,
    pub max_size: Option<u32>,
    pub max_discard_ratio: Option<u32>,
    pub disable_shrinking: Option<bool>,
    pub verbose_progress: Option<bool>,
    pub verbose_shrinking: Option<bool>,
    pub reproduce: Option<(String, Reproduce)>,
}

impl Configuration {
    /// Applies every override present in `self` on top of `params`.
    pub fn apply_to(&self, params: &TestParams) -> TestParams {
        let mut params = params.clone();
        if let Some(seed) = self.seed {
            params.seed = seed;
        }
        if let Some(max_success) = self.max_success {
            params.max_success = max_success;
        }
        if let Some(max_size) = self.max_size {
            params.max_size = max_size;
        }
        if let Some(max_discard_ratio) = self.max_discard_ratio {
            params.max_discard_ratio = max_discard_ratio;
        }
        if let Some(disable_shrinking) = self.disable_shrinking {
            params.disable_shrinking = disable_shrinking;
        }
        params
    }

    /// The `{id: Reproduce}` map a `reproduce` key contributes, empty if
    /// the key was absent.
    pub fn reproduce_map(&self) -> HashMap<String, Reproduce> {
        self.reproduce.clone().into_iter().collect()
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigurationError> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(ConfigurationError {
            message: format!("key `{key}` expects `0` or `1`, found `{other}`"),
        }),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigurationError> {
    value.parse().map_err(|_| ConfigurationError {
        message: format!("key `{key}` expects an unsigned integer, found `{value}`"),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigurationError> {
    value.parse().map_err(|_| ConfigurationError {
        message: format!("key `{key}` expects an unsigned integer, found `{value}`"),
    })
}

fn hex_decode(key: &str, value: &str) -> Result<Vec<u8>, ConfigurationError> {
    if value.len() % 2 != 0 {
        return Err(ConfigurationError {
            message: format!("key `{key}` has an odd-length hex token"),
        });
    }
    (0..value.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&value[i..i + 2], 16).map_err(|_| ConfigurationError {
                message: format!("key `{key}` has a non-hex byte at offset {i}"),
            })
        })
        .collect()
}

fn parse_reproduce(key: &str, value: &str) -> Result<(String, Reproduce), ConfigurationError> {
    let (id, token) = value.split_once(':').ok_or_else(|| ConfigurationError {
        message: format!("key `{key}` expects `id:token`, found `{value}`"),
    })?;
    let bytes = hex_decode(key, token)?;
    let reproduce = Reproduce::decode(&bytes).map_err(|error| ConfigurationError {
        message: format!("key `{key}` carries a malformed reproduce token: {error}"),
    })?;
    Ok((id.to_string(), reproduce))
}

/// Splits `input` into whitespace-separated `key=value` tokens, honoring
/// `"..."`/`'...'` quoting around the value so a value may itself
/// contain whitespace.
fn tokenize(input: &str) -> Result<Vec<(String, String)>, ConfigurationError> {
    let mut tokens = Vec::new();
    let mut rest = input.trim();
    while !rest.is_empty() {
        let equals = rest.find('=').ok_or_else(|| ConfigurationError {
            message: format!("expected `key=value`, found `{rest}`"),
        })?;
        let key = rest[..equals].trim().to_string();
        if key.is_empty() {
            return Err(ConfigurationError {
                message: "empty key before `=`".to_string(),
            });
        }
        rest = &rest[equals + 1..];
        let (value, remainder) = match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &rest[1..];
                let end = body.find(quote).ok_or_else(|| ConfigurationError {
                    message: format!("unterminated quoted value for key `{key}`"),
                })?;
                (body[..end].to_string(), body[end + 1..].trim_start())
            }
            _ => match rest.find(char::is_whitespace) {
                Some(end) => (rest[..end].to_string(), rest[end..].trim_start()),
                None => (rest.to_string(), ""),
            },
        };
        tokens.push((key, value));
        rest = remainder;
    }
    Ok(tokens)
}

/// Parses a whitespace-separated `key=value` configuration string.
/// Unknown keys are ignored; malformed values for a recognized key
/// raise a [`ConfigurationError`].
pub fn parse(input: &str) -> Result<Configuration, ConfigurationError> {
    let mut configuration = Configuration::default();
    for (key, value) in tokenize(input)? {
        match key.as_str() {
            "seed" => configuration.seed = Some(parse_u64(&key, &value)?),
            "max_success" => configuration.max_success = Some(parse_u32(&key, &value)?),
            "max_size" => configuration.max_size = Some(parse_u32(&key, &value)?),
            "max_discard_ratio" => configuration.max_discard_ratio = Some(parse_u32(&key, &value)?),
            "noshrink" => configuration.disable_shrinking = Some(parse_bool(&key, &value)?),
            "verbose_progress" => configuration.verbose_progress = Some(parse_bool(&key, &value)?),
            "verbose_shrinking" => configuration.verbose_shrinking = Some(parse_bool(&key, &value)?),
            "reproduce" => configuration.reproduce = Some(parse_reproduce(&key, &value)?),
            _ => {}
        }
    }
    Ok(configuration)
}
