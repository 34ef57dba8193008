//! Simulated vehicle configuration
//!
//! Each module answers from a response table keyed by PGN. A module may also
//! carry an `after_clear` table that takes precedence once it has processed
//! a DM11 it erases on.
//!
//! ```toml
//! latency_ms = 10
//!
//! [[modules]]
//! address = "0x00"
//! obd = true
//! responses = [
//!     { pgn = "0xFECF", data = "00FF00000000FFFF" },
//!     { pgn = "0xFED4", reply = "nack", scope = "directed" },
//! ]
//! after_clear = [
//!     { pgn = "0xFECF", data = "00FF00000000FFFF" },
//! ]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a vehicle configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Complete simulated vehicle configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// Delay before every answer
    #[serde(default)]
    pub latency_ms: u64,

    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

impl VehicleConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

// =============================================================================
// Module Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    #[serde(deserialize_with = "deserialize_hex_u8")]
    pub address: u8,

    /// Function code claimed by the module
    #[serde(default)]
    pub function: u8,

    #[serde(default)]
    pub obd: bool,

    /// Which DM11 requests erase this module
    #[serde(default)]
    pub erase_on: EraseOn,

    #[serde(default)]
    pub responses: Vec<ResponseDef>,

    #[serde(default)]
    pub after_clear: Vec<ResponseDef>,
}

/// Request scopes that trigger a module's clear
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EraseOn {
    #[default]
    Global,
    Directed,
    Both,
    Never,
}

impl EraseOn {
    pub fn erases(&self, global: bool) -> bool {
        match self {
            EraseOn::Global => global,
            EraseOn::Directed => !global,
            EraseOn::Both => true,
            EraseOn::Never => false,
        }
    }
}

/// Which kinds of request a response entry answers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Both,
    Global,
    Directed,
}

impl Scope {
    pub fn matches(&self, global: bool) -> bool {
        match self {
            Scope::Both => true,
            Scope::Global => global,
            Scope::Directed => !global,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
    #[default]
    Data,
    Ack,
    Nack,
    Silent,
}

/// One response table entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseDef {
    #[serde(deserialize_with = "deserialize_hex_u32")]
    pub pgn: u32,

    #[serde(default)]
    pub scope: Scope,

    #[serde(default)]
    pub reply: ReplyKind,

    /// Payload for `reply = "data"`, hex string or byte array
    #[serde(default, deserialize_with = "deserialize_optional_hex_bytes")]
    pub data: Option<Vec<u8>>,
}

// =============================================================================
// Hex helpers
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum HexOrInt {
    Hex(String),
    Int(u64),
}

fn parse_hex_or_int<E: serde::de::Error>(value: HexOrInt, max: u64) -> Result<u64, E> {
    let n = match value {
        HexOrInt::Int(n) => n,
        HexOrInt::Hex(s) => {
            let s = s.trim();
            let s = s
                .strip_prefix("0x")
                .or_else(|| s.strip_prefix("0X"))
                .unwrap_or(s);
            u64::from_str_radix(s, 16).map_err(|e| E::custom(e.to_string()))?
        }
    };
    if n > max {
        return Err(E::custom(format!("value {} out of range", n)));
    }
    Ok(n)
}

fn deserialize_hex_u8<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    parse_hex_or_int(HexOrInt::deserialize(deserializer)?, u8::MAX as u64).map(|n| n as u8)
}

fn deserialize_hex_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    parse_hex_or_int(HexOrInt::deserialize(deserializer)?, 0x3FFFF).map(|n| n as u32)
}

fn deserialize_optional_hex_bytes<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HexBytes {
        Hex(String),
        Array(Vec<u8>),
    }

    match Option::<HexBytes>::deserialize(deserializer)? {
        None => Ok(None),
        Some(HexBytes::Array(bytes)) => Ok(Some(bytes)),
        Some(HexBytes::Hex(s)) => {
            let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
            hex::decode(cleaned)
                .map(Some)
                .map_err(|e| D::Error::custom(format!("Invalid hex string: {}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
latency_ms = 5

[[modules]]
address = "0x3D"
obd = true
erase_on = "both"
responses = [
    { pgn = "0xFECF", data = "00FF 0000 0000 FFFF" },
    { pgn = 65236, reply = "nack", scope = "directed" },
]
after_clear = [
    { pgn = "FECF", data = [0, 255, 0, 0, 0, 0, 255, 255] },
]

[[modules]]
address = 23
"#;

    #[test]
    fn test_parse_sample() {
        let config = VehicleConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.latency_ms, 5);
        assert_eq!(config.modules.len(), 2);

        let aftertreatment = &config.modules[0];
        assert_eq!(aftertreatment.address, 0x3D);
        assert!(aftertreatment.obd);
        assert_eq!(aftertreatment.erase_on, EraseOn::Both);
        assert_eq!(aftertreatment.responses[0].pgn, 0xFECF);
        assert_eq!(
            aftertreatment.responses[0].data.as_deref(),
            Some(&[0x00, 0xFF, 0, 0, 0, 0, 0xFF, 0xFF][..])
        );
        assert_eq!(aftertreatment.responses[1].reply, ReplyKind::Nack);
        assert_eq!(aftertreatment.responses[1].scope, Scope::Directed);
        assert_eq!(aftertreatment.after_clear[0].pgn, 0xFECF);

        let cluster = &config.modules[1];
        assert_eq!(cluster.address, 0x17);
        assert!(!cluster.obd);
        assert_eq!(cluster.erase_on, EraseOn::Global);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = VehicleConfig::load(file.path()).unwrap();
        assert_eq!(config.modules.len(), 2);
    }

    #[test]
    fn test_rejects_out_of_range_address() {
        let err = VehicleConfig::from_toml("[[modules]]\naddress = \"0x1FF\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_scopes() {
        assert!(Scope::Both.matches(true) && Scope::Both.matches(false));
        assert!(!Scope::Global.matches(false));
        assert!(EraseOn::Directed.erases(false));
        assert!(!EraseOn::Never.erases(true));
    }
}
