//! Codec selection for posting streams.
//!
//! Index writers carry one `CodecConfig`, usually loaded from the index's
//! JSON settings, and pick an encoder per stream from it.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which integer codec a posting stream is written with.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CompressMode {
    /// Raw little-endian values.
    NoCompress,
    /// One VByte varint per value.
    Vbyte,
    /// Groups of four behind a selector byte.
    GroupVarint,
    /// 128-value patched frame-of-reference blocks.
    #[default]
    PforDelta,
}

/// Per-stream codec choice for a posting list.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    pub doc_id_mode: CompressMode,
    pub term_freq_mode: CompressMode,
    pub position_mode: CompressMode,
}

impl CodecConfig {
    /// Every stream uses `mode`.
    pub fn uniform(mode: CompressMode) -> Self {
        Self {
            doc_id_mode: mode,
            term_freq_mode: mode,
            position_mode: mode,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        log::debug!("loaded codec config: {:?}", config);
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_pfor_delta() {
        let config = CodecConfig::from_json("{}").unwrap();
        assert_eq!(config, CodecConfig::uniform(CompressMode::PforDelta));
    }

    #[test]
    fn test_partial_config() {
        let config = CodecConfig::from_json(r#"{"position_mode": "group_varint"}"#).unwrap();
        assert_eq!(config.doc_id_mode, CompressMode::PforDelta);
        assert_eq!(config.position_mode, CompressMode::GroupVarint);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = CodecConfig {
            doc_id_mode: CompressMode::Vbyte,
            term_freq_mode: CompressMode::NoCompress,
            position_mode: CompressMode::PforDelta,
        };
        let json = config.to_json().unwrap();
        assert!(json.contains("\"no_compress\""));
        assert_eq!(CodecConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let err = CodecConfig::from_json(r#"{"doc_id_mode": "zstd"}"#).unwrap_err();
        assert!(matches!(err, crate::CodecError::Config(_)));
        assert!(CodecConfig::from_json(r#"{"doc_mode": "vbyte"}"#).is_err());
    }
}
