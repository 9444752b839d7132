//! Pipeline-wide configuration.
//!
//! Kept deliberately tiny: no config-file format is specified, since
//! file discovery and package management are driver-level concerns
//! out of scope for the core.

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum VerificationLevel {
    None,
    Runtime,
    Hybrid,
    Full,
}

impl Default for VerificationLevel {
    fn default() -> Self {
        VerificationLevel::Hybrid
    }
}

impl std::str::FromStr for VerificationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(VerificationLevel::None),
            "runtime" => Ok(VerificationLevel::Runtime),
            "hybrid" => Ok(VerificationLevel::Hybrid),
            "full" => Ok(VerificationLevel::Full),
            other => Err(format!("unknown verification level '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub verification_level: VerificationLevel,
    pub verification_timeout_ms: u64,
    pub formatter_indent_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            verification_level: VerificationLevel::default(),
            verification_timeout_ms: 1000,
            formatter_indent_width: 2,
        }
    }
}
