// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Machine configuration: a single `serde`-derived struct loadable from
//! a TOML file, with field-level defaults for anything the file omits.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub roms: RomPaths,
    pub sound: SoundConfig,
    pub fio: FioConfig,
    pub nic: NicConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roms: RomPaths::default(),
            sound: SoundConfig::default(),
            fio: FioConfig::default(),
            nic: NicConfig::default(),
        }
    }
}

impl Config {
    /// Load from a TOML file, falling back to field defaults for anything
    /// the file omits.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RomPaths {
    pub basic: String,
    pub charset: String,
}

impl Default for RomPaths {
    fn default() -> Self {
        Self {
            basic: "basic.rom".to_string(),
            charset: "charset.rom".to_string(),
        }
    }
}

impl RomPaths {
    /// Reads both ROM images off disk, resolved from config rather than
    /// bytes baked into the binary.
    pub fn load(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        let basic = fs::read(&self.basic).with_context(|| format!("reading ROM {}", self.basic))?;
        let charset = fs::read(&self.charset).with_context(|| format!("reading charset ROM {}", self.charset))?;
        Ok((basic, charset))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SoundConfig {
    pub enable: bool,
    pub sample_rate: u32,
    pub buffer_size: usize,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enable: true,
            sample_rate: 44_100,
            buffer_size: 4096,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FioConfig {
    pub root_dir: String,
}

impl Default for FioConfig {
    fn default() -> Self {
        Self {
            root_dir: ".".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct NicConfig {
    pub connect_timeout_secs: u64,
}

impl Default for NicConfig {
    fn default() -> Self {
        Self { connect_timeout_secs: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_sample_rate() {
        let cfg = Config::default();
        assert_eq!(cfg.sound.sample_rate, 44_100);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: Config = toml::from_str("[sound]\nsample_rate = 48000\n").unwrap();
        assert_eq!(cfg.sound.sample_rate, 48_000);
        assert_eq!(cfg.sound.buffer_size, 4096);
        assert_eq!(cfg.fio.root_dir, ".");
    }
}
