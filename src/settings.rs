//! User preferences persisted as JSON next to the database, plus the fixed
//! lookup tables (regions, part categories) the search screen offers.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use log::{debug, LevelFilter};
use serde::{Deserialize, Serialize};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".part-list-manager";
/// Settings file name stored inside the application data directory.
const SETTINGS_FILE_NAME: &str = "settings.json";

pub const DEFAULT_REGION: &str = "United States";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Supported regions as shown to the user, with the code the search API
/// expects and the symbol used when printing totals.
pub const REGIONS: &[(&str, &str, &str)] = &[
    ("Australia", "au", "A$"),
    ("Austria", "at", "€"),
    ("Belgium", "be", "€"),
    ("Canada", "ca", "C$"),
    ("Czech Republic", "cz", "Kč "),
    ("Denmark", "dk", "kr "),
    ("Finland", "fi", "€"),
    ("France", "fr", "€"),
    ("Germany", "de", "€"),
    ("Hungary", "hu", "Ft "),
    ("Ireland", "ie", "€"),
    ("Italy", "it", "€"),
    ("Netherlands", "nl", "€"),
    ("New Zealand", "nz", "NZ$"),
    ("Norway", "no", "kr "),
    ("Portugal", "pt", "€"),
    ("Romania", "ro", "lei "),
    ("Saudi Arabia", "sa", "SR "),
    ("Slovakia", "sk", "€"),
    ("Spain", "es", "€"),
    ("Sweden", "se", "kr "),
    ("United Kingdom", "uk", "£"),
    ("United States", "us", "$"),
];

/// Part categories offered by the filter picker, mapped to the API's
/// product-type keys.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("Case", "case"),
    ("CPU", "cpu"),
    ("Video Card", "video-card"),
    ("Memory", "memory"),
    ("Monitor", "monitor"),
    ("Motherboard", "motherboard"),
    ("Keyboard", "keyboard"),
    ("Speaker", "speaker"),
    ("Thermal Paste", "thermal-paste"),
    ("Case Fan", "case-fan"),
    ("OS", "os"),
    ("CPU Cooler", "cpu-cooler"),
    ("Fan Controller", "fan-controller"),
    ("UPS", "ups"),
    ("Wired Network Card", "wired-network-card"),
    ("Headphones", "headphones"),
    ("Sound Card", "sound-card"),
    ("Internal Hard Drive", "internal-hard-drive"),
    ("Mouse", "mouse"),
    ("Wireless Network Card", "wireless-network-card"),
    ("Power Supply", "power-supply"),
    ("Webcam", "webcam"),
    ("External Hard Drive", "external-hard-drive"),
    ("Optical Drive", "optical-drive"),
];

/// API code for a region display name. Unknown names search the US store.
pub fn region_code(region: &str) -> &'static str {
    REGIONS
        .iter()
        .find(|(name, _, _)| *name == region)
        .map(|(_, code, _)| *code)
        .unwrap_or("us")
}

pub fn currency_symbol(region: &str) -> &'static str {
    REGIONS
        .iter()
        .find(|(name, _, _)| *name == region)
        .map(|(_, _, symbol)| *symbol)
        .unwrap_or("$")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub display_name: String,
    pub region: String,
    /// Use a component's custom price instead of its listed one in totals.
    pub use_custom_prices: bool,
    pub api_base_url: String,
    pub page_size: u32,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_name: String::new(),
            region: DEFAULT_REGION.to_string(),
            use_custom_prices: true,
            api_base_url: DEFAULT_API_URL.to_string(),
            page_size: 5,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Read settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let settings = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create settings directory")?;
        }
        let text = serde_json::to_string_pretty(self).context("failed to encode settings")?;
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
        debug!("saved settings to {}", path.display());
        Ok(())
    }

    pub fn region_code(&self) -> &'static str {
        region_code(&self.region)
    }

    pub fn currency_symbol(&self) -> &'static str {
        currency_symbol(&self.region)
    }

    /// Step through the region table, wrapping at either end.
    pub fn cycle_region(&mut self, offset: isize) {
        let len = REGIONS.len() as isize;
        let current = REGIONS
            .iter()
            .position(|(name, _, _)| *name == self.region)
            .unwrap_or(0) as isize;
        let next = (current + offset).rem_euclid(len) as usize;
        self.region = REGIONS[next].0.to_string();
    }

    /// Invalid level names fall back to `Info`.
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

/// Absolute path to the application data directory inside the user's home.
pub fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(SETTINGS_FILE_NAME))
}
