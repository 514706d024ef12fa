//! Application configuration loading from config.toml
//!
//! The configuration names the shops, the default bakery catalog seeded into
//! shops that have none yet, the beverage SKUs tracked by counter, and the
//! database URL. Missing keys fall back to the built-in defaults, and a
//! missing file means "use the defaults". `DATABASE_URL` in the environment
//! always wins over the file.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Environment variable holding the cash at the start of the reported day
pub const OPENING_BALANCE_VAR: &str = "OPENING_BALANCE";

const DEFAULT_DATABASE_URL: &str = "sqlite://data/bakery_ledger.sqlite?mode=rwc";

const DEFAULT_SHOPS: &[&str] = &[
    "Katuwawala",
    "Koswatta",
    "Arawwala",
    "Depanama",
    "Maharagama A",
    "Maharagama B",
    "Maharagama C",
];

const DEFAULT_BAKERY_ITEMS: &[&str] = &[
    "Normal bread",
    "Sandwich bread",
    "Half bread",
    "1/2 rose bread",
    "1/4 rose bread",
    "Tea bun",
    "Dagara bun",
    "Dot bun",
    "Cream bun",
    "Viyana Roll",
    "Jam bun",
    "Fish bun",
    "Sinisambol bun",
    "Othana Sausages",
    "Vegetable Bun",
    "Fish pastry",
    "Egg Pastry",
    "Sausages Pastry",
    "Fish Roll",
    "Egg Roll",
    "Vegetable Rotty",
    "Fish Rotty",
    "Chicken Pastry",
    "Wade",
    "patty -Vegetable",
    "Patty -fish",
    "Egg Bun",
    "Sausages Bun",
    "Hot dog",
    "Burger -Chicken",
    "Burger -Egg Bullseye",
    "Devel Sausages",
    "Omlet Bun",
    "Umbalakada Bun",
    "Semon Bun",
    "Fish finger",
    "Drumstick -Chicken",
    "Fish Cake",
    "Egg Pizza",
    "Sausages Pizza -cheese",
    "Sandwich -Egg",
    "Sandwich -fish",
    "Sandwich -Cheese",
    "string Hoppers",
    "Helapa",
    "Levaria",
    "Spanchi -Vanila",
    "Spanchi -Chocolate",
    "Cup Cake",
    "Daughnut",
    "Rock Bun",
    "Gnanakatha",
    "Pol Cake",
    "Swiss Roll",
    "Butter Cake",
    "100 Baby crush",
    "1/4 Side Rosed",
    "1/2 Side Rosed",
];

const DEFAULT_BEVERAGES: &[&str] = &["Nescafe", "Nestea"];

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_currency_label() -> String {
    "Rs.".to_string()
}

fn default_shops() -> Vec<String> {
    to_owned_list(DEFAULT_SHOPS)
}

fn default_bakery_items() -> Vec<String> {
    to_owned_list(DEFAULT_BAKERY_ITEMS)
}

fn default_beverages() -> Vec<String> {
    to_owned_list(DEFAULT_BEVERAGES)
}

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Database URL passed to `sea_orm::Database::connect`
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Currency prefix used when printing money
    #[serde(default = "default_currency_label")]
    pub currency_label: String,
    /// Shops (outlets) managed by the ledger
    #[serde(default = "default_shops")]
    pub shops: Vec<String>,
    /// Items seeded into a shop's catalog when it has none
    #[serde(default = "default_bakery_items")]
    pub bakery_items: Vec<String>,
    /// Beverage SKUs tracked by cumulative counter
    #[serde(default = "default_beverages")]
    pub beverages: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            currency_label: default_currency_label(),
            shops: default_shops(),
            bakery_items: default_bakery_items(),
            beverages: default_beverages(),
        }
    }
}

impl AppConfig {
    /// Returns a copy with the environment overrides applied.
    #[must_use]
    pub fn with_database_url(mut self, database_url: Option<String>) -> Self {
        if let Some(url) = database_url.filter(|url| !url.trim().is_empty()) {
            self.database_url = url;
        }
        self
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    /// Returns an error if no shops are configured, a shop name is blank, or
    /// a name appears twice in one of the lists.
    pub fn validate(&self) -> Result<()> {
        if self.shops.is_empty() {
            return Err(Error::Config {
                message: "At least one shop must be configured".to_string(),
            });
        }
        if self.shops.iter().any(|shop| shop.trim().is_empty()) {
            return Err(Error::Config {
                message: "Shop names cannot be empty".to_string(),
            });
        }
        for (list, names) in [
            ("shops", &self.shops),
            ("bakery_items", &self.bakery_items),
            ("beverages", &self.beverages),
        ] {
            if let Some(name) = first_duplicate(names) {
                return Err(Error::Config {
                    message: format!("'{name}' is listed more than once in {list}"),
                });
            }
        }
        Ok(())
    }

    /// Whether `shop` is one of the configured shops.
    #[must_use]
    pub fn has_shop(&self, shop: &str) -> bool {
        self.shops.iter().any(|s| s == shop)
    }
}

fn first_duplicate(names: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|name| name.trim())
        .find(|name| !seen.insert(*name))
}

/// Parses configuration from TOML text.
///
/// # Errors
/// Returns an error if the TOML syntax is invalid or a field has the wrong type.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads the application configuration used by the binary.
///
/// Reads `BAKERY_CONFIG` (default `config.toml`); falls back to the built-in
/// defaults when the file does not exist, then applies `DATABASE_URL`.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("BAKERY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = if Path::new(&path).exists() {
        let config = load_config(&path)?;
        info!("Loaded configuration from {}", path);
        config
    } else {
        info!("No configuration file at {}, using built-in defaults", path);
        AppConfig::default()
    };

    let config = config.with_database_url(std::env::var("DATABASE_URL").ok());
    config.validate()?;
    Ok(config)
}

/// Parses the opening cash balance given in [`OPENING_BALANCE_VAR`].
/// Unset means zero.
///
/// # Errors
/// Returns [`Error::Validation`] if the value is not a decimal amount.
pub fn parse_opening_balance(raw: Option<&str>) -> Result<Decimal> {
    let Some(raw) = raw else {
        return Ok(Decimal::ZERO);
    };
    Decimal::from_str(raw.trim()).map_err(|_| Error::Validation {
        message: format!("{OPENING_BALANCE_VAR} must be an amount, got '{raw}'"),
    })
}
