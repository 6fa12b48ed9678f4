//! # Engine Configuration
//!
//! Currency, exchange rates, tax rates and field precision for one tenant.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_DEFAULT_CURRENCY=USD                                         │
//! │     TALLY_RATE_USD=32.50                                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/invoicing/engine.toml (Linux)                            │
//! │     ~/Library/Application Support/com.tally.invoicing/engine.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     TRY base, USD 32.50, EUR 35.20, tax rates {0, 1, 10, 20}           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # engine.toml
//! [currency]
//! base = "TRY"
//! default = "TRY"
//! amount_decimals = 2
//!
//! [rates]          # units of base per one unit of the currency
//! USD = "32.50"
//! EUR = "35.20"
//!
//! [tax]
//! allowed_rates = ["0", "1", "10", "20"]
//! default_rate = "20"
//!
//! [editing]
//! quantity_decimals = 2
//! rate_decimals = 2
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

use tally_core::validation::validate_percentage;
use tally_core::{
    Currency, StaticRateTable, TaxPolicy, TaxRate, DEFAULT_AMOUNT_SCALE, DEFAULT_LINE_TAX_PERCENT,
    DEFAULT_TAX_RATES,
};

use crate::error::{EditorError, EditorResult};
use crate::line::{EditContext, FieldScales};

/// Upper bound for any configured number of decimals.
pub const MAX_DECIMALS: u32 = 10;

// =============================================================================
// Sections
// =============================================================================

/// `[currency]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencySettings {
    /// Currency every exchange rate is quoted against.
    #[serde(default)]
    pub base: Currency,

    /// Currency of a new invoice.
    #[serde(default)]
    pub default: Currency,

    /// Decimal places of committed amounts.
    #[serde(default = "default_amount_decimals")]
    pub amount_decimals: u32,
}

fn default_amount_decimals() -> u32 {
    DEFAULT_AMOUNT_SCALE
}

impl Default for CurrencySettings {
    fn default() -> Self {
        CurrencySettings {
            base: Currency::default(),
            default: Currency::default(),
            amount_decimals: default_amount_decimals(),
        }
    }
}

/// `[tax]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSettings {
    /// Percentages a line may use.
    #[serde(default = "default_allowed_rates")]
    pub allowed_rates: Vec<Decimal>,

    /// Percentage of a freshly added line.
    #[serde(default = "default_tax_rate")]
    pub default_rate: Decimal,

    /// Accept any percentage in [0, 100] instead of the list.
    #[serde(default)]
    pub accept_any_rate: bool,
}

fn default_allowed_rates() -> Vec<Decimal> {
    DEFAULT_TAX_RATES.iter().map(|r| Decimal::from(*r)).collect()
}

fn default_tax_rate() -> Decimal {
    Decimal::from(DEFAULT_LINE_TAX_PERCENT)
}

impl Default for TaxSettings {
    fn default() -> Self {
        TaxSettings {
            allowed_rates: default_allowed_rates(),
            default_rate: default_tax_rate(),
            accept_any_rate: false,
        }
    }
}

/// `[editing]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditingSettings {
    #[serde(default = "default_field_decimals")]
    pub quantity_decimals: u32,

    /// Decimals of discount and tax percentages.
    #[serde(default = "default_field_decimals")]
    pub rate_decimals: u32,
}

fn default_field_decimals() -> u32 {
    2
}

impl Default for EditingSettings {
    fn default() -> Self {
        EditingSettings {
            quantity_decimals: default_field_decimals(),
            rate_decimals: default_field_decimals(),
        }
    }
}

// =============================================================================
// Engine Config
// =============================================================================

/// Complete pricing engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub currency: CurrencySettings,

    /// Currency code → units of base per one unit of that currency.
    ///
    /// A file without `[rates]` gets the built-in table, which is quoted
    /// against TRY. A config that moves the base must list its own rates.
    #[serde(default = "default_rates")]
    pub rates: BTreeMap<String, Decimal>,

    #[serde(default)]
    pub tax: TaxSettings,

    #[serde(default)]
    pub editing: EditingSettings,
}

fn default_rates() -> BTreeMap<String, Decimal> {
    BTreeMap::from([
        (Currency::Usd.code().to_string(), Decimal::new(3250, 2)),
        (Currency::Eur.code().to_string(), Decimal::new(3520, 2)),
    ])
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            currency: CurrencySettings::default(),
            rates: default_rates(),
            tax: TaxSettings::default(),
            editing: EditingSettings::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (engine.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EditorResult<Self> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// [`EngineConfig::load`] with an explicit environment lookup.
    pub fn load_with<F>(config_path: Option<PathBuf>, env: F) -> EditorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                config = Self::read_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides_from(env);
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    fn read_file(path: &Path) -> EditorResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> EditorResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| EditorError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| EditorError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| EditorError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EditorResult<()> {
        let decimals = [
            ("amount_decimals", self.currency.amount_decimals),
            ("quantity_decimals", self.editing.quantity_decimals),
            ("rate_decimals", self.editing.rate_decimals),
        ];
        for (name, value) in decimals {
            if value > MAX_DECIMALS {
                return Err(EditorError::InvalidConfig(format!(
                    "{} must be at most {}, got {}",
                    name, MAX_DECIMALS, value
                )));
            }
        }

        let table = self.rate_table()?;
        if self.currency.default != self.currency.base
            && !table.currencies().contains(&self.currency.default)
        {
            return Err(EditorError::InvalidConfig(format!(
                "No exchange rate for default currency {}",
                self.currency.default
            )));
        }

        if !self.tax.accept_any_rate && self.tax.allowed_rates.is_empty() {
            return Err(EditorError::InvalidConfig(
                "allowed_rates must not be empty".into(),
            ));
        }
        for rate in &self.tax.allowed_rates {
            validate_percentage(*rate, "tax.allowed_rates")?;
        }
        validate_percentage(self.tax.default_rate, "tax.default_rate")?;
        self.tax_policy()
            .check(TaxRate::from_percent(self.tax.default_rate))
            .map_err(|e| EditorError::InvalidConfig(format!("default_rate: {}", e)))?;

        Ok(())
    }

    /// Applies `TALLY_*` overrides read through `env`.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides_from<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = env("TALLY_BASE_CURRENCY") {
            match value.parse() {
                Ok(currency) => {
                    debug!(currency = %value, "Overriding base currency from environment");
                    self.currency.base = currency;
                }
                Err(_) => warn!(currency = %value, "Unknown base currency in environment"),
            }
        }

        if let Some(value) = env("TALLY_DEFAULT_CURRENCY") {
            match value.parse() {
                Ok(currency) => {
                    debug!(currency = %value, "Overriding default currency from environment");
                    self.currency.default = currency;
                }
                Err(_) => warn!(currency = %value, "Unknown default currency in environment"),
            }
        }

        if let Some(value) = env("TALLY_AMOUNT_DECIMALS") {
            match value.trim().parse::<u32>() {
                Ok(decimals) => self.currency.amount_decimals = decimals,
                Err(_) => warn!(decimals = %value, "Invalid amount decimals in environment"),
            }
        }

        if let Some(value) = env("TALLY_DEFAULT_TAX_RATE") {
            match Decimal::from_str(value.trim()) {
                Ok(rate) => self.tax.default_rate = rate,
                Err(_) => warn!(rate = %value, "Invalid default tax rate in environment"),
            }
        }

        for currency in Currency::ALL {
            let key = format!("TALLY_RATE_{}", currency.code());
            if let Some(value) = env(&key) {
                match Decimal::from_str(value.trim()) {
                    Ok(rate) => {
                        debug!(%currency, %rate, "Overriding exchange rate from environment");
                        self.rates.insert(currency.code().to_string(), rate);
                    }
                    Err(_) => warn!(%currency, rate = %value, "Invalid exchange rate in environment"),
                }
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "invoicing")
            .map(|dirs| dirs.config_dir().join("engine.toml"))
    }

    // =========================================================================
    // Derived Settings
    // =========================================================================

    /// Exchange rates as a rate table over the base currency.
    pub fn rate_table(&self) -> EditorResult<StaticRateTable> {
        let mut table = StaticRateTable::new(self.currency.base);
        for (code, rate) in &self.rates {
            let currency = Currency::from_str(code)
                .map_err(|_| EditorError::InvalidConfig(format!("Unknown currency in [rates]: {}", code)))?;

            if currency == self.currency.base {
                if *rate != Decimal::ONE {
                    return Err(EditorError::InvalidConfig(format!(
                        "Rate of the base currency {} must be 1, got {}",
                        currency, rate
                    )));
                }
                continue;
            }

            if *rate <= Decimal::ZERO {
                return Err(EditorError::InvalidConfig(format!(
                    "Exchange rate for {} must be positive, got {}",
                    currency, rate
                )));
            }
            table.set_rate(currency, *rate);
        }
        Ok(table)
    }

    pub fn tax_policy(&self) -> TaxPolicy {
        if self.tax.accept_any_rate {
            TaxPolicy::AnyPercentage
        } else {
            TaxPolicy::fixed(self.tax.allowed_rates.iter().copied())
        }
    }

    pub fn field_scales(&self) -> FieldScales {
        FieldScales {
            amount: self.currency.amount_decimals,
            quantity: self.editing.quantity_decimals,
            rate: self.editing.rate_decimals,
        }
    }

    /// Pricing rules for an editing session.
    pub fn edit_context(&self) -> EditContext {
        EditContext {
            policy: self.tax_policy(),
            default_tax_rate: TaxRate::from_percent(self.tax.default_rate),
            scales: self.field_scales(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use tally_core::RateProvider;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.currency.base, Currency::Try);
        assert_eq!(config.currency.amount_decimals, 2);
        assert_eq!(config.tax.default_rate, dec!(20));
        assert!(config.validate().is_ok());
        assert_eq!(config.edit_context(), EditContext::default());

        let table = config.rate_table().unwrap();
        assert_eq!(table.rate(Currency::Usd), Some(dec!(32.50)));
        assert_eq!(table.rate(Currency::Eur), Some(dec!(35.20)));
    }

    #[test]
    fn test_default_rates_price_foreign_products() {
        let table = EngineConfig::default().rate_table().unwrap();
        let price = tally_core::convert(
            tally_core::Money::new(dec!(10)),
            Currency::Usd,
            Currency::Try,
            &table,
            2,
        )
        .unwrap();
        assert_eq!(price.amount(), dec!(325.00));
    }

    #[test]
    fn test_moved_base_needs_its_own_rates() {
        let mut config = EngineConfig::default();
        config.currency.base = Currency::Usd;
        assert!(config.validate().unwrap_err().is_config_error());

        config.rates = BTreeMap::from([("TRY".to_string(), dec!(0.0308))]);
        config.currency.default = Currency::Usd;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.tax.default_rate = dec!(18);
        assert!(config.validate().unwrap_err().is_config_error());

        config.tax.accept_any_rate = true;
        assert!(config.validate().is_ok());

        config.rates.insert("GBP".into(), dec!(40));
        assert!(config.validate().is_err());

        config.rates.clear();
        config.rates.insert("USD".into(), dec!(0));
        assert!(config.validate().is_err());

        config.rates.insert("USD".into(), dec!(32.5));
        config.currency.default = Currency::Eur;
        assert!(config.validate().is_err());

        config.currency.default = Currency::Usd;
        assert!(config.validate().is_ok());

        config.editing.quantity_decimals = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_allowed_rate_is_rejected() {
        let mut config = EngineConfig::default();
        config.tax.allowed_rates.push(dec!(120));
        assert!(config.validate().unwrap_err().is_rejected_input());
    }

    #[test]
    fn test_rate_table() {
        let mut config = EngineConfig::default();
        config.rates.insert("USD".into(), dec!(33));
        config.rates.insert("TRY".into(), dec!(1));
        config.rates.remove("EUR");

        let table = config.rate_table().unwrap();
        assert_eq!(table.base(), Currency::Try);
        assert_eq!(table.rate(Currency::Usd), Some(dec!(33)));
        assert_eq!(table.rate(Currency::Eur), None);
    }

    #[test]
    fn test_toml_parsing() {
        let toml = r#"
            [currency]
            base = "TRY"
            default = "USD"

            [rates]
            USD = "32.50"
            EUR = "35.2"

            [tax]
            allowed_rates = ["0", "8", "18"]
            default_rate = "18"
        "#;

        let config: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.currency.default, Currency::Usd);
        assert_eq!(config.currency.amount_decimals, 2);
        assert_eq!(config.rates["USD"], dec!(32.50));
        assert_eq!(config.rates["EUR"], dec!(35.2));
        assert_eq!(config.editing, EditingSettings::default());
        assert!(config.validate().is_ok());
        assert!(config.tax_policy().check(TaxRate::from_percent(dec!(8))).is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EngineConfig::default();
        config.apply_overrides_from(env_of(&[
            ("TALLY_DEFAULT_CURRENCY", "eur"),
            ("TALLY_RATE_EUR", "36"),
            ("TALLY_RATE_USD", "not-a-number"),
            ("TALLY_AMOUNT_DECIMALS", "3"),
            ("TALLY_BASE_CURRENCY", "XYZ"),
        ]));

        assert_eq!(config.currency.default, Currency::Eur);
        assert_eq!(config.currency.base, Currency::Try);
        assert_eq!(config.currency.amount_decimals, 3);
        assert_eq!(config.rates.get("EUR"), Some(&dec!(36)));
        // An unparseable rate keeps the built-in one.
        assert_eq!(config.rates.get("USD"), Some(&dec!(32.50)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_env_values_keep_previous_settings() {
        let mut config = EngineConfig::default();
        config.apply_overrides_from(env_of(&[
            ("TALLY_AMOUNT_DECIMALS", "two"),
            ("TALLY_DEFAULT_TAX_RATE", "twenty"),
            ("TALLY_DEFAULT_CURRENCY", "GBP"),
        ]));
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_file_without_rates_gets_defaults() {
        let config: EngineConfig = toml::from_str("[currency]\ndefault = \"EUR\"\n").unwrap();
        assert_eq!(config.rates, default_rates());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("engine.toml");

        let mut config = EngineConfig::default();
        config.rates.insert("USD".into(), dec!(32.50));
        config.editing.quantity_decimals = 3;
        config.save(Some(path.clone())).unwrap();

        let loaded = EngineConfig::load_with(Some(path), no_env).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = EngineConfig::load_with(Some(path), no_env).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "[currency]\nbase = \"GBP\"\n").unwrap();

        let err = EngineConfig::load_with(Some(path.clone()), no_env).unwrap_err();
        assert!(matches!(err, EditorError::ConfigLoadFailed(_)));

        // Falls back instead of failing.
        assert_eq!(EngineConfig::load_or_default(Some(path)), EngineConfig::default());
    }
}
