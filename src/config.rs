// ⚙️ Registry Configuration
// Tariffs, loan windows, commission rates and the passenger weight constant
//
// Layering (last wins):
//   1. built-in defaults
//   2. optional file (json / toml / yaml, picked by extension)
//   3. environment: REGISTRY__RENTAL__CAR__DAILY_RATE=55
//
// Values are handed explicitly to constructors and compute functions.

use crate::error::ValidationError;
use crate::records::payment::{CARD_RATE, PREMIUM_CARD_RATE, TRANSFER_FEE};
use crate::records::publication::{PublicationType, BOOK_LOAN_DAYS, MAGAZINE_LOAN_DAYS, MAX_LOAN_DAYS};
use crate::records::railcar::AVG_PASSENGER_WEIGHT_KG;
use crate::records::vehicle::{RentalTariff, VehicleType};
use crate::validation::{require_at_most, require_non_negative, require_positive, require_positive_int, require_range};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_PREFIX: &str = "REGISTRY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalConfig {
    pub car: RentalTariff,
    pub van: RentalTariff,
    /// Distance a van covers before the per-block charge applies
    pub van_free_distance: f64,
}

impl Default for RentalConfig {
    fn default() -> Self {
        RentalConfig {
            car: RentalTariff::car(),
            van: RentalTariff::van(),
            van_free_distance: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    pub book_loan_days: u32,
    pub magazine_loan_days: u32,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            book_loan_days: BOOK_LOAN_DAYS,
            magazine_loan_days: MAGAZINE_LOAN_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentsConfig {
    pub card_rate: f64,
    pub premium_card_rate: f64,
    pub transfer_fee: f64,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        PaymentsConfig {
            card_rate: CARD_RATE,
            premium_card_rate: PREMIUM_CARD_RATE,
            transfer_fee: TRANSFER_FEE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RailConfig {
    pub avg_passenger_weight_kg: f64,
}

impl Default for RailConfig {
    fn default() -> Self {
        RailConfig {
            avg_passenger_weight_kg: AVG_PASSENGER_WEIGHT_KG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub rental: RentalConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub payments: PaymentsConfig,

    #[serde(default)]
    pub rail: RailConfig,
}

impl RegistryConfig {
    /// Defaults, then `path` if given, then `REGISTRY__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = config::Config::try_from(&RegistryConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            builder = builder.add_source(config::File::from(path));
        }

        let loaded: RegistryConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        loaded.validate().context("Invalid configuration")?;

        tracing::debug!(?path, "configuration loaded");
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        within("rental.car", self.rental.car.validate())?;
        within("rental.van", self.rental.van.validate())?;
        require_non_negative("rental.van_free_distance", self.rental.van_free_distance)?;

        require_positive_int("library.book_loan_days", self.library.book_loan_days)?;
        require_positive_int("library.magazine_loan_days", self.library.magazine_loan_days)?;
        require_at_most("library.book_loan_days", self.library.book_loan_days.into(), MAX_LOAN_DAYS.into())?;
        require_at_most("library.magazine_loan_days", self.library.magazine_loan_days.into(), MAX_LOAN_DAYS.into())?;

        require_range("payments.card_rate", self.payments.card_rate, 0.0, 1.0)?;
        require_range("payments.premium_card_rate", self.payments.premium_card_rate, 0.0, 1.0)?;
        require_non_negative("payments.transfer_fee", self.payments.transfer_fee)?;

        require_positive("rail.avg_passenger_weight_kg", self.rail.avg_passenger_weight_kg)?;
        Ok(())
    }

    pub fn tariff_for(&self, vehicle_type: VehicleType) -> RentalTariff {
        match vehicle_type {
            VehicleType::Car => self.rental.car,
            VehicleType::Van => self.rental.van,
        }
    }

    pub fn loan_days_for(&self, publication_type: PublicationType) -> u32 {
        match publication_type {
            PublicationType::Book => self.library.book_loan_days,
            PublicationType::Magazine => self.library.magazine_loan_days,
        }
    }
}

/// Prefix a nested field name with its section
fn within(section: &str, result: Result<(), ValidationError>) -> Result<(), ValidationError> {
    result.map_err(|err| ValidationError::invalid(format!("{}.{}", section, err.field()), err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_match_constants() {
        let config = RegistryConfig::default();

        assert_eq!(config.rental.car.daily_rate, 50.0);
        assert_eq!(config.rental.car.distance_block, 25.0);
        assert_eq!(config.rental.van.daily_rate, 70.0);
        assert_eq!(config.rental.van_free_distance, 100.0);
        assert_eq!(config.library.book_loan_days, 30);
        assert_eq!(config.library.magazine_loan_days, 7);
        assert_eq!(config.payments.transfer_fee, 2.5);
        assert_eq!(config.rail.avg_passenger_weight_kg, 65.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_without_file_gives_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = RegistryConfig::load(None).unwrap();
        assert_eq!(config, RegistryConfig::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{ "library": {{ "book_loan_days": 21, "magazine_loan_days": 3 }} }}"#
        )
        .unwrap();

        let config = RegistryConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.library.book_loan_days, 21);
        assert_eq!(config.loan_days_for(PublicationType::Magazine), 3);
        assert_eq!(config.rental, RentalConfig::default());
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        std::env::set_var("REGISTRY__RENTAL__VAN_FREE_DISTANCE", "150");
        let result = RegistryConfig::load(None);
        std::env::remove_var("REGISTRY__RENTAL__VAN_FREE_DISTANCE");

        let config = result.unwrap();
        assert_eq!(config.rental.van_free_distance, 150.0);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        assert!(RegistryConfig::load(Some(Path::new("/nonexistent/registry.toml"))).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = RegistryConfig::default();
        config.rental.car.distance_block = 0.0;
        assert_eq!(config.validate().unwrap_err().field(), "rental.car.distance_block");

        let mut config = RegistryConfig::default();
        config.library.book_loan_days = 0;
        assert_eq!(config.validate().unwrap_err().field(), "library.book_loan_days");

        let mut config = RegistryConfig::default();
        config.library.magazine_loan_days = u32::MAX;
        assert_eq!(config.validate().unwrap_err().field(), "library.magazine_loan_days");

        let mut config = RegistryConfig::default();
        config.payments.card_rate = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tariff_for_vehicle_type() {
        let config = RegistryConfig::default();
        assert_eq!(config.tariff_for(VehicleType::Van).daily_rate, 70.0);
        assert_eq!(config.tariff_for(VehicleType::Car).daily_rate, 50.0);
    }
}
