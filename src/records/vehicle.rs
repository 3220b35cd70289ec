// 🚗 Vehicle Records - rental fleet
//
// One shared attribute block (VehicleSpec) + a variant payload (Car / Van).
// The rental formula is a single match on the payload:
//   daily_rate × days + billable_distance / distance_block × block_rate
//   + fuel_deficit × fuel_rate
// Cars bill every unit of distance, vans only what exceeds their free
// allowance.

use crate::error::ValidationError;
use crate::registry::{Record, Registry};
use crate::session::{Period, Settle};
use crate::validation::{
    require_at_most, require_non_empty, require_non_negative, require_positive,
    require_positive_int,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// TARIFF
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RentalTariff {
    /// Flat charge per billed day
    pub daily_rate: f64,

    /// Distance covered by one `block_rate` charge (e.g. 1 € every 25 km)
    pub distance_block: f64,

    pub block_rate: f64,

    /// Charge per unit of missing fuel
    pub fuel_rate: f64,
}

impl RentalTariff {
    /// 50/day, 1 every 25 km, 2 per missing litre
    pub fn car() -> Self {
        RentalTariff {
            daily_rate: 50.0,
            distance_block: 25.0,
            block_rate: 1.0,
            fuel_rate: 2.0,
        }
    }

    /// 70/day, 1 every 30 km, 2 per missing litre
    pub fn van() -> Self {
        RentalTariff {
            daily_rate: 70.0,
            distance_block: 30.0,
            block_rate: 1.0,
            fuel_rate: 2.0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_negative("daily_rate", self.daily_rate)?;
        require_positive("distance_block", self.distance_block)?;
        require_non_negative("block_rate", self.block_rate)?;
        require_non_negative("fuel_rate", self.fuel_rate)?;
        Ok(())
    }
}

// ============================================================================
// VEHICLE TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    Car,
    Van,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "Car",
            VehicleType::Van => "Van",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VehicleKind {
    Car { seats: u32 },
    Van { payload_kg: f64, free_distance: f64 },
}

// ============================================================================
// VEHICLE
// ============================================================================

/// Attributes every vehicle carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSpec {
    pub plate: String,
    pub serial: u32,
    pub make: String,
    pub model: String,
    pub displacement_cc: u32,
    pub purchase_year: u32,
    /// Litres
    pub tank_capacity: f64,
}

impl VehicleSpec {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("plate", &self.plate)?;
        require_positive_int("serial", self.serial)?;
        require_non_empty("make", &self.make)?;
        require_non_empty("model", &self.model)?;
        require_positive_int("displacement_cc", self.displacement_cc)?;
        require_positive_int("purchase_year", self.purchase_year)?;
        require_positive("tank_capacity", self.tank_capacity)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vehicle {
    spec: VehicleSpec,
    tariff: RentalTariff,
    kind: VehicleKind,
}

/// Usage recorded when a rental closes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RentalUsage {
    pub distance: f64,
    pub fuel_deficit: f64,
}

/// Breakdown of a rental total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RentalCharge {
    pub days: u32,
    pub time_charge: f64,
    pub distance_charge: f64,
    pub fuel_charge: f64,
    pub total: f64,
}

impl Vehicle {
    pub fn new(spec: VehicleSpec, tariff: RentalTariff, kind: VehicleKind) -> Result<Self, ValidationError> {
        spec.validate()?;
        tariff.validate()?;

        match &kind {
            VehicleKind::Car { seats } => {
                require_positive_int("seats", *seats)?;
            }
            VehicleKind::Van {
                payload_kg,
                free_distance,
            } => {
                require_positive("payload_kg", *payload_kg)?;
                require_non_negative("free_distance", *free_distance)?;
            }
        }

        Ok(Vehicle { spec, tariff, kind })
    }

    pub fn car(spec: VehicleSpec, seats: u32, tariff: RentalTariff) -> Result<Self, ValidationError> {
        Self::new(spec, tariff, VehicleKind::Car { seats })
    }

    pub fn van(
        spec: VehicleSpec,
        payload_kg: f64,
        free_distance: f64,
        tariff: RentalTariff,
    ) -> Result<Self, ValidationError> {
        Self::new(
            spec,
            tariff,
            VehicleKind::Van {
                payload_kg,
                free_distance,
            },
        )
    }

    /// Distance subject to the per-block charge
    fn billable_distance(&self, distance: f64) -> f64 {
        match &self.kind {
            VehicleKind::Car { .. } => distance,
            VehicleKind::Van { free_distance, .. } => (distance - free_distance).max(0.0),
        }
    }

    /// Itemised rental cost for `days` billed days
    pub fn rental_charge(&self, days: u32, usage: &RentalUsage) -> Result<RentalCharge, ValidationError> {
        require_positive_int("days", days)?;
        self.check_usage(usage)?;

        let time_charge = self.tariff.daily_rate * days as f64;
        let distance_charge =
            self.billable_distance(usage.distance) / self.tariff.distance_block * self.tariff.block_rate;
        let fuel_charge = usage.fuel_deficit * self.tariff.fuel_rate;

        Ok(RentalCharge {
            days,
            time_charge,
            distance_charge,
            fuel_charge,
            total: time_charge + distance_charge + fuel_charge,
        })
    }

    /// Total rental cost
    pub fn rental_cost(&self, days: u32, distance: f64, fuel_deficit: f64) -> Result<f64, ValidationError> {
        self.rental_charge(
            days,
            &RentalUsage {
                distance,
                fuel_deficit,
            },
        )
        .map(|charge| charge.total)
    }

    pub fn spec(&self) -> &VehicleSpec {
        &self.spec
    }

    pub fn plate(&self) -> &str {
        &self.spec.plate
    }

    pub fn serial(&self) -> u32 {
        self.spec.serial
    }

    pub fn make(&self) -> &str {
        &self.spec.make
    }

    pub fn model(&self) -> &str {
        &self.spec.model
    }

    pub fn displacement_cc(&self) -> u32 {
        self.spec.displacement_cc
    }

    pub fn purchase_year(&self) -> u32 {
        self.spec.purchase_year
    }

    pub fn tank_capacity(&self) -> f64 {
        self.spec.tank_capacity
    }

    pub fn tariff(&self) -> &RentalTariff {
        &self.tariff
    }

    pub fn kind(&self) -> &VehicleKind {
        &self.kind
    }

    pub fn vehicle_type(&self) -> VehicleType {
        match self.kind {
            VehicleKind::Car { .. } => VehicleType::Car,
            VehicleKind::Van { .. } => VehicleType::Van,
        }
    }

    pub fn seats(&self) -> Option<u32> {
        match self.kind {
            VehicleKind::Car { seats } => Some(seats),
            VehicleKind::Van { .. } => None,
        }
    }

    pub fn payload_kg(&self) -> Option<f64> {
        match self.kind {
            VehicleKind::Van { payload_kg, .. } => Some(payload_kg),
            VehicleKind::Car { .. } => None,
        }
    }

    pub fn summary(&self) -> String {
        let detail = match &self.kind {
            VehicleKind::Car { seats } => format!("{} seats", seats),
            VehicleKind::Van { payload_kg, .. } => format!("{:.0} kg payload", payload_kg),
        };
        format!(
            "{} #{} {} {} {} ({}cc, {}, {:.1} L) - {}",
            self.vehicle_type().as_str(),
            self.spec.serial,
            self.spec.plate,
            self.spec.make,
            self.spec.model,
            self.spec.displacement_cc,
            self.spec.purchase_year,
            self.spec.tank_capacity,
            detail
        )
    }
}

impl Record for Vehicle {
    type Key = String;
    type Variant = VehicleType;
    const KIND: &'static str = "vehicle";

    fn key(&self) -> &String {
        &self.spec.plate
    }

    fn variant(&self) -> VehicleType {
        self.vehicle_type()
    }
}

impl Settle for Vehicle {
    type Usage = RentalUsage;
    type Outcome = RentalCharge;

    fn check_usage(&self, usage: &RentalUsage) -> Result<(), ValidationError> {
        require_non_negative("distance", usage.distance)?;
        require_non_negative("fuel_deficit", usage.fuel_deficit)?;
        require_at_most("fuel_deficit", usage.fuel_deficit, self.spec.tank_capacity)?;
        Ok(())
    }

    fn settle(&self, period: &Period, usage: &RentalUsage) -> Result<RentalCharge, ValidationError> {
        self.rental_charge(period.billed_days(), usage)
    }
}

// ============================================================================
// FLEET QUERIES
// ============================================================================

pub type Fleet = Registry<Vehicle>;

impl Registry<Vehicle> {
    pub fn find_by_serial(&self, serial: u32) -> Option<&Vehicle> {
        self.find_by(|v| v.serial() == serial)
    }

    /// Case-insensitive plate lookup
    pub fn find_by_plate(&self, plate: &str) -> Option<&Vehicle> {
        self.find_by(|v| v.plate().eq_ignore_ascii_case(plate))
    }

    pub fn cars(&self) -> Vec<&Vehicle> {
        self.by_variant(VehicleType::Car)
    }

    pub fn vans(&self) -> Vec<&Vehicle> {
        self.by_variant(VehicleType::Van)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn spec(plate: &str, serial: u32) -> VehicleSpec {
        VehicleSpec {
            plate: plate.to_string(),
            serial,
            make: "Fiat".to_string(),
            model: "Panda".to_string(),
            displacement_cc: 1200,
            purchase_year: 2021,
            tank_capacity: 40.0,
        }
    }

    #[test]
    fn test_car_creation_reads_back() {
        let car = Vehicle::car(spec("AB123CD", 1), 5, RentalTariff::car()).unwrap();

        assert_eq!(car.plate(), "AB123CD");
        assert_eq!(car.serial(), 1);
        assert_eq!(car.make(), "Fiat");
        assert_eq!(car.model(), "Panda");
        assert_eq!(car.displacement_cc(), 1200);
        assert_eq!(car.purchase_year(), 2021);
        assert_eq!(car.tank_capacity(), 40.0);
        assert_eq!(car.seats(), Some(5));
        assert_eq!(car.payload_kg(), None);
        assert_eq!(car.vehicle_type(), VehicleType::Car);
        assert_eq!(car.key(), "AB123CD");
    }

    #[test]
    fn test_invalid_attributes_name_the_field() {
        let mut bad = spec("AB123CD", 1);
        bad.tank_capacity = 0.0;
        let err = Vehicle::car(bad, 5, RentalTariff::car()).unwrap_err();
        assert_eq!(err.field(), "tank_capacity");

        let err = Vehicle::car(spec(" ", 1), 5, RentalTariff::car()).unwrap_err();
        assert_eq!(err.field(), "plate");

        let err = Vehicle::car(spec("AB123CD", 0), 5, RentalTariff::car()).unwrap_err();
        assert_eq!(err.field(), "serial");

        let err = Vehicle::car(spec("AB123CD", 1), 0, RentalTariff::car()).unwrap_err();
        assert_eq!(err.field(), "seats");

        let err = Vehicle::van(spec("AB123CD", 1), -5.0, 100.0, RentalTariff::van()).unwrap_err();
        assert_eq!(err.field(), "payload_kg");
    }

    #[test]
    fn test_car_cost_formula() {
        let car = Vehicle::car(spec("AB123CD", 1), 5, RentalTariff::car()).unwrap();
        // 50*3 + 200/25 + 5*2
        assert_eq!(car.rental_cost(3, 200.0, 5.0).unwrap(), 168.0);

        let charge = car
            .rental_charge(
                3,
                &RentalUsage {
                    distance: 200.0,
                    fuel_deficit: 5.0,
                },
            )
            .unwrap();
        assert_eq!(charge.time_charge, 150.0);
        assert_eq!(charge.distance_charge, 8.0);
        assert_eq!(charge.fuel_charge, 10.0);
        assert_eq!(charge.total, 168.0);
    }

    #[test]
    fn test_van_cost_has_free_distance() {
        let van = Vehicle::van(spec("VAN001", 2), 1500.0, 100.0, RentalTariff::van()).unwrap();
        // 70*2 + (400-100)/30 + 0
        assert_eq!(van.rental_cost(2, 400.0, 0.0).unwrap(), 150.0);
        // inside the free allowance
        assert_eq!(van.rental_cost(1, 80.0, 0.0).unwrap(), 70.0);
    }

    #[test]
    fn test_cost_rejects_bad_usage() {
        let car = Vehicle::car(spec("AB123CD", 1), 5, RentalTariff::car()).unwrap();

        assert_eq!(car.rental_cost(0, 10.0, 0.0).unwrap_err().field(), "days");
        assert_eq!(car.rental_cost(1, -1.0, 0.0).unwrap_err().field(), "distance");
        assert_eq!(car.rental_cost(1, 0.0, -1.0).unwrap_err().field(), "fuel_deficit");
        assert!(matches!(
            car.rental_cost(1, 0.0, 41.0),
            Err(ValidationError::Exceeds { .. })
        ));
        assert!(car.rental_cost(1, 0.0, 40.0).is_ok());
    }

    #[test]
    fn test_fleet_queries() {
        let mut fleet = Fleet::new();
        fleet
            .add(Vehicle::car(spec("AB123CD", 1), 5, RentalTariff::car()).unwrap())
            .unwrap();
        fleet
            .add(Vehicle::van(spec("VAN001", 2), 1500.0, 100.0, RentalTariff::van()).unwrap())
            .unwrap();

        assert_eq!(fleet.find_by_serial(2).map(|v| v.plate()), Some("VAN001"));
        assert_eq!(fleet.find_by_plate("ab123cd").map(|v| v.serial()), Some(1));
        assert!(fleet.find_by_plate("ZZ999ZZ").is_none());
        assert_eq!(fleet.cars().len(), 1);
        assert_eq!(fleet.vans().len(), 1);
    }

    #[test]
    fn test_summary_mentions_variant() {
        let van = Vehicle::van(spec("VAN001", 2), 1500.0, 100.0, RentalTariff::van()).unwrap();
        let summary = van.summary();
        assert!(summary.starts_with("Van #2 VAN001"));
        assert!(summary.contains("1500 kg payload"));
    }

    proptest! {
        #[test]
        fn prop_cost_is_deterministic(
            days in 1u32..60,
            distance in 0.0f64..5000.0,
            fuel in 0.0f64..40.0,
        ) {
            let a = Vehicle::car(spec("AB123CD", 1), 5, RentalTariff::car()).unwrap();
            let b = Vehicle::car(spec("AB123CD", 1), 5, RentalTariff::car()).unwrap();

            let first = a.rental_cost(days, distance, fuel).unwrap();
            prop_assert_eq!(first, a.rental_cost(days, distance, fuel).unwrap());
            prop_assert_eq!(first, b.rental_cost(days, distance, fuel).unwrap());
        }

        #[test]
        fn prop_valid_spec_reads_back(
            serial in 1u32..100_000,
            cc in 1u32..8000,
            year in 1950u32..2030,
            tank in 1.0f64..200.0,
            seats in 1u32..9,
        ) {
            let mut s = spec("XY000ZZ", serial);
            s.displacement_cc = cc;
            s.purchase_year = year;
            s.tank_capacity = tank;

            let car = Vehicle::car(s.clone(), seats, RentalTariff::car()).unwrap();
            prop_assert_eq!(car.spec(), &s);
            prop_assert_eq!(car.seats(), Some(seats));
        }
    }
}
