// 🚆 Railcar Records - train composition
//
// Gross weight per variant:
//   Passenger → tare + occupied seats × average passenger weight
//   Freight   → tare + current load
// The average passenger weight is an explicit argument, never shared state.

use crate::error::ValidationError;
use crate::registry::{Record, Registry};
use crate::validation::{
    require_at_most, require_non_empty, require_non_negative, require_positive, require_positive_int,
    require_range,
};
use serde::{Deserialize, Serialize};

pub const AVG_PASSENGER_WEIGHT_KG: f64 = 65.0;
pub const MIN_BUILD_YEAR: u32 = 1800;
pub const MAX_BUILD_YEAR: u32 = 2100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RailcarType {
    Passenger,
    Freight,
}

impl RailcarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RailcarType::Passenger => "Passenger",
            RailcarType::Freight => "Freight",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RailcarKind {
    Passenger { class: u8, seats: u32, occupied: u32 },
    Freight { volume_m3: f64, max_load_kg: f64, load_kg: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Railcar {
    id: String,
    tare_kg: f64,
    manufacturer: String,
    build_year: u32,
    kind: RailcarKind,
}

impl Railcar {
    pub fn new(
        id: &str,
        tare_kg: f64,
        manufacturer: &str,
        build_year: u32,
        kind: RailcarKind,
    ) -> Result<Self, ValidationError> {
        require_non_empty("id", id)?;
        require_positive("tare_kg", tare_kg)?;
        require_non_empty("manufacturer", manufacturer)?;
        require_range(
            "build_year",
            build_year as f64,
            MIN_BUILD_YEAR as f64,
            MAX_BUILD_YEAR as f64,
        )?;

        match &kind {
            RailcarKind::Passenger { class, seats, occupied } => {
                require_range("class", *class as f64, 1.0, 2.0)?;
                require_positive_int("seats", *seats)?;
                require_at_most("occupied", *occupied as f64, *seats as f64)?;
            }
            RailcarKind::Freight {
                volume_m3,
                max_load_kg,
                load_kg,
            } => {
                require_positive("volume_m3", *volume_m3)?;
                require_positive("max_load_kg", *max_load_kg)?;
                require_non_negative("load_kg", *load_kg)?;
                require_at_most("load_kg", *load_kg, *max_load_kg)?;
            }
        }

        Ok(Railcar {
            id: id.to_string(),
            tare_kg,
            manufacturer: manufacturer.to_string(),
            build_year,
            kind,
        })
    }

    pub fn passenger(
        id: &str,
        tare_kg: f64,
        manufacturer: &str,
        build_year: u32,
        class: u8,
        seats: u32,
    ) -> Result<Self, ValidationError> {
        Self::new(
            id,
            tare_kg,
            manufacturer,
            build_year,
            RailcarKind::Passenger {
                class,
                seats,
                occupied: 0,
            },
        )
    }

    pub fn freight(
        id: &str,
        tare_kg: f64,
        manufacturer: &str,
        build_year: u32,
        volume_m3: f64,
        max_load_kg: f64,
    ) -> Result<Self, ValidationError> {
        Self::new(
            id,
            tare_kg,
            manufacturer,
            build_year,
            RailcarKind::Freight {
                volume_m3,
                max_load_kg,
                load_kg: 0.0,
            },
        )
    }

    /// Gross weight in kg
    pub fn gross_weight(&self, avg_passenger_kg: f64) -> f64 {
        match &self.kind {
            RailcarKind::Passenger { occupied, .. } => self.tare_kg + *occupied as f64 * avg_passenger_kg,
            RailcarKind::Freight { load_kg, .. } => self.tare_kg + load_kg,
        }
    }

    pub fn set_occupied(&mut self, value: u32) -> Result<(), ValidationError> {
        match &mut self.kind {
            RailcarKind::Passenger { seats, occupied, .. } => {
                require_at_most("occupied", value as f64, *seats as f64)?;
                *occupied = value;
                Ok(())
            }
            RailcarKind::Freight { .. } => Err(ValidationError::invalid("occupied", "freight cars carry no passengers")),
        }
    }

    pub fn set_load(&mut self, value: f64) -> Result<(), ValidationError> {
        match &mut self.kind {
            RailcarKind::Freight {
                max_load_kg, load_kg, ..
            } => {
                require_non_negative("load_kg", value)?;
                require_at_most("load_kg", value, *max_load_kg)?;
                *load_kg = value;
                Ok(())
            }
            RailcarKind::Passenger { .. } => Err(ValidationError::invalid("load_kg", "passenger cars carry no freight")),
        }
    }

    pub fn set_tare(&mut self, tare_kg: f64) -> Result<(), ValidationError> {
        self.tare_kg = require_positive("tare_kg", tare_kg)?;
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tare_kg(&self) -> f64 {
        self.tare_kg
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn build_year(&self) -> u32 {
        self.build_year
    }

    pub fn kind(&self) -> &RailcarKind {
        &self.kind
    }

    pub fn railcar_type(&self) -> RailcarType {
        match self.kind {
            RailcarKind::Passenger { .. } => RailcarType::Passenger,
            RailcarKind::Freight { .. } => RailcarType::Freight,
        }
    }

    pub fn seats(&self) -> u32 {
        match self.kind {
            RailcarKind::Passenger { seats, .. } => seats,
            RailcarKind::Freight { .. } => 0,
        }
    }

    pub fn occupied(&self) -> u32 {
        match self.kind {
            RailcarKind::Passenger { occupied, .. } => occupied,
            RailcarKind::Freight { .. } => 0,
        }
    }
}

impl Record for Railcar {
    type Key = String;
    type Variant = RailcarType;
    const KIND: &'static str = "railcar";

    fn key(&self) -> &String {
        &self.id
    }

    fn variant(&self) -> RailcarType {
        self.railcar_type()
    }
}

// ============================================================================
// TRAIN
// ============================================================================

/// Named composition of railcars in coupling order
#[derive(Debug, Clone, Serialize)]
pub struct Train {
    name: String,
    cars: Registry<Railcar>,
}

impl Train {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        require_non_empty("name", name)?;
        Ok(Train {
            name: name.to_string(),
            cars: Registry::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cars(&self) -> &Registry<Railcar> {
        &self.cars
    }

    pub fn cars_mut(&mut self) -> &mut Registry<Railcar> {
        &mut self.cars
    }

    pub fn couple(&mut self, car: Railcar) -> crate::error::RegistryResult<&Railcar> {
        self.cars.add(car)
    }

    pub fn uncouple(&mut self, id: &str) -> Option<Railcar> {
        self.cars.remove(&id.to_string())
    }

    pub fn total_weight(&self, avg_passenger_kg: f64) -> f64 {
        self.cars.sum(|c| c.gross_weight(avg_passenger_kg))
    }

    pub fn passenger_cars(&self) -> usize {
        self.cars.count_variant(RailcarType::Passenger)
    }

    pub fn freight_cars(&self) -> usize {
        self.cars.count_variant(RailcarType::Freight)
    }

    pub fn seat_capacity(&self) -> u32 {
        self.cars.iter().map(Railcar::seats).sum()
    }

    pub fn occupied_seats(&self) -> u32 {
        self.cars.iter().map(Railcar::occupied).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passenger_weight_uses_explicit_average() {
        let mut car = Railcar::passenger("P1", 40_000.0, "Alstom", 2010, 2, 80).unwrap();
        car.set_occupied(10).unwrap();

        assert_eq!(car.gross_weight(AVG_PASSENGER_WEIGHT_KG), 40_650.0);
        assert_eq!(car.gross_weight(80.0), 40_800.0);
    }

    #[test]
    fn test_freight_weight_and_load_guard() {
        let mut car = Railcar::freight("F1", 20_000.0, "Greenbrier", 1999, 90.0, 60_000.0).unwrap();
        car.set_load(15_000.0).unwrap();
        assert_eq!(car.gross_weight(AVG_PASSENGER_WEIGHT_KG), 35_000.0);

        assert!(car.set_load(60_001.0).is_err());
        assert!(car.set_load(-1.0).is_err());
        assert!(car.set_occupied(3).is_err());
        assert_eq!(car.gross_weight(AVG_PASSENGER_WEIGHT_KG), 35_000.0);
    }

    #[test]
    fn test_invalid_railcars() {
        assert_eq!(
            Railcar::passenger("P1", 40_000.0, "Alstom", 1799, 1, 80).unwrap_err().field(),
            "build_year"
        );
        assert_eq!(
            Railcar::passenger("P1", 40_000.0, "Alstom", 2000, 3, 80).unwrap_err().field(),
            "class"
        );
        assert_eq!(
            Railcar::passenger("P1", 0.0, "Alstom", 2000, 1, 80).unwrap_err().field(),
            "tare_kg"
        );
        assert_eq!(
            Railcar::freight("F1", 1.0, "Greenbrier", 2000, 0.0, 10.0).unwrap_err().field(),
            "volume_m3"
        );

        let mut car = Railcar::passenger("P1", 40_000.0, "Alstom", 2000, 1, 80).unwrap();
        assert!(car.set_occupied(81).is_err());
        assert_eq!(car.occupied(), 0);
        assert!(car.set_tare(-5.0).is_err());
    }

    #[test]
    fn test_train_totals() {
        let mut train = Train::new("Frecciarossa").unwrap();
        let mut p1 = Railcar::passenger("P1", 40_000.0, "Alstom", 2010, 1, 50).unwrap();
        p1.set_occupied(20).unwrap();
        let mut f1 = Railcar::freight("F1", 20_000.0, "Greenbrier", 1999, 90.0, 60_000.0).unwrap();
        f1.set_load(10_000.0).unwrap();

        train.couple(p1).unwrap();
        train.couple(f1).unwrap();

        assert_eq!(train.passenger_cars(), 1);
        assert_eq!(train.freight_cars(), 1);
        assert_eq!(train.seat_capacity(), 50);
        assert_eq!(train.occupied_seats(), 20);
        assert_eq!(train.total_weight(AVG_PASSENGER_WEIGHT_KG), 40_000.0 + 1_300.0 + 30_000.0);

        assert!(train.uncouple("F1").is_some());
        assert!(train.uncouple("F1").is_none());
        assert_eq!(train.freight_cars(), 0);
    }

    #[test]
    fn test_empty_train_weighs_nothing() {
        let train = Train::new("Empty").unwrap();
        assert_eq!(train.total_weight(AVG_PASSENGER_WEIGHT_KG), 0.0);
        assert!(Train::new(" ").is_err());
    }
}
