// 🏢 Rental Desk
// Fleet registry + rental ledger for one company
//
// Plates and serial numbers are both unique across the fleet. A vehicle is
// available while no open rental references it.

use crate::error::{RegistryError, RegistryResult, StateError};
use crate::config::RentalConfig;
use crate::records::vehicle::{Fleet, RentalCharge, RentalUsage, Vehicle, VehicleSpec};
use crate::registry::{Aggregation, Record};
use crate::session::{SessionLedger, SessionOf, SessionStatus};
use crate::validation::require_non_empty;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type Rental = SessionOf<Vehicle>;

/// Printable breakdown of one closed rental
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalStatement {
    pub rental_id: String,
    pub plate: String,
    pub vehicle: String,
    pub customer: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub distance: f64,
    pub fuel_deficit: f64,
    pub charge: RentalCharge,
}

#[derive(Debug, Clone)]
pub struct RentalDesk {
    company: String,
    fleet: Fleet,
    rentals: SessionLedger<Vehicle>,
}

impl RentalDesk {
    pub fn new(company: &str) -> RegistryResult<Self> {
        require_non_empty("company", company)?;
        Ok(RentalDesk {
            company: company.to_string(),
            fleet: Fleet::new(),
            rentals: SessionLedger::new(),
        })
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    // ========================================================================
    // FLEET
    // ========================================================================

    /// Add a vehicle; plate and serial must both be new
    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> RegistryResult<&Vehicle> {
        if self.fleet.find_by_serial(vehicle.serial()).is_some() {
            tracing::warn!(serial = vehicle.serial(), "duplicate serial rejected");
            return Err(RegistryError::duplicate("vehicle serial", vehicle.serial()));
        }
        if self.fleet.find_by_plate(vehicle.plate()).is_some() {
            return Err(RegistryError::duplicate(Vehicle::KIND, vehicle.plate()));
        }
        self.fleet.add(vehicle)
    }

    /// Remove an idle vehicle
    pub fn remove_vehicle(&mut self, plate: &str) -> RegistryResult<Vehicle> {
        let key = self.resolve_plate(plate)?;
        if !self.rentals.is_available(&key) {
            return Err(StateError::NotAllowed {
                operation: "remove vehicle".to_string(),
                reason: format!("{} is currently rented", key),
            }
            .into());
        }
        self.fleet
            .remove(&key)
            .ok_or_else(|| RegistryError::not_found(Vehicle::KIND, plate))
    }

    pub fn find_vehicle(&self, serial: u32) -> Option<&Vehicle> {
        self.fleet.find_by_serial(serial)
    }

    pub fn find_by_plate(&self, plate: &str) -> Option<&Vehicle> {
        self.fleet.find_by_plate(plate)
    }

    pub fn is_available(&self, serial: u32) -> RegistryResult<bool> {
        let vehicle = self
            .find_vehicle(serial)
            .ok_or_else(|| RegistryError::not_found(Vehicle::KIND, serial))?;
        Ok(self.rentals.is_available(&vehicle.plate().to_string()))
    }

    pub fn available_vehicles(&self) -> Vec<&Vehicle> {
        self.fleet
            .filter(|v| self.rentals.is_available(&v.plate().to_string()))
    }

    pub fn rented_vehicles(&self) -> Vec<&Vehicle> {
        self.fleet
            .filter(|v| !self.rentals.is_available(&v.plate().to_string()))
    }

    pub fn cars(&self) -> Vec<&Vehicle> {
        self.fleet.cars()
    }

    pub fn vans(&self) -> Vec<&Vehicle> {
        self.fleet.vans()
    }

    // ========================================================================
    // RENTALS
    // ========================================================================

    /// Open a rental on the vehicle with this serial
    pub fn start_rental(&mut self, serial: u32, customer: &str, start: NaiveDate) -> RegistryResult<&Rental> {
        let plate = self
            .find_vehicle(serial)
            .map(|v| v.plate().to_string())
            .ok_or_else(|| RegistryError::not_found(Vehicle::KIND, serial))?;
        self.rentals.open(&self.fleet, &plate, customer, start)
    }

    /// Close a rental and return its cost breakdown
    pub fn end_rental(
        &mut self,
        rental_id: &str,
        end: NaiveDate,
        distance: f64,
        fuel_deficit: f64,
    ) -> RegistryResult<RentalCharge> {
        let usage = RentalUsage {
            distance,
            fuel_deficit,
        };
        self.rentals.close(&self.fleet, rental_id, end, usage).copied()
    }

    pub fn rental(&self, rental_id: &str) -> RegistryResult<&Rental> {
        self.rentals.get(rental_id)
    }

    pub fn rentals(&self) -> &[Rental] {
        self.rentals.all()
    }

    pub fn active_rentals(&self) -> Vec<&Rental> {
        self.rentals.active()
    }

    pub fn closed_rentals(&self) -> Vec<&Rental> {
        self.rentals.closed()
    }

    pub fn history_for(&self, plate: &str) -> Vec<&Rental> {
        self.rentals.history_for(&plate.to_string())
    }

    /// Sum of every closed rental's total
    pub fn revenue(&self) -> f64 {
        let totals = self
            .rentals
            .closed()
            .into_iter()
            .filter_map(|r| r.total().ok())
            .map(|charge| charge.total);
        Aggregation::Sum.apply(totals).unwrap_or(0.0)
    }

    pub fn statement(&self, rental_id: &str) -> RegistryResult<RentalStatement> {
        let rental = self.rentals.get(rental_id)?;
        let charge = *rental.total()?;
        let vehicle = self.fleet.get(rental.record())?;
        let usage = rental.usage().copied().unwrap_or_default();
        let end = rental.closed_on().unwrap_or_else(|| rental.opened_on());

        Ok(RentalStatement {
            rental_id: rental.id().to_string(),
            plate: vehicle.plate().to_string(),
            vehicle: format!("{} {}", vehicle.make(), vehicle.model()),
            customer: rental.counterparty().to_string(),
            start: rental.opened_on(),
            end,
            distance: usage.distance,
            fuel_deficit: usage.fuel_deficit,
            charge,
        })
    }

    pub fn count_by_status(&self, status: SessionStatus) -> usize {
        self.rentals.all().iter().filter(|r| r.status() == status).count()
    }

    fn resolve_plate(&self, plate: &str) -> RegistryResult<String> {
        self.fleet
            .find_by_plate(plate)
            .map(|v| v.plate().to_string())
            .ok_or_else(|| RegistryError::not_found(Vehicle::KIND, plate))
    }
}

/// Demo fleet used by the CLI and the server when no CSV is given
pub fn sample_fleet(rental: &RentalConfig) -> RegistryResult<Vec<Vehicle>> {
    let spec = |plate: &str, serial: u32, make: &str, model: &str, cc: u32, year: u32, tank: f64| VehicleSpec {
        plate: plate.to_string(),
        serial,
        make: make.to_string(),
        model: model.to_string(),
        displacement_cc: cc,
        purchase_year: year,
        tank_capacity: tank,
    };

    Ok(vec![
        Vehicle::car(spec("AB123CD", 1, "Fiat", "Panda", 1200, 2021, 37.0), 5, rental.car)?,
        Vehicle::car(spec("EF456GH", 2, "Volkswagen", "Golf", 1500, 2022, 50.0), 5, rental.car)?,
        Vehicle::car(spec("IJ789KL", 3, "Toyota", "Yaris", 1000, 2023, 36.0), 4, rental.car)?,
        Vehicle::van(
            spec("MN012OP", 4, "Iveco", "Daily", 2300, 2019, 90.0),
            1500.0,
            rental.van_free_distance,
            rental.van,
        )?,
        Vehicle::van(
            spec("QR345ST", 5, "Ford", "Transit", 2000, 2020, 80.0),
            1100.0,
            rental.van_free_distance,
            rental.van,
        )?,
    ])
}
