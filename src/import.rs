// 📥 CSV Import
// Seed data for the fleet, the library catalog and the expense ledger
//
// Every row goes through the validating constructors; a bad row aborts the
// import with its line number in the error chain. Rows are applied to a
// staged copy that replaces the target only once every row is accepted, so
// a failed import leaves the target (ids included) untouched.

use crate::config::RentalConfig;
use crate::library::Library;
use crate::records::expense::Ledger;
use crate::records::publication::PublicationDetails;
use crate::records::vehicle::{Vehicle, VehicleSpec};
use crate::rental::RentalDesk;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

/// One fleet row: `kind` is `car` or `van`
#[derive(Debug, Clone, Deserialize)]
pub struct FleetRow {
    pub kind: String,
    pub plate: String,
    pub serial: u32,
    pub make: String,
    pub model: String,
    pub displacement_cc: u32,
    pub purchase_year: u32,
    pub tank_capacity: f64,
    pub seats: Option<u32>,
    pub payload_kg: Option<f64>,
}

/// One catalog row: `kind` is `book` or `magazine`
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRow {
    pub kind: String,
    pub title: String,
    pub published_on: NaiveDate,
    pub pages: u32,
    pub isbn: Option<String>,
    pub author: Option<String>,
    pub issue: Option<u32>,
    pub frequency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseRow {
    pub category: String,
    pub date: Option<NaiveDate>,
    pub amount: f64,
    pub payment_method: String,
}

/// Deserialize every row, tagging each with its 1-based file line
fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<(usize, T)>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let mut rows = Vec::new();
    for (index, result) in rdr.deserialize().enumerate() {
        let line = index + 2;
        let row: T = result.with_context(|| format!("Failed to deserialize line {}", line))?;
        rows.push((line, row));
    }

    Ok(rows)
}

impl FleetRow {
    pub fn into_vehicle(self, rental: &RentalConfig) -> Result<Vehicle> {
        let kind = self.kind.trim().to_lowercase();
        let spec = VehicleSpec {
            plate: self.plate,
            serial: self.serial,
            make: self.make,
            model: self.model,
            displacement_cc: self.displacement_cc,
            purchase_year: self.purchase_year,
            tank_capacity: self.tank_capacity,
        };

        let vehicle = match kind.as_str() {
            "car" => {
                let seats = self.seats.context("car row without seats")?;
                Vehicle::car(spec, seats, rental.car)?
            }
            "van" => {
                let payload = self.payload_kg.context("van row without payload_kg")?;
                Vehicle::van(spec, payload, rental.van_free_distance, rental.van)?
            }
            other => bail!("Unknown vehicle kind: {}", other),
        };

        Ok(vehicle)
    }
}

pub fn load_fleet(path: &Path, rental: &RentalConfig) -> Result<Vec<Vehicle>> {
    read_rows::<FleetRow>(path)?
        .into_iter()
        .map(|(line, row)| row.into_vehicle(rental).with_context(|| format!("Invalid vehicle on line {}", line)))
        .collect()
}

/// Load vehicles into the desk, returning how many were added
pub fn import_fleet(desk: &mut RentalDesk, path: &Path, rental: &RentalConfig) -> Result<usize> {
    let vehicles = load_fleet(path, rental)?;
    let count = vehicles.len();
    let mut staged = desk.clone();

    for vehicle in vehicles {
        let plate = vehicle.plate().to_string();
        staged
            .add_vehicle(vehicle)
            .with_context(|| format!("Failed to add vehicle {}", plate))?;
    }

    *desk = staged;
    tracing::info!(count, path = %path.display(), "fleet imported");
    Ok(count)
}

pub fn import_catalog(library: &mut Library, path: &Path) -> Result<usize> {
    let rows = read_rows::<CatalogRow>(path)?;
    let count = rows.len();
    let mut staged = library.clone();

    for (line, row) in rows {
        let details = PublicationDetails {
            title: row.title,
            published_on: row.published_on,
            pages: row.pages,
        };

        let added = match row.kind.trim().to_lowercase().as_str() {
            "book" => {
                let isbn = row.isbn.unwrap_or_default();
                let author = row.author.unwrap_or_default();
                staged.add_book(details, &isbn, &author)
            }
            "magazine" => {
                let issue = row.issue.unwrap_or_default();
                let frequency = row.frequency.unwrap_or_default();
                staged.add_magazine(details, issue, &frequency)
            }
            other => bail!("Unknown publication kind on line {}: {}", line, other),
        };
        added.with_context(|| format!("Invalid publication on line {}", line))?;
    }

    *library = staged;
    tracing::info!(count, path = %path.display(), "catalog imported");
    Ok(count)
}

pub fn import_expenses(ledger: &mut Ledger, path: &Path) -> Result<usize> {
    let rows = read_rows::<ExpenseRow>(path)?;
    let count = rows.len();
    let mut staged = ledger.clone();

    for (line, row) in rows {
        staged
            .record_expense(&row.category, row.date, row.amount, &row.payment_method)
            .with_context(|| format!("Invalid expense on line {}", line))?;
    }

    *ledger = staged;
    tracing::info!(count, path = %path.display(), "expenses imported");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LibraryConfig;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_import_fleet() {
        let file = csv_file(
            "kind,plate,serial,make,model,displacement_cc,purchase_year,tank_capacity,seats,payload_kg\n\
             car,AB123CD,1,Fiat,Panda,1200,2021,40,5,\n\
             van,VAN001,2,Iveco,Daily,2300,2019,80,,1500\n",
        );

        let mut desk = RentalDesk::new("Test").unwrap();
        let count = import_fleet(&mut desk, file.path(), &RentalConfig::default()).unwrap();

        assert_eq!(count, 2);
        assert_eq!(desk.cars().len(), 1);
        assert_eq!(desk.vans().len(), 1);
        assert_eq!(desk.find_vehicle(2).and_then(|v| v.payload_kg()), Some(1500.0));
        // van billed with the configured free distance
        assert_eq!(desk.find_vehicle(2).unwrap().rental_cost(1, 130.0, 0.0).unwrap(), 71.0);
    }

    #[test]
    fn test_invalid_fleet_row_reports_line() {
        let file = csv_file(
            "kind,plate,serial,make,model,displacement_cc,purchase_year,tank_capacity,seats,payload_kg\n\
             car,AB123CD,1,Fiat,Panda,1200,2021,40,5,\n\
             car,XY999ZZ,2,Fiat,Uno,1000,1990,0,4,\n",
        );

        let err = load_fleet(file.path(), &RentalConfig::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 3"));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let file = csv_file(
            "kind,plate,serial,make,model,displacement_cc,purchase_year,tank_capacity,seats,payload_kg\n\
             truck,AB123CD,1,Volvo,FH,12000,2021,400,2,\n",
        );
        assert!(load_fleet(file.path(), &RentalConfig::default()).is_err());
    }

    #[test]
    fn test_import_catalog() {
        let file = csv_file(
            "kind,title,published_on,pages,isbn,author,issue,frequency\n\
             book,Dune,1965-08-01,412,9780441013593,Frank Herbert,,\n\
             magazine,Focus,2025-01-01,120,,,300,monthly\n",
        );

        let mut library = Library::new("Civica", LibraryConfig::default()).unwrap();
        assert_eq!(import_catalog(&mut library, file.path()).unwrap(), 2);
        assert_eq!(library.books().len(), 1);
        assert_eq!(library.find(2).map(|p| p.loan_days()), Some(7));
    }

    #[test]
    fn test_import_expenses() {
        let file = csv_file(
            "category,date,amount,payment_method\n\
             food,2025-01-02,12.5,cash\n\
             travel,,80,card\n",
        );

        let mut ledger = Ledger::new();
        assert_eq!(import_expenses(&mut ledger, file.path()).unwrap(), 2);
        assert_eq!(ledger.total_spent(), 92.5);
        assert_eq!(ledger.find(&2).and_then(|e| e.date()), None);
    }

    #[test]
    fn test_failed_expense_import_leaves_ledger_untouched() {
        let file = csv_file(
            "category,date,amount,payment_method\n\
             food,2025-01-02,12.5,cash\n\
             travel,,80,card\n\
             bad,,0,card\n",
        );

        let mut ledger = Ledger::new();
        ledger.record_expense("rent", None, 700.0, "transfer").unwrap();

        let err = import_expenses(&mut ledger, file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 4"));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.ids().peek(), 2);
        assert_eq!(ledger.total_spent(), 700.0);
    }

    #[test]
    fn test_failed_catalog_import_leaves_library_untouched() {
        let file = csv_file(
            "kind,title,published_on,pages,isbn,author,issue,frequency\n\
             book,Dune,1965-08-01,412,9780441013593,Frank Herbert,,\n\
             magazine,Focus,2025-01-01,0,,,300,monthly\n",
        );

        let mut library = Library::new("Civica", LibraryConfig::default()).unwrap();
        assert!(import_catalog(&mut library, file.path()).is_err());
        assert!(library.catalog().is_empty());

        // ids were not consumed by the rejected rows
        let added = library
            .add_magazine(
                PublicationDetails {
                    title: "Focus".to_string(),
                    published_on: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                    pages: 120,
                },
                300,
                "monthly",
            )
            .unwrap();
        assert_eq!(added.id(), 1);
    }

    #[test]
    fn test_duplicate_in_fleet_import_leaves_desk_untouched() {
        let file = csv_file(
            "kind,plate,serial,make,model,displacement_cc,purchase_year,tank_capacity,seats,payload_kg\n\
             car,NEW001,7,Fiat,Panda,1200,2021,40,5,\n\
             car,AB123CD,8,Fiat,Uno,1000,2010,35,4,\n",
        );

        let mut desk = RentalDesk::new("Test").unwrap();
        for vehicle in crate::rental::sample_fleet(&RentalConfig::default()).unwrap() {
            desk.add_vehicle(vehicle).unwrap();
        }
        let before = desk.fleet().len();

        let err = import_fleet(&mut desk, file.path(), &RentalConfig::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("AB123CD"));
        assert_eq!(desk.fleet().len(), before);
        assert!(desk.find_vehicle(7).is_none());
    }

    #[test]
    fn test_missing_file() {
        let mut ledger = Ledger::new();
        assert!(import_expenses(&mut ledger, Path::new("/nonexistent/expenses.csv")).is_err());
    }
}
