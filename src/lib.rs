// Record Registry - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod error;
pub mod validation;
pub mod ids;
pub mod registry;  // Ordered collection + aggregates
pub mod session;   // OPEN → CLOSED agreements
pub mod records;   // Record families (vehicle, publication, payment, ...)
pub mod rental;    // Rental desk: fleet + rentals
pub mod library;   // Library: catalog + loans
pub mod config;
pub mod import;
pub mod logging;

// Re-export commonly used types
pub use error::{RegistryError, RegistryResult, StateError, ValidationError};
pub use ids::IdGenerator;
pub use registry::{Aggregation, Record, Registry};
pub use session::{Period, Session, SessionLedger, SessionOf, SessionStatus, Settle};
pub use records::{
    Computer, ComputerKey, ComputerSpec, ComputerType, FormFactor, Inventory, Portable,
    Expense, ExpenseReport, Ledger,
    Payer, PaymentKind, PaymentMethod, PaymentType, Receipt, Wallet,
    Catalog, LoanSummary, Publication, PublicationDetails, PublicationKind, PublicationType,
    Railcar, RailcarKind, RailcarType, Train,
    Fleet, RentalCharge, RentalTariff, RentalUsage, Vehicle, VehicleKind, VehicleSpec, VehicleType,
};
pub use rental::{Rental, RentalDesk, RentalStatement};
pub use library::{Library, Loan};
pub use config::RegistryConfig;
pub use logging::{init_logging, LogFormat};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
