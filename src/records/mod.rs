// 🧩 Record Families
// Each family = shared attribute struct + variant payload, dispatched by match

pub mod computer;
pub mod expense;
pub mod payment;
pub mod publication;
pub mod railcar;
pub mod vehicle;

pub use computer::{Computer, ComputerKey, ComputerSpec, ComputerType, FormFactor, Inventory, Portable};
pub use expense::{Expense, ExpenseReport, Ledger};
pub use payment::{charge_all, charge_payer, Payer, PaymentKind, PaymentMethod, PaymentType, Receipt, Wallet};
pub use publication::{Catalog, LoanSummary, Publication, PublicationDetails, PublicationKind, PublicationType};
pub use railcar::{Railcar, RailcarKind, RailcarType, Train};
pub use vehicle::{
    Fleet, RentalCharge, RentalTariff, RentalUsage, Vehicle, VehicleKind, VehicleSpec, VehicleType,
};
