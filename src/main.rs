use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;

use record_registry::config::RegistryConfig;
use record_registry::records::payment::{charge_all, charge_payer};
use record_registry::records::railcar::Railcar;
use record_registry::rental::sample_fleet;
use record_registry::{
    import, init_logging, Computer, ComputerSpec, FormFactor, Inventory, Ledger, Library, LogFormat, Payer,
    PaymentMethod, Portable, PublicationDetails, RentalDesk, Train, Wallet,
};

const USAGE: &str = "Usage: record-registry [rental|library|inventory|payments|train|expenses|all] \
                     [--config PATH] [--fleet CSV] [--log-format pretty|json]";

struct Options {
    scenario: String,
    config: Option<PathBuf>,
    fleet: Option<PathBuf>,
    log_format: LogFormat,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options {
        scenario: "all".to_string(),
        config: None,
        fleet: None,
        log_format: LogFormat::default(),
    };

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => options.config = Some(PathBuf::from(iter.next().context("--config needs a path")?)),
            "--fleet" => options.fleet = Some(PathBuf::from(iter.next().context("--fleet needs a path")?)),
            "--log-format" => options.log_format = iter.next().context("--log-format needs a value")?.parse()?,
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("Unknown flag: {}\n{}", other, USAGE),
            other => options.scenario = other.to_string(),
        }
    }

    Ok(options)
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args)?;
    init_logging(options.log_format)?;

    let config = RegistryConfig::load(options.config.as_deref())?;

    match options.scenario.as_str() {
        "rental" => run_rental(&config, options.fleet.as_deref())?,
        "library" => run_library(&config)?,
        "inventory" => run_inventory()?,
        "payments" => run_payments(&config)?,
        "train" => run_train(&config)?,
        "expenses" => run_expenses()?,
        "all" => {
            run_rental(&config, options.fleet.as_deref())?;
            run_library(&config)?;
            run_inventory()?;
            run_payments(&config)?;
            run_train(&config)?;
            run_expenses()?;
        }
        other => bail!("Unknown scenario: {}\n{}", other, USAGE),
    }

    Ok(())
}

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).with_context(|| format!("Invalid date {}-{}-{}", y, m, d))
}

fn header(title: &str) {
    println!("\n{}", title);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

fn run_rental(config: &RegistryConfig, fleet: Option<&std::path::Path>) -> Result<()> {
    header("🚗 Rental Desk");

    let mut desk = RentalDesk::new("AutoNoleggio Roma")?;
    match fleet {
        Some(path) => {
            let count = import::import_fleet(&mut desk, path, &config.rental)?;
            println!("✓ Loaded {} vehicles from {}", count, path.display());
        }
        None => {
            for vehicle in sample_fleet(&config.rental)? {
                desk.add_vehicle(vehicle)?;
            }
            println!("✓ Loaded {} sample vehicles", desk.fleet().len());
        }
    }

    for vehicle in desk.fleet() {
        println!("   {}", vehicle.summary());
    }

    let serials: Vec<u32> = desk.fleet().iter().map(|v| v.serial()).take(2).collect();
    let Some(&first) = serials.first() else {
        println!("⚠️  Empty fleet, nothing to rent");
        return Ok(());
    };

    println!("\n📝 Opening rentals...");
    let first_rental = desk.start_rental(first, "Mario Rossi", date(2025, 6, 1)?)?.id().to_string();
    println!("✓ Vehicle #{} rented to Mario Rossi", first);

    if let Err(e) = desk.start_rental(first, "Luigi Verdi", date(2025, 6, 2)?) {
        println!("✗ Second rental refused: {}", e);
    }

    let second_rental = match serials.get(1) {
        Some(&serial) => Some(desk.start_rental(serial, "Anna Bianchi", date(2025, 6, 2)?)?.id().to_string()),
        None => None,
    };
    println!("✓ Available now: {}", desk.available_vehicles().len());

    println!("\n🔒 Closing rentals...");
    let charge = desk.end_rental(&first_rental, date(2025, 6, 4)?, 200.0, 5.0)?;
    println!(
        "✓ {} days: time {:.2} + distance {:.2} + fuel {:.2} = {:.2}",
        charge.days, charge.time_charge, charge.distance_charge, charge.fuel_charge, charge.total
    );

    if let Some(id) = second_rental {
        let charge = desk.end_rental(&id, date(2025, 6, 2)?, 40.0, 0.0)?;
        println!("✓ Same-day return billed {} day: {:.2}", charge.days, charge.total);
    }

    if let Err(e) = desk.end_rental(&first_rental, date(2025, 6, 5)?, 0.0, 0.0) {
        println!("✗ Double close refused: {}", e);
    }

    let statement = desk.statement(&first_rental)?;
    println!("\n📄 Statement: {}", serde_json::to_string_pretty(&statement)?);
    println!("💰 Revenue: {:.2}", desk.revenue());

    Ok(())
}

fn run_library(config: &RegistryConfig) -> Result<()> {
    header("📚 Library");

    let mut library = Library::new("Biblioteca Civica", config.library.clone())?;
    let details = |title: &str, published: NaiveDate, pages: u32| PublicationDetails {
        title: title.to_string(),
        published_on: published,
        pages,
    };

    let book = library
        .add_book(details("Il nome della rosa", date(1980, 1, 1)?, 503), "9788845292613", "Umberto Eco")?
        .id();
    let magazine = library.add_magazine(details("Focus", date(2025, 5, 1)?, 130), 391, "monthly")?.id();

    for publication in library.catalog() {
        println!("   {}", publication.summary());
    }

    let start = date(2025, 6, 1)?;
    let book_loan = library.lend(book, "Giulia", start)?.id().to_string();
    let magazine_loan = library.lend(magazine, "Paolo", start)?.id().to_string();
    println!("\n✓ Book due on {}", library.due_date(&book_loan)?);
    println!("✓ Magazine due on {}", library.due_date(&magazine_loan)?);

    let summary = library.return_loan(&magazine_loan, date(2025, 6, 10)?)?;
    println!(
        "✓ Magazine returned after {} days ({} overdue)",
        summary.days_held, summary.days_overdue
    );
    println!("📊 On loan: {}, available: {}", library.on_loan().len(), library.available().len());

    let summary = library.return_publication(book, date(2025, 7, 4)?)?;
    println!(
        "✓ Book #{} returned after {} days ({} overdue)",
        book, summary.days_held, summary.days_overdue
    );
    println!("📊 On loan: {}, available: {}", library.on_loan().len(), library.available().len());

    Ok(())
}

fn run_inventory() -> Result<()> {
    header("💻 Computer Inventory");

    let spec = |make: &str, model: &str, ram_gb: u32, os: &str| ComputerSpec {
        make: make.to_string(),
        model: model.to_string(),
        cpu: "x86-64".to_string(),
        ram_gb,
        storage_gb: 512,
        os: os.to_string(),
    };
    let portable = |weight_kg: f64, wifi: bool| Portable {
        weight_kg,
        dimensions: "30x21x1.5 cm".to_string(),
        screen_in: 13.3,
        wifi,
    };

    let mut inventory = Inventory::new();
    inventory.add(Computer::new(
        spec("Dell", "OptiPlex 7000", 16, "Windows"),
        FormFactor::Desktop {
            case_type: "tower".to_string(),
            gpu: "integrated".to_string(),
            audio: "onboard".to_string(),
        },
    )?)?;
    inventory.add(Computer::new(
        spec("HP", "ProLiant DL380", 256, "Linux"),
        FormFactor::Server {
            case_type: "rack 2U".to_string(),
            cpus: 2,
            raid: true,
        },
    )?)?;
    inventory.add(Computer::new(
        spec("Lenovo", "ThinkPad X1", 32, "Linux"),
        FormFactor::Notebook {
            portable: portable(1.12, true),
            webcam_mp: Some(5.0),
        },
    )?)?;
    inventory.add(Computer::new(
        spec("Palm", "Tungsten T5", 1, "PalmOS"),
        FormFactor::Handheld {
            portable: portable(0.16, true),
            bluetooth: true,
            expansion_slot: true,
        },
    )?)?;

    for computer in &inventory {
        println!("   {}", computer.summary());
    }

    println!("\n📊 Linux machines: {}", inventory.by_os("linux").len());
    if let Some(top) = inventory.most_ram() {
        println!("✓ Most RAM: {} ({} GB)", top.model(), top.ram_gb());
    }
    println!("✓ Average RAM: {:.1} GB", inventory.average_ram());
    println!("✓ Portables with wifi: {}", inventory.portables_with_wifi());
    println!("✓ Servers with RAID: {}", inventory.servers_with_raid());
    if let Some(light) = inventory.lightest_notebook() {
        println!("✓ Lightest notebook: {}", light.model());
    }
    println!("✓ Portables under 1 kg with wifi: {}", inventory.portables_under(1.0, true).len());

    Ok(())
}

fn run_payments(config: &RegistryConfig) -> Result<()> {
    header("💳 Payments");

    let rates = &config.payments;
    let mut wallet = Wallet::new();
    wallet.add(PaymentMethod::credit_card("visa", 0.0, "4111111111111111", "12/28", rates.card_rate)?)?;
    wallet.add(PaymentMethod::premium_card("gold", 0.0, "5500000000000004", "01/29", rates.premium_card_rate)?)?;
    wallet.add(PaymentMethod::bank_transfer("iban", 0.0, "IT60X0542811101000000123456", rates.transfer_fee)?)?;

    let payers = vec![
        Payer::new("u1", "Alice", Some("visa"))?,
        Payer::new("u2", "Bruno", Some("iban"))?,
        Payer::new("u3", "Chiara", None)?,
    ];

    for (user, result) in charge_all(&mut wallet, &payers, 120.0) {
        match result {
            Ok(receipt) => println!(
                "✓ {} paid {:.2} + {:.2} commission via {}",
                user,
                receipt.amount,
                receipt.commission,
                receipt.payment_type.as_str()
            ),
            Err(e) => println!("✗ {}: {}", user, e),
        }
    }

    let receipt = charge_payer(&mut wallet, &payers[2], 50.0, Some("gold"))?;
    println!("✓ u3 paid {:.2} total with an explicit method", receipt.total);

    for method in &wallet {
        println!("   {} {} authorized={}", method.id(), method.masked_reference(), method.authorize());
    }

    Ok(())
}

fn run_train(config: &RegistryConfig) -> Result<()> {
    header("🚆 Train Composition");

    let mut train = Train::new("Regionale 2231")?;
    let mut first = Railcar::passenger("P-01", 42_000.0, "Alstom", 2012, 1, 60)?;
    first.set_occupied(48)?;
    let mut second = Railcar::passenger("P-02", 40_000.0, "Alstom", 2012, 2, 80)?;
    second.set_occupied(75)?;
    let mut freight = Railcar::freight("F-01", 22_000.0, "Greenbrier", 1998, 90.0, 60_000.0)?;
    freight.set_load(35_000.0)?;

    train.couple(first)?;
    train.couple(second)?;
    train.couple(freight)?;

    let avg = config.rail.avg_passenger_weight_kg;
    println!("✓ {} passenger + {} freight cars", train.passenger_cars(), train.freight_cars());
    println!("✓ Seats occupied: {}/{}", train.occupied_seats(), train.seat_capacity());
    println!("✓ Total weight: {:.0} kg (avg passenger {:.0} kg)", train.total_weight(avg), avg);

    Ok(())
}

fn run_expenses() -> Result<()> {
    header("🧾 Expense Report");

    let mut ledger = Ledger::new();
    ledger.record_expense("food", Some(date(2025, 6, 1)?), 42.0, "card")?;
    ledger.record_expense("food", Some(date(2025, 6, 3)?), 18.5, "cash")?;
    ledger.record_expense("travel", Some(date(2025, 6, 5)?), 220.0, "card")?;
    ledger.record_expense("books", None, 15.0, "cash")?;

    let report = ledger.report();
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("record-registry")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_parse_args_defaults() {
        let options = parse_args(&args(&[])).unwrap();
        assert_eq!(options.scenario, "all");
        assert!(options.config.is_none());
        assert_eq!(options.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_parse_args_flags() {
        let options = parse_args(&args(&["rental", "--fleet", "fleet.csv", "--log-format", "json"])).unwrap();
        assert_eq!(options.scenario, "rental");
        assert_eq!(options.fleet, Some(PathBuf::from("fleet.csv")));
        assert_eq!(options.log_format, LogFormat::Json);

        assert!(parse_args(&args(&["--config"])).is_err());
        assert!(parse_args(&args(&["--verbose"])).is_err());
    }

    #[test]
    fn test_scenarios_run_with_defaults() {
        let config = RegistryConfig::default();
        run_rental(&config, None).unwrap();
        run_library(&config).unwrap();
        run_inventory().unwrap();
        run_payments(&config).unwrap();
        run_train(&config).unwrap();
        run_expenses().unwrap();
    }
}
