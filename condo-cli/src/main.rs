mod cli;
mod prompts;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use colored::Colorize;
use inquire::InquireError;

use condo_core::{
    determine_data_paths, validate_reservation_date, DomainError, Place, RecordStore, Repository,
    StoreError, Tenant,
};

use crate::cli::{Cli, Command};
use crate::prompts::MenuAction;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Determine where the store files live
    let paths = determine_data_paths(cli.data_dir.as_deref())
        .context("Failed to resolve the data directory")?;
    log::debug!("Using data files {:?}", paths);

    let (mut repo, load_errors) = Repository::open(&paths);
    for error in &load_errors {
        println!("{}", format!("Error loading data: {}", error).red());
    }

    match cli.command {
        None | Some(Command::Menu) => run_menu(&mut repo),
        Some(Command::Pay {
            tenant,
            amount,
            interactive,
        }) => {
            if interactive || (tenant.is_none() && amount.is_none()) {
                register_payment_interactive(&mut repo)
            } else {
                let tenant = tenant.context("--tenant is required")?;
                let amount = amount.context("--amount is required")?;
                register_payment_cli(&mut repo, &tenant, amount)
            }
        }
        Some(Command::Reserve {
            date,
            tenant,
            place,
            interactive,
        }) => {
            if interactive || (date.is_none() && tenant.is_none() && place.is_none()) {
                reserve_place_interactive(&mut repo)
            } else {
                let date = date.context("--date is required")?;
                let tenant = tenant.context("--tenant is required")?;
                let place = place.context("--place is required")?;
                reserve_place_cli(&mut repo, &date, &tenant, &place)
            }
        }
        Some(Command::Cancel { number }) => {
            let number = match number {
                Some(n) => n,
                None => prompts::prompt_reservation_number()?,
            };
            cancel_reservation(&mut repo, number)
        }
        Some(Command::Spots) => {
            list_parking_spots(&repo);
            Ok(())
        }
        Some(Command::Payments) => print_log("Payments", repo.payment_log()),
        Some(Command::Reservations) => print_log("Reservations", repo.reservation_log()),
        Some(Command::Tenants) => {
            list_tenants(repo.tenants());
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_title(title: &str) {
    println!("\n{}", format!("==== {} ====", title).bold());
}

fn run_menu(repo: &mut Repository) -> Result<()> {
    loop {
        println!();
        let action = match prompts::prompt_menu_action() {
            Ok(action) => action,
            Err(e) if is_cancellation(&e) => MenuAction::Exit,
            Err(e) => return Err(e),
        };

        let result = match action {
            MenuAction::RegisterPayment => register_payment_interactive(repo),
            MenuAction::ReservePlace => reserve_place_interactive(repo),
            MenuAction::CancelReservation => prompts::prompt_reservation_number()
                .and_then(|number| cancel_reservation(repo, number)),
            MenuAction::ListParkingSpots => {
                list_parking_spots(repo);
                Ok(())
            }
            MenuAction::ListPayments => print_log("Payments", repo.payment_log()),
            MenuAction::ListReservations => print_log("Reservations", repo.reservation_log()),
            MenuAction::ListTenants => {
                list_tenants(repo.tenants());
                Ok(())
            }
            MenuAction::Exit => {
                println!("Exiting...");
                return Ok(());
            }
        };

        match result {
            Ok(()) => {}
            Err(e) if is_cancellation(&e) => println!("{}", "Cancelled.".yellow()),
            Err(e) => println!("{}", format!("Error: {:#}", e).red()),
        }

        prompts::wait_for_enter();
    }
}

fn is_cancellation(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<InquireError>(),
        Some(InquireError::OperationCanceled) | Some(InquireError::OperationInterrupted)
    )
}

fn register_payment_interactive(repo: &mut Repository) -> Result<()> {
    print_title("Register Payment");

    let tenant = prompts::prompt_select_tenant(repo.tenants())?;
    let amount = prompts::prompt_amount()?;

    register_payment(repo, &tenant, amount)
}

fn register_payment_cli(repo: &mut Repository, national_id: &str, amount: f64) -> Result<()> {
    let tenant = find_tenant(repo, national_id)?;
    register_payment(repo, &tenant, amount)
}

fn register_payment(repo: &mut Repository, tenant: &Tenant, amount: f64) -> Result<()> {
    let payment = repo.new_payment(tenant, amount, today())?;
    let spot_number = payment.spot_number;

    repo.register_payment(payment)
        .context("Failed to register payment")?;

    println!(
        "{}",
        format!("Payment registered. Parking spot N°{} is now paid.", spot_number).green()
    );
    Ok(())
}

fn reserve_place_interactive(repo: &mut Repository) -> Result<()> {
    print_title("Reserve Place");

    // Validate the date before asking anything else
    let date_input = prompts::prompt_reservation_date()?;
    let date = validate_reservation_date(&date_input, today())?;

    let tenant = prompts::prompt_select_tenant(repo.tenants())?;
    let place = prompts::prompt_place()?;

    reserve_place(repo, date, &tenant, place)
}

fn reserve_place_cli(
    repo: &mut Repository,
    date_input: &str,
    national_id: &str,
    place_input: &str,
) -> Result<()> {
    let date = validate_reservation_date(date_input, today())?;
    let place: Place = place_input.parse()?;
    let tenant = find_tenant(repo, national_id)?;

    reserve_place(repo, date, &tenant, place)
}

fn reserve_place(repo: &mut Repository, date: NaiveDate, tenant: &Tenant, place: Place) -> Result<()> {
    let reservation = repo.new_reservation(date, tenant, place)?;
    let number = reservation.number;

    repo.register_reservation(reservation)
        .context("Failed to save reservation")?;

    println!(
        "{}",
        format!("Reservation N°{} created for {} ({}).", number, tenant.full_name(), place).green()
    );
    Ok(())
}

fn cancel_reservation(repo: &mut Repository, number: u32) -> Result<()> {
    print_title("Cancel Reservation");

    repo.cancel_reservation(number)?;
    println!("{}", format!("Reservation N°{} cancelled.", number).green());
    Ok(())
}

fn find_tenant(repo: &Repository, national_id: &str) -> Result<Tenant> {
    let tenant = repo
        .find_tenant_by_national_id(national_id)
        .cloned()
        .ok_or_else(|| DomainError::TenantNotFound(national_id.to_string()))?;
    Ok(tenant)
}

fn list_parking_spots(repo: &Repository) {
    print_title("Parking Spots");

    let mut empty = true;
    for spot in repo.parking_spots() {
        empty = false;
        let line = spot.to_string();
        if spot.paid {
            println!("{}", line.green());
        } else {
            println!("{}", line.yellow());
        }
    }

    if empty {
        println!("{}", "No parking spots found.".yellow());
    }

    for spot in repo.unresolved_spots() {
        println!("{}", format!("Warning: {}", spot).red());
    }
}

fn list_tenants(tenants: &[Tenant]) {
    print_title("Tenants");

    if tenants.is_empty() {
        println!("{}", "No tenants found.".yellow());
        return;
    }

    for (i, tenant) in tenants.iter().enumerate() {
        println!("{}. {}", i + 1, tenant);
    }
}

/// Prints every line of a log store
fn print_log(title: &str, store: &RecordStore) -> Result<()> {
    print_title(title);

    let lines = match store.read_all() {
        Ok(lines) => lines,
        Err(StoreError::NotFound { .. }) => {
            println!("{}", "No records yet.".yellow());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    for line in lines {
        let line = line.with_context(|| format!("Failed to read {:?}", store.path()))?;
        println!("{}", line);
    }

    Ok(())
}
