use anyhow::Result;
use inquire::{CustomType, Select, Text};
use std::fmt;

use condo_core::{Place, Tenant};

/// Entries of the interactive main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    RegisterPayment,
    ReservePlace,
    CancelReservation,
    ListParkingSpots,
    ListPayments,
    ListReservations,
    ListTenants,
    Exit,
}

impl MenuAction {
    pub fn all() -> Vec<MenuAction> {
        vec![
            MenuAction::RegisterPayment,
            MenuAction::ReservePlace,
            MenuAction::CancelReservation,
            MenuAction::ListParkingSpots,
            MenuAction::ListPayments,
            MenuAction::ListReservations,
            MenuAction::ListTenants,
            MenuAction::Exit,
        ]
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuAction::RegisterPayment => write!(f, "Register payment"),
            MenuAction::ReservePlace => write!(f, "Reserve place"),
            MenuAction::CancelReservation => write!(f, "Cancel reservation"),
            MenuAction::ListParkingSpots => write!(f, "List parking spots"),
            MenuAction::ListPayments => write!(f, "List payments"),
            MenuAction::ListReservations => write!(f, "List reservations"),
            MenuAction::ListTenants => write!(f, "List tenants"),
            MenuAction::Exit => write!(f, "Exit"),
        }
    }
}

pub fn prompt_menu_action() -> Result<MenuAction> {
    let action = Select::new("Main menu:", MenuAction::all())
        .with_page_size(MenuAction::all().len())
        .prompt()?;
    Ok(action)
}

/// Prompts the user to select a tenant from a list
pub fn prompt_select_tenant(tenants: &[Tenant]) -> Result<Tenant> {
    if tenants.is_empty() {
        anyhow::bail!("No tenants loaded");
    }

    let tenant = Select::new("Select the tenant:", tenants.to_vec()).prompt()?;
    Ok(tenant)
}

pub fn prompt_amount() -> Result<f64> {
    let amount = CustomType::<f64>::new("Amount:")
        .with_error_message("Please type a valid number")
        .prompt()?;
    Ok(amount)
}

pub fn prompt_reservation_date() -> Result<String> {
    let date = Text::new("Reservation date (dd/mm/yyyy):").prompt()?;
    Ok(date)
}

pub fn prompt_place() -> Result<Place> {
    let place = Select::new("Place:", Place::all().to_vec()).prompt()?;
    Ok(place)
}

pub fn prompt_reservation_number() -> Result<u32> {
    let number = CustomType::<u32>::new("Reservation number to cancel:")
        .with_error_message("Please type a reservation number")
        .prompt()?;
    Ok(number)
}

/// Waits for ENTER before going back to the menu
pub fn wait_for_enter() {
    if let Err(e) = Text::new("Press ENTER to return to the menu...").prompt() {
        log::debug!("Continue prompt ended with {}", e);
    }
}
