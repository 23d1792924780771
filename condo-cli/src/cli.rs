use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Tenant, parking, payment and amenity records for a residential building")]
pub struct Cli {
    /// Directory holding the store files (overrides CONDO_DATA_DIR and the config file)
    #[clap(long, short = 'd')]
    pub data_dir: Option<PathBuf>,

    /// Log storage activity to stderr
    #[clap(long, short = 'v')]
    pub verbose: bool,

    /// Command to run; opens the interactive menu when omitted
    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the interactive menu
    Menu,

    /// Register a parking payment for a tenant
    Pay {
        /// National id of the paying tenant
        #[clap(long)]
        tenant: Option<String>,

        /// Amount paid
        #[clap(long)]
        amount: Option<f64>,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// Reserve a shared amenity
    Reserve {
        /// Reservation date (dd/mm/yyyy)
        #[clap(long)]
        date: Option<String>,

        /// National id of the tenant making the reservation
        #[clap(long)]
        tenant: Option<String>,

        /// Place to reserve (grill, hall, pool)
        #[clap(long)]
        place: Option<String>,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// Cancel a reservation by number
    Cancel {
        /// Reservation number; prompted for when omitted
        number: Option<u32>,
    },

    /// List parking spots and their payment status
    Spots,

    /// Print the payment log
    Payments,

    /// Print the reservation log
    Reservations,

    /// List tenants
    Tenants,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_opens_menu() {
        let cli = Cli::try_parse_from(["condo"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.data_dir.is_none());
    }

    #[test]
    fn test_parse_pay() {
        let cli = Cli::try_parse_from([
            "condo", "--data-dir", "/tmp/building", "pay", "--tenant", "111", "--amount", "2500.5",
        ])
        .unwrap();

        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/building")));
        match cli.command {
            Some(Command::Pay { tenant, amount, interactive }) => {
                assert_eq!(tenant.as_deref(), Some("111"));
                assert_eq!(amount, Some(2500.5));
                assert!(!interactive);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_cancel_number() {
        let cli = Cli::try_parse_from(["condo", "cancel", "3"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Cancel { number: Some(3) })));
    }
}
