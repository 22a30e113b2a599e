use clap::{ArgAction, Parser, Subcommand};
use sispm_usb::outlet::Outlet;

#[derive(Parser, Debug)]
#[command(about, version, author)]
pub struct Cli {
    /// The specific device's serial number to execute commands on.
    /// This field is optional if you have exactly one outlet device, but required if you have more.
    #[arg(long, env = "SISPM_SERIAL", global = true)]
    pub serial: Option<String>,

    /// Keep the device claimed for the whole command, releasing it once at the end
    #[arg(long, global = true)]
    pub hold: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: SubCommands,
}

#[derive(Subcommand, Debug)]
pub enum SubCommands {
    /// List every connected outlet device
    List,

    /// Show the details of a device
    Info,

    /// Show whether an outlet is powered
    Status {
        /// Outlet number, or 'all'
        #[arg(default_value = "all", value_parser = parse_outlet)]
        outlet: Outlet,
    },

    /// Power an outlet on
    On {
        /// Outlet number, or 'all'
        #[arg(value_parser = parse_outlet)]
        outlet: Outlet,
    },

    /// Power an outlet off
    Off {
        /// Outlet number, or 'all'
        #[arg(value_parser = parse_outlet)]
        outlet: Outlet,
    },

    /// Flip the power state of an outlet
    Toggle {
        /// Outlet number, or 'all'
        #[arg(value_parser = parse_outlet)]
        outlet: Outlet,
    },
}

fn parse_outlet(value: &str) -> Result<Outlet, String> {
    value.parse().map_err(|error: sispm_usb::error::OutletError| error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_outlet_commands() {
        let cli = Cli::try_parse_from(["sispm", "--serial", "01:02:03:04:05:06", "on", "3"]).unwrap();
        assert_eq!(cli.serial.as_deref(), Some("01:02:03:04:05:06"));
        assert!(matches!(cli.command, SubCommands::On { outlet: Outlet::Number(3) }));

        let cli = Cli::try_parse_from(["sispm", "toggle", "all", "--hold"]).unwrap();
        assert!(cli.hold);
        assert!(matches!(cli.command, SubCommands::Toggle { outlet: Outlet::All }));
    }

    #[test]
    fn status_defaults_to_all() {
        let cli = Cli::try_parse_from(["sispm", "-vv", "status"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, SubCommands::Status { outlet: Outlet::All }));
    }

    #[test]
    fn rejects_bad_outlets() {
        assert!(Cli::try_parse_from(["sispm", "off", "kitchen"]).is_err());
        assert!(Cli::try_parse_from(["sispm", "on"]).is_err());
    }
}
