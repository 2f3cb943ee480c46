use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use libvenue::user::Role;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub(crate) struct Cli {
    #[arg(
        short,
        long,
        global = true,
        help = "Path to the venue database (defaults to the one used by venueweb)"
    )]
    pub(crate) database: Option<PathBuf>,
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct OutputArgs {
    #[arg(short = 'o', long = "output", value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    #[command(about = "Administrative commands")]
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
    #[command(about = "Query locations")]
    Locations {
        #[command(subcommand)]
        command: LocationCommands,
    },
    #[command(about = "Query events")]
    Events {
        #[command(subcommand)]
        command: EventCommands,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum AdminCommands {
    #[command(about = "Manage users")]
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
    #[command(about = "Manage the database")]
    Database {
        #[command(subcommand)]
        command: DatabaseCommands,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum DatabaseCommands {
    #[command(about = "Create a new database with an administrator account")]
    Init {
        #[arg(long, help = "Username for the administrator account")]
        admin_user: Option<String>,
        #[arg(long, help = "Email address for the administrator account")]
        admin_email: Option<String>,
        #[arg(long, help = "File containing the administrator's password")]
        passwordfile: Option<PathBuf>,
        #[arg(long, help = "JSON file with venues to add to the new database")]
        venues: Option<PathBuf>,
    },
    #[command(about = "Add venues and their events from a JSON file")]
    Seed {
        #[arg(help = "JSON file containing an array of venues")]
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum UserCommands {
    #[command(about = "List all users")]
    List {
        #[command(flatten)]
        output: OutputArgs,
    },
    #[command(about = "Add a new user to the database")]
    Add {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long, default_value_t = Role::User)]
        role: Role,
        #[arg(long, help = "File containing the new user's password")]
        passwordfile: Option<PathBuf>,
    },
    #[command(about = "Remove an existing user from the database")]
    Remove {
        id: i64,
        #[arg(short, long, help = "Don't ask for confirmation")]
        yes: bool,
    },
    #[command(
        about = "Modify properties of a user",
        group(
            clap::ArgGroup::new("modify")
                .required(true)
                .multiple(true)
                .args(&["username", "email", "role", "change_password"]),
        ))]
    Modify {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<Role>,
        #[arg(long)]
        change_password: bool,
        #[arg(long, requires = "change_password")]
        passwordfile: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum LocationCommands {
    #[command(about = "List locations, optionally filtered and sorted")]
    List {
        #[arg(short, long, help = "Only show locations whose name contains this text")]
        keyword: Option<String>,
        #[arg(short, long, help = "Only show locations in this area")]
        area: Option<String>,
        #[arg(
            short = 'r',
            long,
            help = "Only show locations within this many kilometers of the reference point"
        )]
        distance: Option<String>,
        #[arg(long, allow_hyphen_values = true, help = "Latitude of the reference point")]
        lat: Option<String>,
        #[arg(long, allow_hyphen_values = true, help = "Longitude of the reference point")]
        lng: Option<String>,
        #[arg(short, long, help = "Sort order: name, distance or events")]
        sort: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    #[command(about = "Show a location and its events")]
    Show {
        id: i64,
        #[command(flatten)]
        output: OutputArgs,
    },
    #[command(about = "Search for locations by name or area")]
    Search {
        text: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum EventCommands {
    #[command(about = "List the events at a location")]
    List {
        #[arg(short, long)]
        location: i64,
        #[command(flatten)]
        output: OutputArgs,
    },
    #[command(about = "Pick an event at random")]
    Random {
        #[command(flatten)]
        output: OutputArgs,
    },
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
    fn test_parse_location_list() {
        let cli = Cli::try_parse_from([
            "venuectl",
            "locations",
            "list",
            "--keyword",
            "hall",
            "--lat",
            "-22.5",
            "--sort",
            "events",
            "-r",
            "5",
            "-d",
            "venues.sqlite",
            "-o",
            "json",
        ])
        .expect("failed to parse");
        assert_eq!(cli.database, Some(PathBuf::from("venues.sqlite")));
        let Commands::Locations {
            command:
                LocationCommands::List {
                    keyword,
                    distance,
                    lat,
                    sort,
                    output,
                    ..
                },
        } = cli.command
        else {
            panic!("unexpected command");
        };
        assert_eq!(keyword.as_deref(), Some("hall"));
        assert_eq!(distance.as_deref(), Some("5"));
        assert_eq!(lat.as_deref(), Some("-22.5"));
        assert_eq!(sort.as_deref(), Some("events"));
        assert_eq!(output.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_admin() {
        let cli = Cli::try_parse_from([
            "venuectl",
            "--database",
            "/tmp/venues.sqlite",
            "admin",
            "users",
            "add",
            "--username",
            "curator",
            "--role",
            "ADMIN",
        ])
        .expect("failed to parse");
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/venues.sqlite")));
        let Commands::Admin {
            command:
                AdminCommands::Users {
                    command: UserCommands::Add { username, role, .. },
                },
        } = cli.command
        else {
            panic!("unexpected command");
        };
        assert_eq!(username.as_deref(), Some("curator"));
        assert_eq!(role, Role::Admin);

        // modify needs something to modify
        assert!(
            Cli::try_parse_from(["venuectl", "admin", "users", "modify", "--id", "3"]).is_err()
        );
        assert!(
            Cli::try_parse_from(["venuectl", "admin", "database", "seed", "venues.json"]).is_ok()
        );
    }
}
