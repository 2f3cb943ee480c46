//! Commands for querying [Event]s
use crate::{
    cli::EventCommands,
    output::{self, rows::EventRow},
};
use anyhow::Result;
use libvenue::{Database, event::Event};
use rand::{SeedableRng, rngs::StdRng};

/// Handle the `venuectl events` command and its subcommands
pub(crate) async fn handle_command(command: EventCommands, db: &Database) -> Result<()> {
    match command {
        EventCommands::List { location, output } => {
            let events = Event::load_for_location(location, db).await?;
            println!(
                "{}",
                output::format_seq(events.iter().map(EventRow::new), output.format)?
            );
            Ok(())
        }
        EventCommands::Random { output } => {
            let mut rng = StdRng::from_entropy();
            match Event::pick_random(&mut rng, db).await? {
                Some(event) => {
                    let row = EventRow::new(&event);
                    println!("{}", output::format_one(row, output.format)?);
                }
                None => println!("No events"),
            }
            Ok(())
        }
    }
}
