//! Commands for querying [Location]s
use crate::{
    cli::LocationCommands,
    output::{
        self,
        rows::{LocationRow, LocationRowDetails},
    },
};
use anyhow::Result;
use libvenue::{
    Database,
    Error::DatabaseError,
    geo::DEFAULT_REFERENCE,
    location::{Location, LocationDetail, LocationQuery, LocationQueryParams},
};
use tracing::debug;

/// Handle the `venuectl locations` command and its subcommands
pub(crate) async fn handle_command(command: LocationCommands, db: &Database) -> Result<()> {
    match command {
        LocationCommands::List {
            keyword,
            area,
            distance,
            lat,
            lng,
            sort,
            output,
        } => {
            let params = LocationQueryParams {
                keyword,
                area,
                distance,
                lat,
                lng,
                sort,
            };
            let query = LocationQuery::from_params(&params, DEFAULT_REFERENCE);
            debug!(?query, "Querying locations");
            let locations = Location::query(&query, db).await?;
            let rows = locations.iter().map(|loc| LocationRow::new(loc, &query));
            println!("{}", output::format_seq(rows, output.format)?);
            Ok(())
        }
        LocationCommands::Show { id, output } => match LocationDetail::load(id, db).await {
            Ok(detail) => {
                let row = LocationRowDetails::new(&detail.location, &detail.events);
                println!("{}", output::format_one(row, output.format)?);
                Ok(())
            }
            Err(DatabaseError(sqlx::Error::RowNotFound)) => {
                println!("Location {id} not found");
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
        LocationCommands::Search { text, output } => {
            let locations = Location::search(&text, db).await?;
            // search results have no meaningful reference point of their own
            let query =
                LocationQuery::from_params(&LocationQueryParams::default(), DEFAULT_REFERENCE);
            let rows = locations.iter().map(|loc| LocationRow::new(loc, &query));
            println!("{}", output::format_seq(rows, output.format)?);
            Ok(())
        }
    }
}
