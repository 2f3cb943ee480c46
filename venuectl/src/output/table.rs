use tabled::{Table, settings::Style};

/// The table style used for all of the tool's output
pub(crate) trait VenuectlTable {
    fn styled(&mut self) -> &mut Self;
}

impl VenuectlTable for Table {
    fn styled(&mut self) -> &mut Self {
        self.with(Style::psql())
    }
}
