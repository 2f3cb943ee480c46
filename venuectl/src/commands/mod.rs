pub(crate) mod admin;
pub(crate) mod events;
pub(crate) mod locations;
