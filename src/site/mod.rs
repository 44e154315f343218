pub mod front_matter;
pub mod page;
