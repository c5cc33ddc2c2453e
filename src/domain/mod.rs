//! Business rules that do not touch the database.

pub mod catalog;
pub mod delivery;
pub mod numbering;
pub mod packages;
pub mod pricing;
pub mod rating;
pub mod status;
