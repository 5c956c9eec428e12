//! SeaORM entity definitions for PostgreSQL database.

pub mod credit;
pub mod studio;
pub mod studio_image;
