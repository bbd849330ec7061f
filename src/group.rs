pub mod index;
pub mod table;
