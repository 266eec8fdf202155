pub mod error;
pub mod totem_repo;
