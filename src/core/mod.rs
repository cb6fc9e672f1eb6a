pub mod error;
pub mod inventory;
pub mod manager;
pub mod multigroup;
pub mod regions;
pub mod types;
