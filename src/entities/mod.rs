pub mod campaign;
pub mod earning;
pub mod order;
pub mod profile;
pub mod transaction;
pub mod withdrawal;
