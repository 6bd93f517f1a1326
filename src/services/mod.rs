pub mod campaigns;
pub mod media;
pub mod notifications;
pub mod orders;
pub mod payouts;
pub mod pricing;
pub mod settlement;
pub mod wallet;
