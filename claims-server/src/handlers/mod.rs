pub mod annotations;
pub mod claims;
pub mod dashboard;
pub mod health;
pub mod uploads;
