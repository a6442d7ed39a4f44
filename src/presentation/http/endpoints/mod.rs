pub mod deliveries;
pub mod devices;
pub mod health;
pub mod root;
