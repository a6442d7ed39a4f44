pub mod bind_device;
pub mod list_deliveries;
