pub mod push;
pub mod repositories;
