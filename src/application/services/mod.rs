pub mod batch_dispatcher;
pub mod delivery_recorder;
pub mod payload_builder;
pub mod push;
pub mod recipient_resolver;
