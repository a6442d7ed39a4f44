use std::sync::Arc;

use poem_openapi::Tags;

use crate::application::usecases::{
    bind_device::BindDeviceUseCase, list_deliveries::ListDeliveriesUseCase,
};

#[derive(Clone)]
pub struct ApiState {
    pub list_deliveries_usecase: Arc<ListDeliveriesUseCase>,
    pub bind_device_usecase: Arc<BindDeviceUseCase>,
}

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Deliveries,
    Devices,
}
