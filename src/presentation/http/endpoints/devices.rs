use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{OpenApi, param::Path, payload::Json};
use uuid::Uuid;

use crate::{
    application::usecases::bind_device::BindDeviceRequest,
    domain::errors::DomainError,
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::map_user_device,
        requests::BindDeviceRequestDto,
        responses::UserDeviceDto,
    },
};

#[derive(Clone)]
pub struct DevicesEndpoints {
    state: Arc<ApiState>,
}

impl DevicesEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl DevicesEndpoints {
    /// Binds the caller's push device. Other accounts holding the same
    /// device lose it, and the previously bound device is signed out.
    #[oai(
        path = "/users/:user_id/device",
        method = "put",
        tag = EndpointsTags::Devices,
    )]
    pub async fn bind_device(
        &self,
        user_id: Path<Uuid>,
        request: Json<BindDeviceRequestDto>,
    ) -> PoemResult<Json<UserDeviceDto>> {
        let user = self
            .state
            .bind_device_usecase
            .execute(BindDeviceRequest {
                user_id: user_id.0,
                push_id: request.push_id.clone(),
            })
            .await
            .map_err(map_error)?;

        Ok(Json(map_user_device(&user)))
    }
}

fn map_error(err: anyhow::Error) -> poem::Error {
    let status = match err.downcast_ref::<DomainError>() {
        Some(DomainError::Validation(_)) => poem::http::StatusCode::BAD_REQUEST,
        Some(DomainError::NotFound(_)) => poem::http::StatusCode::NOT_FOUND,
        _ => poem::http::StatusCode::INTERNAL_SERVER_ERROR,
    };
    poem::Error::from_string(err.to_string(), status)
}
