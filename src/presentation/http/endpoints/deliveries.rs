use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{
    OpenApi,
    param::{Path, Query},
    payload::Json,
};
use uuid::Uuid;

use crate::presentation::http::{
    endpoints::root::{ApiState, EndpointsTags},
    mappers::map_delivery,
    responses::PaginatedDeliveriesDto,
};

#[derive(Clone)]
pub struct DeliveriesEndpoints {
    state: Arc<ApiState>,
}

impl DeliveriesEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl DeliveriesEndpoints {
    /// Delivery history of one receiver, newest first.
    #[oai(
        path = "/users/:user_id/deliveries",
        method = "get",
        tag = EndpointsTags::Deliveries,
    )]
    pub async fn list_deliveries(
        &self,
        user_id: Path<Uuid>,
        limit: Query<Option<u32>>,
        offset: Query<Option<u32>>,
    ) -> PoemResult<Json<PaginatedDeliveriesDto>> {
        let result = self
            .state
            .list_deliveries_usecase
            .execute(user_id.0, limit.0, offset.0)
            .await
            .map_err(|err| {
                poem::Error::from_string(
                    err.to_string(),
                    poem::http::StatusCode::INTERNAL_SERVER_ERROR,
                )
            })?;

        Ok(Json(PaginatedDeliveriesDto {
            deliveries: result.records.iter().map(map_delivery).collect(),
            has_more: result.has_more,
            next_offset: result.next_offset,
        }))
    }
}
