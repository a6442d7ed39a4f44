use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
    application::handlers::notification_dispatcher::NotificationDispatcher,
    domain::{
        errors::DomainError, models::User, repositories::UserRepository,
        value_objects::DeviceId,
    },
};

/// Binds a push device to an account. An account is bound to one device at
/// a time; the device it is taken from receives a forced logout.
pub struct BindDeviceUseCase {
    users: Arc<dyn UserRepository>,
    notifier: Arc<NotificationDispatcher>,
}

pub struct BindDeviceRequest {
    pub user_id: Uuid,
    pub push_id: String,
}

impl BindDeviceUseCase {
    pub fn new(users: Arc<dyn UserRepository>, notifier: Arc<NotificationDispatcher>) -> Self {
        Self { users, notifier }
    }

    pub async fn execute(&self, request: BindDeviceRequest) -> anyhow::Result<User> {
        let device = DeviceId::parse(&request.push_id)
            .ok_or_else(|| DomainError::Validation("push id must not be empty".to_string()))?;
        let user = self
            .users
            .get(&request.user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user {}", request.user_id)))?;

        // A device belongs to one account only.
        let released = self.users.release_device(&device, &user.id).await?;
        if released > 0 {
            info!(device_id = %device, released, "device unbound from other accounts");
        }

        if user
            .push_id
            .as_deref()
            .is_some_and(|current| device.matches(current))
        {
            return Ok(user);
        }

        let previous = user.device_id();
        let updated = self
            .users
            .set_device(&user.id, Some(&device))
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user {}", user.id)))?;

        if let Some(previous) = previous {
            self.notifier
                .dispatch_forced_logout(&updated, Some(previous))
                .await;
        }

        Ok(updated)
    }
}
