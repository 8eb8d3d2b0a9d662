use crate::error::Auth0Error;
use crate::management::users::User;
use crate::management::{Filter, ManagementApi};

/// Reads a user through the Management API.
pub struct GetUserCommand {
    management: ManagementApi,
}

impl GetUserCommand {
    pub fn new(management: ManagementApi) -> Self {
        Self { management }
    }

    pub fn get_user(&self, user_id: &str) -> Result<User, Auth0Error> {
        let response = self
            .management
            .users()
            .get(user_id, &Filter::new())?
            .execute()?;
        Ok(response.into_body())
    }
}
