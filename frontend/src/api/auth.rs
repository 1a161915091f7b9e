use serde_json::json;

use super::{
    client::ApiClient,
    types::{ApiError, LoginRequest, LoginResponse, NewUser, User, UserId},
};

impl ApiClient {
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ApiError> {
        let payload = serde_json::to_value(&request)
            .map_err(|e| ApiError::unknown(format!("Failed to encode login: {}", e)))?;
        let data = self.call("login", Some(payload)).await?;
        let present = |key: &str| data.get(key).is_some_and(|value| !value.is_null());
        if !present("user") || !present("users") {
            return Err(ApiError::application(
                "Respuesta de login inválida del servidor.",
            ));
        }
        serde_json::from_value(data).map_err(|e| {
            ApiError::application(format!("Respuesta de login inválida del servidor: {}", e))
        })
    }

    pub async fn add_user(&self, user: &NewUser) -> Result<User, ApiError> {
        self.call_as(
            "addUser",
            Some(json!({ "user": user, "totalLeave": user.total_leave })),
        )
        .await
    }

    pub async fn update_user(&self, user: &User) -> Result<User, ApiError> {
        self.call_as("updateUser", Some(json!({ "user": user })))
            .await
    }

    pub async fn delete_user(&self, user_id: UserId) -> Result<(), ApiError> {
        self.call("deleteUser", Some(json!({ "userId": user_id })))
            .await
            .map(|_| ())
    }
}
