use reqwest::Method;
use serde_json::{json, Value};

use crate::models::{
    Availability, NewWeight, User, UserPatch, WeightEntry, WeightId, WeightPatch,
};

use super::{
    client::{decode, unwrap_envelope, ApiClient},
    error::{ApiError, ApiResult},
};

fn message_of(value: &Value) -> String {
    ["message", "detail"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

fn validate_weight(weight_kg: f64) -> ApiResult<()> {
    if weight_kg.is_finite() && weight_kg > 0.0 && weight_kg < 1000.0 {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "weight must be between 0 and 1000 kg, got {weight_kg}"
        )))
    }
}

impl ApiClient {
    pub async fn me(&self) -> ApiResult<User> {
        let value: Value = self.get("users/me/", &[]).await?;
        unwrap_envelope(value, "user")
    }

    pub async fn update_me(&self, patch: &UserPatch) -> ApiResult<User> {
        let value: Value = self.send(Method::PATCH, "users/me/", patch).await?;
        let user: User = unwrap_envelope(value, "user")?;
        self.tokens().cache_user(&user).await?;
        Ok(user)
    }

    pub async fn delete_me(&self) -> ApiResult<()> {
        self.delete("users/me/").await?;
        self.force_logout().await;
        Ok(())
    }

    /// A 400 naming the taken field is an answer, not a failure.
    pub async fn check_availability(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> ApiResult<Availability> {
        let mut query = Vec::new();
        if let Some(username) = username.filter(|u| !u.is_empty()) {
            query.push(("username", username.to_string()));
        }
        if let Some(email) = email.filter(|e| !e.is_empty()) {
            query.push(("email", email.to_string()));
        }
        if query.is_empty() {
            return Err(ApiError::Validation(
                "username or email is required".into(),
            ));
        }

        let (status, body) = self.probe("users/check_availability/", &query).await?;
        let taken = |field: &str| body.get(field).and_then(Value::as_str) == Some("taken");

        match status {
            200..=299 => Ok(Availability::default()),
            400 if taken("username") || taken("email") => Ok(Availability {
                username_taken: taken("username"),
                email_taken: taken("email"),
            }),
            _ => Err(ApiError::from_response(status, &body.to_string())),
        }
    }

    pub async fn request_password_reset(&self, email: &str) -> ApiResult<String> {
        let value: Value = self
            .send_anonymous("password-reset/request/", &json!({ "email": email }))
            .await?;
        Ok(message_of(&value))
    }

    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> ApiResult<String> {
        if new_password != confirm_password {
            return Err(ApiError::Validation("passwords do not match".into()));
        }
        let value: Value = self
            .send_anonymous(
                "password-reset/confirm/",
                &json!({
                    "token": token,
                    "new_password": new_password,
                    "confirm_password": confirm_password,
                }),
            )
            .await?;
        Ok(message_of(&value))
    }

    /// Newest first, as the server orders them.
    pub async fn list_weights(&self) -> ApiResult<Vec<WeightEntry>> {
        let value: Value = self.get("weights/", &[]).await?;
        match value {
            Value::Object(mut map) => decode(map.remove("weights").unwrap_or(Value::Array(vec![]))),
            other => decode(other),
        }
    }

    pub async fn add_weight(&self, weight_kg: f64) -> ApiResult<WeightEntry> {
        validate_weight(weight_kg)?;
        let value: Value = self
            .send(Method::POST, "weights/", &NewWeight { weight: weight_kg })
            .await?;
        unwrap_envelope(value, "weight")
    }

    pub async fn update_weight(&self, id: WeightId, weight_kg: f64) -> ApiResult<WeightEntry> {
        validate_weight(weight_kg)?;
        let value: Value = self
            .send(
                Method::PATCH,
                &format!("weights/{id}/"),
                &WeightPatch { weight: weight_kg },
            )
            .await?;
        unwrap_envelope(value, "weight")
    }

    pub async fn delete_weight(&self, id: WeightId) -> ApiResult<()> {
        self.delete(&format!("weights/{id}/")).await
    }
}
