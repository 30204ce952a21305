use serde::{Deserialize, Serialize};

use crate::error::FieldErrors;
use crate::models::user::{UserFields, UserResponse};

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[schema(example = "sari@example.com")]
    pub email: String,
    #[serde(default)]
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("email", &self.email);
        if self.password.is_empty() {
            errors.add("password", "The password field is required");
        }
        errors
    }
}

/// Request body for self-registration. New accounts are always customers.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    #[schema(example = "Sari Dewi")]
    pub full_name: String,
    #[serde(default)]
    #[schema(example = "sari")]
    pub username: String,
    #[serde(default)]
    #[schema(example = "081234567890")]
    pub phone_number: String,
    #[serde(default)]
    #[schema(example = "sari@example.com")]
    pub email: String,
    #[serde(default)]
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    pub address: Option<String>,
}

impl From<RegisterRequest> for UserFields {
    fn from(r: RegisterRequest) -> Self {
        Self {
            full_name: r.full_name.trim().to_string(),
            username: r.username.trim().to_string(),
            phone_number: r.phone_number.trim().to_string(),
            email: r.email.trim().to_string(),
            password: r.password,
            address: r
                .address
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
        }
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    pub user: UserResponse,
}
