use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::user::{self, Role};
use crate::error::FieldErrors;
use crate::listing::Listing;
use crate::models::shared::LabelOption;

/// Password length bounds, in bytes.
pub const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 8..=128;

/// Profile fields shared by registration and admin-side user creation.
#[derive(Debug, Default, Clone)]
pub struct UserFields {
    pub full_name: String,
    pub username: String,
    pub phone_number: String,
    pub email: String,
    pub password: String,
    pub address: Option<String>,
}

impl UserFields {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("full_name", &self.full_name);
        errors.require("username", &self.username);
        errors.require("phone_number", &self.phone_number);
        errors.require("email", &self.email);
        if !self.email.trim().is_empty() && !looks_like_email(&self.email) {
            errors.add("email", "The email must be a valid email address");
        }
        validate_password(&mut errors, &self.password);
        errors
    }
}

pub fn validate_password(errors: &mut FieldErrors, password: &str) {
    if password.is_empty() {
        errors.add("password", "The password field is required");
    } else if !PASSWORD_LEN.contains(&password.len()) {
        errors.add("password", "The password must be 8-128 characters");
    }
}

pub fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Parse a role form value; blank means the default `Customer`.
pub fn parse_role(errors: &mut FieldErrors, raw: &str) -> Role {
    if raw.trim().is_empty() {
        return Role::Customer;
    }
    Role::parse(raw.trim()).unwrap_or_else(|| {
        errors.add("role", "The role must be one of: Admin, Customer, SuperAdmin");
        Role::Customer
    })
}

/// User as sent to clients; never includes the password hash.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub user_id: i32,
    #[schema(example = "Sari Dewi")]
    pub full_name: String,
    pub username: String,
    pub phone_number: String,
    pub email: String,
    pub address: Option<String>,
    pub role: Role,
    pub file_id: Option<i32>,
    pub path_file: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn new(u: user::Model, path_file: String) -> Self {
        Self {
            user_id: u.id,
            full_name: u.full_name,
            username: u.username,
            phone_number: u.phone_number,
            email: u.email,
            address: u.address,
            role: u.role,
            file_id: u.file_id,
            path_file,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

impl From<user::Model> for LabelOption {
    fn from(u: user::Model) -> Self {
        Self {
            value: u.id,
            label: u.full_name,
        }
    }
}

pub const USER_LISTING: Listing<user::Entity> = Listing {
    search: &[
        user::Column::FullName,
        user::Column::Username,
        user::Column::Email,
    ],
    sort: &[
        ("full_name", user::Column::FullName),
        ("username", user::Column::Username),
        ("email", user::Column::Email),
        ("role", user::Column::Role),
        ("created_at", user::Column::CreatedAt),
    ],
    tie_breaker: user::Column::Id,
};
