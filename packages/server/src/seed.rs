use chrono::Utc;
use sea_orm::*;
use tracing::info;

use crate::config::AuthConfig;
use crate::entity::user::{self, Role};
use crate::utils::hash;

/// Create the bootstrap SuperAdmin from `auth.admin_*` if no user holds that
/// email yet. Does nothing unless both email and password are configured.
pub async fn ensure_super_admin(db: &DatabaseConnection, auth: &AuthConfig) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (
        auth.admin_email.as_deref().map(str::trim).filter(|e| !e.is_empty()),
        auth.admin_password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Ok(());
    };

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let hashed = hash::hash_password(password)
        .map_err(|e| anyhow::anyhow!("Password hash error: {e}"))?;
    let name = auth.admin_name.clone().unwrap_or_else(|| "Administrator".into());
    let now = Utc::now();
    let admin = user::ActiveModel {
        full_name: Set(name),
        username: Set(email.split('@').next().unwrap_or(email).to_string()),
        phone_number: Set(String::new()),
        email: Set(email.to_string()),
        password: Set(hashed),
        address: Set(None),
        role: Set(Role::SuperAdmin),
        file_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(user_id = admin.id, email, "Seeded SuperAdmin account");
    Ok(())
}
