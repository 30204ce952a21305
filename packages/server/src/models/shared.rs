use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// `{value, label}` pair for select inputs.
#[derive(Debug, Serialize, PartialEq, utoipa::ToSchema)]
pub struct LabelOption {
    #[schema(example = 3)]
    pub value: i32,
    #[schema(example = "Lighting")]
    pub label: String,
}

/// `?id=` selector used by the endpoints that take the id as a query parameter.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdQuery {
    /// Record id.
    pub id: Option<String>,
}

impl IdQuery {
    pub fn require(&self) -> Result<i32, AppError> {
        self.id
            .as_deref()
            .map(str::trim)
            .and_then(|s| s.parse::<i32>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::Validation("id must be a positive integer".into()))
    }
}
