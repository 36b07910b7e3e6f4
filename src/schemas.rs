// src/schemas.rs

//! Parameter shapes shared by the tools, each paired with the validator that
//! narrows raw caller input into the form the Razorpay client sends.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const MIN_COUNT: i64 = 1;
pub const MAX_COUNT: i64 = 100;

/// Pagination arguments exactly as a caller supplied them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaginationParams {
    pub skip: Option<i64>,
    pub count: Option<i64>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

/// Pagination options that passed validation. Omitted fields are left to
/// Razorpay's own defaults and are not serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PaginationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<u64>,
}

impl PaginationParams {
    /// `skip >= 0`, `1 <= count <= 100`, `from`/`to` strictly positive.
    pub fn validate(&self) -> Result<PaginationOptions, ValidationError> {
        let skip = self
            .skip
            .map(|skip| at_least("skip", skip, 0))
            .transpose()?;

        let count = self
            .count
            .map(|count| {
                if count > MAX_COUNT {
                    return Err(ValidationError::new(
                        "count",
                        format!("Number must be less than or equal to {MAX_COUNT}"),
                    ));
                }
                at_least("count", count, MIN_COUNT).map(|count| count as u8)
            })
            .transpose()?;

        let from = self
            .from
            .map(|from| at_least("from", from, 1))
            .transpose()?;
        let to = self.to.map(|to| at_least("to", to, 1)).transpose()?;

        Ok(PaginationOptions {
            skip,
            count,
            from,
            to,
        })
    }
}

fn at_least(field: &str, value: i64, min: i64) -> Result<u64, ValidationError> {
    if value < min {
        let message = if min == 1 {
            "Number must be greater than 0".to_string()
        } else {
            format!("Number must be greater than or equal to {min}")
        };
        return Err(ValidationError::new(field, message));
    }
    Ok(value as u64)
}

/// Validates the account identifier taken by `getAccountBalance`.
pub fn validate_account_id(account_id: &str) -> Result<&str, ValidationError> {
    if account_id.is_empty() {
        return Err(ValidationError::new(
            "accountId",
            "Account ID cannot be empty",
        ));
    }
    Ok(account_id)
}
