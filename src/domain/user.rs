use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Learner,
    Admin,
    Manager,
}

/// Account record. Authentication credentials are handled outside this
/// service; a user here is identity plus tenancy only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub role: UserRole,
    pub tenant_id: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(DomainError::validation(format!(
                "invalid email address: {}",
                self.email
            )));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("user name must not be empty"));
        }
        if self.tenant_id.trim().is_empty() {
            return Err(DomainError::validation("tenantId must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        let now = Utc::now();
        User {
            id: "u-1".to_string(),
            email: email.to_string(),
            name: "Alex Rivera".to_string(),
            avatar: None,
            role: UserRole::Learner,
            tenant_id: "tenant-1".to_string(),
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn accepts_plain_address() {
        assert!(user("alex@example.com").validate().is_ok());
    }

    #[test]
    fn rejects_address_without_at() {
        assert!(user("not-an-email").validate().is_err());
    }
}
