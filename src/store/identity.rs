use chrono::{DateTime, Utc};

use crate::domain::learner::Learner;
use crate::domain::user::User;
use crate::domain::DomainError;

use super::{ensure_unmodified, MemoryStore};

impl MemoryStore {
    /// Creates the account and its learning profile together. A learner
    /// never exists without its user, so the pair is validated and written
    /// as one unit.
    pub fn create_learner_with_user(
        &self,
        user: User,
        learner: Learner,
    ) -> Result<(User, Learner), DomainError> {
        user.validate()?;
        learner.validate()?;
        if learner.user_id != user.id {
            return Err(DomainError::validation(
                "learner.userId must reference the created user",
            ));
        }
        if learner.tenant_id != user.tenant_id {
            return Err(DomainError::validation(
                "learner and user must share a tenant",
            ));
        }

        let mut inner = self.write();
        let email_taken = inner.users.values().any(|existing| {
            existing.tenant_id == user.tenant_id
                && existing.email.eq_ignore_ascii_case(&user.email)
        });
        if email_taken {
            return Err(DomainError::validation(format!(
                "email {} is already registered in tenant {}",
                user.email, user.tenant_id
            )));
        }
        if inner
            .learners
            .values()
            .any(|existing| existing.user_id == user.id)
        {
            return Err(DomainError::validation(format!(
                "user {} already has a learner profile",
                user.id
            )));
        }

        inner.users.insert(user.id.clone(), user.clone());
        inner.learners.insert(learner.id.clone(), learner.clone());
        Ok((user, learner))
    }

    pub fn user(&self, id: &str) -> Result<User, DomainError> {
        self.read()
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("user", id))
    }

    pub fn learner(&self, id: &str) -> Result<Learner, DomainError> {
        self.read()
            .learners
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("learner", id))
    }

    pub fn learners(&self, tenant_id: Option<&str>) -> Vec<Learner> {
        let inner = self.read();
        let mut learners: Vec<Learner> = inner
            .learners
            .values()
            .filter(|l| tenant_id.map_or(true, |t| l.tenant_id == t))
            .cloned()
            .collect();
        learners.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        learners
    }

    pub fn update_learner(
        &self,
        mut learner: Learner,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<Learner, DomainError> {
        learner.validate()?;

        let mut inner = self.write();
        let stored = inner
            .learners
            .get(&learner.id)
            .ok_or_else(|| DomainError::not_found("learner", &learner.id))?;
        ensure_unmodified("learner", &learner.id, stored.updated_at, expected_updated_at)?;
        if stored.user_id != learner.user_id || stored.tenant_id != learner.tenant_id {
            return Err(DomainError::validation(
                "learner identity fields are immutable",
            ));
        }

        learner.created_at = stored.created_at;
        learner.updated_at = Utc::now();
        inner.learners.insert(learner.id.clone(), learner.clone());
        Ok(learner)
    }
}
