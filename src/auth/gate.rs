//! Capability checks run before every write. Callers evaluate them in the
//! order authentication, role, ownership and stop at the first failure.

use crate::{
    domain::{Owned, User},
    error::{AppError, Result},
};

pub fn require_authenticated(actor: Option<&User>) -> Result<&User> {
    actor.ok_or(AppError::Forbidden)
}

pub fn require_admin(actor: &User) -> Result<()> {
    if actor.role.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub fn require_publisher_or_admin(actor: &User) -> Result<()> {
    if actor.role.can_publish() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub fn require_owner_or_admin(actor: &User, resource: &impl Owned) -> Result<()> {
    if actor.id == resource.owner_id() || actor.role.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Whether the owner-or-admin check would pass; used to show edit controls.
pub fn can_manage(actor: &User, resource: &impl Owned) -> bool {
    require_owner_or_admin(actor, resource).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use chrono::Utc;

    struct Record(i64);

    impl Owned for Record {
        fn owner_id(&self) -> i64 {
            self.0
        }
    }

    fn user(id: i64, role: Role) -> User {
        User {
            id,
            username: format!("user{}", id),
            email: format!("user{}@example.edu", id),
            role,
            department_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn anonymous_actor_is_forbidden() {
        assert!(matches!(require_authenticated(None), Err(AppError::Forbidden)));
        let alice = user(1, Role::Student);
        assert_eq!(require_authenticated(Some(&alice)).map(|u| u.id).ok(), Some(1));
    }

    #[test]
    fn only_publishers_and_admins_may_publish() {
        assert!(require_publisher_or_admin(&user(1, Role::Student)).is_err());
        assert!(require_publisher_or_admin(&user(2, Role::Publisher)).is_ok());
        assert!(require_publisher_or_admin(&user(3, Role::Admin)).is_ok());
    }

    #[test]
    fn admin_check_rejects_publishers() {
        assert!(require_admin(&user(2, Role::Publisher)).is_err());
        assert!(require_admin(&user(3, Role::Admin)).is_ok());
    }

    #[test]
    fn owner_or_admin_may_manage_a_record() {
        let notice = Record(2);
        assert!(require_owner_or_admin(&user(2, Role::Publisher), &notice).is_ok());
        assert!(require_owner_or_admin(&user(3, Role::Admin), &notice).is_ok());
        assert!(matches!(
            require_owner_or_admin(&user(1, Role::Student), &notice),
            Err(AppError::Forbidden)
        ));
        assert!(!can_manage(&user(4, Role::Publisher), &notice));
    }
}
