use crate::error::ApiError;
use crate::model::Book;
use crate::session::Session;

/// A resource that belongs to exactly one user.
pub trait Owned {
    fn owner_id(&self) -> &str;
}

impl Owned for Book {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

pub fn require_session(session: Option<&Session>) -> Result<&Session, ApiError> {
    session.ok_or(ApiError::Unauthorized("Unauthorized"))
}

pub fn is_owner<R: Owned + ?Sized>(session: &Session, resource: &R) -> bool {
    session.user_id() == resource.owner_id()
}

pub fn ensure_owner<R: Owned + ?Sized>(session: &Session, resource: &R, denied: &'static str) -> Result<(), ApiError> {
    if is_owner(session, resource) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(denied))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionUser;
    use chrono::Utc;

    struct Shelf {
        owner: String,
    }

    impl Owned for Shelf {
        fn owner_id(&self) -> &str {
            &self.owner
        }
    }

    fn session(user_id: &str) -> Session {
        Session {
            user: SessionUser {
                id: user_id.into(),
                name: None,
                email: None,
                image: None,
            },
            expires: Utc::now(),
        }
    }

    #[test]
    fn missing_session_is_unauthorized() {
        let err = require_session(None).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn owner_passes_and_others_are_forbidden() {
        let shelf = Shelf { owner: "a".into() };
        assert!(ensure_owner(&session("a"), &shelf, "not yours").is_ok());

        let err = ensure_owner(&session("b"), &shelf, "not yours").unwrap_err();
        assert!(matches!(err, ApiError::Forbidden("not yours")));
    }
}
