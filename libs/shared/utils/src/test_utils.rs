use http::request::Builder;
use uuid::Uuid;

use shared_models::auth::{Role, User};

use crate::extractor::{USER_ID_HEADER, USER_NAME_HEADER, USER_ROLE_HEADER};

/// Identity fixture for tests that need an acting user.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(name: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            role,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn patient(name: &str) -> Self {
        Self::new(name, Role::Patient)
    }

    pub fn doctor(name: &str) -> Self {
        Self::new(name, Role::Doctor)
    }

    pub fn admin(name: &str) -> Self {
        Self::new(name, Role::Admin)
    }

    pub fn delivery(name: &str) -> Self {
        Self::new(name, Role::Delivery)
    }

    pub fn to_user(&self) -> User {
        User::new(self.id.clone(), self.name.clone(), self.role)
    }

    /// Adds the identity headers the middleware expects.
    pub fn sign(&self, builder: Builder) -> Builder {
        builder
            .header(USER_ID_HEADER, self.id.as_str())
            .header(USER_ROLE_HEADER, self.role.to_string())
            .header(USER_NAME_HEADER, self.name.as_str())
    }
}
