pub mod item;
pub mod user;

pub use item::{Item, ItemCreate, ItemPublic, ItemUpdate, ItemsPublic};
pub use user::{NewUser, User, UserCreate, UserPublic, UsersPublic};

use std::collections::HashMap;

/// Per-field validation failures, keyed by field name
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors(pub HashMap<String, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Length check in characters, not bytes
pub(crate) fn check_length(
    errors: &mut FieldErrors,
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.chars().count();
    if len < min {
        errors.add(field, format!("String should have at least {} characters", min));
    } else if len > max {
        errors.add(field, format!("String should have at most {} characters", max));
    }
}
