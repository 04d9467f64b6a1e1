//! Schema validation of records
//!
//! Records accept any content while they are being built. [`Validate`] checks
//! what the schema requires before a record is sent: required attributes and
//! elements, cardinality bounds, and the same for every child.

use crate::error::{Result, ValidationError};
use crate::model::containment::{ChildList, ChildSlot};

/// Record with schema-level constraints
pub trait Validate {
    /// Check this record and its children
    fn validate(&self) -> Result<()>;

    /// Whether [`Validate::validate`] succeeds
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Fail unless a required property is present
pub fn require<T>(value: Option<&T>, type_name: &str, field: &str) -> Result<()> {
    if value.is_some() {
        Ok(())
    } else {
        Err(ValidationError::new(format!("required property '{}' is missing", field))
            .with_type_name(type_name)
            .with_path(field)
            .into())
    }
}

/// Fail unless a required string property is present and not blank
pub fn require_text(value: Option<&String>, type_name: &str, field: &str) -> Result<()> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(()),
        _ => require::<String>(None, type_name, field),
    }
}

/// Validate an optional child, prefixing errors with `field`
pub fn validate_child<T: Validate>(child: Option<&T>, field: &str) -> Result<()> {
    match child {
        Some(child) => child.validate().map_err(|e| nest(e, field)),
        None => Ok(()),
    }
}

/// Validate every child of a list, prefixing errors with `field[i]`
pub fn validate_all<'a, T, I>(children: I, field: &str) -> Result<()>
where
    T: Validate + 'a,
    I: IntoIterator<Item = &'a T>,
{
    for (index, child) in children.into_iter().enumerate() {
        child
            .validate()
            .map_err(|e| nest(e, &format!("{}[{}]", field, index)))?;
    }
    Ok(())
}

fn nest(error: crate::error::Error, field: &str) -> crate::error::Error {
    match error {
        crate::error::Error::Validation(inner) => inner.nested_in(field).into(),
        other => other,
    }
}

impl<T: Validate> Validate for ChildSlot<T> {
    fn validate(&self) -> Result<()> {
        match self.get() {
            Some(child) => child.validate(),
            None => Ok(()),
        }
    }
}

impl<T: Validate> Validate for ChildList<T> {
    fn validate(&self) -> Result<()> {
        validate_all(self.iter(), "item")
    }
}
