//! The read-only type source contract.
//!
//! A [`TypeSource`] exposes the hierarchical type information of a schema:
//! the three category roots, each type's explicit (direct) subtypes, its owned
//! attributes, and for relation types the declared roles and their players.
//!
//! Handles are opaque to callers. A builder only needs to compare, hash and
//! clone them, and to ask the source for their labels.

use std::{fmt, hash::Hash};

use thiserror::Error;

use crate::category::Category;

/// Failure to obtain type information from a source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("{0}")]
    Unavailable(String),

    #[error("unknown type handle {0}")]
    UnknownHandle(String),
}

impl SourceError {
    /// Creates an [`SourceError::Unavailable`] error with the given reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}

/// Read-only access to the type hierarchy of a schema.
///
/// Every call may fail; a failure means the source cannot currently provide a
/// consistent view and callers are expected to abort rather than continue with
/// partial information.
pub trait TypeSource {
    /// Handle to a schema type.
    type Type: Clone + Eq + Hash + fmt::Debug;

    /// Handle to a role declared by a relation type.
    type Role: Clone + fmt::Debug;

    /// Returns the built-in root type of `category`.
    fn category_root(&self, category: Category) -> Result<Self::Type, SourceError>;

    /// Returns the explicit subtypes of `ty`, one level down, in source order.
    fn direct_subtypes(&self, ty: &Self::Type) -> Result<Vec<Self::Type>, SourceError>;

    /// Returns the attribute types `ty` declares ownership of.
    fn owned_attributes(&self, ty: &Self::Type) -> Result<Vec<Self::Type>, SourceError>;

    /// Returns the roles declared by the relation type `ty`.
    fn declared_roles(&self, ty: &Self::Type) -> Result<Vec<Self::Role>, SourceError>;

    /// Returns the types that may play `role`.
    fn role_players(&self, role: &Self::Role) -> Result<Vec<Self::Type>, SourceError>;

    /// Returns the label of `ty`, or `None` if the record carries no label.
    fn type_label(&self, ty: &Self::Type) -> Result<Option<String>, SourceError>;

    /// Returns the label of `role`, or `None` if the record carries no label.
    fn role_label(&self, role: &Self::Role) -> Result<Option<String>, SourceError>;
}

impl<S: TypeSource + ?Sized> TypeSource for &S {
    type Type = S::Type;
    type Role = S::Role;

    fn category_root(&self, category: Category) -> Result<Self::Type, SourceError> {
        (**self).category_root(category)
    }

    fn direct_subtypes(&self, ty: &Self::Type) -> Result<Vec<Self::Type>, SourceError> {
        (**self).direct_subtypes(ty)
    }

    fn owned_attributes(&self, ty: &Self::Type) -> Result<Vec<Self::Type>, SourceError> {
        (**self).owned_attributes(ty)
    }

    fn declared_roles(&self, ty: &Self::Type) -> Result<Vec<Self::Role>, SourceError> {
        (**self).declared_roles(ty)
    }

    fn role_players(&self, role: &Self::Role) -> Result<Vec<Self::Type>, SourceError> {
        (**self).role_players(role)
    }

    fn type_label(&self, ty: &Self::Type) -> Result<Option<String>, SourceError> {
        (**self).type_label(ty)
    }

    fn role_label(&self, role: &Self::Role) -> Result<Option<String>, SourceError> {
        (**self).role_label(role)
    }
}
