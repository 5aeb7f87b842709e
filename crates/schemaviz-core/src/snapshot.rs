//! In-memory schema snapshot.
//!
//! [`SchemaSnapshot`] is a [`TypeSource`] backed by plain vectors. It is what
//! the schema parser produces, and it is convenient for building schemas
//! programmatically.
//!
//! # Example
//!
//! ```
//! use schemaviz_core::{category::Category, snapshot::SchemaSnapshot};
//!
//! let mut schema = SchemaSnapshot::new();
//! let person = schema.add_type("person", schema.root(Category::Entity)).unwrap();
//! let name = schema.add_type("name", schema.root(Category::Attribute)).unwrap();
//! schema.add_owns(person, name).unwrap();
//!
//! let employment = schema.add_type("employment", schema.root(Category::Relation)).unwrap();
//! let employee = schema.add_role(employment, "employee").unwrap();
//! schema.add_player(employee, person).unwrap();
//!
//! assert_eq!(schema.find_type("person"), Some(person));
//! ```

use log::trace;

use crate::{
    category::Category,
    source::{SourceError, TypeSource},
};

/// Handle to a type stored in a [`SchemaSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(usize);

/// Handle to a role stored in a [`SchemaSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleRef(usize);

#[derive(Debug, Clone)]
struct TypeRecord {
    label: String,
    category: Category,
    supertype: Option<TypeRef>,
    subtypes: Vec<TypeRef>,
    owns: Vec<TypeRef>,
    roles: Vec<RoleRef>,
}

#[derive(Debug, Clone)]
struct RoleRecord {
    label: String,
    relation: TypeRef,
    players: Vec<TypeRef>,
}

/// A read-only-once-built schema held in memory.
///
/// The three category roots are created up front; every other type is added
/// below an existing supertype and inherits its category.
#[derive(Debug, Clone)]
pub struct SchemaSnapshot {
    types: Vec<TypeRecord>,
    roles: Vec<RoleRecord>,
}

impl SchemaSnapshot {
    /// Creates a snapshot containing only the three built-in root types.
    pub fn new() -> Self {
        let types = Category::ALL
            .into_iter()
            .map(|category| TypeRecord {
                label: category.root_label().to_string(),
                category,
                supertype: None,
                subtypes: Vec::new(),
                owns: Vec::new(),
                roles: Vec::new(),
            })
            .collect();

        Self {
            types,
            roles: Vec::new(),
        }
    }

    /// Returns the built-in root type of `category`.
    pub fn root(&self, category: Category) -> TypeRef {
        // Roots occupy the first three slots in `Category::ALL` order.
        TypeRef(category as usize)
    }

    /// Adds a type labeled `label` as a direct subtype of `supertype`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnknownHandle`] if `supertype` does not belong to
    /// this snapshot.
    pub fn add_type(
        &mut self,
        label: impl Into<String>,
        supertype: TypeRef,
    ) -> Result<TypeRef, SourceError> {
        let category = self.record(supertype)?.category;
        let label = label.into();
        let ty = TypeRef(self.types.len());

        trace!(label = label.as_str(), category:% = category; "Adding type to snapshot");

        self.types.push(TypeRecord {
            label,
            category,
            supertype: Some(supertype),
            subtypes: Vec::new(),
            owns: Vec::new(),
            roles: Vec::new(),
        });
        self.types[supertype.0].subtypes.push(ty);
        Ok(ty)
    }

    /// Declares that `owner` owns the attribute type `attribute`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnknownHandle`] for handles outside this snapshot.
    pub fn add_owns(&mut self, owner: TypeRef, attribute: TypeRef) -> Result<(), SourceError> {
        self.record(attribute)?;
        self.record_mut(owner)?.owns.push(attribute);
        Ok(())
    }

    /// Declares a role named `label` on the relation type `relation`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnknownHandle`] if `relation` is outside this snapshot.
    pub fn add_role(
        &mut self,
        relation: TypeRef,
        label: impl Into<String>,
    ) -> Result<RoleRef, SourceError> {
        let role = RoleRef(self.roles.len());
        self.record_mut(relation)?.roles.push(role);
        self.roles.push(RoleRecord {
            label: label.into(),
            relation,
            players: Vec::new(),
        });
        Ok(role)
    }

    /// Declares that `player` may play `role`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnknownHandle`] for handles outside this snapshot.
    pub fn add_player(&mut self, role: RoleRef, player: TypeRef) -> Result<(), SourceError> {
        self.record(player)?;
        self.role_record_mut(role)?.players.push(player);
        Ok(())
    }

    /// Finds a type by label.
    pub fn find_type(&self, label: &str) -> Option<TypeRef> {
        self.types
            .iter()
            .position(|record| record.label == label)
            .map(TypeRef)
    }

    /// Finds a role declared directly on `relation` by label.
    pub fn find_role(&self, relation: TypeRef, label: &str) -> Option<RoleRef> {
        let record = self.types.get(relation.0)?;
        record
            .roles
            .iter()
            .copied()
            .find(|role| self.roles[role.0].label == label)
    }

    /// Returns the category of `ty`.
    pub fn category(&self, ty: TypeRef) -> Option<Category> {
        self.types.get(ty.0).map(|record| record.category)
    }

    /// Returns the direct supertype of `ty`; `None` for the category roots.
    pub fn supertype(&self, ty: TypeRef) -> Option<TypeRef> {
        self.types.get(ty.0).and_then(|record| record.supertype)
    }

    /// Returns the relation type that declares `role`.
    pub fn role_relation(&self, role: RoleRef) -> Option<TypeRef> {
        self.roles.get(role.0).map(|record| record.relation)
    }

    /// Returns the number of types, roots included.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    fn record(&self, ty: TypeRef) -> Result<&TypeRecord, SourceError> {
        self.types
            .get(ty.0)
            .ok_or_else(|| SourceError::UnknownHandle(format!("{ty:?}")))
    }

    fn record_mut(&mut self, ty: TypeRef) -> Result<&mut TypeRecord, SourceError> {
        self.types
            .get_mut(ty.0)
            .ok_or_else(|| SourceError::UnknownHandle(format!("{ty:?}")))
    }

    fn role_record(&self, role: RoleRef) -> Result<&RoleRecord, SourceError> {
        self.roles
            .get(role.0)
            .ok_or_else(|| SourceError::UnknownHandle(format!("{role:?}")))
    }

    fn role_record_mut(&mut self, role: RoleRef) -> Result<&mut RoleRecord, SourceError> {
        self.roles
            .get_mut(role.0)
            .ok_or_else(|| SourceError::UnknownHandle(format!("{role:?}")))
    }
}

impl Default for SchemaSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Labels that are empty or whitespace-only count as missing.
fn usable_label(label: &str) -> Option<String> {
    (!label.trim().is_empty()).then(|| label.to_string())
}

impl TypeSource for SchemaSnapshot {
    type Type = TypeRef;
    type Role = RoleRef;

    fn category_root(&self, category: Category) -> Result<TypeRef, SourceError> {
        Ok(self.root(category))
    }

    fn direct_subtypes(&self, ty: &TypeRef) -> Result<Vec<TypeRef>, SourceError> {
        Ok(self.record(*ty)?.subtypes.clone())
    }

    fn owned_attributes(&self, ty: &TypeRef) -> Result<Vec<TypeRef>, SourceError> {
        Ok(self.record(*ty)?.owns.clone())
    }

    fn declared_roles(&self, ty: &TypeRef) -> Result<Vec<RoleRef>, SourceError> {
        Ok(self.record(*ty)?.roles.clone())
    }

    fn role_players(&self, role: &RoleRef) -> Result<Vec<TypeRef>, SourceError> {
        Ok(self.role_record(*role)?.players.clone())
    }

    fn type_label(&self, ty: &TypeRef) -> Result<Option<String>, SourceError> {
        Ok(usable_label(&self.record(*ty)?.label))
    }

    fn role_label(&self, role: &RoleRef) -> Result<Option<String>, SourceError> {
        Ok(usable_label(&self.role_record(*role)?.label))
    }
}
