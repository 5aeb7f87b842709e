//! Type categories.
//!
//! Every schema type belongs to exactly one of three categories. Each category
//! has a built-in root type (`entity`, `attribute`, `relation`) that anchors its
//! subtype tree but is never drawn itself.

use std::{fmt, str::FromStr};

/// One of the three top-level classifications of schema types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Entity types (drawn as boxes).
    Entity,
    /// Attribute types (drawn as ellipses).
    Attribute,
    /// Relation types (drawn as diamonds).
    Relation,
}

impl Category {
    /// All categories in traversal order.
    pub const ALL: [Category; 3] = [Category::Entity, Category::Attribute, Category::Relation];

    /// Returns the label of the built-in root type of this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use schemaviz_core::category::Category;
    ///
    /// assert_eq!(Category::Relation.root_label(), "relation");
    /// ```
    pub fn root_label(self) -> &'static str {
        match self {
            Category::Entity => "entity",
            Category::Attribute => "attribute",
            Category::Relation => "relation",
        }
    }

    /// Returns the display label of the synthetic anchor node for this category.
    pub fn anchor_label(self) -> &'static str {
        match self {
            Category::Entity => "Entity",
            Category::Attribute => "Attribute",
            Category::Relation => "Relation",
        }
    }

    /// Returns the category whose root type carries `label`, if any.
    pub fn from_root_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.root_label() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.anchor_label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.root_label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown type category `{s}`"))
    }
}
