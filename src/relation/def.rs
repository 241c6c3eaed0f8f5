//! Relation definitions.
//!
//! A [`Relation`] names the field on a parent entity that receives the children
//! produced by an attached mapper. Single-valued relations fill an
//! `Option<C>`; collections append to a `Vec<C>`.
//!
//! Back references are not modelled: a child that needs its parent stores the
//! parent's key column (e.g. `incidentid: i32`) like any other field, which
//! keeps object graphs acyclic.

use std::fmt;

/// Cardinality of a relation as seen from the parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationType {
    /// Parent holds at most one child (`Option<C>`)
    HasOne,
    /// Parent holds a key-deduplicated, insertion-ordered list (`Vec<C>`)
    HasMany,
}

pub(crate) enum RelationSlot<P, C> {
    One(fn(&mut P) -> &mut Option<C>),
    Many(fn(&mut P) -> &mut Vec<C>),
}

/// Field on `P` that receives mapped `C` children
///
/// # Example
///
/// ```
/// use incidentdb::{Relation, RelationType};
///
/// struct IncidentType { incidenttypeid: i32 }
/// struct Incident { incidentid: i32, types: Vec<IncidentType> }
///
/// let relation: Relation<Incident, IncidentType> =
///     Relation::many("types", |incident| &mut incident.types);
/// assert_eq!(relation.rel_type(), RelationType::HasMany);
/// ```
pub struct Relation<P, C> {
    name: &'static str,
    pub(crate) slot: RelationSlot<P, C>,
}

impl<P, C> Relation<P, C> {
    /// Single-valued relation.
    pub fn one(name: &'static str, field: fn(&mut P) -> &mut Option<C>) -> Self {
        Self {
            name,
            slot: RelationSlot::One(field),
        }
    }

    /// Collection relation.
    pub fn many(name: &'static str, field: fn(&mut P) -> &mut Vec<C>) -> Self {
        Self {
            name,
            slot: RelationSlot::Many(field),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn rel_type(&self) -> RelationType {
        match self.slot {
            RelationSlot::One(_) => RelationType::HasOne,
            RelationSlot::Many(_) => RelationType::HasMany,
        }
    }
}

impl<P, C> fmt::Debug for Relation<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("name", &self.name)
            .field("rel_type", &self.rel_type())
            .finish()
    }
}
