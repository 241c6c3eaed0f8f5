//! Join row mapper composition.
//!
//! A [`JoinRowMapper`] is a tree: one root [`EntityMapper`] plus any number of
//! attached child mappers, each bound to a [`Relation`] on its parent. The tree
//! is immutable once built and carries no per-execution state, so a single
//! definition can be shared between threads and reused for every execution of
//! the same query.
//!
//! Children of different types hang off one parent through an object-safe
//! attachment trait.

use crate::mapper::{Entity, EntityMapper, MappingError};
use crate::relation::def::RelationSlot;
use crate::relation::Relation;
use crate::row::Row;
use crate::value::RowKey;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Per-execution record of children already attached below each parent.
///
/// Keys are scopes: the parent's scope, the attachment slot and the child's
/// dedup key. Two parents never share a scope, so the same child row under two
/// different roots yields two children.
#[derive(Debug, Default)]
pub(crate) struct ChildIndex {
    positions: HashMap<String, usize>,
    singles: HashMap<String, RowKey>,
}

fn child_scope(parent_scope: &str, slot: usize, key: &RowKey) -> String {
    format!("{parent_scope}\u{1e}{slot}\u{1d}{}", key.as_str())
}

fn slot_scope(parent_scope: &str, slot: usize) -> String {
    format!("{parent_scope}\u{1e}{slot}")
}

/// Select-list entries plus the row column name each one produces.
#[derive(Debug, Default)]
struct SelectList {
    entries: Vec<String>,
    outputs: HashSet<String>,
}

/// Object-safe view of one attached child mapper.
trait Attachment<P>: Send + Sync {
    fn relation_name(&self) -> &'static str;

    fn select_list(&self, out: &mut SelectList) -> Result<(), MappingError>;

    fn describe(&self, depth: usize, out: &mut String);

    /// Map the child found in `row` (if any) into `parent`.
    fn attach(
        &self,
        parent: &mut P,
        row: &Row,
        parent_scope: &str,
        index: &mut ChildIndex,
    ) -> Result<(), MappingError>;
}

struct Attached<P, C> {
    slot: usize,
    relation: Relation<P, C>,
    mapper: JoinRowMapper<C>,
}

impl<P, C> Attachment<P> for Attached<P, C> {
    fn relation_name(&self) -> &'static str {
        self.relation.name()
    }

    fn select_list(&self, out: &mut SelectList) -> Result<(), MappingError> {
        self.mapper.collect_select_list(out)
    }

    fn describe(&self, depth: usize, out: &mut String) {
        out.push_str(&format!(
            "\n{}{} -> {} ({:?})",
            "  ".repeat(depth),
            self.relation.name(),
            self.mapper.root.table(),
            self.relation.rel_type()
        ));
        self.mapper.describe_children(depth + 1, out);
    }

    fn attach(
        &self,
        parent: &mut P,
        row: &Row,
        parent_scope: &str,
        index: &mut ChildIndex,
    ) -> Result<(), MappingError> {
        // outer-join non-match
        let Some(key) = self.mapper.root.key(row)? else {
            return Ok(());
        };
        let scope = child_scope(parent_scope, self.slot, &key);

        match &self.relation.slot {
            RelationSlot::Many(field) => {
                let children = field(parent);
                match index.positions.get(&scope).copied() {
                    Some(position) => {
                        let child = children.get_mut(position).ok_or_else(|| {
                            MappingError::Invalid(format!(
                                "relation '{}' lost child {} during collection",
                                self.relation.name(),
                                key
                            ))
                        })?;
                        self.mapper.merge_children(child, row, &scope, index)
                    }
                    None => {
                        let child = self.mapper.map_new(row, &scope, index)?;
                        index.positions.insert(scope, children.len());
                        children.push(child);
                        Ok(())
                    }
                }
            }
            RelationSlot::One(field) => {
                let slot = slot_scope(parent_scope, self.slot);
                let current = field(parent);
                match index.singles.get(&slot).cloned() {
                    Some(existing) if existing == key => match current.as_mut() {
                        Some(child) => self.mapper.merge_children(child, row, &scope, index),
                        None => Ok(()),
                    },
                    Some(existing) => {
                        log::warn!(
                            "Relation '{}' on '{}' is single-valued; keeping {} and ignoring {}",
                            self.relation.name(),
                            self.mapper.root.table(),
                            existing,
                            key
                        );
                        Ok(())
                    }
                    None => {
                        let child = self.mapper.map_new(row, &scope, index)?;
                        *current = Some(child);
                        index.singles.insert(slot, key);
                        Ok(())
                    }
                }
            }
        }
    }
}

/// Root entity mapper plus its attached relations
///
/// # Example
///
/// ```
/// use incidentdb::{EntityMapper, Identity, JoinRowMapper, MappingError, Relation, RowView};
///
/// #[derive(Default)]
/// struct Incident { incidentid: i32, types: Vec<IncidentType> }
/// struct IncidentType { incidenttypeid: i32 }
///
/// fn incident(row: &RowView<'_>) -> Result<Incident, MappingError> {
///     Ok(Incident { incidentid: row.get("incidentid")?, types: Vec::new() })
/// }
///
/// fn incident_type(row: &RowView<'_>) -> Result<IncidentType, MappingError> {
///     Ok(IncidentType { incidenttypeid: row.get("incidenttypeid")? })
/// }
///
/// let mapper = JoinRowMapper::new(EntityMapper::new(
///     "incident",
///     Identity::Unary("incidentid"),
///     &["incidentid"],
///     incident,
/// ))
/// .attach(
///     EntityMapper::new(
///         "incident_incidenttype",
///         Identity::Binary("incidentid", "incidenttypeid"),
///         &["incidenttypeid"],
///         incident_type,
///     ),
///     Relation::many("types", |i: &mut Incident| &mut i.types),
/// );
/// assert_eq!(mapper.relation_count(), 1);
/// ```
pub struct JoinRowMapper<E> {
    root: EntityMapper<E>,
    children: Vec<Box<dyn Attachment<E>>>,
}

impl<E: Entity> JoinRowMapper<E> {
    /// Mapper rooted at the entity's own [`Entity`] description.
    pub fn for_entity() -> Self {
        Self::new(EntityMapper::for_entity())
    }
}

impl<E> JoinRowMapper<E> {
    pub fn new(root: EntityMapper<E>) -> Self {
        Self {
            root,
            children: Vec::new(),
        }
    }

    /// Attach `child` under `relation`.
    ///
    /// `child` may itself carry attachments; grandchildren are mapped and
    /// deduplicated the same way, scoped to their own parent.
    pub fn attach<C>(mut self, child: impl Into<JoinRowMapper<C>>, relation: Relation<E, C>) -> Self
    where
        E: 'static,
        C: 'static,
    {
        let slot = self.children.len();
        self.children.push(Box::new(Attached {
            slot,
            relation,
            mapper: child.into(),
        }));
        self
    }

    pub fn root(&self) -> &EntityMapper<E> {
        &self.root
    }

    /// Number of relations attached directly to the root.
    pub fn relation_count(&self) -> usize {
        self.children.len()
    }

    /// Names of relations attached directly to the root, in attach order.
    pub fn relation_names(&self) -> Vec<&'static str> {
        self.children.iter().map(|c| c.relation_name()).collect()
    }

    /// Select list covering the whole tree: root columns first, then each
    /// attachment depth-first.
    ///
    /// Two mappers producing the same row column name (say a parent and a
    /// has-one child both reading `incidentid` unprefixed) fail with
    /// [`MappingError::AmbiguousColumn`]; give one of them a prefix.
    pub fn select_list(&self) -> Result<Vec<String>, MappingError> {
        let mut out = SelectList::default();
        self.collect_select_list(&mut out)?;
        Ok(out.entries)
    }

    fn collect_select_list(&self, out: &mut SelectList) -> Result<(), MappingError> {
        let prefix = self.root.prefix().unwrap_or_default();
        for (column, entry) in self.root.columns().iter().zip(self.root.select_list()) {
            let output = format!("{prefix}{column}");
            if !out.outputs.insert(output.clone()) {
                return Err(MappingError::AmbiguousColumn { column: output });
            }
            out.entries.push(entry);
        }
        for child in &self.children {
            child.select_list(out)?;
        }
        Ok(())
    }

    fn describe_children(&self, depth: usize, out: &mut String) {
        for child in &self.children {
            child.describe(depth, out);
        }
    }

    /// Dedup key of the root entity in `row`.
    ///
    /// A NULL in any root key column is [`MappingError::NullRootKey`]: a root
    /// row without identity points at a broken predicate or join.
    pub fn root_key(&self, row: &Row) -> Result<RowKey, MappingError> {
        self.root
            .key(row)?
            .ok_or_else(|| MappingError::NullRootKey {
                table: self.root.table().to_string(),
                key: self.root.identity().clone(),
            })
    }

    /// Map one row in isolation: root key plus the root entity with whatever
    /// children this row carries.
    pub fn map_row(&self, row: &Row) -> Result<(RowKey, E), MappingError> {
        let key = self.root_key(row)?;
        let mut index = ChildIndex::default();
        let entity = self.map_new(row, key.as_str(), &mut index)?;
        Ok((key, entity))
    }

    pub(crate) fn map_new(
        &self,
        row: &Row,
        scope: &str,
        index: &mut ChildIndex,
    ) -> Result<E, MappingError> {
        let mut entity = self.root.map(row)?;
        self.merge_children(&mut entity, row, scope, index)?;
        Ok(entity)
    }

    pub(crate) fn merge_children(
        &self,
        entity: &mut E,
        row: &Row,
        scope: &str,
        index: &mut ChildIndex,
    ) -> Result<(), MappingError> {
        for child in &self.children {
            child.attach(entity, row, scope, index)?;
        }
        Ok(())
    }
}

impl<E> From<EntityMapper<E>> for JoinRowMapper<E> {
    fn from(root: EntityMapper<E>) -> Self {
        Self::new(root)
    }
}

impl<E> fmt::Debug for JoinRowMapper<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tree = String::new();
        self.describe_children(1, &mut tree);
        f.debug_struct("JoinRowMapper")
            .field("root", &self.root.table())
            .field("relations", &self.children.len())
            .field("tree", &format_args!("{}{tree}", self.root.table()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::Identity;
    use crate::row::RowView;
    use crate::value::Value;

    #[derive(Debug, Default, PartialEq)]
    struct Incident {
        incidentid: i32,
        name: String,
        room: Option<Room>,
        types: Vec<IncidentType>,
    }

    #[derive(Debug, PartialEq)]
    struct IncidentType {
        incidenttypeid: i32,
    }

    #[derive(Debug, PartialEq)]
    struct Room {
        collabroomid: i32,
    }

    fn incident(row: &RowView<'_>) -> Result<Incident, MappingError> {
        Ok(Incident {
            incidentid: row.get("incidentid")?,
            name: row.get("name")?,
            ..Default::default()
        })
    }

    fn incident_type(row: &RowView<'_>) -> Result<IncidentType, MappingError> {
        Ok(IncidentType {
            incidenttypeid: row.get("incidenttypeid")?,
        })
    }

    fn room(row: &RowView<'_>) -> Result<Room, MappingError> {
        Ok(Room {
            collabroomid: row.get("collabroomid")?,
        })
    }

    fn mapper() -> JoinRowMapper<Incident> {
        JoinRowMapper::new(EntityMapper::new(
            "incident",
            Identity::Unary("incidentid"),
            &["incidentid", "name"],
            incident,
        ))
        .attach(
            EntityMapper::new(
                "incident_incidenttype",
                Identity::Binary("incidentid", "incidenttypeid"),
                &["incidenttypeid"],
                incident_type,
            ),
            Relation::many("types", |i: &mut Incident| &mut i.types),
        )
        .attach(
            EntityMapper::new(
                "collabroom",
                Identity::Unary("collabroomid"),
                &["collabroomid"],
                room,
            ),
            Relation::one("room", |i: &mut Incident| &mut i.room),
        )
    }

    #[test]
    fn test_map_row_with_children() {
        let row = Row::new()
            .with("incidentid", 1)
            .with("name", "Flood")
            .with("incidenttypeid", 4)
            .with("collabroomid", 9);
        let (key, incident) = mapper().map_row(&row).unwrap();
        assert_eq!(key.as_str(), "1");
        assert_eq!(incident.types, vec![IncidentType { incidenttypeid: 4 }]);
        assert_eq!(incident.room, Some(Room { collabroomid: 9 }));
    }

    #[test]
    fn test_null_child_key_is_absent() {
        let row = Row::new()
            .with("incidentid", 1)
            .with("name", "Flood")
            .with("incidenttypeid", Value::Int(None))
            .with("collabroomid", Value::Int(None));
        let (_, incident) = mapper().map_row(&row).unwrap();
        assert!(incident.types.is_empty());
        assert!(incident.room.is_none());
    }

    #[test]
    fn test_null_root_key_is_error() {
        let row = Row::new()
            .with("incidentid", Value::Int(None))
            .with("name", "Flood")
            .with("incidenttypeid", 4)
            .with("collabroomid", 9);
        assert!(matches!(
            mapper().map_row(&row),
            Err(MappingError::NullRootKey { table, .. }) if table == "incident"
        ));
    }

    #[test]
    fn test_select_list_covers_tree() {
        assert_eq!(
            mapper().select_list().unwrap(),
            vec![
                "incident.incidentid",
                "incident.name",
                "incident_incidenttype.incidenttypeid",
                "collabroom.collabroomid",
            ]
        );
        assert_eq!(mapper().relation_names(), vec!["types", "room"]);
    }

    #[derive(Debug, Default, PartialEq)]
    struct CollabRoom {
        collabroomid: i32,
        incidentid: i32,
        incident: Option<Linked>,
    }

    #[derive(Debug, PartialEq)]
    struct Linked {
        incidentid: i32,
        name: String,
    }

    fn collab_room(row: &RowView<'_>) -> Result<CollabRoom, MappingError> {
        Ok(CollabRoom {
            collabroomid: row.get("collabroomid")?,
            incidentid: row.get("incidentid")?,
            incident: None,
        })
    }

    fn linked(row: &RowView<'_>) -> Result<Linked, MappingError> {
        Ok(Linked {
            incidentid: row.get("incidentid")?,
            name: row.get("name")?,
        })
    }

    fn room_with_incident(prefix: Option<&str>) -> JoinRowMapper<CollabRoom> {
        let mut child = EntityMapper::new(
            "incident",
            Identity::Unary("incidentid"),
            &["incidentid", "name"],
            linked,
        );
        if let Some(prefix) = prefix {
            child = child.with_prefix(prefix);
        }
        JoinRowMapper::new(EntityMapper::new(
            "collabroom",
            Identity::Unary("collabroomid"),
            &["collabroomid", "incidentid"],
            collab_room,
        ))
        .attach(child, Relation::one("incident", |r: &mut CollabRoom| &mut r.incident))
    }

    #[test]
    fn test_shared_child_key_column_without_prefix_is_ambiguous() {
        let mapper = room_with_incident(None);
        assert_eq!(
            mapper.select_list().unwrap_err(),
            MappingError::AmbiguousColumn {
                column: "incidentid".to_string()
            }
        );

        // LEFT JOIN ... ON with no incident row: the parent's incidentid is
        // set, the child's copy is NULL.
        let row = Row::new()
            .with("collabroomid", 3)
            .with("incidentid", 42)
            .with("incidentid", Value::Int(None))
            .with("name", Value::String(None));
        assert!(matches!(
            mapper.map_row(&row),
            Err(MappingError::AmbiguousColumn { column }) if column == "incidentid"
        ));
    }

    #[test]
    fn test_prefixed_child_key_column() {
        let mapper = room_with_incident(Some("incident_"));
        assert_eq!(
            mapper.select_list().unwrap(),
            vec![
                "collabroom.collabroomid",
                "collabroom.incidentid",
                "incident.incidentid AS incident_incidentid",
                "incident.name AS incident_name",
            ]
        );

        let unmatched = Row::new()
            .with("collabroomid", 3)
            .with("incidentid", 42)
            .with("incident_incidentid", Value::Int(None))
            .with("incident_name", Value::String(None));
        let (_, room) = mapper.map_row(&unmatched).unwrap();
        assert_eq!(room.incidentid, 42);
        assert_eq!(room.incident, None);

        let matched = Row::new()
            .with("collabroomid", 3)
            .with("incidentid", 42)
            .with("incident_incidentid", 42)
            .with("incident_name", "Flood");
        let (_, room) = mapper.map_row(&matched).unwrap();
        assert_eq!(
            room.incident,
            Some(Linked {
                incidentid: 42,
                name: "Flood".to_string(),
            })
        );
    }

    #[test]
    fn test_mapper_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<JoinRowMapper<Incident>>();
    }
}
