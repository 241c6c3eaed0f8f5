//! Join-collapsing row collector.
//!
//! One [`RowCollector`] lives for exactly one query execution. The execution
//! facility pushes every raw row into [`RowCollector::on_row`]; the collector
//! deduplicates roots by key, merges newly seen children into roots it already
//! materialized, and hands the finished graph out through
//! [`RowCollector::results`] or [`RowCollector::single_result`]. Both consume
//! the collector, so no row can be processed after finalization.

use crate::mapper::join::ChildIndex;
use crate::mapper::{JoinRowMapper, MappingError};
use crate::row::Row;
use crate::value::RowKey;
use std::collections::HashMap;

/// Lifecycle of a collector before finalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    /// No row seen yet
    Empty,
    /// At least one row seen
    Accumulating,
}

/// Per-execution accumulator turning a row stream into deduplicated entities
pub struct RowCollector<'m, E> {
    mapper: &'m JoinRowMapper<E>,
    entities: Vec<E>,
    roots: HashMap<RowKey, usize>,
    children: ChildIndex,
    rows: usize,
}

impl<'m, E> RowCollector<'m, E> {
    pub fn new(mapper: &'m JoinRowMapper<E>) -> Self {
        Self {
            mapper,
            entities: Vec::new(),
            roots: HashMap::new(),
            children: ChildIndex::default(),
            rows: 0,
        }
    }

    /// Consume one raw row.
    ///
    /// An unseen root key materializes a new root (first-seen order is kept);
    /// a seen key reuses the existing instance. Children found in the row are
    /// merged into it either way.
    pub fn on_row(&mut self, row: &Row) -> Result<(), MappingError> {
        self.rows += 1;
        let key = self.mapper.root_key(row)?;

        match self.roots.get(&key).copied() {
            Some(position) => {
                let entity = self.entities.get_mut(position).ok_or_else(|| {
                    MappingError::Invalid(format!("root {key} missing from collector"))
                })?;
                self.mapper
                    .merge_children(entity, row, key.as_str(), &mut self.children)
            }
            None => {
                let entity = self
                    .mapper
                    .map_new(row, key.as_str(), &mut self.children)?;
                self.roots.insert(key, self.entities.len());
                self.entities.push(entity);
                Ok(())
            }
        }
    }

    pub fn state(&self) -> CollectorState {
        if self.rows == 0 {
            CollectorState::Empty
        } else {
            CollectorState::Accumulating
        }
    }

    /// Raw rows consumed so far.
    pub fn rows_seen(&self) -> usize {
        self.rows
    }

    /// Distinct root keys seen so far.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Finalize: root entities in first-seen order.
    pub fn results(self) -> Vec<E> {
        log::debug!(
            "Collapsed {} rows into {} '{}' entities",
            self.rows,
            self.entities.len(),
            self.mapper.root().table()
        );
        self.entities
    }

    /// Finalize expecting at most one root.
    ///
    /// Zero distinct keys is `Ok(None)`; more than one is
    /// [`MappingError::NonUniqueResult`].
    pub fn single_result(self) -> Result<Option<E>, MappingError> {
        let count = self.entities.len();
        if count > 1 {
            return Err(MappingError::NonUniqueResult { count });
        }
        Ok(self.results().into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::EntityMapper;
    use crate::relation::{Identity, Relation};
    use crate::row::RowView;
    use crate::value::Value;

    #[derive(Debug, Default, PartialEq)]
    struct Room {
        collabroomid: i32,
        name: String,
        chats: Vec<Chat>,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Chat {
        chatid: i32,
        reads: Vec<ChatRead>,
    }

    #[derive(Debug, PartialEq)]
    struct ChatRead {
        userid: i32,
    }

    fn room(row: &RowView<'_>) -> Result<Room, MappingError> {
        Ok(Room {
            collabroomid: row.get("collabroomid")?,
            name: row.get("name")?,
            ..Default::default()
        })
    }

    fn chat(row: &RowView<'_>) -> Result<Chat, MappingError> {
        Ok(Chat {
            chatid: row.get("chatid")?,
            ..Default::default()
        })
    }

    fn chat_read(row: &RowView<'_>) -> Result<ChatRead, MappingError> {
        Ok(ChatRead {
            userid: row.get("userid")?,
        })
    }

    fn mapper() -> JoinRowMapper<Room> {
        let reads = EntityMapper::new(
            "chat_read",
            Identity::Binary("chatid", "userid"),
            &["userid"],
            chat_read,
        );
        let chats = JoinRowMapper::new(EntityMapper::new(
            "chat",
            Identity::Unary("chatid"),
            &["chatid"],
            chat,
        ))
        .attach(reads, Relation::many("reads", |c: &mut Chat| &mut c.reads));

        JoinRowMapper::new(EntityMapper::new(
            "collabroom",
            Identity::Unary("collabroomid"),
            &["collabroomid", "name"],
            room,
        ))
        .attach(chats, Relation::many("chats", |r: &mut Room| &mut r.chats))
    }

    fn row(room: i32, chat: Option<i32>, user: Option<i32>) -> Row {
        Row::new()
            .with("collabroomid", room)
            .with("name", format!("room {room}"))
            .with("chatid", Value::Int(chat))
            .with("userid", Value::Int(user))
    }

    #[test]
    fn test_fan_out_collapses_with_grandchildren() {
        let mapper = mapper();
        let mut collector = RowCollector::new(&mapper);
        assert_eq!(collector.state(), CollectorState::Empty);

        for r in [
            row(1, Some(10), Some(100)),
            row(1, Some(10), Some(101)),
            row(1, Some(11), None),
            row(2, None, None),
            row(1, Some(10), Some(100)),
        ] {
            collector.on_row(&r).unwrap();
        }
        assert_eq!(collector.state(), CollectorState::Accumulating);
        assert_eq!(collector.rows_seen(), 5);

        let rooms = collector.results();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].collabroomid, 1);
        assert_eq!(rooms[0].chats.len(), 2);
        assert_eq!(
            rooms[0].chats[0].reads,
            vec![ChatRead { userid: 100 }, ChatRead { userid: 101 }]
        );
        assert!(rooms[0].chats[1].reads.is_empty());
        assert_eq!(rooms[1].collabroomid, 2);
        assert!(rooms[1].chats.is_empty());
    }

    #[test]
    fn test_order_follows_first_sighting() {
        let mapper = mapper();
        let mut collector = RowCollector::new(&mapper);
        for id in [3, 1, 3, 2, 1] {
            collector.on_row(&row(id, None, None)).unwrap();
        }
        let ids: Vec<i32> = collector
            .results()
            .into_iter()
            .map(|r| r.collabroomid)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_same_child_key_under_two_parents() {
        let mapper = mapper();
        let mut collector = RowCollector::new(&mapper);
        collector.on_row(&row(1, Some(10), None)).unwrap();
        collector.on_row(&row(2, Some(10), None)).unwrap();
        let rooms = collector.results();
        assert_eq!(rooms[0].chats.len(), 1);
        assert_eq!(rooms[1].chats.len(), 1);
    }

    #[test]
    fn test_single_result() {
        let mapper = mapper();
        assert_eq!(RowCollector::new(&mapper).single_result().unwrap(), None);

        let mut collector = RowCollector::new(&mapper);
        collector.on_row(&row(1, Some(10), None)).unwrap();
        collector.on_row(&row(1, Some(11), None)).unwrap();
        let room = collector.single_result().unwrap().unwrap();
        assert_eq!(room.chats.len(), 2);

        let mut collector = RowCollector::new(&mapper);
        collector.on_row(&row(1, None, None)).unwrap();
        collector.on_row(&row(2, None, None)).unwrap();
        assert_eq!(
            collector.single_result(),
            Err(MappingError::NonUniqueResult { count: 2 })
        );
    }

    #[test]
    fn test_null_root_key_fails() {
        let mapper = mapper();
        let mut collector = RowCollector::new(&mapper);
        let bad = Row::new()
            .with("collabroomid", Value::Int(None))
            .with("name", "x")
            .with("chatid", 1)
            .with("userid", 1);
        assert!(matches!(
            collector.on_row(&bad),
            Err(MappingError::NullRootKey { .. })
        ));
    }

    #[test]
    fn test_single_valued_relation_keeps_first() {
        #[derive(Debug, Default)]
        struct Incident {
            incidentid: i32,
            room: Option<Room>,
        }

        fn incident(row: &RowView<'_>) -> Result<Incident, MappingError> {
            Ok(Incident {
                incidentid: row.get("incidentid")?,
                room: None,
            })
        }

        let mapper = JoinRowMapper::new(EntityMapper::new(
            "incident",
            Identity::Unary("incidentid"),
            &["incidentid"],
            incident,
        ))
        .attach(
            EntityMapper::new(
                "collabroom",
                Identity::Unary("collabroomid"),
                &["collabroomid", "name"],
                room,
            ),
            Relation::one("room", |i: &mut Incident| &mut i.room),
        );

        let mut collector = RowCollector::new(&mapper);
        for id in [5, 6] {
            let r = Row::new()
                .with("incidentid", 1)
                .with("collabroomid", id)
                .with("name", "r");
            collector.on_row(&r).unwrap();
        }
        let incident = collector.single_result().unwrap().unwrap();
        assert_eq!(incident.incidentid, 1);
        assert_eq!(incident.room.map(|r| r.collabroomid), Some(5));
    }
}
