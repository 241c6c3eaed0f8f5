//! End-to-end tests: build a query, run it through the in-memory executor and
//! collapse the fanned-out rows into entities.
//!
//! Test relationships:
//! - Incident has_many IncidentIncidentType (composite key)
//! - Incident has_one CollabRoom
//! - CollabRoom has_many Chat

use incidentdb::query::{col, QueryError, QueryFactory};
use incidentdb::test_helpers::StaticExecutor;
use incidentdb::{
    dao, DbError, Entity, EntityMapper, JoinRowMapper, MappingError, Relation, Row, Value,
};

// ============================================================================
// Test Entities
// ============================================================================

#[derive(Debug, Entity, PartialEq)]
#[table_name = "incident_incidenttype"]
struct IncidentIncidentType {
    #[primary_key]
    incidentid: i32,
    #[primary_key]
    incidenttypeid: i32,
}

#[derive(Debug, Entity)]
#[table_name = "chat"]
struct Chat {
    #[primary_key]
    chatid: i32,
    message: Option<String>,
}

#[derive(Debug, Entity)]
#[table_name = "collabroom"]
struct CollabRoom {
    #[primary_key]
    collabroomid: i32,
    name: String,
    #[relation]
    chats: Vec<Chat>,
}

#[derive(Debug, Entity)]
#[table_name = "incident"]
struct Incident {
    #[primary_key]
    incidentid: i32,
    incidentname: String,
    #[relation]
    incident_types: Vec<IncidentIncidentType>,
    #[relation]
    collabroom: Option<CollabRoom>,
}

fn incident_mapper() -> JoinRowMapper<Incident> {
    JoinRowMapper::for_entity().attach(
        EntityMapper::<IncidentIncidentType>::for_entity(),
        Relation::many("incident_types", |i: &mut Incident| &mut i.incident_types),
    )
}

fn incident_row(incidentid: i32, incidenttypeid: Option<i32>) -> Row {
    Row::new()
        .with("incidentid", incidentid)
        .with("incidentname", format!("Incident {incidentid}"))
        .with("incidenttypeid", incidenttypeid)
}

fn incident_query() -> incidentdb::BuiltQuery {
    QueryFactory::new_query("incident")
        .select_all()
        .left_join("incident_incidenttype")
        .using(["incidentid"])
        .r#where(col("workspaceid").eq(1))
        .order_by_asc("incidentname")
        .build()
        .unwrap()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_one_incident_three_types() {
    let executor = StaticExecutor::new();
    executor.push_rows((1..=3).map(|t| incident_row(10, Some(t))).collect());

    let incidents = dao::fetch_all(&executor, &incident_query(), &incident_mapper()).unwrap();

    assert_eq!(incidents.len(), 1);
    let types: Vec<i32> = incidents[0]
        .incident_types
        .iter()
        .map(|t| t.incidenttypeid)
        .collect();
    assert_eq!(types, vec![1, 2, 3]);

    let statement = &executor.statements()[0];
    assert_eq!(
        statement.sql,
        "SELECT * FROM incident LEFT JOIN incident_incidenttype USING (incidentid) \
         WHERE incident.workspaceid = :workspaceid ORDER BY incident.incidentname ASC"
    );
}

#[test]
fn test_outer_join_without_children() {
    let executor = StaticExecutor::new();
    executor.push_rows(vec![
        incident_row(1, None),
        incident_row(2, Some(5)),
        incident_row(2, Some(5)),
        incident_row(2, Some(6)),
    ]);

    let incidents = dao::fetch_all(&executor, &incident_query(), &incident_mapper()).unwrap();

    assert_eq!(incidents.len(), 2);
    assert!(incidents[0].incident_types.is_empty());
    assert_eq!(incidents[1].incident_types.len(), 2);
}

#[test]
fn test_root_order_follows_first_appearance() {
    let executor = StaticExecutor::new();
    executor.push_rows(vec![
        incident_row(3, Some(1)),
        incident_row(1, Some(1)),
        incident_row(3, Some(2)),
        incident_row(2, None),
    ]);

    let ids: Vec<i32> = dao::fetch_all(&executor, &incident_query(), &incident_mapper())
        .unwrap()
        .iter()
        .map(|i| i.incidentid)
        .collect();
    assert_eq!(ids, vec![3, 1, 2]);
}

#[test]
fn test_single_result_zero_rows_is_absent() {
    let executor = StaticExecutor::new();
    let query = QueryFactory::new_query("incident")
        .select_all()
        .r#where(col("incidentid").eq(404))
        .build()
        .unwrap();

    let found = dao::fetch_single(&executor, &query, &JoinRowMapper::<Incident>::for_entity())
        .unwrap();
    assert!(found.is_none());
}

#[test]
fn test_nested_has_one_and_grandchildren() {
    let chats = JoinRowMapper::from(EntityMapper::<Chat>::for_entity());
    let room = JoinRowMapper::from(EntityMapper::<CollabRoom>::for_entity())
        .attach(chats, Relation::many("chats", |r: &mut CollabRoom| &mut r.chats));
    let mapper = JoinRowMapper::<Incident>::for_entity()
        .attach(room, Relation::one("collabroom", |i: &mut Incident| &mut i.collabroom));

    let row = |chatid: Option<i32>| {
        Row::new()
            .with("incidentid", 1)
            .with("incidentname", "Flood")
            .with("collabroomid", 8)
            .with("name", "Ops")
            .with("chatid", chatid)
            .with("message", Value::String(None))
    };

    let executor = StaticExecutor::new();
    executor.push_rows(vec![row(Some(100)), row(Some(101)), row(Some(100))]);

    let query = QueryFactory::new_query("incident")
        .select_all()
        .join("collabroom")
        .using(["incidentid"])
        .left_join("chat")
        .using(["collabroomid"])
        .r#where(col("incidentid").eq(1))
        .build()
        .unwrap();

    let incident = dao::fetch_single(&executor, &query, &mapper)
        .unwrap()
        .unwrap();
    let room = incident.collabroom.as_ref().unwrap();
    assert_eq!(room.name, "Ops");
    let chat_ids: Vec<i32> = room.chats.iter().map(|c| c.chatid).collect();
    assert_eq!(chat_ids, vec![100, 101]);
    assert!(room.chats[0].message.is_none());
}

#[test]
fn test_chat_insert_parameters() {
    let executor = StaticExecutor::new();
    executor.push_rows(vec![Row::new().with("chatid", 77)]);

    let query = QueryFactory::new_query("chat")
        .insert_into(["collabroomid", "userorgid", "created", "seqnum", "message"])
        .return_value(["chatid"])
        .bind("collabroomid", 5)
        .bind("userorgid", 7)
        .bind("created", 1_700_000_000_000i64)
        .bind("seqnum", 1)
        .bind("message", "hi")
        .build()
        .unwrap();

    assert!(query
        .to_sql()
        .contains("INSERT INTO chat (collabroomid, userorgid, created, seqnum, message) VALUES ("));
    assert!(query.to_sql().ends_with("RETURNING chatid"));
    assert_eq!(query.parameters().len(), 5);

    let chatid: i32 = dao::insert_returning(&executor, &query).unwrap();
    assert_eq!(chatid, 77);
}

#[test]
fn test_parameter_parity_is_checked_before_io() {
    let err = QueryFactory::new_query("chat")
        .update(["message"])
        .r#where(col("chatid").eq(1))
        .build()
        .unwrap_err();
    assert_eq!(err, QueryError::UnboundParameter("message".to_string()));

    let err = QueryFactory::new_query("chat")
        .select_all()
        .bind("unused", 1)
        .build()
        .unwrap_err();
    assert_eq!(err, QueryError::UnusedParameter("unused".to_string()));
}

#[test]
fn test_null_root_key_is_reported() {
    let executor = StaticExecutor::new();
    executor.push_rows(vec![Row::new()
        .with("incidentid", Option::<i32>::None)
        .with("incidentname", "ghost")
        .with("incidenttypeid", Option::<i32>::None)]);

    let err = dao::fetch_all(&executor, &incident_query(), &incident_mapper()).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        DbError::Mapping(MappingError::NullRootKey { .. })
    ));
}

#[test]
fn test_entity_select_list() {
    assert_eq!(Incident::columns(), &["incidentid", "incidentname"]);
    assert_eq!(
        incident_mapper().select_list().unwrap_err(),
        MappingError::AmbiguousColumn {
            column: "incidentid".to_string()
        }
    );

    let aliased = JoinRowMapper::<Incident>::for_entity().attach(
        EntityMapper::<IncidentIncidentType>::for_entity().with_prefix("it_"),
        Relation::many("incident_types", |i: &mut Incident| &mut i.incident_types),
    );
    assert_eq!(
        aliased.select_list().unwrap(),
        vec![
            "incident.incidentid",
            "incident.incidentname",
            "incident_incidenttype.incidentid AS it_incidentid",
            "incident_incidenttype.incidenttypeid AS it_incidenttypeid",
        ]
    );
}

#[test]
fn test_has_one_keyed_on_parent_column() {
    #[derive(Debug, Entity)]
    #[table_name = "collabroom"]
    struct Room {
        #[primary_key]
        collabroomid: i32,
        incidentid: i32,
        #[relation]
        incident: Option<Incident>,
    }

    let mapper = |prefix: Option<&str>| {
        let mut child = EntityMapper::<Incident>::for_entity();
        if let Some(prefix) = prefix {
            child = child.with_prefix(prefix);
        }
        JoinRowMapper::<Room>::for_entity()
            .attach(child, Relation::one("incident", |r: &mut Room| &mut r.incident))
    };

    // Unaliased: the outer-join non-match leaves two incidentid cells, 42 and NULL.
    let executor = StaticExecutor::new();
    executor.push_rows(vec![Row::new()
        .with("collabroomid", 3)
        .with("incidentid", 42)
        .with("incidentid", Option::<i32>::None)
        .with("incidentname", Option::<String>::None)]);
    let query = QueryFactory::new_query("collabroom")
        .select_all()
        .left_join("incident")
        .on("collabroom.incidentid", "incident.incidentid")
        .build()
        .unwrap();
    let err = dao::fetch_all(&executor, &query, &mapper(None)).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        DbError::Mapping(MappingError::AmbiguousColumn { column }) if column == "incidentid"
    ));
    assert!(mapper(None).select_list().is_err());

    // Aliased: a room without an incident maps to `None`.
    let aliased = mapper(Some("incident_"));
    let select = aliased.select_list().unwrap();
    assert!(select.contains(&"incident.incidentid AS incident_incidentid".to_string()));

    let executor = StaticExecutor::new();
    executor.push_rows(vec![
        Row::new()
            .with("collabroomid", 3)
            .with("incidentid", 42)
            .with("incident_incidentid", Option::<i32>::None)
            .with("incident_incidentname", Option::<String>::None),
        Row::new()
            .with("collabroomid", 4)
            .with("incidentid", 7)
            .with("incident_incidentid", 7)
            .with("incident_incidentname", "Flood"),
    ]);
    let rooms = dao::fetch_all(&executor, &query, &aliased).unwrap();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0].incidentid, 42);
    assert!(rooms[0].incident.is_none());
    let incident = rooms[1].incident.as_ref().unwrap();
    assert_eq!(incident.incidentid, 7);
    assert_eq!(incident.incidentname, "Flood");
}
