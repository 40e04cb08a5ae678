use super::AuditLogRepository;
use crate::domain::audit_log::AuditEntry;
use crate::engine::retention::{AuditSink, RecordPurger};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn setup_repo() -> AuditLogRepository {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    AuditLogRepository::new(Arc::new(Mutex::new(conn)))
}

fn at(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, day)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn make_entry(category: &str, created_at: NaiveDateTime) -> AuditEntry {
    let mut entry = AuditEntry::new(category, "CONFIGURATION_SAVE", "user-1", "test".to_string())
        .with_after(Some(json!({"activeDisciplines": ["ARQUITETURA"]})));
    entry.created_at = created_at;
    entry
}

#[test]
fn test_insert_and_find_by_id() {
    let repo = setup_repo();
    let entry = make_entry("budget_configuration", at(5));
    let id = repo.insert(&entry).unwrap();

    let found = repo.find_by_id(&id).unwrap().unwrap();
    assert_eq!(found.category, "budget_configuration");
    assert_eq!(found.actor_id, "user-1");
    assert_eq!(found.before_json, None);
    assert_eq!(found.after_json, Some(json!({"activeDisciplines": ["ARQUITETURA"]})));
    assert_eq!(found.created_at, at(5));
}

#[test]
fn test_find_by_category_newest_first() {
    let repo = setup_repo();
    repo.insert(&make_entry("budget_configuration", at(1))).unwrap();
    repo.insert(&make_entry("retention", at(2))).unwrap();
    repo.insert(&make_entry("budget_configuration", at(3))).unwrap();

    let found = repo.find_by_category("budget_configuration", 10).unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].created_at, at(3));

    let recent = repo.find_recent(1).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].created_at, at(3));
}

#[test]
fn test_purge_is_idempotent() {
    let repo = setup_repo();
    repo.insert(&make_entry("retention", at(1))).unwrap();
    repo.insert(&make_entry("retention", at(2))).unwrap();
    repo.insert(&make_entry("retention", at(20))).unwrap();

    let threshold = at(10);
    assert_eq!(repo.purge_older_than(threshold).unwrap(), 2);
    assert_eq!(repo.purge_older_than(threshold).unwrap(), 0);
    assert_eq!(repo.count().unwrap(), 1);

    // 阈值本身不删除
    assert_eq!(repo.purge_older_than(at(20)).unwrap(), 0);
    assert_eq!(repo.purge_older_than(at(20) + Duration::seconds(1)).unwrap(), 1);
}

#[tokio::test]
async fn test_sink_and_purger_traits() {
    let repo = setup_repo();
    AuditSink::record(&repo, "retention", "RETENTION_RUN", "system", None, Some(json!({"n": 1})), "run")
        .await
        .unwrap();
    assert_eq!(repo.count().unwrap(), 1);

    let far_future = at(1) + Duration::days(3650);
    let removed = RecordPurger::purge_older_than(&repo, far_future).await.unwrap();
    assert_eq!(removed, 1);
}
