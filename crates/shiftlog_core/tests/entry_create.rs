use shiftlog_core::db::open_db_in_memory;
use shiftlog_core::{
    EntryDraft, EntryServiceError, Markup, RegistryService, SearchParams,
    SqliteEntryService, SqliteRegistryRepository,
};
use std::collections::BTreeSet;

fn names(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn create_stamps_owner_and_returns_submitted_references() {
    let conn = open_db_in_memory().unwrap();
    RegistryService::new(SqliteRegistryRepository::logbooks(&conn))
        .create("operations", "admin")
        .unwrap();
    RegistryService::new(SqliteRegistryRepository::tags(&conn))
        .create("rf", "admin")
        .unwrap();

    let service = SqliteEntryService::with_connection(&conn);
    let mut draft = EntryDraft::new("beam dump at 14:02");
    draft.logbooks = names(&["operations"]);
    draft.tags = names(&["rf"]);

    let created = service.create_entry(draft, "alice").unwrap();
    assert_eq!(created.owner, "alice");
    assert_eq!(created.logbooks, names(&["operations"]));
    assert_eq!(created.tags, names(&["rf"]));
    assert_eq!(created.version, 1);
    assert!(created.created_at > 0);
}

#[test]
fn created_entry_round_trips_through_get() {
    let conn = open_db_in_memory().unwrap();
    RegistryService::new(SqliteRegistryRepository::logbooks(&conn))
        .create("operations", "admin")
        .unwrap();

    let service = SqliteEntryService::with_connection(&conn);
    let mut draft = EntryDraft::new("round trip body");
    draft.logbooks = names(&["operations"]);

    let created = service.create_entry(draft, "alice").unwrap();
    let fetched = service.get_entry(created.id).unwrap();
    assert_eq!(fetched, created);
}

#[test]
fn unknown_logbook_reference_fails_and_persists_nothing() {
    let conn = open_db_in_memory().unwrap();
    RegistryService::new(SqliteRegistryRepository::logbooks(&conn))
        .create("operations", "admin")
        .unwrap();

    let service = SqliteEntryService::with_connection(&conn);
    let mut draft = EntryDraft::new("stale reference");
    draft.logbooks = names(&["operations", "decommissioned"]);

    let err = service.create_entry(draft, "alice").unwrap_err();
    assert!(matches!(
        err,
        EntryServiceError::InvalidLogbookReference(ref unknown)
            if unknown == &vec!["decommissioned".to_string()]
    ));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM entries;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn unknown_tag_reference_fails_and_persists_nothing() {
    let conn = open_db_in_memory().unwrap();
    RegistryService::new(SqliteRegistryRepository::logbooks(&conn))
        .create("operations", "admin")
        .unwrap();

    let service = SqliteEntryService::with_connection(&conn);
    let mut draft = EntryDraft::new("bad tag");
    draft.logbooks = names(&["operations"]);
    draft.tags = names(&["no-such-tag"]);

    let err = service.create_entry(draft, "alice").unwrap_err();
    assert!(matches!(err, EntryServiceError::InvalidTagReference(_)));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM entries;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn inactive_logbook_is_still_a_valid_reference() {
    let conn = open_db_in_memory().unwrap();
    let logbooks = RegistryService::new(SqliteRegistryRepository::logbooks(&conn));
    logbooks.create("legacy", "admin").unwrap();
    logbooks.soft_delete("legacy").unwrap();

    let service = SqliteEntryService::with_connection(&conn);
    let mut draft = EntryDraft::new("entry in a retired logbook");
    draft.logbooks = names(&["legacy"]);

    let created = service.create_entry(draft, "alice").unwrap();
    assert_eq!(created.logbooks, names(&["legacy"]));
}

#[test]
fn default_markup_keeps_body_verbatim() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteEntryService::with_connection(&conn);

    let created = service
        .create_entry(EntryDraft::new("**not rendered**"), "alice")
        .unwrap();
    assert_eq!(created.markup, Markup::None);
    assert_eq!(created.description.as_deref(), Some("**not rendered**"));
}

#[test]
fn commonmark_markup_renders_description_html() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteEntryService::with_connection(&conn);

    let mut draft = EntryDraft::new("**urgent** magnet quench");
    draft.markup = Markup::from_param(Some("commonmark"));

    let created = service.create_entry(draft, "alice").unwrap();
    assert_eq!(created.markup, Markup::Commonmark);
    assert!(created
        .description
        .as_deref()
        .unwrap()
        .contains("<strong>urgent</strong>"));
    assert_eq!(created.source, "**urgent** magnet quench");
}

#[test]
fn unknown_markup_discriminator_falls_back_to_default() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteEntryService::with_connection(&conn);

    let mut draft = EntryDraft::new("plain body");
    draft.markup = Markup::from_param(Some("asciidoc"));

    let created = service.create_entry(draft, "alice").unwrap();
    assert_eq!(created.markup, Markup::None);
    assert_eq!(created.description.as_deref(), Some("plain body"));
}

#[test]
fn entries_without_references_need_no_registry_rows() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteEntryService::with_connection(&conn);

    let created = service
        .create_entry(EntryDraft::new("free-floating note"), "alice")
        .unwrap();
    assert!(created.logbooks.is_empty());
    assert!(created.tags.is_empty());

    let found = service.find_entries(&SearchParams::new()).unwrap();
    assert_eq!(found.len(), 1);
}
