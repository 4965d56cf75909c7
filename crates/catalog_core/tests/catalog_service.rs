use catalog_core::db::open_db_in_memory;
use catalog_core::{
    AuthorDto, AuthorRemovalPolicy, BookDto, CatalogError, CatalogService, EntityKind,
};
use chrono::NaiveDate;
use rusqlite::Connection;

fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

fn book(isbn: &str, title: &str, authors: &[(&str, &str)], publisher: &str) -> BookDto {
    BookDto {
        isbn: isbn.to_string(),
        title: title.to_string(),
        authors: authors
            .iter()
            .map(|(name, birth)| AuthorDto::new(*name, date(birth)))
            .collect(),
        publisher: publisher.to_string(),
    }
}

fn go_book() -> BookDto {
    book("123", "Go", &[("Rob", "1956-01-01")], "OReilly")
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn assert_not_found<T: std::fmt::Debug>(
    result: Result<T, CatalogError>,
    kind: EntityKind,
    key: &str,
) {
    match result {
        Err(CatalogError::NotFound {
            kind: actual_kind,
            key: actual_key,
        }) => {
            assert_eq!(actual_kind, kind);
            assert_eq!(actual_key, key);
        }
        other => panic!("expected {kind} not found, got {other:?}"),
    }
}

#[test]
fn add_then_find_returns_matching_book() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CatalogService::try_new(&mut conn).unwrap();

    assert!(service.add_book(&go_book()).unwrap());

    let found = service.find_book_by_isbn("123").unwrap();
    assert_eq!(found, go_book());
    assert_eq!(found.author_names(), vec!["Rob"]);
    assert_eq!(found.publisher, "OReilly");
}

#[test]
fn adding_duplicate_isbn_returns_false_and_keeps_record() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CatalogService::try_new(&mut conn).unwrap();
    assert!(service.add_book(&go_book()).unwrap());

    let impostor = book("123", "Not Go", &[("Ken", "1943-02-04")], "Prentice Hall");
    assert!(!service.add_book(&impostor).unwrap());

    assert_eq!(service.find_book_by_isbn("123").unwrap(), go_book());
    drop(service);
    assert_eq!(row_count(&conn, "authors"), 1);
    assert_eq!(row_count(&conn, "publishers"), 1);
}

#[test]
fn existing_author_is_reused_without_changes() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CatalogService::try_new(&mut conn).unwrap();
    service.add_book(&go_book()).unwrap();

    let second = book("456", "Plan 9", &[("Rob", "1999-09-09")], "Bell Labs");
    assert!(service.add_book(&second).unwrap());

    let authors = service.find_authors_by_book("456").unwrap();
    assert_eq!(authors, vec![AuthorDto::new("Rob", date("1956-01-01"))]);
    drop(service);
    assert_eq!(row_count(&conn, "authors"), 1);
    assert_eq!(row_count(&conn, "publishers"), 2);
}

#[test]
fn lookups_on_missing_keys_fail_with_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CatalogService::try_new(&mut conn).unwrap();

    assert_not_found(service.find_book_by_isbn("404"), EntityKind::Book, "404");
    assert_not_found(service.remove_book("404"), EntityKind::Book, "404");
    assert_not_found(service.update_book("404", "x"), EntityKind::Book, "404");
    assert_not_found(service.find_authors_by_book("404"), EntityKind::Book, "404");
    assert_not_found(
        service.find_books_by_author("Nobody"),
        EntityKind::Author,
        "Nobody",
    );
    assert_not_found(
        service.find_books_by_publisher("Nobody"),
        EntityKind::Publisher,
        "Nobody",
    );
    assert_not_found(service.remove_author("Nobody"), EntityKind::Author, "Nobody");
}

#[test]
fn update_changes_title_only() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CatalogService::try_new(&mut conn).unwrap();
    service.add_book(&go_book()).unwrap();

    let updated = service
        .update_book("123", "The Go Programming Language")
        .unwrap();

    let mut expected = go_book();
    expected.title = "The Go Programming Language".to_string();
    assert_eq!(updated, expected);
    assert_eq!(service.find_book_by_isbn("123").unwrap(), expected);
}

#[test]
fn remove_book_returns_prior_state_and_keeps_related_entities() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CatalogService::try_new(&mut conn).unwrap();
    service.add_book(&go_book()).unwrap();

    let removed = service.remove_book("123").unwrap();
    assert_eq!(removed, go_book());
    assert!(service.find_book_by_isbn("123").unwrap_err().is_not_found());

    assert!(service.find_books_by_author("Rob").unwrap().is_empty());
    assert!(service.find_books_by_publisher("OReilly").unwrap().is_empty());
}

#[test]
fn books_by_author_returns_exactly_the_authored_books() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CatalogService::try_new(&mut conn).unwrap();
    service.add_book(&go_book()).unwrap();
    service
        .add_book(&book(
            "100",
            "The C Programming Language",
            &[("Brian", "1942-01-01"), ("Dennis", "1941-09-09")],
            "Prentice Hall",
        ))
        .unwrap();
    service
        .add_book(&book(
            "200",
            "The Practice of Programming",
            &[("Brian", "1942-01-01"), ("Rob", "1956-01-01")],
            "Addison-Wesley",
        ))
        .unwrap();

    let isbns = |books: Vec<BookDto>| books.into_iter().map(|b| b.isbn).collect::<Vec<_>>();
    assert_eq!(
        isbns(service.find_books_by_author("Rob").unwrap()),
        vec!["123", "200"]
    );
    assert_eq!(
        isbns(service.find_books_by_author("Dennis").unwrap()),
        vec!["100"]
    );
    assert_eq!(
        isbns(service.find_books_by_publisher("Prentice Hall").unwrap()),
        vec!["100"]
    );

    let by_rob = service.find_books_by_author("Rob").unwrap();
    assert!(by_rob.iter().all(|b| b.author_names().contains(&"Rob")));
    assert_eq!(by_rob[1].publisher, "Addison-Wesley");
}

#[test]
fn publishers_by_author_are_distinct_and_sorted() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CatalogService::try_new(&mut conn).unwrap();
    service.add_book(&go_book()).unwrap();
    service
        .add_book(&book("2", "Two", &[("Rob", "1956-01-01")], "OReilly"))
        .unwrap();
    service
        .add_book(&book("3", "Three", &[("Rob", "1956-01-01")], "Addison-Wesley"))
        .unwrap();

    assert_eq!(
        service.find_publishers_by_author("Rob").unwrap(),
        vec!["Addison-Wesley", "OReilly"]
    );
    assert!(service
        .find_publishers_by_author("Nobody")
        .unwrap()
        .is_empty());
}

#[test]
fn remove_author_detaches_without_cascade_by_default() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CatalogService::try_new(&mut conn).unwrap();
    assert_eq!(service.removal_policy(), AuthorRemovalPolicy::Detach);
    service.add_book(&go_book()).unwrap();

    let removed = service.remove_author("Rob").unwrap();
    assert_eq!(removed, AuthorDto::new("Rob", date("1956-01-01")));

    assert!(service.find_authors_by_book("123").unwrap().is_empty());
    let survivor = service.find_book_by_isbn("123").unwrap();
    assert_eq!(survivor.title, "Go");
    assert_eq!(survivor.publisher, "OReilly");
    assert!(service.find_books_by_author("Rob").unwrap_err().is_not_found());
}

#[test]
fn cascade_policy_removes_sole_authored_books_and_orphaned_publishers() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CatalogService::try_new(&mut conn)
        .unwrap()
        .with_removal_policy(AuthorRemovalPolicy::Cascade);

    service.add_book(&go_book()).unwrap();
    service
        .add_book(&book(
            "200",
            "The Practice of Programming",
            &[("Brian", "1942-01-01"), ("Rob", "1956-01-01")],
            "Addison-Wesley",
        ))
        .unwrap();
    service
        .add_book(&book("300", "Unix", &[("Ken", "1943-02-04")], "OReilly"))
        .unwrap();
    service
        .add_book(&book("400", "Limbo", &[("Rob", "1956-01-01")], "Vita Nuova"))
        .unwrap();

    service.remove_author("Rob").unwrap();

    assert!(service.find_book_by_isbn("123").unwrap_err().is_not_found());
    assert!(service.find_book_by_isbn("400").unwrap_err().is_not_found());
    let co_authored = service.find_book_by_isbn("200").unwrap();
    assert_eq!(co_authored.author_names(), vec!["Brian"]);

    // OReilly still publishes "300"; Vita Nuova lost its only book.
    assert_eq!(service.find_books_by_publisher("OReilly").unwrap().len(), 1);
    assert_not_found(
        service.find_books_by_publisher("Vita Nuova"),
        EntityKind::Publisher,
        "Vita Nuova",
    );
}

#[test]
fn duplicate_author_names_in_one_request_link_once() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CatalogService::try_new(&mut conn).unwrap();

    let twice = book(
        "123",
        "Go",
        &[("Rob", "1956-01-01"), ("Rob", "1960-06-06")],
        "OReilly",
    );
    assert!(service.add_book(&twice).unwrap());

    let authors = service.find_authors_by_book("123").unwrap();
    assert_eq!(authors, vec![AuthorDto::new("Rob", date("1956-01-01"))]);
}

#[test]
fn failed_write_rolls_back_side_effects() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_books BEFORE INSERT ON books
         BEGIN
             SELECT RAISE(ABORT, 'books are read-only');
         END;",
    )
    .unwrap();

    {
        let mut service = CatalogService::try_new(&mut conn).unwrap();
        let err = service.add_book(&go_book()).unwrap_err();
        assert!(matches!(err, CatalogError::Repo(_)));
    }

    assert_eq!(row_count(&conn, "authors"), 0);
    assert_eq!(row_count(&conn, "publishers"), 0);
}

#[test]
fn book_dto_uses_camel_case_wire_names() {
    let json = serde_json::to_value(go_book()).unwrap();
    assert_eq!(json["authors"][0]["birthDate"], "1956-01-01");
    assert_eq!(json["publisher"], "OReilly");

    let parsed: BookDto = serde_json::from_value(serde_json::json!({
        "isbn": "9",
        "title": "Untitled",
        "publisher": "Nobody"
    }))
    .unwrap();
    assert!(parsed.authors.is_empty());
}
