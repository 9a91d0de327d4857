use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use small_library::core::bootstrap::default_library;
use small_library::core::catalog::all_books;
use small_library::core::query::{search_by_title, sort_by, BookField};
use small_library::{
    BookId, Catalog, LendingEngine, LibraryError, LoanTerm, ManualClock, PatronRegistry, Role,
};

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 10, 0, 0).unwrap()
}

fn engine_with_clock() -> (LendingEngine, Arc<ManualClock>) {
    let (catalog, registry) = default_library().unwrap();
    let clock = Arc::new(ManualClock::new(start()));
    let engine = LendingEngine::new(catalog, registry, LoanTerm::from_secs(30), clock.clone());
    (engine, clock)
}

/// 每本書只能出現在架上或某一位讀者手上，且借閱日期與位置一致
fn assert_partition_invariant(engine: &LendingEngine) {
    let mut seen = HashSet::new();

    for book in engine.catalog().list_available() {
        assert!(seen.insert(book.id()), "{} appears twice", book.id());
        assert!(book.loan_date().is_none(), "{} on shelf with loan date", book.id());
    }
    for patron in engine.registry().all() {
        for book in patron.borrowed() {
            assert!(seen.insert(book.id()), "{} appears twice", book.id());
            assert!(book.is_on_loan(), "{} on loan without loan date", book.id());
        }
    }

    assert_eq!(seen.len(), all_books(engine.catalog(), engine.registry()).len());
}

fn available_titles(engine: &LendingEngine) -> Vec<String> {
    engine
        .catalog()
        .list_available()
        .iter()
        .map(|b| b.title.clone())
        .collect()
}

#[test]
fn test_alice_borrows_and_returns() {
    let mut registry = PatronRegistry::new();
    registry.register("alice", Role::Member).unwrap();
    registry.register("admin", Role::Librarian).unwrap();
    let clock = Arc::new(ManualClock::new(start()));
    let mut engine = LendingEngine::new(Catalog::new(), registry, LoanTerm::default(), clock);

    let admin = engine.login("admin").unwrap();
    let a = engine.add_book(&admin, "A", "Author A", "").unwrap();
    engine.add_book(&admin, "B", "Author B", "").unwrap();

    let alice = engine.login("alice").unwrap();
    engine.borrow(&alice, a).unwrap();

    assert_eq!(available_titles(&engine), vec!["B"]);
    let borrowed = engine.current_patron(&alice).unwrap().borrowed();
    assert_eq!(borrowed.len(), 1);
    assert_eq!(borrowed[0].id(), a);
    assert_eq!(borrowed[0].loan_date(), Some(start()));
    assert_partition_invariant(&engine);

    engine.return_book(&alice, 0).unwrap();

    assert_eq!(available_titles(&engine), vec!["B", "A"]);
    assert!(engine.current_patron(&alice).unwrap().borrowed().is_empty());
    assert!(engine.catalog().get(a).unwrap().loan_date().is_none());
    assert_partition_invariant(&engine);
}

#[test]
fn test_invariant_holds_across_mixed_operations() {
    let (mut engine, clock) = engine_with_clock();
    let johan = engine.login("johan").unwrap();
    let peter = engine.login("peter").unwrap();
    let admin = engine.login("admin").unwrap();

    let ids: Vec<BookId> = engine.catalog().list_available().iter().map(|b| b.id()).collect();

    engine.borrow(&johan, ids[0]).unwrap();
    clock.advance(Duration::seconds(5));
    engine.borrow(&peter, ids[1]).unwrap();
    engine.borrow(&johan, ids[2]).unwrap();
    assert_partition_invariant(&engine);

    // 同一本書不能被兩位讀者借走
    assert!(matches!(engine.borrow(&peter, ids[0]), Err(LibraryError::NotFound { .. })));
    assert_partition_invariant(&engine);

    engine.return_book(&johan, 0).unwrap();
    engine.remove_book(&admin, ids[3]).unwrap();
    let new_id = engine.add_book(&admin, "Dune", "Herbert, Frank", "Spice").unwrap();
    engine.borrow(&peter, new_id).unwrap();
    assert_partition_invariant(&engine);

    let johan_titles: Vec<_> = engine
        .current_patron(&johan)
        .unwrap()
        .borrowed()
        .iter()
        .map(|b| b.title.as_str())
        .collect();
    assert_eq!(johan_titles, vec!["The Lord of the Rings"]);
}

#[test]
fn test_return_keeps_remaining_order() {
    let (mut engine, _) = engine_with_clock();
    let kalle = engine.login("kalle").unwrap();
    let ids: Vec<BookId> = engine.catalog().list_available().iter().map(|b| b.id()).collect();
    for id in &ids[..3] {
        engine.borrow(&kalle, *id).unwrap();
    }

    engine.return_book(&kalle, 1).unwrap();

    let remaining: Vec<BookId> = engine
        .current_patron(&kalle)
        .unwrap()
        .borrowed()
        .iter()
        .map(|b| b.id())
        .collect();
    assert_eq!(remaining, vec![ids[0], ids[2]]);
}

#[test]
fn test_return_with_bad_index_changes_nothing() {
    let (mut engine, _) = engine_with_clock();
    let kalle = engine.login("kalle").unwrap();
    let id = engine.catalog().list_available()[0].id();
    engine.borrow(&kalle, id).unwrap();
    let before = engine.snapshot();

    let err = engine.return_book(&kalle, 1).unwrap_err();
    assert!(matches!(err, LibraryError::IndexOutOfRange { index: 1, len: 1 }));
    assert_eq!(engine.snapshot(), before);
}

#[test]
fn test_member_rejected_from_librarian_actions() {
    let (mut engine, _) = engine_with_clock();
    let johan = engine.login("johan").unwrap();
    let id = engine.catalog().list_available()[0].id();
    let before = engine.snapshot();

    for result in [
        engine.add_book(&johan, "X", "Y", "Z").map(|_| ()),
        engine.remove_book(&johan, id).map(|_| ()),
    ] {
        assert!(matches!(result, Err(LibraryError::Unauthorized { .. })));
    }
    assert!(matches!(engine.list_patrons(&johan), Err(LibraryError::Unauthorized { .. })));
    assert!(matches!(engine.all_loans(&johan), Err(LibraryError::Unauthorized { .. })));
    assert!(matches!(
        engine.search_patrons(&johan, "pe"),
        Err(LibraryError::Unauthorized { .. })
    ));
    assert!(matches!(
        engine.loans_of(&johan, "peter"),
        Err(LibraryError::Unauthorized { .. })
    ));

    assert_eq!(engine.snapshot(), before);
}

#[test]
fn test_member_cannot_read_other_patrons_loans() {
    let (mut engine, _) = engine_with_clock();
    let peter = engine.login("peter").unwrap();
    let johan = engine.login("johan").unwrap();
    let id = engine.catalog().list_available()[0].id();
    engine.borrow(&peter, id).unwrap();

    assert!(matches!(engine.all_loans(&johan), Err(LibraryError::Unauthorized { .. })));
    assert!(matches!(engine.list_patrons(&johan), Err(LibraryError::Unauthorized { .. })));
    assert!(matches!(
        engine.search_patrons(&johan, ""),
        Err(LibraryError::Unauthorized { .. })
    ));
    assert!(matches!(
        engine.loans_of(&johan, "peter"),
        Err(LibraryError::Unauthorized { .. })
    ));

    // 自己的借閱仍可查看，且不含別人的書
    assert!(engine.my_loans(&johan).unwrap().is_empty());
    assert_eq!(engine.my_loans(&peter).unwrap().len(), 1);
}

#[test]
fn test_librarian_reports() {
    let (mut engine, _) = engine_with_clock();
    let peter = engine.login("peter").unwrap();
    let admin = engine.login("admin").unwrap();
    let id = engine.catalog().list_available()[4].id();
    engine.borrow(&peter, id).unwrap();

    let loans = engine.all_loans(&admin).unwrap();
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].book.title, "Nineteen Eighty Four");
    assert_eq!(loans[0].borrower.name(), "peter");

    let of_peter = engine.loans_of(&admin, "peter").unwrap();
    assert_eq!(of_peter.len(), 1);
    assert!(matches!(
        engine.loans_of(&admin, "nobody"),
        Err(LibraryError::NotFound { .. })
    ));

    let names: Vec<_> = engine
        .list_patrons(&admin)
        .unwrap()
        .iter()
        .map(|p| p.name())
        .collect();
    assert_eq!(names, vec!["johan", "peter", "kalle", "admin"]);

    let hits = engine.search_patrons(&admin, "E").unwrap();
    let hit_names: Vec<_> = hits.iter().map(|p| p.name()).collect();
    assert_eq!(hit_names, vec!["peter", "kalle"]);
}

#[test]
fn test_overdue_boundary_through_engine() {
    let (mut engine, clock) = engine_with_clock();
    let johan = engine.login("johan").unwrap();
    let id = engine.catalog().list_available()[0].id();
    engine.borrow(&johan, id).unwrap();

    clock.set(start() + Duration::seconds(30));
    let loans = engine.my_loans(&johan).unwrap();
    assert!(!loans[0].overdue);
    assert!(!engine.is_overdue(loans[0].book));
    assert_eq!(loans[0].due_date, start() + Duration::seconds(30));

    clock.set(start() + Duration::seconds(30) + Duration::nanoseconds(1));
    let loans = engine.my_loans(&johan).unwrap();
    assert!(loans[0].overdue);
    assert_eq!(engine.overdue_notices(&johan).unwrap().len(), 1);
}

#[test]
fn test_borrowed_book_stays_discoverable() {
    let (mut engine, _) = engine_with_clock();
    let johan = engine.login("johan").unwrap();
    let harry = search_by_title(engine.catalog(), engine.registry(), "harry")[0]
        .book
        .id();
    engine.borrow(&johan, harry).unwrap();

    let hits = search_by_title(engine.catalog(), engine.registry(), "HARRY");
    assert_eq!(hits.len(), 1);
    assert!(!hits[0].is_available());
    assert_eq!(hits[0].borrower.map(|p| p.name()), Some("johan"));

    let sorted = sort_by(engine.catalog(), engine.registry(), BookField::Author);
    let authors: Vec<_> = sorted.iter().map(|e| e.book.author.as_str()).collect();
    assert_eq!(
        authors,
        vec![
            "Bloch, Joshua",
            "Orwell, George",
            "Rowling, J.K.",
            "Tolkien, J. R. R.",
            "Toole, John Kennedy",
        ]
    );
}
