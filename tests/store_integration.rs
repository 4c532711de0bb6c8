use std::fs;

use tempfile::tempdir;

use testdesk::bank::{EmbeddedBank, QuestionBank, TestDescriptor, TestType};
use testdesk::session::{Command, Session};
use testdesk::store::{export_results_csv, SessionStore, SqliteStore, StoreSink};
use testdesk::submission::SubmitTrigger;

fn run_to_submission(store: SqliteStore, questions: usize) -> Session {
    let descriptor = TestDescriptor::new("store-it", "Store Mock", TestType::Quantitative, questions, 1);
    let qs = EmbeddedBank::with_seed(2).load(&descriptor).unwrap();
    let mut session = Session::init(descriptor, qs)
        .unwrap()
        .with_sink(Box::new(StoreSink::new(store)));
    session.handle(Command::Select(3));
    session.handle(Command::Tick);
    session.handle(Command::Submit);
    session
}

#[test]
fn submitted_results_survive_reopening_the_database() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("nested").join("results.db");

    let session = run_to_submission(SqliteStore::open(&db).unwrap(), 3);
    let submitted = session.teardown().unwrap();

    let reopened = SqliteStore::open(&db).unwrap();
    let recent = reopened.recent_results(10).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].test_id, "store-it");
    assert_eq!(recent[0].answered_count, 1);
    assert_eq!(recent[0].elapsed_seconds, 1);
    assert_eq!(recent[0].trigger, SubmitTrigger::Manual);
    assert_eq!(recent[0].answers, submitted.answers);
}

#[test]
fn descriptors_can_be_resumed_by_key() {
    let dir = tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("s.db")).unwrap();
    let descriptor = TestDescriptor::new("vrb-101-5q-3m", "Verbal", TestType::Verbal, 5, 3);

    assert!(store.load_session("vrb-101-5q-3m").unwrap().is_none());
    store.save_session(&descriptor.id, &descriptor).unwrap();
    assert_eq!(
        store.load_session("vrb-101-5q-3m").unwrap(),
        Some(descriptor.clone())
    );

    let mut longer = descriptor.clone();
    longer.duration_minutes = 10;
    store.save_session(&descriptor.id, &longer).unwrap();
    assert_eq!(store.load_session(&descriptor.id).unwrap(), Some(longer));
}

#[test]
fn history_is_newest_first_and_exports_to_csv() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("h.db");
    for n in 1..=3 {
        run_to_submission(SqliteStore::open(&db).unwrap(), n);
    }

    let store = SqliteStore::open(&db).unwrap();
    let recent = store.recent_results(2).unwrap();
    let counts: Vec<usize> = recent.iter().map(|r| r.question_count()).collect();
    assert_eq!(counts, vec![3, 2]);

    let csv_path = dir.path().join("out.csv");
    let mut all = store.recent_results(100).unwrap();
    all.reverse();
    export_results_csv(&all, fs::File::create(&csv_path).unwrap()).unwrap();

    let text = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("submitted_at,test_id"));
    assert!(lines[1].ends_with(",1,1,0,0,1,Manual"));
    assert!(lines[3].ends_with(",3,1,0,2,1,Manual"));

    assert_eq!(store.clear_results().unwrap(), 3);
    assert!(store.recent_results(10).unwrap().is_empty());
}
