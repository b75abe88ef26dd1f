//! Labeling sessions against a file-backed ledger

use std::collections::{HashSet, VecDeque};
use std::path::Path;

use hostrel_common::db::init_database;
use hostrel_common::db::occurrences::{insert_occurrence, upsert_host, Occurrence};
use hostrel_common::{Error, LabelCodes, Platform, RelevanceCode, Result};
use hostrel_label::{session_rng, HostOutcome, LabelSession, ReviewSink, TableSpec};
use hostrel_label::LabelLedger;
use sqlx::SqlitePool;
use tokio::runtime::Handle;

/// Annotator replaying fixed answers; closed input once they run out
struct ScriptedSink {
    answers: VecDeque<String>,
    prompts: Vec<String>,
    tables: Vec<TableSpec>,
    lines: Vec<String>,
}

impl ScriptedSink {
    fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            prompts: Vec::new(),
            tables: Vec::new(),
            lines: Vec::new(),
        }
    }

    fn repeating(answer: &str, times: usize) -> Self {
        Self::new(&vec![answer; times])
    }
}

impl ReviewSink for ScriptedSink {
    fn show_table(&mut self, table: &TableSpec) -> Result<()> {
        self.tables.push(table.clone());
        Ok(())
    }

    fn show_line(&mut self, line: &str) -> Result<()> {
        self.lines.push(line.to_string());
        Ok(())
    }

    fn prompt(&mut self, question: &str) -> Result<Option<String>> {
        self.prompts.push(question.to_string());
        Ok(self.answers.pop_front())
    }
}

async fn seeded_pool(path: &Path) -> SqlitePool {
    let pool = init_database(path).await.unwrap();

    upsert_host(&pool, "example.com", 5).await.unwrap();
    for (article, video) in [("art1", "v1"), ("art1", "v2"), ("art2", "v1")] {
        insert_occurrence(&pool, "example.com", &Occurrence::new(article, Platform::Youtube, video))
            .await
            .unwrap();
    }

    upsert_host(&pool, "short.example", 2).await.unwrap();
    insert_occurrence(&pool, "short.example", &Occurrence::new("s/1", Platform::Twitter, "t1"))
        .await
        .unwrap();

    upsert_host(&pool, "both.example", 3).await.unwrap();
    insert_occurrence(&pool, "both.example", &Occurrence::new("b/1", Platform::Facebook, "f1"))
        .await
        .unwrap();
    insert_occurrence(&pool, "both.example", &Occurrence::new("b/2", Platform::Youtube, "y1"))
        .await
        .unwrap();

    pool
}

async fn label_row(pool: &SqlitePool, host: &str) -> (i64, i64, i64) {
    sqlx::query_as(
        "SELECT twitter_relevant, facebook_relevant, youtube_relevant FROM labeled_hosts WHERE hostname = ?",
    )
    .bind(host)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_full_session_labels_every_host_once() {
    let dir = tempfile::tempdir().unwrap();
    let pool = seeded_pool(&dir.path().join("hostrel.db")).await;
    upsert_host(&pool, "quiet.example", 9).await.unwrap();

    let session = LabelSession::new(pool.clone());
    let mut sink = ScriptedSink::repeating("1", 10);
    let summary = session.run(&mut sink, &mut session_rng(Some(11))).await.unwrap();

    assert_eq!(summary.labeled, 4);
    assert_eq!(summary.skipped, 0);
    assert!(!summary.quit);

    // One prompt per present platform: youtube, twitter, facebook + youtube
    assert_eq!(sink.prompts.len(), 4);
    assert_eq!(sink.tables.len(), 4);

    assert_eq!(label_row(&pool, "example.com").await, (4, 4, 1));
    assert_eq!(label_row(&pool, "short.example").await, (1, 4, 4));
    assert_eq!(label_row(&pool, "both.example").await, (4, 1, 1));
    assert_eq!(label_row(&pool, "quiet.example").await, (4, 4, 4));

    let pending = session.ledger().pending_hosts(&mut session_rng(None)).await.unwrap();
    assert!(pending.is_empty());
}

#[tokio::test]
async fn test_resume_after_limit_never_repeats_hosts() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("hostrel.db");
    let pool = seeded_pool(&db_path).await;

    let first = LabelSession::new(pool.clone()).with_limit(Some(1));
    let mut sink = ScriptedSink::repeating("2", 10);
    let summary = first.run(&mut sink, &mut session_rng(Some(5))).await.unwrap();
    assert_eq!(summary.labeled, 1);
    let first_tables = sink.tables.len();
    pool.close().await;

    // Restart
    let pool = init_database(&db_path).await.unwrap();
    let second = LabelSession::new(pool.clone());
    let mut sink = ScriptedSink::repeating("3", 10);
    let summary = second.run(&mut sink, &mut session_rng(Some(5))).await.unwrap();
    assert_eq!(summary.labeled, 2);
    assert_eq!(first_tables + sink.tables.len(), 3);

    let labeled: Vec<String> = sqlx::query_scalar("SELECT hostname FROM labeled_hosts")
        .fetch_all(&pool)
        .await
        .unwrap();
    let unique: HashSet<&String> = labeled.iter().collect();
    assert_eq!(labeled.len(), 3);
    assert_eq!(unique.len(), 3);
}

#[tokio::test]
async fn test_quit_mid_host_leaves_it_pending() {
    let dir = tempfile::tempdir().unwrap();
    let pool = seeded_pool(&dir.path().join("hostrel.db")).await;

    let session = LabelSession::new(pool.clone());
    let outcome = session
        .label_host("both.example", &mut ScriptedSink::new(&["1", "q"]))
        .await
        .unwrap();
    assert_eq!(outcome, HostOutcome::Quit);
    assert!(!session.ledger().is_labeled("both.example").await.unwrap());

    // Input closed before the only prompt
    let mut closed = ScriptedSink::new(&[]);
    let summary = session.run(&mut closed, &mut session_rng(Some(2))).await.unwrap();
    assert!(summary.quit);
    assert_eq!(summary.labeled, 0);

    let pending = session.ledger().pending_hosts(&mut session_rng(Some(2))).await.unwrap();
    assert_eq!(pending.len(), 3);
}

#[tokio::test]
async fn test_relabeling_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let pool = seeded_pool(&dir.path().join("hostrel.db")).await;
    let session = LabelSession::new(pool.clone());

    let outcome = session
        .label_host("short.example", &mut ScriptedSink::new(&["1"]))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        HostOutcome::Committed(LabelCodes::all_absent().with(Platform::Twitter, RelevanceCode::Relevant))
    );

    let err = session
        .label_host("short.example", &mut ScriptedSink::new(&["3"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateLabel(_)));
    assert_eq!(label_row(&pool, "short.example").await, (1, 4, 4));
}

#[tokio::test]
async fn test_invalid_answers_never_stored() {
    let dir = tempfile::tempdir().unwrap();
    let pool = seeded_pool(&dir.path().join("hostrel.db")).await;
    let session = LabelSession::new(pool.clone());

    let mut sink = ScriptedSink::new(&["maybe", "-1", "7", "2"]);
    session.label_host("example.com", &mut sink).await.unwrap();

    assert_eq!(sink.prompts.len(), 4);
    assert_eq!(label_row(&pool, "example.com").await, (4, 4, 2));

    let rejections: Vec<&String> = sink.lines.iter().filter(|l| l.starts_with("Invalid relevance code")).collect();
    assert_eq!(rejections.len(), 3);
    for line in rejections {
        assert!(line.ends_with("(expected 1, 2 or 3)"), "{}", line);
    }
}

#[tokio::test]
async fn test_presented_table_matches_articles() {
    let dir = tempfile::tempdir().unwrap();
    let pool = seeded_pool(&dir.path().join("hostrel.db")).await;
    let session = LabelSession::new(pool);

    let mut sink = ScriptedSink::new(&["1"]);
    session.label_host("example.com", &mut sink).await.unwrap();

    let table = &sink.tables[0];
    assert_eq!(table.headers, vec!["twitter", "facebook", "youtube", "URL"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0], vec!["0", "0", "2", "art1"]);
    assert_eq!(table.rows[1], vec!["0", "0", "1", "art2"]);
}

/// Annotator that, at the first prompt, has another writer label the host on
/// screen before answering
struct RacingSink {
    inner: ScriptedSink,
    ledger: LabelLedger,
    current_host: Option<String>,
    raced: Option<String>,
}

impl ReviewSink for RacingSink {
    fn show_table(&mut self, table: &TableSpec) -> Result<()> {
        self.inner.show_table(table)
    }

    fn show_line(&mut self, line: &str) -> Result<()> {
        if let Some(rest) = line.strip_prefix("Host ") {
            self.current_host = rest.split_whitespace().next().map(str::to_string);
        }
        self.inner.show_line(line)
    }

    fn prompt(&mut self, question: &str) -> Result<Option<String>> {
        if self.raced.is_none() {
            let host = self.current_host.clone().unwrap();
            let codes = LabelCodes::all_absent()
                .with(Platform::Twitter, RelevanceCode::UserGenerated)
                .with(Platform::Facebook, RelevanceCode::UserGenerated)
                .with(Platform::Youtube, RelevanceCode::UserGenerated);
            let ledger = self.ledger.clone();
            tokio::task::block_in_place(|| Handle::current().block_on(ledger.commit_label(&host, &codes)))?;
            self.raced = Some(host);
        }
        self.inner.prompt(question)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_host_labeled_elsewhere_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let pool = seeded_pool(&dir.path().join("hostrel.db")).await;
    let session = LabelSession::new(pool.clone());

    let mut sink = RacingSink {
        inner: ScriptedSink::repeating("1", 10),
        ledger: LabelLedger::new(pool.clone()),
        current_host: None,
        raced: None,
    };
    let summary = session.run(&mut sink, &mut session_rng(Some(3))).await.unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.labeled, 2);
    assert!(!summary.quit);

    // The other writer's record survives; the rest are labeled by the session
    let raced = sink.raced.unwrap();
    assert_eq!(label_row(&pool, &raced).await, (3, 3, 3));
    for host in ["example.com", "short.example", "both.example"] {
        assert!(session.ledger().is_labeled(host).await.unwrap());
        if host != raced {
            assert_ne!(label_row(&pool, host).await, (3, 3, 3));
        }
    }
}
