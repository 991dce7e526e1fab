use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::batch::{BackfillOutcome, BatchResult, BatchSummary};
use crate::models::book::{Candidate, Difficulty};
use crate::services::catalog_service::{ContentStore, CoverageStore};
use crate::services::pacer::Pacer;
use crate::services::quiz_generator::{GenerationRequest, QuizGenerator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    /// How many approved books to read per wanted candidate.
    pub overfetch_factor: usize,
    pub questions_per_quiz: u32,
}

impl Default for BackfillSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            overfetch_factor: 2,
            questions_per_quiz: 10,
        }
    }
}

/// Result of scanning the catalog for books that need quizzes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSelection {
    NoContent,
    FullyCovered,
    Candidates(Vec<Candidate>),
}

#[derive(Clone)]
pub struct BackfillService {
    content: Arc<dyn ContentStore>,
    coverage: Arc<dyn CoverageStore>,
    generator: Arc<dyn QuizGenerator>,
    pacer: Arc<dyn Pacer>,
    settings: BackfillSettings,
    run_lock: Arc<Mutex<()>>,
}

impl BackfillService {
    pub fn new(
        content: Arc<dyn ContentStore>,
        coverage: Arc<dyn CoverageStore>,
        generator: Arc<dyn QuizGenerator>,
        pacer: Arc<dyn Pacer>,
        settings: BackfillSettings,
    ) -> Self {
        Self {
            content,
            coverage,
            generator,
            pacer,
            settings,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn settings(&self) -> &BackfillSettings {
        &self.settings
    }

    /// Turns a caller supplied limit into the one a run uses: absent means the
    /// default, negatives mean zero, and nothing exceeds the configured cap.
    pub fn effective_limit(&self, requested: Option<i64>) -> usize {
        match requested {
            None => self.settings.default_limit,
            Some(n) if n <= 0 => 0,
            Some(n) => usize::try_from(n)
                .unwrap_or(usize::MAX)
                .min(self.settings.max_limit),
        }
    }

    pub async fn select_candidates(&self, limit: usize) -> Result<CandidateSelection> {
        let fetch = limit.saturating_mul(self.settings.overfetch_factor);
        let books = self.content.approved_books(fetch).await?;
        if books.is_empty() {
            return Ok(CandidateSelection::NoContent);
        }

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for book in books {
            if candidates.len() >= limit {
                break;
            }
            // A book can have several approved content rows.
            if !seen.insert(book.id) {
                continue;
            }

            let existing = self.coverage.existing_difficulties(book.id).await?;
            let missing = Difficulty::missing_from(&existing);
            if !missing.is_empty() {
                candidates.push(Candidate { book, missing });
            }
        }

        tracing::info!(found = candidates.len(), limit, "Found books needing quizzes");

        if candidates.is_empty() {
            Ok(CandidateSelection::FullyCovered)
        } else {
            Ok(CandidateSelection::Candidates(candidates))
        }
    }

    /// Generates every missing difficulty of one candidate. Failures are
    /// recorded on the result and never stop the remaining difficulties.
    pub async fn backfill_book(&self, candidate: &Candidate) -> BatchResult {
        let mut result = BatchResult::for_book(&candidate.book);
        tracing::info!(
            book_id = %candidate.book.id,
            title = %candidate.book.title,
            missing = candidate.missing.len(),
            "Processing book"
        );

        for &difficulty in &candidate.missing {
            let request = GenerationRequest {
                book_id: candidate.book.id,
                num_questions: self.settings.questions_per_quiz,
                difficulty,
            };
            tracing::debug!(book_id = %candidate.book.id, %difficulty, "Generating quiz");

            match self.generator.generate(request).await {
                Ok(()) => {
                    tracing::debug!(book_id = %candidate.book.id, %difficulty, "Quiz generated");
                    result.record_success(difficulty);
                }
                Err(e) => {
                    tracing::warn!(
                        book_id = %candidate.book.id,
                        %difficulty,
                        error = %e,
                        "Quiz generation failed"
                    );
                    result.record_failure(difficulty, &e);
                }
            }

            self.pacer.pause().await;
        }

        tracing::info!(
            book_id = %candidate.book.id,
            succeeded = result.difficulties_generated.len(),
            attempted = candidate.missing.len(),
            "Completed book"
        );
        result
    }

    /// Runs one backfill pass. Only one pass executes at a time; concurrent
    /// callers queue behind it.
    pub async fn run(&self, limit: usize) -> Result<BackfillOutcome> {
        let _guard = self.run_lock.lock().await;
        tracing::info!(limit, "Starting batch quiz generation");

        let candidates = match self.select_candidates(limit).await? {
            CandidateSelection::NoContent => {
                tracing::info!("No books with approved content");
                return Ok(BackfillOutcome::NoContent);
            }
            CandidateSelection::FullyCovered => {
                tracing::info!("All scanned books already have quizzes");
                return Ok(BackfillOutcome::FullyCovered);
            }
            CandidateSelection::Candidates(candidates) => candidates,
        };

        let mut results = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            results.push(self.backfill_book(candidate).await);
        }

        let summary = BatchSummary::from_results(results);
        tracing::info!(
            books_processed = summary.books_processed,
            quizzes_generated = summary.quizzes_generated,
            books_with_new_quizzes = summary.books_with_new_quizzes,
            books_with_errors = summary.books_with_errors,
            "Batch complete"
        );
        Ok(BackfillOutcome::Completed(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::book::Book;
    use crate::services::catalog_service::{MockContentStore, MockCoverageStore};
    use crate::services::pacer::MockPacer;
    use crate::services::quiz_generator::{GenerationError, MockQuizGenerator};
    use mockall::predicate::eq;
    use mockall::Sequence;
    use crate::services::pacer::FixedIntervalPacer;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::time::Instant;
    use tokio_test::{assert_err, assert_ok};
    use uuid::Uuid;

    fn book(title: &str) -> Book {
        Book {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author: "Roald Dahl".to_string(),
        }
    }

    fn coverage_of(map: HashMap<Uuid, Vec<Difficulty>>) -> MockCoverageStore {
        let mut coverage = MockCoverageStore::new();
        coverage
            .expect_existing_difficulties()
            .returning(move |id| Ok(map.get(&id).cloned().unwrap_or_default()));
        coverage
    }

    fn content_of(books: Vec<Book>) -> MockContentStore {
        let mut content = MockContentStore::new();
        content
            .expect_approved_books()
            .returning(move |limit| Ok(books.iter().take(limit).cloned().collect()));
        content
    }

    fn idle_pacer() -> MockPacer {
        let mut pacer = MockPacer::new();
        pacer.expect_pause().return_const(());
        pacer
    }

    fn service(
        content: MockContentStore,
        coverage: MockCoverageStore,
        generator: MockQuizGenerator,
        pacer: MockPacer,
    ) -> BackfillService {
        BackfillService::new(
            Arc::new(content),
            Arc::new(coverage),
            Arc::new(generator),
            Arc::new(pacer),
            BackfillSettings::default(),
        )
    }

    fn all() -> Vec<Difficulty> {
        Difficulty::ALL.to_vec()
    }

    #[tokio::test]
    async fn no_approved_content_short_circuits() {
        let mut generator = MockQuizGenerator::new();
        generator.expect_generate().never();
        let svc = service(content_of(vec![]), coverage_of(HashMap::new()), generator, idle_pacer());

        assert_eq!(assert_ok!(svc.run(10).await), BackfillOutcome::NoContent);
    }

    #[tokio::test]
    async fn fully_covered_catalog_generates_nothing() {
        let books = vec![book("Matilda"), book("The BFG")];
        let coverage = books.iter().map(|b| (b.id, all())).collect();
        let mut generator = MockQuizGenerator::new();
        generator.expect_generate().never();
        let svc = service(content_of(books), coverage_of(coverage), generator, idle_pacer());

        assert_eq!(assert_ok!(svc.run(10).await), BackfillOutcome::FullyCovered);
    }

    #[tokio::test]
    async fn missing_hard_only_is_generated() {
        let b = book("Holes");
        let coverage = HashMap::from([(b.id, vec![Difficulty::Easy, Difficulty::Medium])]);
        let mut generator = MockQuizGenerator::new();
        generator
            .expect_generate()
            .with(eq(GenerationRequest {
                book_id: b.id,
                num_questions: 10,
                difficulty: Difficulty::Hard,
            }))
            .times(1)
            .returning(|_| Ok(()));
        let mut pacer = MockPacer::new();
        pacer.expect_pause().times(1).return_const(());
        let svc = service(content_of(vec![b.clone()]), coverage_of(coverage), generator, pacer);

        let BackfillOutcome::Completed(summary) = svc.run(10).await.unwrap() else {
            panic!("expected a completed run");
        };
        assert_eq!(summary.books_processed, 1);
        assert_eq!(summary.quizzes_generated, 1);
        assert_eq!(summary.books_with_new_quizzes, 1);
        assert_eq!(summary.books_with_errors, 0);
        assert_eq!(summary.results[0].difficulties_generated, vec![Difficulty::Hard]);
        assert!(summary.results[0].errors.is_empty());
    }

    #[tokio::test]
    async fn partial_failure_is_reported_not_raised() {
        let b = book("Wonder");
        let coverage = HashMap::from([(b.id, vec![Difficulty::Medium])]);
        let mut seq = Sequence::new();
        let mut generator = MockQuizGenerator::new();
        generator
            .expect_generate()
            .withf(|r| r.difficulty == Difficulty::Easy)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        generator
            .expect_generate()
            .withf(|r| r.difficulty == Difficulty::Hard)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(GenerationError::Rejected("rate limited".into())));
        let mut pacer = MockPacer::new();
        pacer.expect_pause().times(2).return_const(());
        let svc = service(content_of(vec![b.clone()]), coverage_of(coverage), generator, pacer);

        let BackfillOutcome::Completed(summary) = svc.run(10).await.unwrap() else {
            panic!("expected a completed run");
        };
        let r = &summary.results[0];
        assert_eq!(r.book_id, b.id);
        assert_eq!(r.difficulties_generated, vec![Difficulty::Easy]);
        assert_eq!(r.errors, vec!["hard: rate limited".to_string()]);
        assert_eq!(summary.books_with_new_quizzes, 1);
        assert_eq!(summary.books_with_errors, 1);
    }

    #[tokio::test]
    async fn every_attempt_is_paced_and_counted() {
        let books = vec![book("A"), book("B"), book("C")];
        let coverage = HashMap::from([
            (books[0].id, vec![]),
            (books[1].id, vec![Difficulty::Easy]),
            (books[2].id, vec![Difficulty::Easy, Difficulty::Medium]),
        ]);
        let mut generator = MockQuizGenerator::new();
        generator.expect_generate().times(6).returning(|r| {
            if r.difficulty == Difficulty::Medium {
                Err(GenerationError::Timeout)
            } else {
                Ok(())
            }
        });
        let mut pacer = MockPacer::new();
        pacer.expect_pause().times(6).return_const(());
        let svc = service(content_of(books), coverage_of(coverage), generator, pacer);

        let BackfillOutcome::Completed(summary) = svc.run(10).await.unwrap() else {
            panic!("expected a completed run");
        };
        let generated: usize = summary
            .results
            .iter()
            .map(|r| r.difficulties_generated.len())
            .sum();
        assert_eq!(summary.quizzes_generated, generated);
        assert_eq!(summary.quizzes_generated, 4);
        assert_eq!(summary.books_with_errors, 2);
        assert_eq!(summary.results[0].errors, vec!["medium: request timed out".to_string()]);
    }

    #[tokio::test]
    async fn selector_overfetches_and_stops_at_limit() {
        let books: Vec<Book> = (0..10).map(|i| book(&format!("Book {i}"))).collect();
        let mut content = MockContentStore::new();
        let fetched = books.clone();
        content
            .expect_approved_books()
            .with(eq(4))
            .times(1)
            .returning(move |limit| Ok(fetched.iter().take(limit).cloned().collect()));
        let mut coverage = MockCoverageStore::new();
        coverage
            .expect_existing_difficulties()
            .times(2)
            .returning(|_| Ok(vec![]));
        let svc = service(content, coverage, MockQuizGenerator::new(), idle_pacer());

        let CandidateSelection::Candidates(candidates) = svc.select_candidates(2).await.unwrap()
        else {
            panic!("expected candidates");
        };
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].book, books[0]);
        assert_eq!(candidates[1].book, books[1]);
        assert_eq!(candidates[0].missing, all());
    }

    #[tokio::test]
    async fn covered_books_are_skipped_during_scan() {
        let books: Vec<Book> = (0..4).map(|i| book(&format!("Book {i}"))).collect();
        let coverage = HashMap::from([
            (books[0].id, all()),
            (books[1].id, vec![Difficulty::Easy]),
            (books[2].id, all()),
        ]);
        let svc = service(
            content_of(books.clone()),
            coverage_of(coverage),
            MockQuizGenerator::new(),
            idle_pacer(),
        );

        let CandidateSelection::Candidates(candidates) = svc.select_candidates(5).await.unwrap()
        else {
            panic!("expected candidates");
        };
        let ids: Vec<Uuid> = candidates.iter().map(|c| c.book.id).collect();
        assert_eq!(ids, vec![books[1].id, books[3].id]);
        assert_eq!(candidates[0].missing, vec![Difficulty::Medium, Difficulty::Hard]);
    }

    #[tokio::test]
    async fn duplicate_content_rows_yield_one_candidate() {
        let b = book("Coraline");
        let svc = service(
            content_of(vec![b.clone(), b.clone()]),
            coverage_of(HashMap::new()),
            MockQuizGenerator::new(),
            idle_pacer(),
        );

        let CandidateSelection::Candidates(candidates) = svc.select_candidates(10).await.unwrap()
        else {
            panic!("expected candidates");
        };
        assert_eq!(candidates.len(), 1);
    }

    #[tokio::test]
    async fn zero_limit_processes_nothing() {
        let books: Vec<Book> = (0..5).map(|i| book(&format!("Book {i}"))).collect();
        let mut generator = MockQuizGenerator::new();
        generator.expect_generate().never();
        let svc = service(content_of(books), coverage_of(HashMap::new()), generator, idle_pacer());

        assert_eq!(svc.run(0).await.unwrap(), BackfillOutcome::NoContent);
    }

    #[tokio::test]
    async fn coverage_lookup_failure_aborts_the_run() {
        let mut coverage = MockCoverageStore::new();
        coverage
            .expect_existing_difficulties()
            .returning(|_| Err(Error::Internal("connection reset".into())));
        let mut generator = MockQuizGenerator::new();
        generator.expect_generate().never();
        let svc = service(content_of(vec![book("Frindle")]), coverage, generator, idle_pacer());

        let err = assert_err!(svc.run(10).await);
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn effective_limit_defaults_clamps_and_caps() {
        let svc = service(
            MockContentStore::new(),
            MockCoverageStore::new(),
            MockQuizGenerator::new(),
            MockPacer::new(),
        );
        assert_eq!(svc.effective_limit(None), 10);
        assert_eq!(svc.effective_limit(Some(3)), 3);
        assert_eq!(svc.effective_limit(Some(0)), 0);
        assert_eq!(svc.effective_limit(Some(-4)), 0);
        assert_eq!(svc.effective_limit(Some(5_000)), 100);
    }

    /// Generator that takes a while per call and records when each call ran.
    #[derive(Default)]
    struct SlowGenerator {
        busy: AtomicBool,
        spans: StdMutex<Vec<(Instant, Instant)>>,
    }

    #[async_trait]
    impl QuizGenerator for SlowGenerator {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> std::result::Result<(), GenerationError> {
            assert!(!self.busy.swap(true, Ordering::SeqCst), "generator called concurrently");
            let start = Instant::now();
            tokio::time::sleep(Duration::from_millis(500)).await;
            self.busy.store(false, Ordering::SeqCst);
            self.spans.lock().unwrap().push((start, Instant::now()));
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_runs_never_overlap() {
        let books = vec![book("Stuart Little"), book("Charlotte's Web")];
        let fetches = Arc::new(StdMutex::new(Vec::new()));
        let mut content = MockContentStore::new();
        let seen = fetches.clone();
        content.expect_approved_books().times(2).returning(move |limit| {
            seen.lock().unwrap().push(Instant::now());
            Ok(books.iter().take(limit).cloned().collect())
        });
        let generator = Arc::new(SlowGenerator::default());
        let svc = BackfillService::new(
            Arc::new(content),
            Arc::new(coverage_of(HashMap::new())),
            generator.clone(),
            Arc::new(FixedIntervalPacer::new(Duration::from_secs(2))),
            BackfillSettings::default(),
        );

        let (first, second) = tokio::join!(svc.run(1), svc.run(1));
        assert!(matches!(assert_ok!(first), BackfillOutcome::Completed(_)));
        assert!(matches!(assert_ok!(second), BackfillOutcome::Completed(_)));

        let spans = generator.spans.lock().unwrap().clone();
        assert_eq!(spans.len(), 6);
        for pair in spans.windows(2) {
            // the pacer's interval always separates consecutive calls
            assert!(pair[1].0 >= pair[0].1 + Duration::from_secs(2));
        }

        // The second run reads the catalog only once the first has paced its
        // last attempt.
        let fetches = fetches.lock().unwrap().clone();
        assert_eq!(fetches.len(), 2);
        assert!(fetches[1] >= spans[2].1 + Duration::from_secs(2));
    }
}
