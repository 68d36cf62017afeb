//! Batch generation over a list of card ids.
//!
//! Every id produces a [`CardOutcome`]; the batch statistics are a fold over
//! those outcomes. A failing card never stops the batch. The only early stop
//! is the `max_generated` cap.

use std::fmt;
use std::time::{Duration, Instant};

use crate::descriptor::CardDescriptor;
use crate::error::{CardError, ErrorKind, Result};
use crate::generator::{CardGenerator, GeneratedCard};

// ============================================================================
// Pipeline seam
// ============================================================================

/// The two halves of generating a catalog card, split so the batch can
/// decide whether to spend a generation slot after the cheap mapping step.
pub trait CardPipeline: Sync {
    /// Every id the pipeline knows, in processing order.
    fn all_ids(&self) -> Vec<String>;

    fn describe(&self, id: &str) -> Result<CardDescriptor>;

    fn generate(&self, descriptor: &CardDescriptor) -> Result<GeneratedCard>;
}

impl CardPipeline for CardGenerator {
    fn all_ids(&self) -> Vec<String> {
        self.catalog().ids()
    }

    fn describe(&self, id: &str) -> Result<CardDescriptor> {
        CardGenerator::describe(self, id)
    }

    fn generate(&self, descriptor: &CardDescriptor) -> Result<GeneratedCard> {
        CardGenerator::generate(self, descriptor)
    }
}

// ============================================================================
// Outcomes and stats
// ============================================================================

#[derive(Debug)]
pub enum CardOutcome {
    Generated(GeneratedCard),
    /// Not released yet. Not an error.
    Skipped(CardError),
    Failed(CardError),
}

impl CardOutcome {
    pub fn from_result(result: Result<GeneratedCard>) -> Self {
        match result {
            Ok(card) => Self::Generated(card),
            Err(err) => Self::from_error(err),
        }
    }

    pub fn from_error(err: CardError) -> Self {
        match err.kind() {
            ErrorKind::NotReleased => Self::Skipped(err),
            _ => Self::Failed(err),
        }
    }

    /// Emits the status line of a processed id.
    fn report(&self, id: &str) {
        match self {
            Self::Generated(card) => tracing::info!(
                id,
                " [v] Card ID {id} generated ({:.2} sec)",
                card.elapsed.as_secs_f64()
            ),
            Self::Skipped(_) => tracing::warn!(id, " [x] Card ID {id} has not been released"),
            Self::Failed(err @ CardError::NotFound { .. }) => {
                tracing::error!(id, " [x] {err}")
            }
            Self::Failed(err) => tracing::error!(
                id,
                step = err.step().unwrap_or("Export"),
                " [x] Card ID {id} not generated : {err}"
            ),
        }
    }
}

/// Per-batch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub generated: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl BatchStats {
    /// The single place counters change.
    pub fn record(&mut self, outcome: &CardOutcome) {
        match outcome {
            CardOutcome::Generated(_) => self.generated += 1,
            CardOutcome::Skipped(_) => self.skipped += 1,
            CardOutcome::Failed(_) => self.errors += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.generated + self.errors + self.skipped
    }
}

/// Summary of a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub stats: BatchStats,
    pub elapsed: Duration,
    /// The cap stopped the batch before the id list ran out.
    pub cap_reached: bool,
    pub max_generated: usize,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cap_reached {
            writeln!(f, " [v] Max numbers of cards achieved ({})", self.max_generated)?;
        }
        writeln!(
            f,
            "{} cards generated in {:.2} sec",
            self.stats.generated,
            self.elapsed.as_secs_f64()
        )?;
        writeln!(f, "Generation errors : {}", self.stats.errors)?;
        write!(f, "Not-released cards : {}", self.stats.skipped)
    }
}

fn cap_hit(max_generated: usize, generated: usize) -> bool {
    max_generated > 0 && generated >= max_generated
}

// ============================================================================
// BatchRunner
// ============================================================================

pub struct BatchRunner<'a, P: CardPipeline + ?Sized> {
    pipeline: &'a P,
}

impl<'a, P: CardPipeline + ?Sized> BatchRunner<'a, P> {
    pub fn new(pipeline: &'a P) -> Self {
        Self { pipeline }
    }

    fn process(&self, id: &str) -> CardOutcome {
        CardOutcome::from_result(
            self.pipeline
                .describe(id)
                .and_then(|descriptor| self.pipeline.generate(&descriptor)),
        )
    }

    /// Generates `ids` (or every known id) one after another.
    ///
    /// `max_generated` of 0 means no limit.
    pub fn run(&self, ids: Option<&[String]>, max_generated: usize) -> BatchReport {
        let started = Instant::now();
        let ids = ids.map(<[String]>::to_vec).unwrap_or_else(|| self.pipeline.all_ids());

        let mut stats = BatchStats::default();
        let mut cap_reached = false;
        for id in &ids {
            let outcome = self.process(id);
            outcome.report(id);
            stats.record(&outcome);

            if cap_hit(max_generated, stats.generated) {
                cap_reached = true;
                break;
            }
        }

        BatchReport {
            stats,
            elapsed: started.elapsed(),
            cap_reached,
            max_generated,
        }
    }
}

#[cfg(feature = "rayon")]
impl<'a, P: CardPipeline + ?Sized> BatchRunner<'a, P> {
    /// Generates ids on a fixed-size worker pool.
    ///
    /// A generation slot is taken before composing, so no more than
    /// `max_generated` cards are ever produced. When every free slot is held
    /// by an in-flight card, the worker waits for one to settle: a failed card
    /// hands its slot to the next id. New ids stop only once `max_generated`
    /// cards are confirmed.
    pub fn run_parallel(
        &self,
        ids: Option<&[String]>,
        max_generated: usize,
        workers: usize,
    ) -> Result<BatchReport> {
        use rayon::prelude::*;
        use std::sync::{Mutex, PoisonError};

        let started = Instant::now();
        let ids = ids.map(<[String]>::to_vec).unwrap_or_else(|| self.pipeline.all_ids());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()
            .map_err(|e| CardError::config(format!("worker pool: {e}")))?;

        let stats = Mutex::new(BatchStats::default());
        let gate = SlotGate::new(max_generated);

        pool.install(|| {
            ids.par_iter().for_each(|id| {
                if gate.is_full() {
                    return;
                }
                let outcome = match self.pipeline.describe(id) {
                    Err(err) => CardOutcome::from_error(err),
                    Ok(descriptor) => {
                        if !gate.acquire() {
                            return;
                        }
                        let outcome = CardOutcome::from_result(self.pipeline.generate(&descriptor));
                        gate.settle(matches!(outcome, CardOutcome::Generated(_)));
                        outcome
                    }
                };
                outcome.report(id);
                stats
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .record(&outcome);
            })
        });

        let stats = stats.into_inner().unwrap_or_else(PoisonError::into_inner);
        Ok(BatchReport {
            stats,
            elapsed: started.elapsed(),
            cap_reached: cap_hit(max_generated, stats.generated),
            max_generated,
        })
    }
}

/// Generation slots shared by the workers of a parallel batch.
#[cfg(feature = "rayon")]
struct SlotGate {
    max_generated: usize,
    slots: std::sync::Mutex<Slots>,
    settled: std::sync::Condvar,
}

#[cfg(feature = "rayon")]
#[derive(Default)]
struct Slots {
    in_flight: usize,
    generated: usize,
}

#[cfg(feature = "rayon")]
impl SlotGate {
    fn new(max_generated: usize) -> Self {
        Self {
            max_generated,
            slots: Default::default(),
            settled: Default::default(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slots> {
        self.slots
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// `max_generated` cards are confirmed.
    fn is_full(&self) -> bool {
        cap_hit(self.max_generated, self.lock().generated)
    }

    /// Takes a slot, waiting while the free ones are all in flight.
    /// Returns `false` once the cap is confirmed.
    fn acquire(&self) -> bool {
        let mut slots = self.lock();
        loop {
            if cap_hit(self.max_generated, slots.generated) {
                return false;
            }
            if !cap_hit(self.max_generated, slots.generated + slots.in_flight) {
                slots.in_flight += 1;
                return true;
            }
            slots = self
                .settled
                .wait(slots)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
    }

    /// Releases a slot taken by [`acquire`](Self::acquire).
    fn settle(&self, generated: bool) {
        {
            let mut slots = self.lock();
            slots.in_flight -= 1;
            if generated {
                slots.generated += 1;
            }
        }
        self.settled.notify_all();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ArtworkSource;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Fake {
        Ok,
        Unreleased,
        BrokenAsset,
        #[cfg_attr(not(feature = "rayon"), allow(dead_code))]
        SlowBrokenAsset,
    }

    /// Pipeline that never touches the filesystem.
    struct FakePipeline {
        cards: HashMap<String, Fake>,
        order: Vec<String>,
        generated: Mutex<Vec<String>>,
    }

    impl FakePipeline {
        fn new(cards: &[(&str, Fake)]) -> Self {
            Self {
                cards: cards.iter().map(|(id, f)| (id.to_string(), *f)).collect(),
                order: cards.iter().map(|(id, _)| id.to_string()).collect(),
                generated: Mutex::new(Vec::new()),
            }
        }

        fn generated(&self) -> Vec<String> {
            self.generated.lock().unwrap().clone()
        }
    }

    impl CardPipeline for FakePipeline {
        fn all_ids(&self) -> Vec<String> {
            self.order.clone()
        }

        fn describe(&self, id: &str) -> Result<CardDescriptor> {
            match self.cards.get(id) {
                None => Err(CardError::not_found(id)),
                Some(Fake::Unreleased) => Err(CardError::not_released(id)),
                Some(_) => Ok(CardDescriptor {
                    id: Some(id.to_string()),
                    artwork: ArtworkSource::Catalog { id: id.to_string() },
                    ..Default::default()
                }),
            }
        }

        fn generate(&self, descriptor: &CardDescriptor) -> Result<GeneratedCard> {
            let id = descriptor.id.clone().unwrap_or_default();
            match self.cards.get(&id) {
                Some(Fake::BrokenAsset) => {
                    return Err(CardError::asset("Rank", "rank/bronze.png", "missing"));
                }
                Some(Fake::SlowBrokenAsset) => {
                    std::thread::sleep(Duration::from_millis(300));
                    return Err(CardError::asset("Banner", "banner/neutral.png", "missing"));
                }
                _ => {}
            }
            self.generated.lock().unwrap().push(id.clone());
            Ok(GeneratedCard {
                label: id,
                destination: PathBuf::new(),
                files: Vec::new(),
                elapsed: Duration::ZERO,
            })
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn counts_generated_errors_and_skipped() {
        let pipeline = FakePipeline::new(&[
            ("1", Fake::Ok),
            ("2", Fake::Unreleased),
            ("3", Fake::BrokenAsset),
            ("4", Fake::Ok),
        ]);
        let list = ids(&["1", "2", "3", "404", "4"]);
        let report = BatchRunner::new(&pipeline).run(Some(list.as_slice()), 0);

        assert_eq!(
            report.stats,
            BatchStats {
                generated: 2,
                errors: 2,
                skipped: 1
            }
        );
        assert!(!report.cap_reached);
        assert_eq!(pipeline.generated(), ids(&["1", "4"]));
    }

    #[test]
    fn stops_when_cap_is_reached() {
        let pipeline = FakePipeline::new(&[
            ("1", Fake::Ok),
            ("2", Fake::Unreleased),
            ("3", Fake::Ok),
            ("4", Fake::Ok),
        ]);
        let report = BatchRunner::new(&pipeline).run(None, 2);

        assert_eq!(report.stats.generated, 2);
        assert_eq!(report.stats.processed(), 3);
        assert!(report.cap_reached);
        assert_eq!(pipeline.generated(), ids(&["1", "3"]));
    }

    #[test]
    fn zero_cap_means_unlimited() {
        let pipeline = FakePipeline::new(&[("1", Fake::Ok), ("2", Fake::Ok), ("3", Fake::Ok)]);
        let report = BatchRunner::new(&pipeline).run(None, 0);
        assert_eq!(report.stats.generated, 3);
        assert!(!report.cap_reached);
    }

    #[test]
    fn unreleased_card_is_skipped_not_generated() {
        let pipeline = FakePipeline::new(&[("9", Fake::Unreleased)]);
        let report = BatchRunner::new(&pipeline).run(None, 5);
        assert_eq!(report.stats.skipped, 1);
        assert_eq!(report.stats.errors, 0);
        assert!(pipeline.generated().is_empty());
    }

    #[test]
    fn summary_lines() {
        let report = BatchReport {
            stats: BatchStats {
                generated: 5,
                errors: 1,
                skipped: 2,
            },
            elapsed: Duration::from_millis(1500),
            cap_reached: true,
            max_generated: 5,
        };
        assert_eq!(
            report.to_string(),
            " [v] Max numbers of cards achieved (5)\n\
             5 cards generated in 1.50 sec\n\
             Generation errors : 1\n\
             Not-released cards : 2"
        );
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_run_never_exceeds_cap() {
        let cards: Vec<(String, Fake)> = (0..40).map(|i| (i.to_string(), Fake::Ok)).collect();
        let refs: Vec<(&str, Fake)> = cards.iter().map(|(id, f)| (id.as_str(), *f)).collect();
        let pipeline = FakePipeline::new(&refs);

        let report = BatchRunner::new(&pipeline).run_parallel(None, 7, 4).unwrap();
        assert_eq!(report.stats.generated, 7);
        assert_eq!(pipeline.generated().len(), 7);
        assert!(report.cap_reached);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn failed_card_hands_its_slot_to_a_waiting_id() {
        let pipeline = FakePipeline::new(&[
            ("1", Fake::SlowBrokenAsset),
            ("2", Fake::Ok),
            ("3", Fake::Ok),
        ]);
        let sequential = BatchRunner::new(&pipeline).run(None, 1);
        assert_eq!(sequential.stats.generated, 1);

        let pipeline = FakePipeline::new(&[
            ("1", Fake::SlowBrokenAsset),
            ("2", Fake::Ok),
            ("3", Fake::Ok),
        ]);
        let report = BatchRunner::new(&pipeline).run_parallel(None, 1, 2).unwrap();
        assert_eq!(report.stats.generated, sequential.stats.generated);
        assert!(report.cap_reached);
        assert!(report.stats.errors <= 1);
        assert_eq!(pipeline.generated().len(), 1);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_run_fills_cap_despite_slow_failures() {
        let pipeline = FakePipeline::new(&[
            ("1", Fake::SlowBrokenAsset),
            ("2", Fake::SlowBrokenAsset),
            ("3", Fake::Ok),
            ("4", Fake::Ok),
            ("5", Fake::Ok),
        ]);
        let report = BatchRunner::new(&pipeline).run_parallel(None, 2, 3).unwrap();
        assert_eq!(report.stats.generated, 2);
        assert!(report.cap_reached);
        assert_eq!(pipeline.generated().len(), 2);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_run_counts_like_sequential() {
        let pipeline = FakePipeline::new(&[
            ("1", Fake::Ok),
            ("2", Fake::Unreleased),
            ("3", Fake::BrokenAsset),
            ("4", Fake::Ok),
        ]);
        let report = BatchRunner::new(&pipeline).run_parallel(None, 0, 3).unwrap();
        assert_eq!(
            report.stats,
            BatchStats {
                generated: 2,
                errors: 1,
                skipped: 1
            }
        );
    }
}
