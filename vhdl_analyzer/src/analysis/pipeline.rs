// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use super::deep::deep_analyze;
use super::results::*;
use crate::config::AnalysisConfig;
use crate::data::*;
use crate::declaration::build_declarations;
use crate::expression::Environment;
use crate::resolve::Registry;
use parking_lot::{Condvar, Mutex, RwLock};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The stages of a document that must be re-run.
///
/// A dirty stage implies that all later stages are dirty as well.
pub struct DirtyFlags {
    bits: AtomicU8,
    running: AtomicBool,
    lock: Mutex<()>,
    changed: Condvar,
}

impl Default for DirtyFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl DirtyFlags {
    pub const PARSE: u8 = 1;
    pub const ANALYZE: u8 = 2;
    pub const DEEP: u8 = 4;
    const ALL: u8 = Self::PARSE | Self::ANALYZE | Self::DEEP;

    /// A new document has never been parsed
    pub fn new() -> DirtyFlags {
        DirtyFlags {
            bits: AtomicU8::new(Self::ALL),
            running: AtomicBool::new(false),
            lock: Mutex::new(()),
            changed: Condvar::new(),
        }
    }

    fn implied(stage: u8) -> u8 {
        if stage & Self::PARSE != 0 {
            Self::ALL
        } else if stage & Self::ANALYZE != 0 {
            Self::ANALYZE | Self::DEEP
        } else {
            stage & Self::DEEP
        }
    }

    pub fn mark(&self, stage: u8) {
        self.bits.fetch_or(Self::implied(stage), Ordering::SeqCst);
        self.wake();
    }

    /// Clears a stage and returns whether it was dirty
    pub fn take(&self, stage: u8) -> bool {
        self.bits.fetch_and(!stage, Ordering::SeqCst) & stage != 0
    }

    pub fn contains(&self, stage: u8) -> bool {
        self.bits.load(Ordering::SeqCst) & stage != 0
    }

    pub fn is_dirty(&self) -> bool {
        self.bits.load(Ordering::SeqCst) != 0
    }

    pub fn clear(&self) {
        self.bits.store(0, Ordering::SeqCst);
    }

    /// Claims the document for one cycle, false when a cycle is already running
    pub fn try_start(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn finish(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.wake();
    }

    /// Like [DirtyFlags::try_start], the cycle ends when the guard is dropped
    pub fn start(&self) -> Option<RunningGuard<'_>> {
        self.try_start().then(|| RunningGuard(self))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Wakes up threads blocked in [DirtyFlags::wait]
    pub fn wake(&self) {
        let _guard = self.lock.lock();
        self.changed.notify_all();
    }

    /// Blocks until a stage is marked dirty, [DirtyFlags::wake] is called or the timeout expires
    pub fn wait(&self, timeout: Duration) -> bool {
        let mut guard = self.lock.lock();
        if !self.is_dirty() {
            self.changed.wait_for(&mut guard, timeout);
        }
        self.is_dirty()
    }
}

/// Calls [DirtyFlags::finish] on drop, also when the cycle unwinds
pub struct RunningGuard<'a>(&'a DirtyFlags);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// A result published by a stage of the pipeline, `version` is the version of the result
#[derive(Clone, Debug)]
pub enum PipelineEvent {
    ParseComplete {
        version: u64,
        result: Arc<ParseResult>,
    },
    AnalysisComplete {
        version: u64,
        result: Arc<AnalysisResult>,
    },
    DeepAnalysisComplete {
        version: u64,
        result: Arc<DeepAnalysisResult>,
    },
}

impl PipelineEvent {
    pub fn version(&self) -> u64 {
        match self {
            PipelineEvent::ParseComplete { version, .. }
            | PipelineEvent::AnalysisComplete { version, .. }
            | PipelineEvent::DeepAnalysisComplete { version, .. } => *version,
        }
    }
}

pub type PipelineListener = Box<dyn Fn(&PipelineEvent) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing was dirty
    Idle,
    /// The last edit is too recent to parse
    Debounced,
    /// Another cycle is running on the document
    Busy,
    Completed,
}

/// The parse, analyze and deep analyze stages of one document
pub struct DocumentPipeline {
    source: Source,
    library: Arc<str>,
    registry: Arc<Registry>,
    config: AnalysisConfig,
    flags: Arc<DirtyFlags>,
    /// Version of the latest result of any stage
    results: AtomicU64,
    last_edit: Mutex<Option<Instant>>,
    parsed: RwLock<Option<Arc<ParseResult>>>,
    analysis: RwLock<Option<Arc<AnalysisResult>>>,
    deep: RwLock<Option<Arc<DeepAnalysisResult>>>,
    listeners: RwLock<Vec<PipelineListener>>,
    /// Set when the last cycle panicked
    failure: Mutex<Option<Diagnostic>>,
}

/// Replaces a published result unless it is newer than the candidate
fn publish<T>(slot: &RwLock<Option<Arc<T>>>, result: Arc<T>, version: impl Fn(&T) -> u64) -> bool {
    let mut slot = slot.write();
    if slot
        .as_ref()
        .is_some_and(|current| version(current) > version(&result))
    {
        return false;
    }
    *slot = Some(result);
    true
}

impl DocumentPipeline {
    /// Creates the pipeline and registers the document in a library
    pub fn new(
        source: Source,
        library: &str,
        registry: Arc<Registry>,
        config: AnalysisConfig,
    ) -> DocumentPipeline {
        let flags = Arc::new(DirtyFlags::new());
        registry.add(source.clone(), library, flags.clone());
        DocumentPipeline {
            source,
            library: Arc::from(library.to_lowercase()),
            registry,
            config,
            flags,
            results: AtomicU64::new(0),
            last_edit: Mutex::new(None),
            parsed: RwLock::new(None),
            analysis: RwLock::new(None),
            deep: RwLock::new(None),
            listeners: RwLock::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn flags(&self) -> &Arc<DirtyFlags> {
        &self.flags
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn add_listener(&self, listener: impl Fn(&PipelineEvent) + Send + Sync + 'static) {
        self.listeners.write().push(Box::new(listener));
    }

    pub fn parse_result(&self) -> Option<Arc<ParseResult>> {
        self.parsed.read().clone()
    }

    pub fn analysis(&self) -> Option<Arc<AnalysisResult>> {
        self.analysis.read().clone()
    }

    pub fn deep_analysis(&self) -> Option<Arc<DeepAnalysisResult>> {
        self.deep.read().clone()
    }

    /// Applies an edit to the source text and schedules a re-parse
    pub fn edit(&self, range: Option<&Range>, text: &str) {
        self.source.change(range, text);
        self.touch();
    }

    /// Schedules a re-parse after the source was changed by someone else
    pub fn touch(&self) {
        *self.last_edit.lock() = Some(Instant::now());
        self.flags.mark(DirtyFlags::PARSE);
    }

    /// Time left until the last edit is old enough to parse
    pub fn debounce_remaining(&self) -> Duration {
        match *self.last_edit.lock() {
            Some(edit) => self.config.debounce.saturating_sub(edit.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// The diagnostics of the latest results of every stage
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if let Some(parsed) = self.parse_result() {
            diagnostics.extend(parsed.diagnostics.iter().cloned());
        }
        match (self.deep_analysis(), self.analysis()) {
            (Some(deep), _) => diagnostics.extend(deep.diagnostics.iter().cloned()),
            (None, Some(analysis)) => {
                diagnostics.extend(analysis.table.diagnostics.iter().cloned())
            }
            (None, None) => {}
        }
        diagnostics.extend(self.failure.lock().clone());
        diagnostics
    }

    /// Runs every dirty stage once
    pub fn run_once(&self) -> RunOutcome {
        if !self.flags.is_dirty() {
            return RunOutcome::Idle;
        }
        if self.flags.contains(DirtyFlags::PARSE) && !self.debounce_remaining().is_zero() {
            return RunOutcome::Debounced;
        }
        let Some(_running) = self.flags.start() else {
            return RunOutcome::Busy;
        };
        let failure = match panic::catch_unwind(AssertUnwindSafe(|| self.cycle())) {
            Ok(()) => None,
            Err(_) => {
                log::error!(
                    "Analysis cycle of {} panicked",
                    self.source.file_name().display()
                );
                let start = Position::default();
                let pos = SrcPos::new(self.source.clone(), Range::new(start, start));
                Some(Diagnostic::internal(
                    pos,
                    format!(
                        "Internal error when analyzing {}",
                        self.source.file_name().display()
                    ),
                ))
            }
        };
        *self.failure.lock() = failure;
        RunOutcome::Completed
    }

    fn cycle(&self) {
        if self.flags.take(DirtyFlags::PARSE) {
            self.parse();
        }
        if self.flags.take(DirtyFlags::ANALYZE) {
            self.analyze();
        }
        if self.flags.take(DirtyFlags::DEEP) && self.config.deep_analysis {
            self.deep_analyze();
        }
    }

    fn next_version(&self) -> u64 {
        self.results.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn notify(&self, event: PipelineEvent) {
        for listener in self.listeners.read().iter() {
            listener(&event);
        }
    }

    fn parse(&self) -> Arc<ParseResult> {
        let start = Instant::now();
        let (source_version, contents) = self.source.snapshot();
        let (root, errors) = vhdl_syntax::parse(contents.text());
        let diagnostics = errors
            .iter()
            .map(|error| {
                let range = contents.range_of(error.text_pos..error.text_pos + error.text_len);
                Diagnostic::syntax_error(SrcPos::new(self.source.clone(), range), error.to_string())
            })
            .collect();
        let version = self.next_version();
        let result = Arc::new(ParseResult {
            source: self.source.clone(),
            version,
            source_version,
            contents: Arc::new(contents),
            root,
            diagnostics,
        });
        log::debug!(
            "Parsed {} version {source_version} in {:?}",
            self.source.file_name().display(),
            start.elapsed()
        );
        if publish(&self.parsed, result.clone(), |parsed| parsed.version) {
            self.flags.mark(DirtyFlags::ANALYZE);
            self.notify(PipelineEvent::ParseComplete {
                version,
                result: result.clone(),
            });
        }
        result
    }

    fn analyze(&self) {
        let parsed = match self.parse_result() {
            Some(parsed) => parsed,
            None => self.parse(),
        };
        let start = Instant::now();
        let table = build_declarations(
            &self.source,
            &parsed.contents,
            &parsed.root,
            self.registry.symbols(),
        );
        let mut result = AnalysisResult::new(
            self.source.clone(),
            parsed.source_version,
            self.library.clone(),
            parsed.contents.clone(),
            table,
        );
        result.version = self.next_version();
        let result = Arc::new(result);
        log::debug!(
            "Analyzed {} version {} in {:?}",
            self.source.file_name().display(),
            parsed.source_version,
            start.elapsed()
        );
        if publish(&self.analysis, result.clone(), |analysis| analysis.version) {
            self.registry.update(result.clone());
            self.flags.mark(DirtyFlags::DEEP);
            self.notify(PipelineEvent::AnalysisComplete {
                version: result.version,
                result,
            });
        }
    }

    fn deep_analyze(&self) {
        let Some(analysis) = self.analysis() else {
            return;
        };
        let start = Instant::now();
        let env = Environment::new(self.registry.clone(), self.config.clone());
        let mut result = deep_analyze(&env, &analysis);
        result.version = self.next_version();
        let result = Arc::new(result);
        log::debug!(
            "Deep analyzed {} version {} in {:?}",
            self.source.file_name().display(),
            result.source_version,
            start.elapsed()
        );
        if publish(&self.deep, result.clone(), |deep| deep.version) {
            self.notify(PipelineEvent::DeepAnalysisComplete {
                version: result.version,
                result,
            });
        }
    }
}

impl Drop for DocumentPipeline {
    fn drop(&mut self) {
        self.registry.remove(&self.source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::{quiet_config, standard_registry};
    use crate::data::ErrorCode;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;

    fn pipeline(registry: &Arc<Registry>, file_name: &str, code: &str) -> DocumentPipeline {
        DocumentPipeline::new(
            Source::inline(Path::new(file_name), code),
            "lib",
            registry.clone(),
            quiet_config(),
        )
    }

    fn run_until_idle(pipeline: &DocumentPipeline) -> usize {
        let mut cycles = 0;
        while pipeline.run_once() == RunOutcome::Completed {
            cycles += 1;
        }
        cycles
    }

    #[test]
    fn dirtiness_implies_later_stages() {
        let flags = DirtyFlags::new();
        flags.clear();
        flags.mark(DirtyFlags::ANALYZE);
        assert!(!flags.contains(DirtyFlags::PARSE));
        assert!(flags.contains(DirtyFlags::ANALYZE));
        assert!(flags.contains(DirtyFlags::DEEP));
        assert!(flags.take(DirtyFlags::ANALYZE));
        assert!(!flags.take(DirtyFlags::ANALYZE));
        assert!(flags.is_dirty());
    }

    #[test]
    fn one_cycle_runs_at_a_time() {
        let flags = DirtyFlags::new();
        assert!(flags.try_start());
        assert!(!flags.try_start());
        flags.finish();
        assert!(flags.try_start());
    }

    #[test]
    fn guard_finishes_cycle_on_unwind() {
        let flags = DirtyFlags::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _running = flags.start().unwrap();
            assert!(flags.start().is_none());
            panic!("cycle failed");
        }));
        assert!(result.is_err());
        assert!(!flags.is_running());
    }

    #[test]
    fn panicking_cycle_is_reported_and_recovers() {
        let registry = standard_registry();
        let pipeline = pipeline(&registry, "pkg.vhd", "package pkg is end package;");
        let failed = Arc::new(AtomicBool::new(false));
        let fail_once = failed.clone();
        pipeline.add_listener(move |event| {
            if let PipelineEvent::ParseComplete { .. } = event {
                if !fail_once.swap(true, Ordering::SeqCst) {
                    panic!("listener failed");
                }
            }
        });

        assert_eq!(pipeline.run_once(), RunOutcome::Completed);
        assert!(!pipeline.flags().is_running());
        let diagnostics = pipeline.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].category(), Category::Internal);

        run_until_idle(&pipeline);
        assert_eq!(pipeline.diagnostics(), vec![]);
        assert!(pipeline.deep_analysis().is_some());
    }

    #[test]
    fn runs_all_stages() {
        let registry = standard_registry();
        let pipeline = pipeline(
            &registry,
            "ent.vhd",
            "entity ent is end entity; architecture a of ent is signal s : bit; begin end architecture;",
        );
        let events = Arc::new(Mutex::new(Vec::new()));
        let recorded = events.clone();
        pipeline.add_listener(move |event| {
            let name = match event {
                PipelineEvent::ParseComplete { .. } => "parse",
                PipelineEvent::AnalysisComplete { .. } => "analysis",
                PipelineEvent::DeepAnalysisComplete { .. } => "deep",
            };
            recorded.lock().push((name, event.version()));
        });

        assert_eq!(run_until_idle(&pipeline), 1);
        assert_eq!(
            *events.lock(),
            vec![("parse", 1), ("analysis", 2), ("deep", 3)]
        );
        assert_eq!(pipeline.run_once(), RunOutcome::Idle);
        assert!(pipeline.deep_analysis().is_some());
        assert_eq!(pipeline.diagnostics(), vec![]);

        let analysis = pipeline.analysis().unwrap();
        assert!(analysis.lookup_path("a.s").is_some());
        assert!(registry.resolve_primary("lib", "ent").is_some());
    }

    #[test]
    fn syntax_errors_do_not_stop_analysis() {
        let registry = standard_registry();
        let pipeline = pipeline(
            &registry,
            "pkg.vhd",
            "package pkg is constant c : integer := ; end package;",
        );
        run_until_idle(&pipeline);
        let diagnostics = pipeline.diagnostics();
        assert!(diagnostics
            .iter()
            .any(|diagnostic| diagnostic.code == ErrorCode::SyntaxError));
        assert!(pipeline.analysis().unwrap().lookup_path("pkg.c").is_some());
    }

    #[test]
    fn edits_are_debounced() {
        let registry = standard_registry();
        let source = Source::inline(Path::new("pkg.vhd"), "package pkg is end package;");
        let mut config = quiet_config();
        config.debounce = Duration::from_secs(3600);
        let pipeline = DocumentPipeline::new(source, "lib", registry, config);
        // Nothing was edited yet
        assert_eq!(pipeline.run_once(), RunOutcome::Completed);

        pipeline.edit(None, "package pkg2 is end package;");
        assert_eq!(pipeline.run_once(), RunOutcome::Debounced);
        assert!(pipeline.analysis().unwrap().lookup_path("pkg").is_some());
    }

    #[test]
    fn dirty_mid_cycle_reruns_once() {
        let registry = standard_registry();
        let pipeline = pipeline(&registry, "pkg.vhd", "package pkg is end package;");
        let parses = Arc::new(AtomicUsize::new(0));
        let counter = parses.clone();
        let flags = pipeline.flags().clone();
        pipeline.add_listener(move |event| {
            if let PipelineEvent::ParseComplete { .. } = event {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    flags.mark(DirtyFlags::PARSE);
                    flags.mark(DirtyFlags::PARSE);
                }
            }
        });
        assert_eq!(run_until_idle(&pipeline), 2);
        assert_eq!(parses.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn versions_increase_with_edits() {
        let registry = standard_registry();
        let pipeline = pipeline(&registry, "pkg.vhd", "package pkg is end package;");
        run_until_idle(&pipeline);
        let first = pipeline.parse_result().unwrap().version;
        pipeline.edit(
            None,
            "package pkg is constant c : natural := 1; end package;",
        );
        run_until_idle(&pipeline);
        let second = pipeline.deep_analysis().unwrap();
        assert!(second.version > first);
        assert_eq!(second.source_version, 1);
        assert!(second.analysis.lookup_path("pkg.c").is_some());
    }

    #[test]
    fn reanalysis_after_dependency_change_gets_new_version() {
        let registry = standard_registry();
        let user = pipeline(
            &registry,
            "user.vhd",
            "use work.pkg.all; package user is constant d : integer := c; end package;",
        );
        run_until_idle(&user);
        let first = user.deep_analysis().unwrap();
        assert!(!first.diagnostics.is_empty());

        let pkg = pipeline(
            &registry,
            "pkg.vhd",
            "package pkg is constant c : integer := 0; end package;",
        );
        run_until_idle(&pkg);
        run_until_idle(&user);
        let second = user.deep_analysis().unwrap();
        assert_eq!(second.diagnostics, vec![]);
        assert_eq!(second.source_version, first.source_version);
        assert!(second.version > first.version);
    }

    #[test]
    fn dependents_are_marked_for_deep_analysis() {
        let registry = standard_registry();
        let pkg = pipeline(
            &registry,
            "pkg.vhd",
            "package pkg is constant c : integer := 0; end package;",
        );
        let user = pipeline(
            &registry,
            "user.vhd",
            "use work.pkg.all; entity ent is generic (g : integer := c); end entity;",
        );
        run_until_idle(&pkg);
        run_until_idle(&user);
        assert_eq!(user.diagnostics(), vec![]);

        pkg.edit(None, "package pkg is end package;");
        run_until_idle(&pkg);
        assert!(user.flags().contains(DirtyFlags::DEEP));
        assert!(!user.flags().contains(DirtyFlags::ANALYZE));
        run_until_idle(&user);
        let diagnostics = user.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, ErrorCode::NotDeclared);
    }
}
