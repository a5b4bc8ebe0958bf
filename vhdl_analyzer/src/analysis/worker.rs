// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use super::pipeline::{DocumentPipeline, RunOutcome};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{spawn, JoinHandle};
use std::time::Duration;

const IDLE_POLL: Duration = Duration::from_millis(500);
const BUSY_POLL: Duration = Duration::from_millis(10);

/// A background thread that keeps the results of one document up to date
pub struct DocumentWorker {
    pipeline: Arc<DocumentPipeline>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DocumentWorker {
    pub fn start(pipeline: Arc<DocumentPipeline>) -> DocumentWorker {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let pipeline = pipeline.clone();
            let stop = stop.clone();
            spawn(move || run(&pipeline, &stop))
        };
        DocumentWorker {
            pipeline,
            stop,
            handle: Some(handle),
        }
    }

    pub fn pipeline(&self) -> &Arc<DocumentPipeline> {
        &self.pipeline
    }

    /// Stops the thread after its current cycle
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.pipeline.flags().wake();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!(
                    "Worker of {} panicked",
                    self.pipeline.source().file_name().display()
                );
            }
        }
    }
}

impl Drop for DocumentWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(pipeline: &DocumentPipeline, stop: &AtomicBool) {
    while !stop.load(Ordering::SeqCst) {
        match pipeline.run_once() {
            RunOutcome::Completed => {}
            RunOutcome::Debounced => std::thread::sleep(pipeline.debounce_remaining()),
            RunOutcome::Busy => std::thread::sleep(BUSY_POLL),
            RunOutcome::Idle => {
                pipeline.flags().wait(IDLE_POLL);
            }
        }
    }
    log::debug!(
        "Worker of {} stopped",
        pipeline.source().file_name().display()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::{quiet_config, standard_registry};
    use crate::analysis::PipelineEvent;
    use crate::data::Source;
    use parking_lot::Mutex;
    use std::path::Path;
    use std::time::Instant;

    fn wait_for(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !done() {
            assert!(Instant::now() < deadline, "Timed out");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn worker_analyzes_edits() {
        let registry = standard_registry();
        let source = Source::inline(Path::new("ent.vhd"), "entity ent is end entity;");
        let pipeline = Arc::new(DocumentPipeline::new(
            source,
            "lib",
            registry,
            quiet_config(),
        ));
        let versions = Arc::new(Mutex::new(Vec::new()));
        {
            let versions = versions.clone();
            pipeline.add_listener(move |event| {
                if let PipelineEvent::DeepAnalysisComplete { version, .. } = event {
                    versions.lock().push(*version);
                }
            });
        }

        let mut worker = DocumentWorker::start(pipeline.clone());
        wait_for(|| !versions.lock().is_empty());
        assert!(pipeline.diagnostics().is_empty());

        pipeline.edit(
            None,
            "entity ent is port (a : in bit); end entity;\narchitecture rtl of ent is begin a <= '1'; end;",
        );
        wait_for(|| {
            pipeline
                .deep_analysis()
                .is_some_and(|deep| deep.source_version == pipeline.source().version())
        });
        assert_eq!(pipeline.diagnostics().len(), 1);

        worker.stop();
        assert!(!pipeline.flags().is_running());
    }
}
