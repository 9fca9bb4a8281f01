use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use engine_logging::{engine_debug, engine_info};
use ra2flac_core::{update, Effect, JobId, ManualUrls, Msg, PreparePlan, PublishOutcome, RunPhase, RunState, RunSummary};
use ra2flac_engine::{ArtifactStore, Engine, JobPaths, JobPlan, PublishReport};

/// Executes the effects requested by the run state machine, one at a time, and
/// feeds each result back as a message.
pub struct EffectRunner {
    engine: Engine,
    store: Option<Arc<dyn ArtifactStore>>,
    paths: HashMap<JobId, JobPaths>,
}

impl EffectRunner {
    /// Publishing happens only when a store is supplied.
    pub fn new(engine: Engine, store: Option<Arc<dyn ArtifactStore>>) -> Self {
        Self {
            engine,
            store,
            paths: HashMap::new(),
        }
    }

    pub async fn run(&mut self, manual: ManualUrls) -> RunSummary {
        if manual.is_auto_discover() {
            engine_info!(
                "No manual URLs; discovering from {} source page(s)",
                self.engine.config().source_pages.len()
            );
        } else {
            engine_info!("Using manual URL list: {}", manual.raw());
        }

        let start = Msg::Start {
            manual,
            source_pages: self.engine.config().source_pages.clone(),
            publish: self.store.is_some(),
        };
        let (mut state, effects) = update(RunState::new(), start);
        let mut queue: VecDeque<Effect> = effects.into();
        let mut announced = false;

        loop {
            if !announced && !matches!(state.phase(), RunPhase::Idle | RunPhase::Discovering) {
                engine_info!("Found {} .ra URLs.", state.jobs().count());
                announced = true;
            }
            let Some(effect) = queue.pop_front() else {
                break;
            };
            engine_debug!("effect {:?}", effect);
            let msg = self.execute(effect).await;
            let (next, effects) = update(state, msg);
            state = next;
            queue.extend(effects);
        }

        state.summary()
    }

    async fn execute(&mut self, effect: Effect) -> Msg {
        match effect {
            Effect::ScanPage { page_url } => match self.engine.scan_page(&page_url).await {
                Ok(links) => Msg::PageScanned { page_url, links },
                Err(err) => Msg::PageFailed {
                    page_url,
                    reason: err.to_string(),
                },
            },
            Effect::Prepare { job_id, url } => {
                let paths = self.engine.job_paths(&url);
                let plan = self.engine.plan(&paths);
                self.paths.insert(job_id, paths);
                Msg::JobPrepared {
                    job_id,
                    result: Ok(map_plan(plan)),
                }
            }
            Effect::Download { job_id, url } => {
                let result = match self.paths.get(&job_id) {
                    Some(paths) => self
                        .engine
                        .download(job_id, &url, paths)
                        .await
                        .map_err(|err| err.to_string()),
                    None => Err(unknown_job(job_id)),
                };
                Msg::DownloadFinished { job_id, result }
            }
            Effect::Convert { job_id } => {
                let result = match self.paths.get(&job_id) {
                    Some(paths) => self
                        .engine
                        .convert(paths)
                        .await
                        .map(|_| ())
                        .map_err(|err| err.to_string()),
                    None => Err(unknown_job(job_id)),
                };
                Msg::ConversionFinished { job_id, result }
            }
            Effect::RemoveSource { job_id } => {
                if let Some(paths) = self.paths.get(&job_id) {
                    // Already logged; a leftover source never fails the job.
                    let _ = self.engine.remove_source(paths).await;
                }
                Msg::SourceRemoved { job_id }
            }
            Effect::Publish => {
                let result = match &self.store {
                    Some(store) => self
                        .engine
                        .publish(store.as_ref())
                        .await
                        .map(map_publish)
                        .map_err(|err| err.to_string()),
                    None => Err("publishing is not configured".to_string()),
                };
                Msg::PublishFinished { result }
            }
        }
    }
}

fn map_plan(plan: JobPlan) -> PreparePlan {
    match plan {
        JobPlan::AlreadyConverted => PreparePlan::AlreadyConverted,
        JobPlan::AlreadyConvertedSourceStaged => PreparePlan::AlreadyConvertedSourceStaged,
        JobPlan::SourceStaged => PreparePlan::SourceStaged,
        JobPlan::NeedsDownload => PreparePlan::NeedsDownload,
    }
}

fn map_publish(report: PublishReport) -> PublishOutcome {
    match report {
        PublishReport::NoChanges => PublishOutcome::NoChanges,
        PublishReport::Committed { files, pushed } => PublishOutcome::Committed {
            files: files.len(),
            pushed,
        },
    }
}

fn unknown_job(job_id: JobId) -> String {
    format!("job {job_id} was never prepared")
}
