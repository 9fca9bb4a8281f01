use crate::{Effect, JobResultKind, Msg, PreparePlan, RunPhase, RunState, Stage};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: RunState, msg: Msg) -> (RunState, Vec<Effect>) {
    let effects = match msg {
        Msg::Start {
            manual,
            source_pages,
            publish,
        } => {
            if state.phase() != RunPhase::Idle {
                return (state, Vec::new());
            }
            state.set_publish(publish);

            if manual.is_auto_discover() && !source_pages.is_empty() {
                state.begin_discovery(source_pages.len());
                source_pages
                    .into_iter()
                    .map(|page_url| Effect::ScanPage { page_url })
                    .collect()
            } else {
                // An explicit list replaces discovery entirely.
                state.collect_urls(manual.urls());
                state.create_jobs();
                state.advance()
            }
        }
        Msg::PageScanned { links, .. } => {
            if state.phase() != RunPhase::Discovering {
                return (state, Vec::new());
            }
            state.collect_urls(links);
            finish_page(&mut state)
        }
        Msg::PageFailed { page_url, reason } => {
            if state.phase() != RunPhase::Discovering {
                return (state, Vec::new());
            }
            state.record_page_failure(page_url, reason);
            finish_page(&mut state)
        }
        Msg::JobPrepared { job_id, result } => {
            if !state.is_current(job_id) {
                return (state, Vec::new());
            }
            match result {
                Ok(PreparePlan::AlreadyConverted) => {
                    state.finish_job(job_id, JobResultKind::AlreadyPresent);
                    state.advance()
                }
                Ok(PreparePlan::AlreadyConvertedSourceStaged) => {
                    // The job is already terminal, so the later SourceRemoved is ignored.
                    state.finish_job(job_id, JobResultKind::AlreadyPresent);
                    let mut effects = vec![Effect::RemoveSource { job_id }];
                    effects.extend(state.advance());
                    effects
                }
                Ok(PreparePlan::SourceStaged) => {
                    state.set_stage(job_id, Stage::Converting);
                    vec![Effect::Convert { job_id }]
                }
                Ok(PreparePlan::NeedsDownload) => match state.job_url(job_id) {
                    Some(url) => {
                        state.set_stage(job_id, Stage::Downloading);
                        vec![Effect::Download { job_id, url }]
                    }
                    None => Vec::new(),
                },
                Err(reason) => {
                    state.fail_job(job_id, reason);
                    state.advance()
                }
            }
        }
        Msg::DownloadFinished { job_id, result } => {
            if !state.is_current(job_id) {
                return (state, Vec::new());
            }
            match result {
                Ok(bytes) => {
                    state.set_bytes(job_id, bytes);
                    state.set_stage(job_id, Stage::Converting);
                    vec![Effect::Convert { job_id }]
                }
                Err(reason) => {
                    state.fail_job(job_id, reason);
                    state.advance()
                }
            }
        }
        Msg::ConversionFinished { job_id, result } => {
            if !state.is_current(job_id) {
                return (state, Vec::new());
            }
            match result {
                Ok(()) => {
                    state.set_stage(job_id, Stage::Cleaning);
                    vec![Effect::RemoveSource { job_id }]
                }
                Err(reason) => {
                    // The staged source is left alone so a later run can retry the conversion.
                    state.fail_job(job_id, reason);
                    state.advance()
                }
            }
        }
        Msg::SourceRemoved { job_id } => {
            if !state.is_current(job_id) {
                return (state, Vec::new());
            }
            state.finish_job(job_id, JobResultKind::Converted);
            state.advance()
        }
        Msg::PublishFinished { result } => {
            if state.phase() == RunPhase::Publishing {
                state.finish_publish(result);
            }
            Vec::new()
        }
    };

    (state, effects)
}

fn finish_page(state: &mut RunState) -> Vec<Effect> {
    state.page_reported();
    if state.discovery_complete() {
        state.create_jobs();
        state.advance()
    } else {
        Vec::new()
    }
}
