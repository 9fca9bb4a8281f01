use pretty_assertions::assert_eq;
use ra2flac_core::{update, Effect, ManualUrls, Msg, RunPhase, RunState};

fn pages() -> Vec<String> {
    vec![
        "https://pages.example/a.html".to_string(),
        "https://pages.example/b.html".to_string(),
    ]
}

fn start(manual: &str, publish: bool) -> (RunState, Vec<Effect>) {
    update(
        RunState::new(),
        Msg::Start {
            manual: ManualUrls::new(manual),
            source_pages: pages(),
            publish,
        },
    )
}

#[test]
fn empty_manual_list_scans_every_source_page() {
    engine_logging::initialize_for_tests();
    let (state, effects) = start("", false);

    assert_eq!(state.phase(), RunPhase::Discovering);
    assert_eq!(
        effects,
        vec![
            Effect::ScanPage {
                page_url: "https://pages.example/a.html".to_string()
            },
            Effect::ScanPage {
                page_url: "https://pages.example/b.html".to_string()
            },
        ]
    );
}

#[test]
fn manual_list_skips_discovery() {
    let (state, effects) = start("https://x.example/one.ra, https://x.example/two.ra", false);

    assert_eq!(state.phase(), RunPhase::Processing);
    assert_eq!(state.jobs().count(), 2);
    assert_eq!(
        effects,
        vec![Effect::Prepare {
            job_id: 1,
            url: "https://x.example/one.ra".to_string()
        }]
    );
}

#[test]
fn jobs_are_created_only_after_last_page_reports() {
    let (state, _) = start("", false);

    let (state, effects) = update(
        state,
        Msg::PageScanned {
            page_url: "https://pages.example/a.html".to_string(),
            links: vec!["https://x.example/1.ra".to_string()],
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), RunPhase::Discovering);

    let (state, effects) = update(
        state,
        Msg::PageFailed {
            page_url: "https://pages.example/b.html".to_string(),
            reason: "http status 503".to_string(),
        },
    );
    assert_eq!(state.phase(), RunPhase::Processing);
    assert_eq!(
        effects,
        vec![Effect::Prepare {
            job_id: 1,
            url: "https://x.example/1.ra".to_string()
        }]
    );
    assert_eq!(
        state.summary().failed_pages,
        vec![(
            "https://pages.example/b.html".to_string(),
            "http status 503".to_string()
        )]
    );
}

#[test]
fn discovered_links_are_deduplicated_in_first_seen_order() {
    let (state, _) = start("", false);
    let (state, _) = update(
        state,
        Msg::PageScanned {
            page_url: "https://pages.example/a.html".to_string(),
            links: vec![
                "https://x.example/b.ra".to_string(),
                "https://x.example/a.ra".to_string(),
            ],
        },
    );
    let (state, _) = update(
        state,
        Msg::PageScanned {
            page_url: "https://pages.example/b.html".to_string(),
            links: vec![
                "https://X.example/b.ra#again".to_string(),
                "https://x.example/c.ra".to_string(),
            ],
        },
    );

    let urls: Vec<_> = state.jobs().map(|job| job.url.clone()).collect();
    assert_eq!(
        urls,
        vec![
            "https://x.example/b.ra".to_string(),
            "https://x.example/a.ra".to_string(),
            "https://x.example/c.ra".to_string(),
        ]
    );
    let ids: Vec<_> = state.jobs().map(|job| job.job_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn nothing_discovered_finishes_without_publishing() {
    let (state, _) = start("", false);
    let (state, _) = update(
        state,
        Msg::PageScanned {
            page_url: "https://pages.example/a.html".to_string(),
            links: Vec::new(),
        },
    );
    let (state, effects) = update(
        state,
        Msg::PageScanned {
            page_url: "https://pages.example/b.html".to_string(),
            links: Vec::new(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.phase(), RunPhase::Finished);
    assert_eq!(state.summary().resolved, 0);
}

#[test]
fn second_start_is_ignored() {
    let (state, _) = start("", false);
    let (state, effects) = update(
        state,
        Msg::Start {
            manual: ManualUrls::new("https://x.example/late.ra"),
            source_pages: Vec::new(),
            publish: true,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), RunPhase::Discovering);
}
