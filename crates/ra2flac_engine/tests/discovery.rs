use pretty_assertions::assert_eq;
use ra2flac_engine::{discover_links, AudioLinkExtractor, DiscoveryError, FetchSettings, ReqwestFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn only_ra_anchors_are_collected() {
    let html = r#"
        <ul>
          <li><a href="songs/first.ra">First</a></li>
          <li><a href="songs/second.RA">Second</a></li>
          <li><a href="songs/lyrics.txt">Lyrics</a></li>
          <li><a href="songs/third.ram">Playlist</a></li>
          <li><img src="songs/cover.ra"></li>
        </ul>"#;
    let links = AudioLinkExtractor::new().extract(html, Some("http://www.example.jp/music/index.html"));

    assert_eq!(
        links,
        vec![
            "http://www.example.jp/music/songs/first.ra".to_string(),
            "http://www.example.jp/music/songs/second.RA".to_string(),
        ]
    );
}

#[test]
fn absolute_and_archived_links_resolve_against_the_page() {
    let html = r##"
        <a href="/web/19970807015220/http://www.example.jp/music/a.ra">A</a>
        <a href="https://other.example/b.ra">B</a>
        <a href="#c.ra">fragment</a>
        <a href="javascript:play('d.ra')">script</a>"##;
    let links = AudioLinkExtractor::new().extract(
        html,
        Some("https://web.archive.org/web/19970807015220/http://www.example.jp/music/newsound.html"),
    );

    assert_eq!(
        links,
        vec![
            "https://web.archive.org/web/19970807015220/http://www.example.jp/music/a.ra".to_string(),
            "https://other.example/b.ra".to_string(),
        ]
    );
}

#[test]
fn relative_links_without_base_are_dropped() {
    let links = AudioLinkExtractor::new().extract(r#"<a href="x.ra">x</a>"#, None);
    assert!(links.is_empty());
}

#[test]
fn link_limit_is_enforced() {
    let html = (0..4)
        .map(|i| format!(r#"<a href="https://ex.com/{i}.ra">link{i}</a>"#))
        .collect::<Vec<_>>()
        .join(" ");
    let links = AudioLinkExtractor::new().with_max_links(2).extract(&html, None);

    assert_eq!(
        links,
        vec!["https://ex.com/0.ra".to_string(), "https://ex.com/1.ra".to_string()]
    );
}

#[test]
fn custom_extensions_are_supported() {
    let html = r#"<a href="https://ex.com/a.rm">rm</a><a href="https://ex.com/b.ra">ra</a>"#;
    let links = AudioLinkExtractor::with_extensions([".rm"]).extract(html, None);
    assert_eq!(links, vec!["https://ex.com/a.rm".to_string()]);
}

#[tokio::test]
async fn discovery_decodes_shift_jis_pages() {
    let server = MockServer::start().await;
    let mut body = b"<html><head><meta http-equiv=\"Content-Type\" content=\"text/html; charset=Shift_JIS\"></head><body>".to_vec();
    // "曲" in Shift_JIS as link text.
    body.extend_from_slice(b"<a href=\"snd/kyoku.ra\">");
    body.extend_from_slice(&[0x8b, 0xc8]);
    body.extend_from_slice(b"</a></body></html>");

    Mock::given(method("GET"))
        .and(path("/music/newsound.html"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::for_pages());
    let page = format!("{}/music/newsound.html", server.uri());
    let links = discover_links(&fetcher, &AudioLinkExtractor::new(), &page)
        .await
        .expect("discovery ok");

    assert_eq!(links, vec![format!("{}/music/snd/kyoku.ra", server.uri())]);
}

#[tokio::test]
async fn discovery_reports_fetch_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.html"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::for_pages());
    let err = discover_links(
        &fetcher,
        &AudioLinkExtractor::new(),
        &format!("{}/gone.html", server.uri()),
    )
    .await
    .unwrap_err();
    let DiscoveryError::Fetch(fetch) = err;
    assert!(fetch.to_string().contains("410"), "{fetch}");
}

#[tokio::test]
async fn malformed_shift_jis_bytes_do_not_hide_links() {
    let server = MockServer::start().await;
    let mut body = b"<html><head><meta charset=\"shift_jis\"></head><body><a href=\"a.ra\">A</a>".to_vec();
    // Lead byte followed by an invalid trail byte.
    body.extend_from_slice(&[0x81, 0x20]);
    body.extend_from_slice(b"<a href=\"b.ra\">B</a></body></html>");

    Mock::given(method("GET"))
        .and(path("/music/sndarc.html"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::for_pages());
    let page = format!("{}/music/sndarc.html", server.uri());
    let links = discover_links(&fetcher, &AudioLinkExtractor::new(), &page)
        .await
        .expect("discovery ok");

    assert_eq!(
        links,
        vec![
            format!("{}/music/a.ra", server.uri()),
            format!("{}/music/b.ra", server.uri()),
        ]
    );
}
