use skitter_crawl::url_processor::{process_url, ProcessOptions, Referrer};
use skitter_crawl::Status;

#[test]
fn seed_url_gets_depth_one() {
    let referrer = Referrer::seed("http://example.com/");
    let item = process_url("http://example.com/", &referrer, &ProcessOptions::default()).unwrap();
    assert_eq!(item.depth, 1);
    assert_eq!(item.status, Status::Created);
    assert!(!item.fetched);
}

#[test]
fn discovered_url_depth_is_referrer_plus_one() {
    let referrer = Referrer { url: "http://example.com/".to_string(), depth: 3 };
    let item = process_url("/page", &referrer, &ProcessOptions::default()).unwrap();
    assert_eq!(item.depth, 4);
    assert_eq!(item.host, "example.com");
}

#[test]
fn relative_url_resolves_against_referrer() {
    let referrer = Referrer::seed("http://example.com/dir/page.html");
    let item = process_url("other.html", &referrer, &ProcessOptions::default()).unwrap();
    assert_eq!(item.url, "http://example.com/dir/other.html");
}

#[test]
fn empty_input_is_rejected() {
    let referrer = Referrer::seed("http://example.com/");
    assert!(process_url("   ", &referrer, &ProcessOptions::default()).is_err());
}

#[test]
fn unparseable_url_is_rejected() {
    let referrer = Referrer::seed("not a valid referrer either");
    assert!(process_url("also not valid", &referrer, &ProcessOptions::default()).is_err());
}

#[test]
fn strip_www_removes_prefix() {
    let referrer = Referrer::seed("http://www.x.com/");
    let opts = ProcessOptions { strip_www: true, ..Default::default() };
    let item = process_url("http://www.x.com/", &referrer, &opts).unwrap();
    assert_eq!(item.host, "x.com");
}

#[test]
fn strip_querystring_removes_query() {
    let referrer = Referrer::seed("http://x.com/");
    let opts = ProcessOptions { strip_querystring: true, ..Default::default() };
    let item = process_url("http://x.com/page?b=2&a=1", &referrer, &opts).unwrap();
    assert_eq!(item.url, "http://x.com/page");
}

#[test]
fn sort_query_parameters_collapses_reordered_duplicates() {
    let referrer = Referrer::seed("http://x.com/");
    let opts = ProcessOptions { sort_query_parameters: true, ..Default::default() };
    let a = process_url("http://x.com/page?b=2&a=1", &referrer, &opts).unwrap();
    let b = process_url("http://x.com/page?a=1&b=2", &referrer, &opts).unwrap();
    assert_eq!(a.url, b.url);
}

#[test]
fn default_ports_are_filled_in() {
    let referrer = Referrer::seed("http://x.com/");
    let item = process_url("http://x.com/", &referrer, &ProcessOptions::default()).unwrap();
    assert_eq!(item.port, 80);

    let referrer = Referrer::seed("https://x.com/");
    let item = process_url("https://x.com/", &referrer, &ProcessOptions::default()).unwrap();
    assert_eq!(item.port, 443);
}

#[test]
fn origin_includes_explicit_port() {
    let referrer = Referrer::seed("http://x.com:8080/");
    let item = process_url("http://x.com:8080/page", &referrer, &ProcessOptions::default()).unwrap();
    assert_eq!(item.origin(), "http://x.com:8080");
}
