use skitter_crawl::{Cookie, CookieJar};

#[test]
fn round_trip_preserves_fields() {
    let mut cookie = Cookie::new("name1", "value1").unwrap();
    cookie.path = "/app".to_string();
    cookie.domain = "example.com".to_string();
    cookie.httponly = true;

    let rendered = cookie.to_string(true);
    let parsed = Cookie::from_set_cookie_str(&rendered).unwrap();

    assert_eq!(parsed.name, cookie.name);
    assert_eq!(parsed.value, cookie.value);
    assert_eq!(parsed.path, cookie.path);
    assert_eq!(parsed.domain, cookie.domain);
    assert_eq!(parsed.httponly, cookie.httponly);
}

#[test]
fn set_cookie_parses_attributes_case_insensitively() {
    let cookie = Cookie::from_set_cookie_str("thing=stuff; Path=/; Domain=.localhost; HttpOnly").unwrap();
    assert_eq!(cookie.name, "thing");
    assert_eq!(cookie.value, "stuff");
    assert_eq!(cookie.path, "/");
    assert_eq!(cookie.domain, "localhost");
    assert!(cookie.httponly);
}

#[test]
fn missing_name_is_rejected() {
    assert!(Cookie::from_set_cookie_str("=stuff").is_err());
    assert!(Cookie::from_set_cookie_str("noequalssign").is_err());
}

#[test]
fn domain_matching_uses_reversed_suffix() {
    let mut cookie = Cookie::new("n", "v").unwrap();
    cookie.domain = "example.com".to_string();

    assert!(cookie.domain_matches("example.com"));
    assert!(cookie.domain_matches("www.example.com"));
    assert!(!cookie.domain_matches("notexample.com"));
}

#[test]
fn wildcard_domain_matches_everything() {
    let cookie = Cookie::new("n", "v").unwrap();
    assert_eq!(cookie.domain, "*");
    assert!(cookie.domain_matches("anything.test"));
}

#[test]
fn jar_overwrites_on_same_name_and_domain() {
    let jar = CookieJar::new();
    jar.add_from_header("thing=one; domain=localhost").unwrap();
    jar.add_from_header("thing=two; domain=localhost").unwrap();

    assert_eq!(jar.len(), 1);
    let found = jar.get(Some("thing"), Some("localhost"));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].value, "two");
}

#[test]
fn jar_as_header_joins_name_value_pairs() {
    let jar = CookieJar::new();
    jar.add_from_header("name1=value1; domain=localhost").unwrap();
    jar.add_from_header("name2=value2; domain=localhost").unwrap();
    jar.add_from_header("name3=value3; domain=localhost").unwrap();

    let mut pairs = jar.get_as_header(Some("localhost"), None);
    pairs.sort();
    assert_eq!(pairs, vec!["name1=value1", "name2=value2", "name3=value3"]);
}

#[test]
fn jar_remove_does_not_skip_entries() {
    let jar = CookieJar::new();
    jar.add_from_header("a=1; domain=x.com").unwrap();
    jar.add_from_header("b=1; domain=x.com").unwrap();
    jar.add_from_header("c=1; domain=y.com").unwrap();

    jar.remove(None, Some("x.com"));

    assert_eq!(jar.len(), 1);
    assert_eq!(jar.get(None, None)[0].domain, "y.com");
}

#[test]
fn expired_cookie_excluded_from_header() {
    let jar = CookieJar::new();
    jar.add_from_header("stale=1; domain=x.com; expires=0").unwrap();
    assert!(jar.get_as_header(Some("x.com"), None).is_empty());
}
