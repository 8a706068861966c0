use skitter_crawl::robots::parse_robots_txt;

#[test]
fn disallow_blocks_matching_prefix() {
    let entry = parse_robots_txt("User-agent: *\nDisallow: /forbidden\n");
    assert!(!entry.is_allowed("/forbidden/page", "any-bot"));
    assert!(entry.is_allowed("/allowed", "any-bot"));
}

#[test]
fn no_rules_means_allowed() {
    let entry = parse_robots_txt("");
    assert!(entry.is_allowed("/anything", "any-bot"));
}

#[test]
fn exact_user_agent_block_beats_wildcard() {
    let text = "User-agent: specific-bot\nDisallow: /only-for-specific\n\nUser-agent: *\nDisallow: /\n";
    let entry = parse_robots_txt(text);
    assert!(entry.is_allowed("/anything", "specific-bot"));
    assert!(!entry.is_allowed("/anything", "other-bot"));
}

#[test]
fn longest_prefix_wins_and_allow_breaks_ties() {
    let text = "User-agent: *\nDisallow: /a\nAllow: /a/b\n";
    let entry = parse_robots_txt(text);
    assert!(!entry.is_allowed("/a/x", "any-bot"));
    assert!(entry.is_allowed("/a/b", "any-bot"));
    assert!(entry.is_allowed("/a/b/c", "any-bot"));
}

#[test]
fn sitemaps_are_collected() {
    let text = "User-agent: *\nDisallow:\nSitemap: http://x.com/sitemap1.xml\nSitemap: http://x.com/sitemap2.xml\n";
    let entry = parse_robots_txt(text);
    assert_eq!(entry.sitemaps(), &["http://x.com/sitemap1.xml", "http://x.com/sitemap2.xml"]);
}

#[test]
fn crawl_delay_is_parsed_per_block() {
    let text = "User-agent: slow-bot\nCrawl-delay: 10\n\nUser-agent: *\nCrawl-delay: 1\n";
    let entry = parse_robots_txt(text);
    assert_eq!(entry.crawl_delay("slow-bot"), Some(10.0));
    assert_eq!(entry.crawl_delay("other-bot"), Some(1.0));
}

#[test]
fn comments_and_blank_lines_are_ignored() {
    let text = "# comment\nUser-agent: *\n\n# another comment\nDisallow: /secret # trailing comment\n";
    let entry = parse_robots_txt(text);
    assert!(!entry.is_allowed("/secret", "any-bot"));
    assert!(entry.is_allowed("/public", "any-bot"));
}

#[test]
fn empty_disallow_value_allows_everything() {
    let entry = parse_robots_txt("User-agent: *\nDisallow:\n");
    assert!(entry.is_allowed("/anything/at/all", "any-bot"));
}
