use jobber_fetch::SearchQuery;
use url::Url;

fn base_url() -> Url {
    Url::parse("https://example.com/nx/search/jobs/").unwrap()
}

fn request_pairs(raw: &str) -> Vec<(String, String)> {
    SearchQuery::parse(raw)
        .add_to_url(&base_url())
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn pair(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

#[test]
fn search_query_parses_raw_pairs() {
    assert_eq!(
        request_pairs("q=azure&sort=recency&t=1"),
        vec![pair("q", "azure"), pair("sort", "recency"), pair("t", "1")]
    );
}

#[test]
fn search_query_ignores_leading_question_mark() {
    assert_eq!(request_pairs("?q=rust"), vec![pair("q", "rust")]);
}

#[test]
fn search_query_drops_empty_segments() {
    assert_eq!(
        request_pairs("q=rust&&=orphan&t=0"),
        vec![pair("q", "rust"), pair("t", "0")]
    );
}

#[test]
fn search_query_decodes_then_reencodes() {
    let encoded = SearchQuery::parse("q=%28C%23%20OR%20.NET%29&sort=recency");
    let plain = SearchQuery::parse("q=(C# OR .NET)&sort=recency");
    assert_eq!(encoded, plain);

    let url = encoded.add_to_url(&base_url());
    assert_eq!(url, plain.add_to_url(&base_url()));
    assert_eq!(url.path(), "/nx/search/jobs/");
    assert_eq!(
        request_pairs("q=%28C%23%20OR%20.NET%29&sort=recency")[0],
        pair("q", "(C# OR .NET)")
    );
}

#[test]
fn search_query_keeps_repeated_keys() {
    let tiers: Vec<String> = request_pairs("contractor_tier=2&contractor_tier=3")
        .into_iter()
        .filter(|(k, _)| k == "contractor_tier")
        .map(|(_, v)| v)
        .collect();
    assert_eq!(tiers, vec!["2", "3"]);
}

#[test]
fn empty_query_leaves_url_untouched() {
    assert_eq!(SearchQuery::parse("").add_to_url(&base_url()).query(), None);
    assert_eq!(SearchQuery::parse("  ?").add_to_url(&base_url()), base_url());
}
