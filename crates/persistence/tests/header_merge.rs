use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use axum_extra::extract::cookie::Cookie;
use persistence::{decode, CookieStore, CookieStoreConfig, HeaderWriter, Persistence};
use serde_json::json;

fn set_cookie_lines(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().expect("ascii set-cookie").to_string())
        .collect()
}

fn named<'a>(lines: &'a [String], name: &str) -> Vec<&'a String> {
    let prefix = format!("{name}=");
    lines.iter().filter(|l| l.starts_with(&prefix)).collect()
}

#[test]
fn other_staged_cookies_are_not_overridden() {
    let request = HeaderMap::new();
    let mut response = HeaderMap::new();
    response.append(SET_COOKIE, HeaderValue::from_static("dummy=wow"));

    let mut store = CookieStore::new(&request, HeaderWriter::new(&mut response), CookieStoreConfig::default());
    store.set("foo", json!("FOO")).unwrap();
    drop(store);

    let lines = set_cookie_lines(&response);
    assert!(lines.iter().any(|l| l == "dummy=wow"));
    assert_eq!(named(&lines, "split").len(), 1);
}

#[test]
fn puts_multiple_keys_in_a_single_cookie() {
    let request = HeaderMap::new();
    let mut response = HeaderMap::new();

    let mut store = CookieStore::new(&request, HeaderWriter::new(&mut response), CookieStoreConfig::default());
    store.set("foo", json!("FOO")).unwrap();
    store.set("bar", json!("BAR")).unwrap();
    drop(store);

    let lines = set_cookie_lines(&response);
    let split = named(&lines, "split");
    assert_eq!(split.len(), 1);

    let cookie = Cookie::parse_encoded(split[0].clone()).unwrap();
    assert_eq!(cookie.value(), r#"{"foo":"FOO","bar":"BAR"}"#);
    assert_eq!(cookie.path(), Some("/"));
    assert!(cookie.expires_datetime().is_some());
    // raw JSON punctuation must not leak into the header
    assert!(!split[0].contains('"'));
    assert!(!split[0].contains(','));
}

#[test]
fn prefix_sharing_cookie_survives() {
    let request = HeaderMap::new();
    let mut response = HeaderMap::new();
    response.append(SET_COOKIE, HeaderValue::from_static("splitvariant=blue; Path=/"));
    response.append(SET_COOKIE, HeaderValue::from_static("split=stale; Path=/"));

    let mut store = CookieStore::new(&request, HeaderWriter::new(&mut response), CookieStoreConfig::default());
    store.set("exp", json!("red")).unwrap();
    drop(store);

    let lines = set_cookie_lines(&response);
    assert_eq!(named(&lines, "splitvariant").len(), 1);
    let split = named(&lines, "split");
    assert_eq!(split.len(), 1);
    assert!(!split[0].contains("stale"));
}

#[test]
fn round_trip_through_request_cookie_header() {
    let first_request = HeaderMap::new();
    let mut first_response = HeaderMap::new();
    let mut store = CookieStore::new(&first_request, HeaderWriter::new(&mut first_response), CookieStoreConfig::default());
    store.set("checkout", json!({"variant": "b", "n": 3})).unwrap();
    store.set("banner", json!(["x", 1])).unwrap();
    drop(store);

    // the browser sends back just `name=value`
    let staged = set_cookie_lines(&first_response);
    let pair = staged[0].split(';').next().unwrap().to_string();
    let mut second_request = HeaderMap::new();
    second_request.insert(COOKIE, HeaderValue::from_str(&format!("other=1; {pair}")).unwrap());

    let mut second_response = HeaderMap::new();
    let mut store = CookieStore::new(&second_request, HeaderWriter::new(&mut second_response), CookieStoreConfig::default());
    assert_eq!(store.keys(), vec!["checkout", "banner"]);
    assert_eq!(store.get("checkout"), Some(json!({"variant": "b", "n": 3})));
    assert_eq!(store.get("banner"), Some(json!(["x", 1])));
}

#[test]
fn corrupt_request_cookie_is_replaced() {
    let mut request = HeaderMap::new();
    request.insert(COOKIE, HeaderValue::from_static("split=%7B%22foo%22%3A2%2C"));
    let mut response = HeaderMap::new();

    let mut store = CookieStore::new(&request, HeaderWriter::new(&mut response), CookieStoreConfig::default());
    assert_eq!(store.get("foo"), None);
    store.set("foo", json!("x")).unwrap();
    assert_eq!(store.get("foo"), Some(json!("x")));
    drop(store);

    let lines = set_cookie_lines(&response);
    let cookie = Cookie::parse_encoded(lines[0].clone()).unwrap();
    assert_eq!(decode(cookie.value()).get("foo"), Some(&json!("x")));
}
