use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use query_state::{
    Error, QueryBuilder, SearchParams, StateMap, StateValue, apply_updates, clear_caches,
};
use serde::Deserialize;

fn map<const N: usize>(entries: [(&str, StateValue); N]) -> StateMap {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
}

#[test]
fn defaults_and_overrides() {
    let builder = QueryBuilder::new();
    assert_eq!(
        builder.build(&StateMap::new()).unwrap(),
        map([("page", 1.into()), ("pageSize", 10.into())])
    );
    assert_eq!(
        builder.build(&map([("page", 3.into())])).unwrap(),
        map([("page", 3.into()), ("pageSize", 10.into())])
    );
}

#[test]
fn ignore_beats_mapping() {
    let builder = QueryBuilder::new()
        .mapping("debug", |_| StateValue::from("mutated"))
        .ignore(["debug"]);
    let query = builder.build(&map([("debug", "x".into())])).unwrap();
    assert_eq!(query.get("debug"), None);
}

#[test]
fn ignore_keeps_default() {
    let builder = QueryBuilder::new()
        .defaults([("debug", "off")])
        .ignore(["debug"])
        .mapping("debug", |_| StateValue::from("mutated"));
    let query = builder.build(&map([("debug", "on".into())])).unwrap();
    assert_eq!(query["debug"], StateValue::from("off"));
}

#[test]
fn ignore_is_cumulative() {
    let builder = QueryBuilder::new().ignore(["a"]).ignore(["b".to_owned()]);
    assert!(builder.is_ignored("a"));
    assert!(builder.is_ignored("b"));
    let query = builder
        .build(&map([("a", 1.into()), ("b", 2.into()), ("c", 3.into())]))
        .unwrap();
    assert_eq!(
        query.keys().collect::<Vec<_>>(),
        ["page", "pageSize", "c"]
    );
}

#[test]
fn mapping_sees_decoded_value() {
    let builder = QueryBuilder::new().mapping("pageSize", |v| {
        StateValue::from(v.as_f64().unwrap_or(10.0).min(100.0))
    });
    let params = SearchParams::parse("pageSize=500");
    let query = builder.from_url(&params, "").unwrap();
    assert_eq!(query["pageSize"], StateValue::from(100));
}

#[test]
fn post_process_sees_defaulted_result() {
    let builder = QueryBuilder::new()
        .defaults([("orderDir", "+")])
        .post_process(|mut query| {
            let sort = format!("{}{}", query["orderDir"], query["orderBy"]);
            query.insert("sort".to_owned(), sort.into());
            query
        });
    let query = builder.build(&map([("orderBy", "name".into())])).unwrap();
    assert_eq!(query["sort"], StateValue::from("+name"));
}

#[test]
fn post_process_can_remove_keys() {
    let builder = QueryBuilder::new().post_process(|mut query| {
        query.shift_remove("pageSize");
        query
    });
    let query = builder.build(&StateMap::new()).unwrap();
    assert_eq!(query, map([("page", 1.into())]));
}

#[derive(Debug)]
struct OutOfRange(f64);

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {} out of range", self.0)
    }
}

impl std::error::Error for OutOfRange {}

#[test]
fn mapping_errors_propagate_unchanged() {
    let builder = QueryBuilder::new().try_mapping("page", |v| match v.as_f64() {
        Some(page) if page < 1.0 => Err(OutOfRange(page)),
        _ => Ok(v),
    });

    let err = builder.build(&map([("page", 0.into())])).unwrap_err();
    match &err {
        Error::Mapping { key, .. } => assert_eq!(key, "page"),
        other => panic!("unexpected error: {other}"),
    }
    let source = err.caller_error().unwrap();
    assert_eq!(source.to_string(), "page 0 out of range");
    assert!(source.downcast_ref::<OutOfRange>().is_some());

    assert!(builder.build(&map([("page", 2.into())])).is_ok());
}

#[test]
fn post_process_errors_propagate() {
    let builder = QueryBuilder::new().try_post_process(|query| {
        if query.contains_key("from") && !query.contains_key("to") {
            Err("`from` requires `to`")
        } else {
            Ok(query)
        }
    });
    let err = builder
        .build(&map([("from", "2024-01-01".into())]))
        .unwrap_err();
    assert!(matches!(err, Error::PostProcess(_)));
    assert_eq!(err.caller_error().unwrap().to_string(), "`from` requires `to`");
}

#[test]
fn from_url_with_prefix() {
    let source: HashMap<&str, &str> = [
        ("u_search", "john"),
        ("u_page", "4"),
        ("i_search", "bug"),
        ("i_page", "2"),
    ]
    .into();

    let users = QueryBuilder::new().from_url(&source, "u_").unwrap();
    assert_eq!(
        users,
        map([
            ("page", 4.into()),
            ("pageSize", 10.into()),
            ("search", "john".into())
        ])
    );

    let issues = QueryBuilder::new().from_url(&source, "i_").unwrap();
    assert_eq!(issues["search"], StateValue::from("bug"));
    assert_eq!(issues["page"], StateValue::from(2));
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueQuery {
    page: u32,
    page_size: u32,
    search: Option<String>,
    labels: Vec<String>,
    since: Option<DateTime<Utc>>,
    sort: String,
}

fn issue_builder() -> QueryBuilder {
    QueryBuilder::new()
        .defaults([
            ("labels", StateValue::array(Vec::<String>::new())),
            ("orderBy", "created".into()),
            ("orderDir", "-".into()),
        ])
        .ignore(["debug"])
        .post_process(|mut query| {
            let sort = format!("{}{}", query["orderDir"], query["orderBy"]);
            query.insert("sort".to_owned(), sort.into());
            query
        })
}

#[test]
fn typed_query_from_url() {
    let since = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
    let params = apply_updates(
        &SearchParams::parse("debug=1"),
        "",
        [
            ("labels", Some(StateValue::array(["bug", "ui"]))),
            ("since", Some(StateValue::Date(since))),
            ("orderBy", Some("title".into())),
            ("page", Some(3.into())),
        ],
    );
    let url = params.to_string();

    let query: IssueQuery = issue_builder()
        .from_url_as(&SearchParams::parse(&url), "")
        .unwrap();
    assert_eq!(
        query,
        IssueQuery {
            page: 3,
            page_size: 10,
            search: None,
            labels: vec!["bug".to_owned(), "ui".to_owned()],
            since: Some(since),
            sort: "-title".to_owned(),
        }
    );
}

#[test]
fn typed_query_mismatch_is_an_error() {
    let err = issue_builder()
        .build_as::<IssueQuery>(&map([("page", "first".into())]))
        .unwrap_err();
    assert!(matches!(err, Error::Typed(_)), "got: {err}");
    assert!(err.caller_error().is_none());
}

#[test]
fn builds_are_cache_independent() {
    let params = SearchParams::parse("orderBy=name&labels=%255B%2522a%2522%255D");
    let first = issue_builder().from_url(&params, "").unwrap();
    clear_caches();
    let second = issue_builder().from_url(&params, "").unwrap();
    assert_eq!(first, second);
    assert_eq!(first["labels"], StateValue::array(["a"]));
}
