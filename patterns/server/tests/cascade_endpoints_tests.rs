use insta::assert_yaml_snapshot;
use regex::Regex;

mod common;

use common::{delete, get, get_with_headers, insert_country, insert_state, seed_locality, setup};

/// `(id, name)` pairs of the non-placeholder options in a fragment.
fn option_pairs(html: &str) -> Vec<(i64, String)> {
    let option = Regex::new(r#"<option value="(\d+)">([^<]*)</option>"#).unwrap();
    option
        .captures_iter(html)
        .map(|captures| (captures[1].parse().unwrap(), captures[2].to_string()))
        .collect()
}

/// `(id, name)` pairs of a structured collection.
fn json_pairs(payload: &serde_json::Value, collection: &str) -> Vec<(i64, String)> {
    payload[collection]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| {
            (
                item["id"].as_i64().unwrap(),
                item["name"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[tokio::test]
async fn can_list_states_of_a_country_by_name() {
    let ctx = setup().await.expect("Failed to setup test context");
    let locality = seed_locality(ctx.db()).await;

    let response = get(
        &ctx.app,
        &format!("/api/states?country_id={}", locality.united_states),
    )
    .await;

    assert_eq!(response.status, 200);
    let payload = response.json();
    assert_eq!(payload["states"][0]["id"], locality.california);
    assert_eq!(payload["states"][0]["code"], "CA");
    let names: Vec<&str> = payload["states"]
        .as_array()
        .unwrap()
        .iter()
        .map(|state| state["name"].as_str().unwrap())
        .collect();
    assert_yaml_snapshot!(names, @r"
    - California
    - Texas
    ");
}

#[tokio::test]
async fn both_modes_enumerate_the_same_children_in_the_same_order() {
    let ctx = setup().await.expect("Failed to setup test context");
    let locality = seed_locality(ctx.db()).await;

    for (collection, query) in [
        ("states", format!("country_id={}", locality.united_states)),
        ("states", format!("country_id={}", locality.canada)),
        ("cities", format!("state_id={}", locality.california)),
        ("cities", format!("state_id={}", locality.texas)),
        ("cities", format!("state_id={}", locality.ontario)),
    ] {
        let structured = get(&ctx.app, &format!("/api/{collection}?{query}")).await;
        let fragment = get(&ctx.app, &format!("/htmx/{collection}?{query}")).await;

        let from_json = json_pairs(&structured.json(), collection);
        let from_html = option_pairs(&fragment.body);
        assert!(!from_json.is_empty());
        assert_eq!(from_json, from_html, "{collection}?{query}");
    }
}

#[tokio::test]
async fn can_render_city_options_with_placeholder() {
    let ctx = setup().await.expect("Failed to setup test context");
    let locality = seed_locality(ctx.db()).await;

    let response = get(
        &ctx.app,
        &format!("/htmx/cities?state_id={}", locality.california),
    )
    .await;

    assert_eq!(response.status, 200);
    assert!(response.content_type().starts_with("text/html"));
    assert!(
        response
            .body
            .contains(r#"<option value="" disabled selected>Select a city</option>"#)
    );
    let names: Vec<String> = option_pairs(&response.body)
        .into_iter()
        .map(|(_, name)| name)
        .collect();
    assert_eq!(names, vec!["Los Angeles", "San Francisco"]);
}

#[tokio::test]
async fn missing_or_empty_parent_yields_empty_list() {
    let ctx = setup().await.expect("Failed to setup test context");
    seed_locality(ctx.db()).await;

    for uri in ["/api/states", "/api/states?country_id=", "/api/states?country_id=abc"] {
        let response = get(&ctx.app, uri).await;
        assert_eq!(response.status, 200, "{uri}");
        assert_eq!(response.json(), serde_json::json!({"states": []}), "{uri}");
    }

    let response = get(&ctx.app, "/htmx/cities?state_id=").await;
    assert_eq!(response.status, 200);
    assert_eq!(
        response.body.trim(),
        r#"<option value="">Select a city</option>"#
    );
}

#[tokio::test]
async fn unknown_parent_yields_empty_list() {
    let ctx = setup().await.expect("Failed to setup test context");
    seed_locality(ctx.db()).await;

    let structured = get(&ctx.app, "/api/cities?state_id=9999").await;
    assert_eq!(structured.json(), serde_json::json!({"cities": []}));

    let fragment = get(&ctx.app, "/htmx/states?country_id=9999").await;
    assert_eq!(
        fragment.body.trim(),
        r#"<option value="">Select a state</option>"#
    );
}

#[tokio::test]
async fn country_without_states_yields_empty_list_in_both_modes() {
    let ctx = setup().await.expect("Failed to setup test context");
    seed_locality(ctx.db()).await;
    let mexico = insert_country(ctx.db(), "Mexico", "MX").await;

    let structured = get(&ctx.app, &format!("/api/states?country_id={mexico}")).await;
    assert_eq!(structured.status, 200);
    assert_eq!(structured.json(), serde_json::json!({"states": []}));

    let fragment = get(&ctx.app, &format!("/htmx/states?country_id={mexico}")).await;
    assert_eq!(fragment.status, 200);
    assert_eq!(
        fragment.body.trim(),
        r#"<option value="">Select a state</option>"#
    );
}

#[tokio::test]
async fn state_without_cities_yields_empty_list_in_both_modes() {
    let ctx = setup().await.expect("Failed to setup test context");
    let locality = seed_locality(ctx.db()).await;
    let quebec = insert_state(ctx.db(), locality.canada, "Quebec", "QC").await;

    let structured = get(&ctx.app, &format!("/api/cities?state_id={quebec}")).await;
    assert_eq!(structured.json(), serde_json::json!({"cities": []}));

    let fragment = get(&ctx.app, &format!("/htmx/cities?state_id={quebec}")).await;
    assert_eq!(
        fragment.body.trim(),
        r#"<option value="">Select a city</option>"#
    );
}

#[tokio::test]
async fn cities_omit_code() {
    let ctx = setup().await.expect("Failed to setup test context");
    let locality = seed_locality(ctx.db()).await;

    let response = get(&ctx.app, &format!("/api/cities?state_id={}", locality.ontario)).await;

    let city = &response.json()["cities"][0];
    assert_eq!(city["name"], "Toronto");
    assert!(city.get("code").is_none());
}

#[tokio::test]
async fn can_list_countries_by_name() {
    let ctx = setup().await.expect("Failed to setup test context");
    seed_locality(ctx.db()).await;

    let response = get(&ctx.app, "/api/countries").await;

    let payload = response.json();
    assert_eq!(payload["countries"][0]["name"], "Canada");
    assert_eq!(payload["countries"][1]["name"], "United States");
    assert_eq!(payload["countries"][1]["code"], "US");
}

#[tokio::test]
async fn unprefixed_routes_negotiate_the_mode() {
    let ctx = setup().await.expect("Failed to setup test context");
    let locality = seed_locality(ctx.db()).await;
    let uri = format!("/states?country_id={}", locality.united_states);

    let htmx = get_with_headers(&ctx.app, &uri, &[("HX-Request", "true")]).await;
    assert!(htmx.content_type().starts_with("text/html"));
    assert_eq!(option_pairs(&htmx.body).len(), 2);

    let ajax = get_with_headers(&ctx.app, &uri, &[("Accept", "application/json")]).await;
    assert!(ajax.content_type().starts_with("application/json"));
    assert_eq!(json_pairs(&ajax.json(), "states").len(), 2);

    let forced = get_with_headers(
        &ctx.app,
        &format!("{uri}&format=html"),
        &[("Accept", "application/json")],
    )
    .await;
    assert!(forced.content_type().starts_with("text/html"));

    let plain = get(&ctx.app, &uri).await;
    assert!(plain.content_type().starts_with("application/json"));
}

#[tokio::test]
async fn can_delete_country_with_its_states_and_cities() {
    let ctx = setup().await.expect("Failed to setup test context");
    let locality = seed_locality(ctx.db()).await;

    let response = delete(
        &ctx.app,
        &format!("/api/countries/{}", locality.united_states),
    )
    .await;

    assert_eq!(response.status, 200);
    assert_eq!(
        response.json(),
        serde_json::json!({"success": true, "deleted": {"states": 2, "cities": 4}})
    );

    let states = get(
        &ctx.app,
        &format!("/api/states?country_id={}", locality.united_states),
    )
    .await;
    assert_eq!(states.json(), serde_json::json!({"states": []}));
    let cities = get(
        &ctx.app,
        &format!("/api/cities?state_id={}", locality.texas),
    )
    .await;
    assert_eq!(cities.json(), serde_json::json!({"cities": []}));

    let untouched = get(&ctx.app, &format!("/api/cities?state_id={}", locality.ontario)).await;
    assert_eq!(json_pairs(&untouched.json(), "cities").len(), 1);
}

#[tokio::test]
async fn can_delete_state_with_its_cities() {
    let ctx = setup().await.expect("Failed to setup test context");
    let locality = seed_locality(ctx.db()).await;

    let response = delete(&ctx.app, &format!("/htmx/states/{}", locality.texas)).await;

    assert_eq!(response.status, 200);
    assert!(response.body.is_empty());

    let states = get(
        &ctx.app,
        &format!("/api/states?country_id={}", locality.united_states),
    )
    .await;
    assert_eq!(
        json_pairs(&states.json(), "states"),
        vec![(i64::from(locality.california), "California".to_string())]
    );
}

#[tokio::test]
async fn cannot_delete_unknown_country() {
    let ctx = setup().await.expect("Failed to setup test context");

    let structured = delete(&ctx.app, "/api/countries/9999").await;
    assert_eq!(structured.status, 404);
    assert_eq!(
        structured.json(),
        serde_json::json!({"success": false, "error": "Country not found"})
    );

    let fragment = delete(&ctx.app, "/htmx/countries/9999").await;
    assert_eq!(fragment.status, 404);
    assert_eq!(fragment.headers["hx-reswap"], "innerHTML");
    assert!(fragment.body.contains("Country not found"));
}
