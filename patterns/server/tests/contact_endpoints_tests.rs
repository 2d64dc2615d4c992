use patterns_server::contact::{ContactService, ContactSubmission};
use sea_orm::DatabaseConnection;

mod common;

use common::{get, post_form, setup};

const VALID_FORM: &str =
    "first_name=Jane&last_name=Smith&email=jane%40example.com&phone=&company=Acme&message=Hello";

async fn add_contact(db: &DatabaseConnection, first: &str, last: &str, email: &str, company: &str) {
    let submission = ContactSubmission {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: email.to_string(),
        phone: String::new(),
        company: company.to_string(),
        message: "Hi".to_string(),
    };
    ContactService::new(db).submit(&submission).await.unwrap();
}

#[tokio::test]
async fn can_submit_contact() {
    let ctx = setup().await.expect("Failed to setup test context");

    let response = post_form(&ctx.app, "/api/contacts", VALID_FORM).await;

    assert_eq!(response.status, 200);
    let payload = response.json();
    assert_eq!(payload["success"], true);
    assert_eq!(payload["message"], "Thank you, Jane! We'll be in touch soon.");
    assert!(payload["contact_id"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn can_render_submission_success_fragment() {
    let ctx = setup().await.expect("Failed to setup test context");

    let response = post_form(&ctx.app, "/htmx/contacts", VALID_FORM).await;

    assert_eq!(response.status, 200);
    assert!(response.body.contains("alert-success"));
    assert!(response.body.contains("Thank you, Jane!"));
}

#[tokio::test]
async fn reports_every_missing_field_at_once() {
    let ctx = setup().await.expect("Failed to setup test context");

    let response = post_form(&ctx.app, "/api/contacts", "first_name=+&email=not-an-email").await;

    assert_eq!(response.status, 400);
    assert_eq!(
        response.json(),
        serde_json::json!({
            "success": false,
            "errors": {
                "first_name": "First name is required",
                "last_name": "Last name is required",
                "email": "Please enter a valid email",
                "message": "Message is required"
            }
        })
    );
}

#[tokio::test]
async fn rejects_duplicate_email_on_the_email_field() {
    let ctx = setup().await.expect("Failed to setup test context");
    post_form(&ctx.app, "/api/contacts", VALID_FORM).await;

    let structured = post_form(&ctx.app, "/api/contacts", VALID_FORM).await;
    assert_eq!(structured.status, 400);
    assert_eq!(
        structured.json()["errors"],
        serde_json::json!({"email": "This email is already registered"})
    );

    let fragment = post_form(&ctx.app, "/htmx/contacts", VALID_FORM).await;
    assert_eq!(fragment.status, 400);
    assert!(fragment.body.contains(r#"<li data-field="email">This email is already registered</li>"#));
}

#[tokio::test]
async fn can_search_contacts_case_insensitively() {
    let ctx = setup().await.expect("Failed to setup test context");
    add_contact(ctx.db(), "Ada", "Lovelace", "ada@engines.org", "Analytical").await;
    add_contact(ctx.db(), "Grace", "Hopper", "grace@navy.mil", "US Navy").await;
    add_contact(ctx.db(), "Alan", "Turing", "alan@bletchley.uk", "ENGINES Ltd").await;

    let response = get(&ctx.app, "/api/contacts/search?q=engines").await;

    let payload = response.json();
    assert_eq!(payload["count"], 2);
    // newest first
    assert_eq!(payload["results"][0]["last_name"], "Turing");
    assert_eq!(payload["results"][1]["email"], "ada@engines.org");
    let mut fields: Vec<&String> = payload["results"][1].as_object().unwrap().keys().collect();
    fields.sort();
    assert_eq!(fields, vec!["company", "email", "first_name", "id", "last_name"]);
}

#[tokio::test]
async fn caps_search_results_at_twenty() {
    let ctx = setup().await.expect("Failed to setup test context");
    for n in 0..25 {
        add_contact(ctx.db(), "Test", &format!("User{n}"), &format!("user{n}@example.com"), "").await;
    }

    let everyone = get(&ctx.app, "/api/contacts/search").await;
    assert_eq!(everyone.json()["count"], 20);

    let matching = get(&ctx.app, "/api/contacts/search?q=USER1").await;
    // user1 and user10..user19
    assert_eq!(matching.json()["count"], 11);
}

#[tokio::test]
async fn echoes_query_when_nothing_matches() {
    let ctx = setup().await.expect("Failed to setup test context");
    add_contact(ctx.db(), "Ada", "Lovelace", "ada@engines.org", "").await;

    let response = get(&ctx.app, "/htmx/contacts/search?q=zebra").await;

    assert_eq!(response.status, 200);
    assert!(response.body.contains("No contacts found matching"));
    assert!(response.body.contains("zebra"));
}

#[tokio::test]
async fn treats_like_wildcards_in_query_literally() {
    let ctx = setup().await.expect("Failed to setup test context");
    add_contact(ctx.db(), "Ada", "Lovelace", "ada@engines.org", "Analytical").await;
    add_contact(ctx.db(), "Grace", "Hopper", "grace@navy.mil", "US Navy").await;

    let percent = get(&ctx.app, "/api/contacts/search?q=%25").await;
    assert_eq!(percent.json()["count"], 0);
    let underscore = get(&ctx.app, "/api/contacts/search?q=_").await;
    assert_eq!(underscore.json()["count"], 0);

    add_contact(ctx.db(), "Alan", "Turing", "alan@bletchley.uk", "100%_Pure").await;

    let percent = get(&ctx.app, "/api/contacts/search?q=%25").await.json();
    assert_eq!(percent["count"], 1);
    assert_eq!(percent["results"][0]["last_name"], "Turing");
    let underscore = get(&ctx.app, "/api/contacts/search?q=%25_p").await.json();
    assert_eq!(underscore["count"], 1);
}
