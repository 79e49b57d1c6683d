mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::database::setup_test_database;
use common::fixtures::{create_choice, create_poll, create_question};
use common::{body_string, csrf_token_from, session_cookie};
use polls::orm::{choice, question};
use polls::web::admin::AdminSite;
use sea_orm::{entity::*, query::*};

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[actix_rt::test]
async fn test_site_index_lists_registered_models() {
    let db = setup_test_database().await.unwrap();
    let app = polls_app!(db.clone());

    let req = test::TestRequest::get().uri("/admin/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_string(resp).await;
    assert!(body.contains("href=\"/admin/questions/\""));
    assert!(body.contains("href=\"/admin/questions/add/\""));
}

#[actix_rt::test]
async fn test_unregistered_model_not_found() {
    let db = setup_test_database().await.unwrap();
    let app = polls_app!(db.clone(), AdminSite::new());

    let req = test::TestRequest::get().uri("/admin/questions/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_changelist_search() {
    let db = setup_test_database().await.unwrap();
    create_poll(&db, "What is the sky made of?", -2).await.unwrap();
    create_poll(&db, "What is for dinner?", -3).await.unwrap();
    let app = polls_app!(db.clone());

    let req = test::TestRequest::get()
        .uri("/admin/questions/?q=sky")
        .to_request();
    let body = body_string(test::call_service(&app, req).await).await;
    assert!(body.contains("What is the sky made of?"));
    assert!(!body.contains("What is for dinner?"));
    assert!(body.contains("1 result (2 total)"));

    // Every term must match.
    let req = test::TestRequest::get()
        .uri("/admin/questions/?q=What+dinner")
        .to_request();
    let body = body_string(test::call_service(&app, req).await).await;
    assert!(!body.contains("What is the sky made of?"));
    assert!(body.contains("What is for dinner?"));

    let req = test::TestRequest::get()
        .uri("/admin/questions/?q=sky+dinner")
        .to_request();
    let body = body_string(test::call_service(&app, req).await).await;
    assert!(body.contains("0 results (2 total)"));
}

#[actix_rt::test]
async fn test_changelist_search_matches_wildcards_literally() {
    let db = setup_test_database().await.unwrap();
    create_poll(&db, "Plain question", -2).await.unwrap();
    create_poll(&db, "Is 100% enough?", -3).await.unwrap();
    let app = polls_app!(db.clone());

    for (query, expected) in [("%25", 1), ("_", 0), ("100%25", 1), ("!", 0)] {
        let req = test::TestRequest::get()
            .uri(&format!("/admin/questions/?q={}", query))
            .to_request();
        let body = body_string(test::call_service(&app, req).await).await;
        assert!(!body.contains("Plain question"), "q={}", query);
        assert_eq!(
            body.contains("Is 100% enough?"),
            expected == 1,
            "q={}",
            query
        );
    }
}

#[actix_rt::test]
async fn test_changelist_date_filter() {
    let db = setup_test_database().await.unwrap();
    create_poll(&db, "Recent question.", -2).await.unwrap();
    create_poll(&db, "Old question.", -30).await.unwrap();
    let app = polls_app!(db.clone());

    let req = test::TestRequest::get()
        .uri("/admin/questions/?created=past_7_days")
        .to_request();
    let body = body_string(test::call_service(&app, req).await).await;
    assert!(body.contains("Recent question."));
    assert!(!body.contains("Old question."));

    let req = test::TestRequest::get().uri("/admin/questions/").to_request();
    let body = body_string(test::call_service(&app, req).await).await;
    assert!(body.contains("Recent question."));
    assert!(body.contains("Old question."));
}

#[actix_rt::test]
async fn test_changelist_ordering_and_recency_column() {
    let db = setup_test_database().await.unwrap();
    create_question(&db, "Beta", -10).await.unwrap();
    create_question(&db, "Alpha", -20).await.unwrap();
    create_question(&db, "Gamma", 0).await.unwrap();
    let app = polls_app!(db.clone());

    // Newest first by default.
    let req = test::TestRequest::get().uri("/admin/questions/").to_request();
    let body = body_string(test::call_service(&app, req).await).await;
    let (gamma, beta, alpha) = (
        body.find("Gamma").unwrap(),
        body.find("Beta").unwrap(),
        body.find("Alpha").unwrap(),
    );
    assert!(gamma < beta && beta < alpha);
    assert_eq!(body.matches("class=\"boolean-yes\"").count(), 1);
    assert_eq!(body.matches("class=\"boolean-no\"").count(), 2);

    let req = test::TestRequest::get()
        .uri("/admin/questions/?o=question_text")
        .to_request();
    let body = body_string(test::call_service(&app, req).await).await;
    let (gamma, beta, alpha) = (
        body.find("Gamma").unwrap(),
        body.find("Beta").unwrap(),
        body.find("Alpha").unwrap(),
    );
    assert!(alpha < beta && beta < gamma);

    // Unknown orderings fall back to the default.
    let req = test::TestRequest::get()
        .uri("/admin/questions/?o=votes")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

/// Open a form page and return its session cookie and CSRF token.
macro_rules! open_form {
    ($app:expr, $uri:expr) => {{
        let req = test::TestRequest::get().uri($uri).to_request();
        let resp = test::call_service($app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", $uri);
        let cookie = session_cookie(&resp);
        let token = csrf_token_from(&body_string(resp).await);
        (cookie, token)
    }};
}

#[actix_rt::test]
async fn test_add_question_with_inline_choices() {
    let db = setup_test_database().await.unwrap();
    let app = polls_app!(db.clone());
    let (cookie, token) = open_form!(&app, "/admin/questions/add/");

    let req = test::TestRequest::post()
        .uri("/admin/questions/add/")
        .cookie(cookie)
        .set_form(pairs(&[
            ("csrf_token", token.as_str()),
            ("question_text", "What's new?"),
            ("choice_set-0-id", ""),
            ("choice_set-0-choice_text", "Not much"),
            ("choice_set-0-votes", "0"),
            ("choice_set-1-id", ""),
            ("choice_set-1-choice_text", "The sky"),
            ("choice_set-1-votes", "2"),
            ("choice_set-2-id", ""),
            ("choice_set-2-choice_text", ""),
            ("choice_set-2-votes", "0"),
        ]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get("location").unwrap().to_str().unwrap(),
        "/admin/questions/"
    );

    let stored = question::Entity::find().all(&db).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].question_text, "What's new?");
    assert!(stored[0].was_created_recently());

    let choices = choice::Entity::find()
        .filter(choice::Column::QuestionId.eq(stored[0].id))
        .order_by_asc(choice::Column::Id)
        .all(&db)
        .await
        .unwrap();
    let rows: Vec<_> = choices
        .iter()
        .map(|c| (c.choice_text.as_str(), c.votes))
        .collect();
    assert_eq!(rows, vec![("Not much", 0), ("The sky", 2)]);
}

#[actix_rt::test]
async fn test_add_question_validation_errors() {
    let db = setup_test_database().await.unwrap();
    let app = polls_app!(db.clone());
    let (cookie, token) = open_form!(&app, "/admin/questions/add/");
    let too_long = "x".repeat(201);

    let req = test::TestRequest::post()
        .uri("/admin/questions/add/")
        .cookie(cookie)
        .set_form(pairs(&[
            ("csrf_token", token.as_str()),
            ("question_text", too_long.as_str()),
            ("choice_set-0-choice_text", "Yes"),
            ("choice_set-0-votes", "-1"),
            ("choice_set-1-choice_text", ""),
            ("choice_set-1-votes", "many"),
        ]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_string(resp).await;
    assert!(body.contains("Please correct the errors below."));
    assert!(body.contains("Ensure this value has at most 200 characters (it has 201)."));
    assert!(body.contains("Ensure this value is greater than or equal to 0."));
    assert!(body.contains("Enter a whole number."));
    assert!(body.contains("This field is required."));

    assert_eq!(question::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(choice::Entity::find().count(&db).await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_add_question_requires_csrf_token() {
    let db = setup_test_database().await.unwrap();
    let app = polls_app!(db.clone());
    let (cookie, _) = open_form!(&app, "/admin/questions/add/");

    let req = test::TestRequest::post()
        .uri("/admin/questions/add/")
        .cookie(cookie)
        .set_form(pairs(&[
            ("csrf_token", "forged"),
            ("question_text", "Sneaky?"),
        ]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(question::Entity::find().count(&db).await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_change_form_shows_readonly_created() {
    let db = setup_test_database().await.unwrap();
    let question = create_poll(&db, "What's up?", -3).await.unwrap();
    let app = polls_app!(db.clone());

    let req = test::TestRequest::get()
        .uri(&format!("/admin/questions/{}/change/", question.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_string(resp).await;
    assert!(body.contains("Date information"));
    assert!(body.contains("class=\"readonly\""));
    assert!(!body.contains("name=\"created\""));
    assert!(body.contains("name=\"choice_set-0-choice_text\" value=\"Not much\""));
    assert!(body.contains("name=\"choice_set-1-choice_text\" value=\"\""));
}

#[actix_rt::test]
async fn test_change_question_and_choices() {
    let db = setup_test_database().await.unwrap();
    let question = create_question(&db, "What's up?", -3).await.unwrap();
    let existing = create_choice(&db, question.id, "Not much", 1).await.unwrap();
    let app = polls_app!(db.clone());
    let uri = format!("/admin/questions/{}/change/", question.id);
    let (cookie, token) = open_form!(&app, &uri);
    let existing_id = existing.id.to_string();

    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(cookie)
        .set_form(pairs(&[
            ("csrf_token", token.as_str()),
            ("question_text", "What's going on?"),
            ("choice_set-0-id", existing_id.as_str()),
            ("choice_set-0-choice_text", "Nothing much"),
            ("choice_set-0-votes", "7"),
            ("choice_set-1-id", ""),
            ("choice_set-1-choice_text", "Everything"),
            ("choice_set-1-votes", "0"),
        ]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let stored = question::Entity::find_by_id(question.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.question_text, "What's going on?");
    assert_eq!(stored.created, question.created);

    let choices = choice::Entity::find()
        .filter(choice::Column::QuestionId.eq(question.id))
        .order_by_asc(choice::Column::Id)
        .all(&db)
        .await
        .unwrap();
    assert_eq!(choices.len(), 2);
    assert_eq!(choices[0].id, existing.id);
    assert_eq!(choices[0].choice_text, "Nothing much");
    assert_eq!(choices[0].votes, 7);
    assert_eq!(choices[1].choice_text, "Everything");
}

#[actix_rt::test]
async fn test_change_rejects_choice_of_another_question() {
    let db = setup_test_database().await.unwrap();
    let question = create_poll(&db, "What's up?", -3).await.unwrap();
    let other = create_question(&db, "Other?", -3).await.unwrap();
    let foreign = create_choice(&db, other.id, "Theirs", 0).await.unwrap();
    let app = polls_app!(db.clone());
    let uri = format!("/admin/questions/{}/change/", question.id);
    let (cookie, token) = open_form!(&app, &uri);
    let foreign_id = foreign.id.to_string();

    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(cookie)
        .set_form(pairs(&[
            ("csrf_token", token.as_str()),
            ("question_text", "What's up?"),
            ("choice_set-0-id", foreign_id.as_str()),
            ("choice_set-0-choice_text", "Mine now"),
            ("choice_set-0-votes", "0"),
        ]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let foreign = choice::Entity::find_by_id(foreign.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(foreign.question_id, other.id);
    assert_eq!(foreign.choice_text, "Theirs");
}

#[actix_rt::test]
async fn test_change_missing_question_not_found() {
    let db = setup_test_database().await.unwrap();
    let app = polls_app!(db.clone());

    let req = test::TestRequest::get()
        .uri("/admin/questions/42/change/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_delete_question_cascades_to_choices() {
    let db = setup_test_database().await.unwrap();
    let doomed = create_question(&db, "Delete me?", -3).await.unwrap();
    create_choice(&db, doomed.id, "Yes", 0).await.unwrap();
    create_choice(&db, doomed.id, "No", 0).await.unwrap();
    let survivor = create_poll(&db, "Keep me?", -3).await.unwrap();
    let app = polls_app!(db.clone());
    let uri = format!("/admin/questions/{}/delete/", doomed.id);

    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = session_cookie(&resp);
    let body = body_string(resp).await;
    assert!(body.contains("Are you sure?"));
    assert!(body.contains("Choice: Yes"));
    assert!(body.contains(&format!("action=\"/admin/questions/{}/delete/\"", doomed.id)));
    assert!(body.contains(&format!("href=\"/admin/questions/{}/change/\"", doomed.id)));
    let token = csrf_token_from(&body);

    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(cookie.clone())
        .set_form(pairs(&[("csrf_token", token.as_str())]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    assert!(question::Entity::find_by_id(doomed.id)
        .one(&db)
        .await
        .unwrap()
        .is_none());
    let remaining = choice::Entity::find().all(&db).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].question_id, survivor.id);

    // A second delete finds nothing.
    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(cookie)
        .set_form(pairs(&[("csrf_token", token.as_str())]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
