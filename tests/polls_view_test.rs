//! Home page, poll detail page and voting

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::database::{setup_memory_repository, setup_test_database};
use common::fixtures::{create_answer_poll, create_choice, create_poll};
use common::{extract_csrf_token, location, session_cookie};
use polls::repository::PollRepository;

macro_rules! get {
    ($app:expr, $uri:expr) => {
        test::call_service(&$app, test::TestRequest::get().uri($uri).to_request()).await
    };
}

macro_rules! body_string {
    ($resp:expr) => {
        String::from_utf8(test::read_body($resp).await.to_vec()).unwrap()
    };
}

/// Loads the poll page and posts `fields` plus the page's CSRF token to
/// the vote endpoint with the same session.
macro_rules! post_vote {
    ($app:expr, $poll_id:expr, $fields:expr) => {{
        let page = get!($app, &format!("/poll/{}/", $poll_id));
        let cookie = session_cookie(&page).expect("session cookie");
        let token = extract_csrf_token(&body_string!(page)).expect("csrf token");

        let mut form: Vec<(&str, String)> = $fields;
        form.push(("csrf_token", token));

        let req = test::TestRequest::post()
            .uri(&format!("/poll/{}/vote", $poll_id))
            .cookie(cookie)
            .set_form(&form)
            .to_request();
        test::call_service(&$app, req).await
    }};
}

#[actix_rt::test]
async fn test_root_url_shows_links_to_all_polls() {
    let db = setup_test_database().await.unwrap();
    let poll1 = create_poll(db.repo().as_ref(), "6 times 7").await.unwrap();
    let poll2 = create_poll(db.repo().as_ref(), "life, the universe and everything")
        .await
        .unwrap();

    let app = common::init_app!(db.repo());
    let resp = get!(app, "/");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_string!(resp);
    assert!(body.contains("<h1>Current polls</h1>"));
    assert!(body.contains(&poll1.question));
    assert!(body.contains(&poll2.question));
    assert!(body.contains(&format!(r#"href="/poll/{}/""#, poll1.id)));
    assert!(body.contains(&format!(r#"href="/poll/{}/""#, poll2.id)));

    // Insertion order
    let first = body.find(&poll1.question).unwrap();
    let second = body.find(&poll2.question).unwrap();
    assert!(first < second);
}

#[actix_rt::test]
async fn test_root_url_without_polls() {
    let db = setup_test_database().await.unwrap();
    let app = common::init_app!(db.repo());

    let resp = get!(app, "/");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_string!(resp);
    assert!(body.contains("Current polls"));
    assert!(!body.contains(r#"href="/poll/"#));
}

#[actix_rt::test]
async fn test_root_url_drops_deleted_polls() {
    let db = setup_test_database().await.unwrap();
    let repo = db.repo();
    let kept = create_poll(repo.as_ref(), "6 times 7").await.unwrap();
    let deleted = create_poll(repo.as_ref(), "time").await.unwrap();
    repo.delete_poll(deleted.id).await.unwrap();

    let app = common::init_app!(db.repo());
    let body = body_string!(get!(app, "/"));

    assert!(body.contains(&format!(r#"href="/poll/{}/""#, kept.id)));
    assert!(!body.contains(&format!(r#"href="/poll/{}/""#, deleted.id)));
}

#[actix_rt::test]
async fn test_page_shows_poll_title_and_no_votes_message() {
    let db = setup_test_database().await.unwrap();
    let repo = db.repo();

    // Two polls, to check the right one gets used
    let (poll1, _, _) = create_answer_poll(repo.as_ref(), (0, 0)).await.unwrap();
    let poll2 = create_poll(repo.as_ref(), "time").await.unwrap();
    let choice3 = create_choice(repo.as_ref(), &poll2, "PM", 0).await.unwrap();
    let choice4 = create_choice(repo.as_ref(), &poll2, "Gardener", 0)
        .await
        .unwrap();

    let app = common::init_app!(db.repo());
    let resp = get!(app, &format!("/poll/{}/", poll2.id));
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_string!(resp);
    assert!(body.contains("<h1>time</h1>"));
    assert!(!body.contains(&poll1.question));
    assert!(body.contains("No-one has voted on this poll yet"));
    assert!(!body.contains(" %: "));

    // The voting form: one radio input per choice, valued by choice id
    assert!(body.contains(&format!(r#"action="/poll/{}/vote""#, poll2.id)));
    assert!(body.contains(&format!(
        r#"type="radio" name="vote" value="{}""#,
        choice3.id
    )));
    assert!(body.contains(&format!(
        r#"type="radio" name="vote" value="{}""#,
        choice4.id
    )));
    assert!(body.contains("PM"));
    assert!(body.contains("Gardener"));
    assert!(extract_csrf_token(&body).is_some());
}

#[actix_rt::test]
async fn test_view_shows_percentage_of_votes_and_total_votes() {
    let db = setup_test_database().await.unwrap();
    let (poll, _, _) = create_answer_poll(db.repo().as_ref(), (1, 2)).await.unwrap();

    let app = common::init_app!(db.repo());
    let body = body_string!(get!(app, &format!("/poll/{}/", poll.id)));

    // Percentages are shown, sensibly rounded
    assert!(body.contains("33 %: 42"));
    assert!(body.contains("67 %: The Ultimate Answer"));
    assert!(body.contains("3 votes"));
    assert!(!body.contains("No-one has voted"));
}

#[actix_rt::test]
async fn test_view_only_pluralises_votes_when_needed() {
    let db = setup_test_database().await.unwrap();
    let repo = db.repo();
    let (poll, _, mut choice2) = create_answer_poll(repo.as_ref(), (1, 2)).await.unwrap();

    choice2.votes = 0;
    repo.save_choice(&choice2).await.unwrap();

    let app = common::init_app!(db.repo());
    let body = body_string!(get!(app, &format!("/poll/{}/", poll.id)));

    assert!(body.contains("1 vote"));
    assert!(!body.contains("1 votes"));
    assert!(body.contains("100 %: 42"));
    assert!(body.contains("0 %: The Ultimate Answer"));
}

#[actix_rt::test]
async fn test_unknown_poll_is_not_found() {
    let db = setup_test_database().await.unwrap();
    let app = common::init_app!(db.repo());

    let resp = get!(app, "/poll/999/");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_string!(resp).contains("Poll not found."));

    let resp = get!(app, "/poll/forty-two/");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_view_can_handle_votes_via_post() {
    let db = setup_test_database().await.unwrap();
    let repo = db.repo();
    let (poll, choice1, choice2) = create_answer_poll(repo.as_ref(), (3, 5)).await.unwrap();

    let app = common::init_app!(db.repo());
    let resp = post_vote!(app, poll.id, vec![("vote", choice2.id.to_string())]);

    // Always redirect after a POST, back to the same poll
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).as_deref(), Some(format!("/poll/{}/", poll.id).as_str()));

    assert_eq!(repo.get_choice(choice2.id).await.unwrap().unwrap().votes, 6);
    assert_eq!(repo.get_choice(choice1.id).await.unwrap().unwrap().votes, 3);
}

#[actix_rt::test]
async fn test_each_vote_post_counts() {
    let db = setup_test_database().await.unwrap();
    let repo = db.repo();
    let (poll, choice1, _) = create_answer_poll(repo.as_ref(), (0, 0)).await.unwrap();

    let app = common::init_app!(db.repo());
    for _ in 0..3 {
        let resp = post_vote!(app, poll.id, vec![("vote", choice1.id.to_string())]);
        assert_eq!(resp.status(), StatusCode::FOUND);
    }

    assert_eq!(repo.get_choice(choice1.id).await.unwrap().unwrap().votes, 3);

    let body = body_string!(get!(app, &format!("/poll/{}/", poll.id)));
    assert!(body.contains("100 %: 42"));
    assert!(body.contains("3 votes"));
}

#[actix_rt::test]
async fn test_vote_for_choice_of_another_poll_is_rejected() {
    let db = setup_test_database().await.unwrap();
    let repo = db.repo();
    let (poll1, _, _) = create_answer_poll(repo.as_ref(), (0, 0)).await.unwrap();
    let poll2 = create_poll(repo.as_ref(), "time").await.unwrap();
    let foreign = create_choice(repo.as_ref(), &poll2, "PM", 0).await.unwrap();

    let app = common::init_app!(db.repo());
    let resp = post_vote!(app, poll1.id, vec![("vote", foreign.id.to_string())]);

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(repo.get_choice(foreign.id).await.unwrap().unwrap().votes, 0);
}

#[actix_rt::test]
async fn test_vote_for_unknown_choice_is_not_found() {
    let db = setup_test_database().await.unwrap();
    let (poll, _, second) = create_answer_poll(db.repo().as_ref(), (0, 0)).await.unwrap();

    let app = common::init_app!(db.repo());
    let resp = post_vote!(app, poll.id, vec![("vote", (second.id + 100).to_string())]);

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_vote_without_choice_is_bad_request() {
    let db = setup_test_database().await.unwrap();
    let (poll, _, _) = create_answer_poll(db.repo().as_ref(), (0, 0)).await.unwrap();

    let app = common::init_app!(db.repo());
    let resp = post_vote!(app, poll.id, vec![]);

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_vote_without_csrf_token_is_forbidden() {
    let db = setup_test_database().await.unwrap();
    let repo = db.repo();
    let (poll, choice1, _) = create_answer_poll(repo.as_ref(), (0, 0)).await.unwrap();

    let app = common::init_app!(db.repo());
    let req = test::TestRequest::post()
        .uri(&format!("/poll/{}/vote", poll.id))
        .set_form(vec![("vote", choice1.id.to_string())])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(repo.get_choice(choice1.id).await.unwrap().unwrap().votes, 0);
}

#[actix_rt::test]
async fn test_voting_flow_on_memory_repository() {
    let repo = setup_memory_repository();
    let (poll, choice1, choice2) = create_answer_poll(repo.as_ref(), (1, 1)).await.unwrap();

    let app = common::init_app!(repo.clone());
    let resp = post_vote!(app, poll.id, vec![("vote", choice2.id.to_string())]);
    assert_eq!(resp.status(), StatusCode::FOUND);

    assert_eq!(repo.get_choice(choice1.id).await.unwrap().unwrap().votes, 1);
    assert_eq!(repo.get_choice(choice2.id).await.unwrap().unwrap().votes, 2);

    let body = body_string!(get!(app, &format!("/poll/{}/", poll.id)));
    assert!(body.contains("33 %: 42"));
    assert!(body.contains("67 %: The Ultimate Answer"));
    assert!(body.contains("3 votes"));
}

#[actix_rt::test]
async fn test_vote_with_token_from_another_session_is_forbidden() {
    let db = setup_test_database().await.unwrap();
    let repo = db.repo();
    let (poll, choice1, _) = create_answer_poll(repo.as_ref(), (0, 0)).await.unwrap();

    let app = common::init_app!(db.repo());
    let uri = format!("/poll/{}/", poll.id);

    let other_page = get!(app, &uri);
    let other_token = extract_csrf_token(&body_string!(other_page)).unwrap();

    let page = get!(app, &uri);
    let cookie = session_cookie(&page).unwrap();
    let own_token = extract_csrf_token(&body_string!(page)).unwrap();
    assert_ne!(own_token, other_token);

    let req = test::TestRequest::post()
        .uri(&format!("/poll/{}/vote", poll.id))
        .cookie(cookie)
        .set_form(vec![
            ("vote", choice1.id.to_string()),
            ("csrf_token", other_token),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(repo.get_choice(choice1.id).await.unwrap().unwrap().votes, 0);
}
