//! Integration tests for the client against a mock service.
//!
//! The mock serves the three surfaces the client touches: the main page
//! with its inline session markers and category catalog, the `/api/` form
//! gateway, and the search proxy.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use otvet_client::{
    AuthSnapshot, LiveOptions, OtvetClient, OtvetError, PageRequest, QuestionFilter, RetryPolicy,
    SearchOptions,
};
use otvet_core::QuestionState;

/// Main page with the category catalog and, when a salt is given, the login
/// markers of user 216185885.
fn main_page(salt: Option<&str>) -> String {
    let mut page = String::from(concat!(
        "<!DOCTYPE html><html><head><script>\n",
        "var CATEGORIES = [",
        "{\"id\": \"14\", \"urlname\": \"auto\", \"name\": \"Авто, Мото\", ",
        "\"position\": \"1\", \"readonly\": 0}, ",
        "{\"id\": \"20\", \"urlname\": \"computers\", ",
        "\"name\": \"Компьютеры, Связь\", \"position\": \"2\", \"readonly\": 0}",
        "];\n",
        "</script>\n",
    ));
    if let Some(salt) = salt {
        page.push_str(&format!(
            "<script>var PROFILE = {{\"login\" : {{ \"id\" : \"216185885\", \
             \"salt\" : \"{salt}\", \"is_adult\" : true, }}}};</script>\n"
        ));
    }
    page.push_str("</html>\n");
    page
}

fn question_item(id: u64) -> serde_json::Value {
    json!({
        "id": id.to_string(),
        "qtext": format!("Вопрос {id}"),
        "state": "A",
        "cid": "14",
        "added": "120",
        "waslead": "0",
        "polltype": "",
        "anscnt": 1,
        "usrid": "184548231",
        "nick": "Вася",
        "vip": 0,
        "kpd": "38.2",
        "about": "",
        "filin": "ava",
        "is_expert": 0
    })
}

fn client_for(server: &MockServer) -> OtvetClient {
    OtvetClient::builder()
        .base_url(server.uri())
        .auth_url(format!("{}/cgi-bin/auth", server.uri()))
        .build()
        .unwrap()
}

async fn mount_main_page(server: &MockServer, cookie: Option<&str>, salt: Option<&str>) {
    let mut response = ResponseTemplate::new(200).set_body_string(main_page(salt));
    if let Some(cookie) = cookie {
        response = response.insert_header("Set-Cookie", format!("ot={cookie}; Path=/"));
    }
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("login", "1"))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_anonymous_bootstrap_loads_categories_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("login", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(main_page(None)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let categories = client.categories().await.unwrap();
    assert_eq!(categories.by_urlname("auto").unwrap().id, 14);

    // Cached; a second access does not refetch the page.
    client.categories().await.unwrap();
    assert_eq!(client.user_id().await, None);
    assert_eq!(client.is_adult().await.unwrap(), None);
}

#[tokio::test]
async fn test_authenticate_and_snapshot_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/auth"))
        .and(body_string_contains("Login=someone%40mail.ru"))
        .and(body_string_contains("Password=hunter2"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("Set-Cookie", "Mpop=sso-ticket; Path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_main_page(&server, Some("tok1"), Some("ab12cd34")).await;

    let client = client_for(&server);
    client.authenticate("someone", "hunter2").await.unwrap();
    assert_eq!(client.user_id().await, Some(216_185_885));
    assert_eq!(client.is_adult().await.unwrap(), Some(true));

    let snapshot = client.auth_snapshot().await;
    assert_eq!(snapshot.token.as_deref(), Some("tok1"));
    assert_eq!(snapshot.salt.as_deref(), Some("ab12cd34"));
    assert_eq!(snapshot.user_id, Some(216_185_885));
    assert_eq!(snapshot.cookie.as_deref(), Some("sso-ticket"));

    let json = serde_json::to_string(&snapshot).unwrap();
    let restored: AuthSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, snapshot);
}

#[tokio::test]
async fn test_failed_login_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/auth"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    mount_main_page(&server, None, None).await;

    let client = client_for(&server);
    let error = client.authenticate("someone", "wrong").await.unwrap_err();
    assert!(matches!(error, OtvetError::Auth { login } if login == "someone@mail.ru"));
    assert_eq!(client.user_id().await, None);
}

#[tokio::test]
async fn test_token_cookie_without_markers_is_a_parse_error() {
    let server = MockServer::start().await;
    // The cookie claims a login but the page carries no marker block.
    mount_main_page(&server, Some("tok1"), None).await;

    let client = client_for(&server);
    let error = client.categories().await.unwrap_err();
    assert!(matches!(error, OtvetError::Parse(_)));

    // The catalog itself was parsed before the markers failed, so it is
    // already cached; the session stays anonymous.
    client.categories().await.unwrap();
    assert_eq!(client.user_id().await, None);
}

#[tokio::test]
async fn test_questions_listing_walks_until_short_page() {
    let server = MockServer::start().await;
    mount_main_page(&server, None, None).await;
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(body_string_contains("__urlp=%2Fv2%2Fquestlist"))
        .and(body_string_contains("p=0&n=2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 200,
            "qst": [question_item(1002), question_item(1001)]
        })))
        .expect(1)
        .mount(&server)
        .await;
    // The second page repeats the id the listing was pinned to.
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(body_string_contains("p=2&lastid=1002&n=2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 200,
            "qst": [question_item(1000)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut pages = client.questions(QuestionFilter::default(), 2);

    let first = pages.try_next().await.unwrap().unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].question.id, 1002);
    assert_eq!(first[0].question.category.urlname, "auto");
    assert_eq!(first[0].author.name, "Вася");

    let second = pages.try_next().await.unwrap().unwrap();
    assert_eq!(second.len(), 1);

    // The short page ended the listing; no further request is made.
    assert_eq!(pages.try_next().await.unwrap(), None);
}

#[tokio::test]
async fn test_expired_token_renews_and_reissues_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/auth"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("Set-Cookie", "Mpop=sso-ticket; Path=/"),
        )
        .mount(&server)
        .await;

    // The login bootstrap serves a token that has already expired; the
    // renewal bootstrap serves a fresh pair.
    let stale = ResponseTemplate::new(200)
        .set_body_string(main_page(Some("oldsalt")))
        .insert_header("Set-Cookie", "ot=stale; Path=/");
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("login", "1"))
        .respond_with(stale)
        .up_to_n_times(1)
        .mount(&server)
        .await;
    let fresh = ResponseTemplate::new(200)
        .set_body_string(main_page(Some("newsalt")))
        .insert_header("Set-Cookie", "ot=fresh; Path=/");
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("login", "1"))
        .respond_with(fresh)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(body_string_contains("token=stale"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 400,
            "error": "invalid_token"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(body_string_contains("token=fresh"))
        .and(body_string_contains("salt=newsalt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 200,
            "total":   {"ASK": 5, "DIQ": 2, "AAQ": 120, "VBA": 5, "OPV": 30,
                        "QAM": 50, "IMQ": 5, "VIQ": 5, "GSR": 3},
            "current": {"ASK": 5, "DIQ": 2, "AAQ": 117, "VBA": 5, "OPV": 30,
                        "QAM": 49, "IMQ": 5, "VIQ": 5, "GSR": 3}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.authenticate("someone", "hunter2").await.unwrap();

    let limits = client.limits().await.unwrap();
    assert_eq!(limits.total.answers, 120);
    assert_eq!(limits.current.answers, 117);
    assert_eq!(limits.current.likes, 49);

    // The renewal replaced the whole session, not just the token.
    let snapshot = client.auth_snapshot().await;
    assert_eq!(snapshot.token.as_deref(), Some("fresh"));
    assert_eq!(snapshot.salt.as_deref(), Some("newsalt"));
}

#[tokio::test]
async fn test_rejected_call_maps_to_api_error() {
    let server = MockServer::start().await;
    mount_main_page(&server, None, None).await;
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(body_string_contains("__urlp=%2Fv2%2Fquestion"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 404,
            "error": "question_not_found"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client.question(55, 20).await.unwrap_err();
    match error {
        OtvetError::Api {
            status,
            code,
            response,
        } => {
            assert_eq!(status, 404);
            assert_eq!(code, "question_not_found");
            assert_eq!(response["error"], "question_not_found");
        }
        other => panic!("expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_search_goes_through_the_proxy() {
    let server = MockServer::start().await;
    mount_main_page(&server, None, None).await;
    Mock::given(method("GET"))
        .and(path("/go-proxy/answer_json"))
        .and(query_param("q", "борщ"))
        .and(query_param("num", "20"))
        .and(query_param("sf", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "id": "243000001",
                "question": "Как сварить борщ?",
                "qstcomment": "подробности",
                "count": "12",
                "catname": "Авто, Мото",
                "state": 3,
                "is_poll": 0,
                "time": 1577836800,
                "time_ago": 3600,
                "author": {"id": "5", "nick": "Повар", "filin": "ava"}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let results = client
        .search_page("борщ", &SearchOptions::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, 243_000_001);
    assert_eq!(results[0].category.id, 14);
    assert_eq!(results[0].state, Some(QuestionState::Open));
    assert_eq!(results[0].answer_count, 12);
    assert_eq!(results[0].author.name, "Повар");
}

#[tokio::test]
async fn test_timeout_retries_and_succeeds() {
    let server = MockServer::start().await;
    mount_main_page(&server, None, None).await;
    // The first attempt stalls past the client timeout.
    Mock::given(method("POST"))
        .and(path("/api/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(400))
                .set_body_json(json!({"status": 200, "qst": []})),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 200,
            "qst": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OtvetClient::builder()
        .base_url(server.uri())
        .timeout(Duration::from_millis(100))
        .retry(RetryPolicy {
            max_attempts: 2,
            backoff: Duration::from_millis(10),
        })
        .build()
        .unwrap();

    let page = client
        .questions_page(&QuestionFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn test_restored_snapshot_signs_calls_without_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(header("cookie", "Mpop=sso-ticket"))
        .and(body_string_contains("qid=9"))
        .and(body_string_contains("token=tok"))
        .and(body_string_contains("salt=slt"))
        .and(body_string_contains("__urlp=%2Fv2%2Fmark"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 200})))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = AuthSnapshot {
        token: Some("tok".to_owned()),
        salt: Some("slt".to_owned()),
        user_id: Some(216_185_885),
        cookie: Some("sso-ticket".to_owned()),
    };
    let client = OtvetClient::builder()
        .base_url(server.uri())
        .snapshot(snapshot)
        .build()
        .unwrap();

    // No main page request happens; the restored pair signs directly.
    client.like_question(9, false).await.unwrap();
    assert_eq!(client.user_id().await, Some(216_185_885));
}

#[tokio::test]
async fn test_live_feed_yields_only_new_questions() {
    let server = MockServer::start().await;
    mount_main_page(&server, None, None).await;
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(body_string_contains("__urlp=%2Fv2%2Fquestlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 200,
            "qst": [question_item(1005), question_item(1004)]
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/"))
        .and(body_string_contains("__urlp=%2Fv2%2Fquestlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 200,
            "qst": [
                question_item(1007),
                question_item(1006),
                question_item(1005),
                question_item(1004)
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let options = LiveOptions {
        step: 4,
        delay: Duration::from_millis(30),
        include_first_batch: false,
    };
    let mut feed = client.new_questions(QuestionFilter::default(), &options);

    let batch = feed.next_batch().await.unwrap();
    let ids: Vec<u64> = batch.iter().map(|item| item.question.id).collect();
    assert_eq!(ids, vec![1007, 1006]);
}
