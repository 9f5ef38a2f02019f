use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_store, MailingList, Store, API_KEY};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes: bytes::Bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn call(query: &str) -> Request<String> {
    Request::builder()
        .uri(format!("/1.3/?{query}"))
        .body(String::new())
        .unwrap()
}

fn authed(method: &str, extra: &str) -> Request<String> {
    call(&format!("apikey={API_KEY}&method={method}&output=json{extra}"))
}

fn store_with_list(id: &str) -> Store {
    let mut list = MailingList::new("Test list");
    list.id = id.to_string();
    Store {
        api_keys: vec![API_KEY.to_string()],
        lists: vec![list],
    }
}

// --- ping ---

#[tokio::test]
async fn ping_answers_chimpy() {
    let resp = app().oneshot(authed("ping", "")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(body_json(resp).await, "Everything's Chimpy!");
}

#[tokio::test]
async fn ping_over_form_post() {
    let req = Request::builder()
        .method("POST")
        .uri("/1.3/")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(format!("apikey={API_KEY}&method=ping&output=json"))
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, "Everything's Chimpy!");
}

// --- errors ---

#[tokio::test]
async fn invalid_key_is_error_104_with_status_200() {
    let resp = app()
        .oneshot(call("apikey=wrong-us1&method=ping&output=json"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["code"], 104);
    assert_eq!(body["error"], "Invalid MailChimp API Key: wrong-us1");
}

#[tokio::test]
async fn unknown_method_is_error() {
    let resp = app().oneshot(authed("nope", "")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["code"], -32601);
    assert_eq!(body["error"], "Invalid method: nope");
}

#[tokio::test]
async fn non_json_output_is_rejected() {
    let resp = app()
        .oneshot(call(&format!("apikey={API_KEY}&method=ping&output=php")))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["code"], -100);
}

#[tokio::test]
async fn key_is_checked_before_output_format() {
    let resp = app()
        .oneshot(call("apikey=wrong-us1&method=ping&output=xml"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["code"], 104);
}

#[tokio::test]
async fn unknown_list_is_error_200() {
    let resp = app()
        .oneshot(authed("listMembers", "&id=missing"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["code"], 200);
}

// --- lists ---

#[tokio::test]
async fn lists_reports_seeded_list() {
    let resp = app().oneshot(authed("lists", "")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["name"], "Newsletter");
    assert_eq!(body["data"][0]["stats"]["member_count"], 0);
}

// --- subscribe / unsubscribe ---

#[tokio::test]
async fn subscribe_then_list_members() {
    let app = app_with_store(store_with_list("abc"));

    let resp = app
        .clone()
        .oneshot(authed(
            "listSubscribe",
            "&id=abc&email_address=ada%40example.com&merge_vars%5BFNAME%5D=Ada",
        ))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await, true);

    let resp = app
        .oneshot(authed("listMembers", "&id=abc"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["email"], "ada@example.com");
    assert_eq!(body["data"][0]["merges"]["FNAME"], "Ada");
}

#[tokio::test]
async fn double_subscribe_is_error_214() {
    let app = app_with_store(store_with_list("abc"));
    let req = || authed("listSubscribe", "&id=abc&email_address=ada%40example.com");

    let resp = app.clone().oneshot(req()).await.unwrap();
    assert_eq!(body_json(resp).await, true);

    let resp = app.oneshot(req()).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["code"], 214);
}

#[tokio::test]
async fn invalid_email_is_error_502() {
    let resp = app_with_store(store_with_list("abc"))
        .oneshot(authed("listSubscribe", "&id=abc&email_address=nobody"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["code"], 502);
}

#[tokio::test]
async fn unsubscribe_unknown_member_is_error_215() {
    let resp = app_with_store(store_with_list("abc"))
        .oneshot(authed("listUnsubscribe", "&id=abc&email_address=ada%40example.com"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["code"], 215);
}

#[tokio::test]
async fn missing_parameter_is_validation_error() {
    let resp = app_with_store(store_with_list("abc"))
        .oneshot(authed("listSubscribe", "&id=abc"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["code"], -100);
    assert_eq!(body["error"], "Missing required parameter: email_address");
}
