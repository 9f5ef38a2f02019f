//! In-memory stand-in for the MailChimp 1.3 API.
//!
//! Serves `GET /1.3/` (and form `POST /1.3/`) with the legacy contract:
//! `apikey`, `method` and `output` in the parameters, HTTP 200 for every
//! answer, and failures reported as `{"error": .., "code": ..}` bodies.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Key accepted by the default app.
pub const API_KEY: &str = "0123456789abcdef0123456789abcdef-us1";

/// Name of the list seeded into the default app.
pub const DEFAULT_LIST: &str = "Newsletter";

pub const INVALID_API_KEY: i64 = 104;
pub const LIST_DOES_NOT_EXIST: i64 = 200;
pub const LIST_ALREADY_SUBSCRIBED: i64 = 214;
pub const LIST_NOT_SUBSCRIBED: i64 = 215;
pub const INVALID_EMAIL: i64 = 502;
pub const VALIDATION_ERROR: i64 = -100;
pub const METHOD_UNKNOWN: i64 = -32601;

#[derive(Clone, Debug, Serialize)]
pub struct Member {
    pub email: String,
    pub merges: HashMap<String, String>,
}

#[derive(Clone, Debug)]
pub struct MailingList {
    pub id: String,
    pub name: String,
    pub members: Vec<Member>,
}

impl MailingList {
    pub fn new(name: &str) -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(10);
        Self {
            id,
            name: name.to_string(),
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Store {
    pub api_keys: Vec<String>,
    pub lists: Vec<MailingList>,
}

pub type Db = Arc<RwLock<Store>>;

/// A failure reported in the response body.
#[derive(Debug)]
struct Fault {
    code: i64,
    message: String,
}

impl Fault {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn into_value(self) -> Value {
        json!({ "error": self.message, "code": self.code })
    }
}

type Params = HashMap<String, String>;

pub fn app() -> Router {
    let store = Store {
        api_keys: vec![API_KEY.to_string()],
        lists: vec![MailingList::new(DEFAULT_LIST)],
    };
    app_with_store(store)
}

pub fn app_with_store(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/1.3/", get(call_query).post(call_form))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn call_query(State(db): State<Db>, Query(params): Query<Params>) -> Response {
    respond(&db, &params).await
}

async fn call_form(State(db): State<Db>, Form(params): Form<Params>) -> Response {
    respond(&db, &params).await
}

async fn respond(db: &Db, params: &Params) -> Response {
    let body = match dispatch(db, params).await {
        Ok(value) => value,
        Err(fault) => {
            debug!(code = fault.code, message = %fault.message, "api call failed");
            fault.into_value()
        }
    };
    ([(header::CONTENT_TYPE, "application/json")], body.to_string()).into_response()
}

async fn dispatch(db: &Db, params: &Params) -> Result<Value, Fault> {
    let method = params.get("method").map(String::as_str).unwrap_or("");
    let apikey = params.get("apikey").map(String::as_str).unwrap_or("");
    info!(method, "api call");

    if !db.read().await.api_keys.iter().any(|k| k == apikey) {
        return Err(Fault::new(
            INVALID_API_KEY,
            format!("Invalid MailChimp API Key: {apikey}"),
        ));
    }
    if params.get("output").map(String::as_str) != Some("json") {
        return Err(Fault::new(VALIDATION_ERROR, "Only json output is supported"));
    }

    match method {
        "ping" => Ok(json!("Everything's Chimpy!")),
        "lists" => lists(db).await,
        "listMembers" => list_members(db, params).await,
        "listSubscribe" => list_subscribe(db, params).await,
        "listUnsubscribe" => list_unsubscribe(db, params).await,
        other => Err(Fault::new(METHOD_UNKNOWN, format!("Invalid method: {other}"))),
    }
}

fn require<'a>(params: &'a Params, key: &str) -> Result<&'a str, Fault> {
    params
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| Fault::new(VALIDATION_ERROR, format!("Missing required parameter: {key}")))
}

fn no_such_list(id: &str) -> Fault {
    Fault::new(LIST_DOES_NOT_EXIST, format!("Invalid MailChimp List ID: {id}"))
}

async fn lists(db: &Db) -> Result<Value, Fault> {
    let store = db.read().await;
    let data: Vec<Value> = store
        .lists
        .iter()
        .map(|l| json!({ "id": l.id, "name": l.name, "stats": { "member_count": l.members.len() } }))
        .collect();
    Ok(json!({ "total": data.len(), "data": data }))
}

async fn list_members(db: &Db, params: &Params) -> Result<Value, Fault> {
    let id = require(params, "id")?;
    let store = db.read().await;
    let list = store.lists.iter().find(|l| l.id == id).ok_or_else(|| no_such_list(id))?;
    Ok(json!({ "total": list.members.len(), "data": list.members }))
}

async fn list_subscribe(db: &Db, params: &Params) -> Result<Value, Fault> {
    let id = require(params, "id")?;
    let email = require(params, "email_address")?;
    if !email.contains('@') {
        return Err(Fault::new(INVALID_EMAIL, format!("Invalid Email Address: {email}")));
    }

    // merge_vars[FNAME]=.. arrives as a flat key
    let merges: HashMap<String, String> = params
        .iter()
        .filter_map(|(k, v)| {
            k.strip_prefix("merge_vars[")
                .and_then(|rest| rest.strip_suffix(']'))
                .map(|field| (field.to_string(), v.clone()))
        })
        .collect();

    let mut store = db.write().await;
    let list = store.lists.iter_mut().find(|l| l.id == id).ok_or_else(|| no_such_list(id))?;
    if list.members.iter().any(|m| m.email == email) {
        return Err(Fault::new(
            LIST_ALREADY_SUBSCRIBED,
            format!("{email} is already subscribed to list {}", list.name),
        ));
    }
    list.members.push(Member {
        email: email.to_string(),
        merges,
    });
    Ok(json!(true))
}

async fn list_unsubscribe(db: &Db, params: &Params) -> Result<Value, Fault> {
    let id = require(params, "id")?;
    let email = require(params, "email_address")?;

    let mut store = db.write().await;
    let list = store.lists.iter_mut().find(|l| l.id == id).ok_or_else(|| no_such_list(id))?;
    let before = list.members.len();
    list.members.retain(|m| m.email != email);
    if list.members.len() == before {
        return Err(Fault::new(
            LIST_NOT_SUBSCRIBED,
            format!("{email} is not subscribed to list {}", list.name),
        ));
    }
    Ok(json!(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_ids_are_ten_hex_chars() {
        let list = MailingList::new("Test");
        assert_eq!(list.id.len(), 10);
        assert!(list.id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(list.name, "Test");
        assert!(list.members.is_empty());
    }

    #[test]
    fn fault_serializes_as_error_body() {
        let body = Fault::new(INVALID_API_KEY, "Invalid MailChimp API Key: x").into_value();
        assert_eq!(body["error"], "Invalid MailChimp API Key: x");
        assert_eq!(body["code"], 104);
    }

    #[test]
    fn member_serializes_merges() {
        let member = Member {
            email: "ada@example.com".to_string(),
            merges: HashMap::from([("FNAME".to_string(), "Ada".to_string())]),
        };
        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["merges"]["FNAME"], "Ada");
    }

    #[test]
    fn require_reports_missing_key() {
        let params = Params::new();
        let fault = require(&params, "id").unwrap_err();
        assert_eq!(fault.code, VALIDATION_ERROR);
        assert!(fault.message.contains("id"));
    }

    #[tokio::test]
    async fn dispatch_rejects_non_json_output() {
        let db: Db = Arc::new(RwLock::new(Store {
            api_keys: vec![API_KEY.to_string()],
            lists: Vec::new(),
        }));
        let params = Params::from([
            ("apikey".to_string(), API_KEY.to_string()),
            ("method".to_string(), "ping".to_string()),
            ("output".to_string(), "xml".to_string()),
        ]);
        let fault = dispatch(&db, &params).await.unwrap_err();
        assert_eq!(fault.code, VALIDATION_ERROR);
    }
}
