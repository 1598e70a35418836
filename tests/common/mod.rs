//! Stateful in-memory stand-in for the REST gateway, served by actix-web on
//! an ephemeral port.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};

use hr_portal::api::gateway::GatewayClient;
use hr_portal::auth::store::SessionStore;
use hr_portal::models::IdTokenClaims;
use hr_portal::sync::{self, EventReceiver};
use hr_portal::{Backend, Portal, PortalOptions};

pub const CODE: &str = "123456";

struct Account {
    password: String,
    user_id: String,
    confirmed: bool,
}

pub struct StubState {
    accounts: Mutex<HashMap<String, Account>>,
    profiles: Mutex<HashMap<String, Value>>,
    rows: Mutex<HashMap<(String, String), Vec<Value>>>,
    broken: Mutex<HashSet<String>>,
    write_failure: Mutex<Option<(u16, Option<String>)>>,
    calls: Mutex<Vec<String>>,
    include_user_id: AtomicBool,
    next_id: AtomicU64,
}

impl Default for StubState {
    fn default() -> Self {
        Self {
            accounts: Mutex::default(),
            profiles: Mutex::default(),
            rows: Mutex::default(),
            broken: Mutex::default(),
            write_failure: Mutex::default(),
            calls: Mutex::default(),
            include_user_id: AtomicBool::new(true),
            next_id: AtomicU64::new(1),
        }
    }
}

impl StubState {
    fn record(&self, req: &HttpRequest) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", req.method(), req.path()));
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

fn message(status: u16, text: &str) -> HttpResponse {
    HttpResponse::build(actix_web::http::StatusCode::from_u16(status).unwrap())
        .json(json!({ "message": text }))
}

fn field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

pub fn mint_id_token(sub: &str, email: &str) -> String {
    let claims = IdTokenClaims {
        sub: sub.to_string(),
        email: Some(email.to_string()),
        exp: Some(4_102_444_800),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"stub-identity-provider"),
    )
    .unwrap()
}

async fn login(
    req: HttpRequest,
    state: web::Data<StubState>,
    body: web::Json<Value>,
) -> HttpResponse {
    state.record(&req);
    let email = field(&body, "email").to_lowercase();
    let password = field(&body, "password");

    let accounts = state.accounts.lock().unwrap();
    match accounts.get(&email) {
        Some(account) if account.password == password && account.confirmed => {
            let mut response = json!({
                "message": "Login successful",
                "idToken": mint_id_token(&account.user_id, &email),
                "accessToken": "access-token",
            });
            if state.include_user_id.load(Ordering::SeqCst) {
                response["userId"] = json!(account.user_id);
            }
            HttpResponse::Ok().json(response)
        }
        Some(account) if account.password == password => message(403, "User is not confirmed."),
        _ => message(401, "Incorrect username or password."),
    }
}

async fn signup(
    req: HttpRequest,
    state: web::Data<StubState>,
    body: web::Json<Value>,
) -> HttpResponse {
    state.record(&req);
    let email = field(&body, "email").to_lowercase();
    let mut accounts = state.accounts.lock().unwrap();
    if accounts.contains_key(&email) {
        return message(400, "User already exists");
    }
    let user_id = state.next_id("user");
    accounts.insert(
        email,
        Account {
            password: field(&body, "password").to_string(),
            user_id,
            confirmed: false,
        },
    );
    message(
        200,
        "User registered successfully. Please check your email for verification code.",
    )
}

async fn confirm_signup(
    req: HttpRequest,
    state: web::Data<StubState>,
    body: web::Json<Value>,
) -> HttpResponse {
    state.record(&req);
    let email = field(&body, "email").to_lowercase();
    let mut accounts = state.accounts.lock().unwrap();
    match accounts.get_mut(&email) {
        Some(account) if field(&body, "code") == CODE => {
            account.confirmed = true;
            message(200, "Account confirmed successfully")
        }
        Some(_) => message(400, "Invalid verification code provided, please try again."),
        None => message(404, "User not found"),
    }
}

async fn resend_code(req: HttpRequest, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req);
    message(200, "Verification code resent")
}

#[derive(serde::Deserialize)]
struct UserQuery {
    #[serde(rename = "userId")]
    user_id: String,
}

async fn read_collection(
    req: HttpRequest,
    state: web::Data<StubState>,
    query: web::Query<UserQuery>,
) -> HttpResponse {
    state.record(&req);
    let collection = req.match_info().get("collection").unwrap_or_default().to_string();

    if state.broken.lock().unwrap().contains(&collection) {
        return message(500, "Internal server error");
    }

    match collection.as_str() {
        "profile" => match state.profiles.lock().unwrap().get(&query.user_id) {
            Some(profile) => HttpResponse::Ok().json(json!({ "profile": profile })),
            None => HttpResponse::Ok().json(json!({})),
        },
        "leaves" | "feedback" | "documents" => {
            let rows = state
                .rows
                .lock()
                .unwrap()
                .get(&(query.user_id.clone(), collection.clone()))
                .cloned()
                .unwrap_or_default();
            HttpResponse::Ok().json(json!({ collection: rows }))
        }
        _ => message(404, "Not found"),
    }
}

fn write_rejected(state: &StubState) -> Option<HttpResponse> {
    let failure = state.write_failure.lock().unwrap().clone()?;
    Some(match failure {
        (status, Some(text)) => message(status, &text),
        (status, None) => {
            HttpResponse::build(actix_web::http::StatusCode::from_u16(status).unwrap()).finish()
        }
    })
}

async fn save_profile(
    req: HttpRequest,
    state: web::Data<StubState>,
    body: web::Json<Value>,
) -> HttpResponse {
    state.record(&req);
    if let Some(rejected) = write_rejected(&state) {
        return rejected;
    }
    let user_id = field(&body, "userId").to_string();
    state.profiles.lock().unwrap().insert(user_id, body.into_inner());
    message(200, "Profile saved successfully!")
}

async fn append_row(
    req: HttpRequest,
    state: web::Data<StubState>,
    body: web::Json<Value>,
) -> HttpResponse {
    state.record(&req);
    if let Some(rejected) = write_rejected(&state) {
        return rejected;
    }

    let (collection, id_key) = match req.path() {
        "/leaves" => ("leaves", "leaveId"),
        "/feedback" => ("feedback", "feedbackId"),
        _ => ("documents", "documentId"),
    };
    let id = state.next_id(collection);
    let mut row = body.into_inner();
    row[id_key] = json!(id);
    if collection == "documents" {
        let key = format!("{}/{}-{}", field(&row, "userId"), id, field(&row, "fileName"));
        row["s3Key"] = json!(key);
    }

    let user_id = field(&row, "userId").to_string();
    state
        .rows
        .lock()
        .unwrap()
        .entry((user_id, collection.to_string()))
        .or_default()
        .push(row.clone());

    HttpResponse::Ok().json(json!({ "message": "saved", id_key: id, "s3Key": row.get("s3Key") }))
}

pub struct StubGateway {
    pub base_url: String,
    pub state: web::Data<StubState>,
    handle: ServerHandle,
}

impl StubGateway {
    pub async fn start() -> Self {
        let state = web::Data::new(StubState::default());
        let data = state.clone();

        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .route("/auth/login", web::post().to(login))
                .route("/auth/signup", web::post().to(signup))
                .route("/auth/confirm-signup", web::post().to(confirm_signup))
                .route("/auth/resend-code", web::post().to(resend_code))
                .route("/profile", web::post().to(save_profile))
                .route("/leaves", web::post().to(append_row))
                .route("/feedback", web::post().to(append_row))
                .route("/documents/upload", web::post().to(append_row))
                .route("/{collection}", web::get().to(read_collection))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }

    /// A confirmed account, ready to log in.
    pub fn add_account(&self, email: &str, password: &str, user_id: &str) {
        self.state.accounts.lock().unwrap().insert(
            email.to_lowercase(),
            Account {
                password: password.to_string(),
                user_id: user_id.to_string(),
                confirmed: true,
            },
        );
    }

    pub fn seed(&self, user_id: &str, collection: &str, rows: Vec<Value>) {
        self.state
            .rows
            .lock()
            .unwrap()
            .insert((user_id.to_string(), collection.to_string()), rows);
    }

    pub fn seed_profile(&self, user_id: &str, profile: Value) {
        self.state
            .profiles
            .lock()
            .unwrap()
            .insert(user_id.to_string(), profile);
    }

    pub fn rows(&self, user_id: &str, collection: &str) -> Vec<Value> {
        self.state
            .rows
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), collection.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn profile(&self, user_id: &str) -> Option<Value> {
        self.state.profiles.lock().unwrap().get(user_id).cloned()
    }

    pub fn break_collection(&self, collection: &str) {
        self.state
            .broken
            .lock()
            .unwrap()
            .insert(collection.to_string());
    }

    pub fn fail_writes(&self, status: u16, message: Option<&str>) {
        *self.state.write_failure.lock().unwrap() = Some((status, message.map(str::to_string)));
    }

    pub fn omit_user_id(&self) {
        self.state.include_user_id.store(false, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.ends_with(&format!(" {path}")))
            .count()
    }

    pub fn portal(&self, store: Box<dyn SessionStore>, options: PortalOptions) -> (Portal, EventReceiver) {
        let client = GatewayClient::new(&self.base_url, std::time::Duration::from_secs(5)).unwrap();
        let (events, receiver) = sync::channel();
        (Portal::new(Backend::gateway(client), store, options, events), receiver)
    }
}
