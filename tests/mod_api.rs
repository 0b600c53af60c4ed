use devcamper::api::Api;
use devcamper::auth::hash_password;
use devcamper::config::AppConfig;
use devcamper::errors::ApiError;
use devcamper::services::{Mailer, Message};
use devcamper::store::{DocumentStore, MemoryStore};
use devcamper::query::Filter;
use fake::{Fake, faker::name::en::Name};
use http::{Method, Request, StatusCode};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct Outbox(Mutex<Vec<Message>>);

impl Mailer for Outbox {
    fn send(&self, message: &Message) -> Result<(), ApiError> {
        self.0.lock().push(message.clone());
        Ok(())
    }
}

struct Harness {
    api: Api<MemoryStore>,
    outbox: Arc<Outbox>,
}

fn harness() -> Harness {
    let cfg = AppConfig {
        zipcodes: HashMap::from([
            ("02118".to_string(), [-71.07, 42.34]),
            ("02215".to_string(), [-71.10, 42.35]),
            ("90210".to_string(), [-118.41, 34.10]),
        ]),
        ..AppConfig::default()
    };
    let outbox = Arc::new(Outbox::default());
    let api = Api::new(Arc::new(MemoryStore::new()), cfg).unwrap().with_mailer(outbox.clone());
    Harness { api, outbox }
}

impl Harness {
    async fn call(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(path).header("host", "devcamper.test");
        if let Some(t) = token {
            req = req.header("authorization", format!("Bearer {t}"));
        }
        let bytes = body.map(|b| b.to_string().into_bytes()).unwrap_or_default();
        let resp = self.api.handle(req.body(bytes).unwrap()).await;
        let status = resp.status();
        (status, serde_json::from_slice(resp.body()).unwrap())
    }

    async fn register(&self, email: &str, role: &str) -> String {
        let name: String = Name().fake();
        let body = json!({"name": name, "email": email, "password": "123456", "role": role});
        let (status, v) = self.call(Method::POST, "/api/v1/auth/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::OK, "{v}");
        v["token"].as_str().unwrap().to_string()
    }

    async fn admin(&self) -> String {
        let doc = bson::doc! {
            "name": "Admin",
            "email": "admin@gmail.com",
            "role": "admin",
            "password": hash_password("123456").unwrap(),
        };
        self.api.store().insert("users", doc).await.unwrap();
        let body = json!({"email": "admin@gmail.com", "password": "123456"});
        let (status, v) = self.call(Method::POST, "/api/v1/auth/login", None, Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        v["token"].as_str().unwrap().to_string()
    }

    async fn bootcamp(&self, token: &str, name: &str, zipcode: &str) -> String {
        let body = json!({
            "name": name,
            "description": "Full stack web development",
            "address": format!("233 Bay State Rd, Boston, MA {zipcode}"),
            "careers": ["Web Development", "UI/UX"],
            "website": "https://devworks.com",
        });
        let (status, v) = self.call(Method::POST, "/api/v1/bootcamps", Some(token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{v}");
        v["data"]["_id"].as_str().unwrap().to_string()
    }

    async fn course(&self, token: &str, bootcamp: &str, tuition: f64) -> String {
        let body = json!({
            "title": "Front End Web Development",
            "description": "HTML, CSS and JavaScript",
            "weeks": "8",
            "tuition": tuition,
            "minimumSkill": "beginner",
        });
        let path = format!("/api/v1/bootcamps/{bootcamp}/courses");
        let (status, v) = self.call(Method::POST, &path, Some(token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{v}");
        v["data"]["_id"].as_str().unwrap().to_string()
    }

    async fn bootcamp_field(&self, id: &str, field: &str) -> Value {
        let (_, v) = self.call(Method::GET, &format!("/api/v1/bootcamps/{id}"), None, None).await;
        v["data"][field].clone()
    }
}

#[tokio::test]
async fn role_gating_on_bootcamp_create() {
    let h = harness();
    let body = json!({"name": "x"});
    let (status, v) = h.call(Method::POST, "/api/v1/bootcamps", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(v, json!({"success": false, "error": "Not authorized to access this route"}));

    let user = h.register("john@gmail.com", "user").await;
    let (status, v) = h.call(Method::POST, "/api/v1/bootcamps", Some(&user), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(v["error"], "User role user is not authorized to access this route");

    let (status, _) = h.call(Method::POST, "/api/v1/bootcamps", Some("garbage.token"), Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_derives_slug_and_location() {
    let h = harness();
    let publisher = h.register("pub@gmail.com", "publisher").await;
    let id = h.bootcamp(&publisher, "Devworks Bootcamp", "02118").await;
    assert_eq!(h.bootcamp_field(&id, "slug").await, "devworks-bootcamp");
    let location = h.bootcamp_field(&id, "location").await;
    assert_eq!(location["city"], "Boston");
    assert_eq!(location["zipcode"], "02118");
    assert_eq!(location["coordinates"], json!([-71.07, 42.34]));
    assert_eq!(h.bootcamp_field(&id, "address").await, Value::Null);
    assert_eq!(h.bootcamp_field(&id, "housing").await, false);

    let path = format!("/api/v1/bootcamps/{id}");
    let (status, v) = h.call(Method::PUT, &path, Some(&publisher), Some(json!({"name": "ModernTech Bootcamp"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["data"]["slug"], "moderntech-bootcamp");
}

#[tokio::test]
async fn validation_errors_are_collected() {
    let h = harness();
    let publisher = h.register("pub@gmail.com", "publisher").await;
    let body = json!({"name": "x", "careers": ["Astrology"], "website": "not-a-url"});
    let (status, v) = h.call(Method::POST, "/api/v1/bootcamps", Some(&publisher), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let msg = v["error"].as_str().unwrap();
    assert!(msg.contains("Please add a description"), "{msg}");
    assert!(msg.contains("Please add an address"), "{msg}");
    assert!(msg.contains("Please use a valid URL with HTTP or HTTPS"), "{msg}");
    assert!(msg.contains("`Astrology` is not a valid enum value for path `careers`."), "{msg}");
}

#[tokio::test]
async fn publisher_owns_at_most_one_bootcamp() {
    let h = harness();
    let publisher = h.register("pub@gmail.com", "publisher").await;
    h.bootcamp(&publisher, "First Camp", "02118").await;
    let body = json!({"name": "Second Camp", "description": "d", "address": "02118", "careers": ["Business"]});
    let (status, v) = h.call(Method::POST, "/api/v1/bootcamps", Some(&publisher), Some(body.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v["error"].as_str().unwrap().contains("has already published a bootcamp"));

    let admin = h.admin().await;
    h.bootcamp(&admin, "Admin Camp One", "02118").await;
    h.bootcamp(&admin, "Admin Camp Two", "02118").await;
}

#[tokio::test]
async fn owners_only_modify_their_bootcamp() {
    let h = harness();
    let owner = h.register("owner@gmail.com", "publisher").await;
    let other = h.register("other@gmail.com", "publisher").await;
    let id = h.bootcamp(&owner, "Owned Camp", "02118").await;
    let path = format!("/api/v1/bootcamps/{id}");
    let (status, v) = h.call(Method::PUT, &path, Some(&other), Some(json!({"housing": true}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(v["error"].as_str().unwrap().ends_with("is not authorized to update this bootcamp"));
    let (status, _) = h.call(Method::DELETE, &path, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = h.admin().await;
    let (status, v) = h.call(Method::PUT, &path, Some(&admin), Some(json!({"housing": true}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["data"]["housing"], true);
}

#[tokio::test]
async fn average_cost_follows_courses() {
    let h = harness();
    let publisher = h.register("pub@gmail.com", "publisher").await;
    let camp = h.bootcamp(&publisher, "Cost Camp", "02118").await;
    let first = h.course(&publisher, &camp, 8000.0).await;
    h.course(&publisher, &camp, 9001.0).await;
    assert_eq!(h.bootcamp_field(&camp, "averageCost").await, 8501.0);

    let (status, _) = h.call(Method::PUT, &format!("/api/v1/courses/{first}"), Some(&publisher), Some(json!({"tuition": 10000}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.bootcamp_field(&camp, "averageCost").await, 9501.0);

    let (status, v) = h.call(Method::DELETE, &format!("/api/v1/courses/{first}"), Some(&publisher), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v, json!({"success": true, "data": {}}));
    assert_eq!(h.bootcamp_field(&camp, "averageCost").await, 9001.0);
}

#[tokio::test]
async fn course_lists_populate_bootcamp_summary() {
    let h = harness();
    let publisher = h.register("pub@gmail.com", "publisher").await;
    let camp = h.bootcamp(&publisher, "Populated Camp", "02118").await;
    let course = h.course(&publisher, &camp, 5000.0).await;

    let (status, v) = h.call(Method::GET, "/api/v1/courses", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["count"], 1);
    assert_eq!(
        v["data"][0]["bootcamp"],
        json!({"_id": camp, "name": "Populated Camp", "description": "Full stack web development"})
    );

    let (_, v) = h.call(Method::GET, &format!("/api/v1/courses/{course}"), None, None).await;
    assert_eq!(v["data"]["bootcamp"]["name"], "Populated Camp");

    let (_, v) = h.call(Method::GET, &format!("/api/v1/bootcamps/{camp}/courses?select=title"), None, None).await;
    assert_eq!(v["count"], 1);
    assert_eq!(v["data"][0], json!({"_id": course, "title": "Front End Web Development"}));

    let (_, v) = h.call(Method::GET, "/api/v1/bootcamps", None, None).await;
    assert_eq!(v["data"][0]["courses"][0]["_id"], course);
}

#[tokio::test]
async fn course_on_foreign_bootcamp_is_forbidden() {
    let h = harness();
    let owner = h.register("owner@gmail.com", "publisher").await;
    let other = h.register("other@gmail.com", "publisher").await;
    let camp = h.bootcamp(&owner, "Owner Camp", "02118").await;
    let body = json!({"title": "t", "description": "d", "weeks": "4", "tuition": 1, "minimumSkill": "advanced"});
    let (status, _) = h.call(Method::POST, &format!("/api/v1/bootcamps/{camp}/courses"), Some(&other), Some(body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn one_review_per_user_and_average_rating() {
    let h = harness();
    let publisher = h.register("pub@gmail.com", "publisher").await;
    let camp = h.bootcamp(&publisher, "Rated Camp", "02118").await;
    let path = format!("/api/v1/bootcamps/{camp}/reviews");

    let (status, _) = h.call(Method::POST, &path, Some(&publisher), Some(json!({"title": "t", "text": "x", "rating": 5}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let alice = h.register("alice@gmail.com", "user").await;
    let bob = h.register("bob@gmail.com", "user").await;
    let (status, v) = h.call(Method::POST, &path, Some(&alice), Some(json!({"title": "Great", "text": "Loved it", "rating": 10}))).await;
    assert_eq!(status, StatusCode::CREATED, "{v}");
    let review = v["data"]["_id"].as_str().unwrap().to_string();
    let (status, v) = h.call(Method::POST, &path, Some(&alice), Some(json!({"title": "Again", "text": "x", "rating": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "Duplicate field value entered");
    h.call(Method::POST, &path, Some(&bob), Some(json!({"title": "Fine", "text": "ok", "rating": 7}))).await;
    assert_eq!(h.bootcamp_field(&camp, "averageRating").await, 8.5);

    let (status, _) = h.call(Method::DELETE, &format!("/api/v1/reviews/{review}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = h.call(Method::DELETE, &format!("/api/v1/reviews/{review}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.bootcamp_field(&camp, "averageRating").await, 7.0);

    let carol = h.register("carol@gmail.com", "user").await;
    let (status, v) = h.call(Method::POST, &path, Some(&carol), Some(json!({"title": "t", "text": "x", "rating": 11}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "Rating can not be more than 10");
}

#[tokio::test]
async fn deleting_bootcamp_cascades() {
    let h = harness();
    let publisher = h.register("pub@gmail.com", "publisher").await;
    let camp = h.bootcamp(&publisher, "Doomed Camp", "02118").await;
    h.course(&publisher, &camp, 1000.0).await;
    h.course(&publisher, &camp, 2000.0).await;
    let user = h.register("u@gmail.com", "user").await;
    h.call(Method::POST, &format!("/api/v1/bootcamps/{camp}/reviews"), Some(&user), Some(json!({"title": "t", "text": "x", "rating": 3}))).await;

    let (status, _) = h.call(Method::DELETE, &format!("/api/v1/bootcamps/{camp}"), Some(&publisher), None).await;
    assert_eq!(status, StatusCode::OK);
    let store = h.api.store();
    assert_eq!(store.count("courses", &Filter::True).await.unwrap(), 0);
    assert_eq!(store.count("reviews", &Filter::True).await.unwrap(), 0);
    let (status, v) = h.call(Method::GET, &format!("/api/v1/bootcamps/{camp}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["error"], "Resource not found");
}

#[tokio::test]
async fn passwords_never_leave_the_api() {
    let h = harness();
    let token = h.register("john@gmail.com", "user").await;
    let (status, v) = h.call(Method::GET, "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["data"]["email"], "john@gmail.com");
    assert!(v["data"].get("password").is_none());

    let admin = h.admin().await;
    let (_, v) = h.call(Method::GET, "/api/v1/users", Some(&admin), None).await;
    assert_eq!(v["count"], 2);
    assert!(v["data"].as_array().unwrap().iter().all(|u| u.get("password").is_none()));
}

#[tokio::test]
async fn duplicate_email_and_bad_login() {
    let h = harness();
    h.register("john@gmail.com", "user").await;
    let body = json!({"name": "J", "email": "john@gmail.com", "password": "abcdef"});
    let (status, v) = h.call(Method::POST, "/api/v1/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "Duplicate field value entered");

    let body = json!({"name": "A", "email": "a@gmail.com", "password": "abcdef", "role": "admin"});
    let (status, _) = h.call(Method::POST, "/api/v1/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, v) = h.call(Method::POST, "/api/v1/auth/login", None, Some(json!({"email": "john@gmail.com"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "Please provide an email and password");
    let bad = json!({"email": "john@gmail.com", "password": "wrong!"});
    let (status, v) = h.call(Method::POST, "/api/v1/auth/login", None, Some(bad)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(v["error"], "Invalid credentials");
}

#[tokio::test]
async fn details_and_password_updates() {
    let h = harness();
    let token = h.register("john@gmail.com", "user").await;
    let body = json!({"name": "John Doe", "role": "publisher"});
    let (status, v) = h.call(Method::PUT, "/api/v1/auth/updatedetails", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["data"]["name"], "John Doe");
    assert_eq!(v["data"]["role"], "user");

    let wrong = json!({"currentPassword": "nope!!", "newPassword": "654321"});
    let (status, _) = h.call(Method::PUT, "/api/v1/auth/updatepassword", Some(&token), Some(wrong)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let right = json!({"currentPassword": "123456", "newPassword": "654321"});
    let (status, v) = h.call(Method::PUT, "/api/v1/auth/updatepassword", Some(&token), Some(right)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(v["token"].is_string());
    let login = json!({"email": "john@gmail.com", "password": "654321"});
    let (status, _) = h.call(Method::POST, "/api/v1/auth/login", None, Some(login)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn forgot_and_reset_password() {
    let h = harness();
    h.register("john@gmail.com", "user").await;
    let (status, v) = h.call(Method::POST, "/api/v1/auth/forgotpassword", None, Some(json!({"email": "john@gmail.com"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v, json!({"success": true, "data": "Email sent"}));

    let sent = h.outbox.0.lock().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "john@gmail.com");
    let marker = "http://devcamper.test/api/v1/auth/resetpassword/";
    let at = sent[0].text.find(marker).unwrap() + marker.len();
    let token: String = sent[0].text[at..].chars().take_while(char::is_ascii_hexdigit).collect();
    assert_eq!(token.len(), 40);

    let path = format!("/api/v1/auth/resetpassword/{token}");
    let (status, v) = h.call(Method::PUT, &path, None, Some(json!({"password": "newpass"}))).await;
    assert_eq!(status, StatusCode::OK, "{v}");
    let (status, v) = h.call(Method::PUT, &path, None, Some(json!({"password": "again!"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "Invalid token");

    let login = json!({"email": "john@gmail.com", "password": "newpass"});
    assert_eq!(h.call(Method::POST, "/api/v1/auth/login", None, Some(login)).await.0, StatusCode::OK);

    let (status, _) = h.call(Method::POST, "/api/v1/auth/forgotpassword", None, Some(json!({"email": "x@y.io"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_user_management() {
    let h = harness();
    let user = h.register("john@gmail.com", "user").await;
    let (status, _) = h.call(Method::GET, "/api/v1/users", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = h.admin().await;
    let body = json!({"name": "Mary", "email": "mary@gmail.com", "password": "123456", "role": "publisher"});
    let (status, v) = h.call(Method::POST, "/api/v1/users", Some(&admin), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = v["data"]["_id"].as_str().unwrap().to_string();
    let path = format!("/api/v1/users/{id}");

    let (status, v) = h.call(Method::PUT, &path, Some(&admin), Some(json!({"password": "hacked"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(v["error"], "Admins are not allowed to change user passwords");
    let (status, v) = h.call(Method::PUT, &path, Some(&admin), Some(json!({"name": "Mary Jane"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["data"]["name"], "Mary Jane");

    let (_, v) = h.call(Method::GET, "/api/v1/users?role=publisher&select=email", Some(&admin), None).await;
    assert_eq!(v["data"], json!([{"_id": id, "email": "mary@gmail.com"}]));

    let (status, v) = h.call(Method::DELETE, &path, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["data"], json!({}));
    assert_eq!(h.call(Method::GET, &path, Some(&admin), None).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn radius_search_finds_nearby_bootcamps() {
    let h = harness();
    let p1 = h.register("p1@gmail.com", "publisher").await;
    let p2 = h.register("p2@gmail.com", "publisher").await;
    h.bootcamp(&p1, "Boston Camp", "02215").await;
    h.bootcamp(&p2, "Beverly Hills Camp", "90210").await;
    let (status, v) = h.call(Method::GET, "/api/v1/bootcamps/radius/02118/10", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["count"], 1);
    assert_eq!(v["data"][0]["name"], "Boston Camp");
    let (_, v) = h.call(Method::GET, "/api/v1/bootcamps/radius/02118/5000", None, None).await;
    assert_eq!(v["count"], 2);
    let (status, _) = h.call(Method::GET, "/api/v1/bootcamps/radius/02118/far", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_routes_report_query_errors_and_unknown_routes() {
    let h = harness();
    let (status, v) = h.call(Method::GET, "/api/v1/bootcamps?page=0", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v["error"].as_str().unwrap().starts_with("Query error"));
    let (status, _) = h.call(Method::GET, "/api/v1/bootcamps?averageCost[ne]=3", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = h.call(Method::GET, "/api/v1/bootcamps/not-an-id", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = h.call(Method::GET, "/api/v2/bootcamps", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = h.call(Method::PATCH, "/api/v1/bootcamps", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bootcamp_list_paginates_through_the_dispatcher() {
    let h = harness();
    let admin = h.admin().await;
    for n in 0..5 {
        h.bootcamp(&admin, &format!("Camp {n}"), "02118").await;
    }
    let (status, v) = h.call(Method::GET, "/api/v1/bootcamps?sort=name&limit=2&page=2&select=name", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["count"], 2);
    assert_eq!(v["pagination"], json!({"previous": {"page": 1, "limit": 2}, "next": {"page": 3, "limit": 2}}));
    let names: Vec<&str> = v["data"].as_array().unwrap().iter().map(|d| d["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Camp 2", "Camp 3"]);
}

#[tokio::test]
async fn non_finite_numbers_are_rejected() {
    let h = harness();
    let publisher = h.register("pub@gmail.com", "publisher").await;
    let camp = h.bootcamp(&publisher, "Finite Camp", "02118").await;
    let user = h.register("dave@gmail.com", "user").await;

    let path = format!("/api/v1/bootcamps/{camp}/reviews");
    let body = json!({"title": "t", "text": "x", "rating": "NaN"});
    let (status, v) = h.call(Method::POST, &path, Some(&user), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "Cast to Number failed for value \"NaN\" at path \"rating\"");
    assert_eq!(h.bootcamp_field(&camp, "averageRating").await, Value::Null);

    let path = format!("/api/v1/bootcamps/{camp}/courses");
    let body = json!({
        "title": "t",
        "description": "d",
        "weeks": "8",
        "tuition": "inf",
        "minimumSkill": "beginner",
    });
    let (status, _) = h.call(Method::POST, &path, Some(&publisher), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, v) = h.call(Method::GET, &path, None, None).await;
    assert_eq!(v["count"], 0);

    let (status, _) = h.call(Method::GET, "/api/v1/bootcamps?averageCost[gte]=NaN", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admins_can_filter_users_by_any_stored_role() {
    let h = harness();
    h.register("john@gmail.com", "user").await;
    let admin = h.admin().await;

    let (status, v) = h.call(Method::GET, "/api/v1/users?role=admin&select=email", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK, "{v}");
    assert_eq!(v["count"], 1);
    assert_eq!(v["data"][0]["email"], "admin@gmail.com");

    let (status, _) = h.call(Method::GET, "/api/v1/users?role=root", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // still not self-assignable
    let body = json!({"name": "Eve", "email": "eve@gmail.com", "password": "123456", "role": "admin"});
    let (status, _) = h.call(Method::POST, "/api/v1/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
