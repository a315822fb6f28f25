//! In-process app wiring for handler tests.

use std::sync::Arc;

use actix_web::{
    App, Error,
    body::MessageBody,
    dev::{Service, ServiceResponse},
    test::{self, TestRequest},
    web::Data,
};
use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    auth::{jwt::generate_access_token, otp::OtpSender},
    clock::FixedClock,
    config::Config,
    model::{role::Role, user::{NewUser, User}},
    repo::{MemoryStore, UserRepo},
    routes,
    state::AppState,
};

/// Local wall-clock instant for the fixed test clock.
pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .unwrap()
}

/// Governor keys on the peer address, which `TestRequest` leaves empty.
pub fn peer(req: TestRequest) -> TestRequest {
    req.peer_addr("127.0.0.1:12345".parse().unwrap())
}

pub fn bearer(req: TestRequest, token: &str) -> TestRequest {
    peer(req).insert_header(("Authorization", format!("Bearer {token}")))
}

pub struct TestApp {
    pub config: Config,
    pub state: AppState,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    /// Starts on Tuesday 2026-03-10 at 09:15.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Shares the store so tests can reach store-only operations.
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        let config = Config::for_tests();
        let clock = Arc::new(FixedClock::new(at(2026, 3, 10, 9, 15)));
        let state = AppState::new(store, &config).with_clock(clock.clone());
        Self { config, state, clock }
    }

    pub fn with_sender(mut self, sender: Arc<dyn OtpSender>) -> Self {
        self.state = self.state.with_otp_sender(sender);
        self
    }

    pub fn at(self, now: NaiveDateTime) -> Self {
        self.clock.set(now);
        self
    }

    async fn user(&self, name: &str, phone: &str, role: Role, admin_id: Option<u64>) -> User {
        self.state.phones.insert(phone);
        UserRepo::create(
            self.state.users.as_ref(),
            NewUser {
                name: name.into(),
                phone: phone.into(),
                email: Some(format!("{}@example.com", phone)),
                password_hash: None,
                role,
                admin_id,
                tracing_method: None,
                department: Some("Engineering".into()),
                designation: None,
                join_date: None,
            },
        )
        .await
        .unwrap()
    }

    pub async fn admin(&self, phone: &str) -> User {
        self.user("Asha Admin", phone, Role::Admin, None).await
    }

    pub async fn employee(&self, phone: &str, admin_id: u64) -> User {
        self.user("John Doe", phone, Role::Employee, Some(admin_id)).await
    }

    pub fn token(&self, user: &User) -> String {
        generate_access_token(user, &self.config.jwt_secret, self.config.access_token_ttl).unwrap()
    }

    pub async fn init(
        &self,
    ) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = Error>
    {
        let config = self.config.clone();
        test::init_service(
            App::new()
                .app_data(Data::new(self.state.clone()))
                .app_data(Data::new(self.config.clone()))
                .configure(move |cfg| routes::configure(cfg, config)),
        )
        .await
    }
}
