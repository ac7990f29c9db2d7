//! Test utilities for the clubhub crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Only compiled for tests or with the `test-support` feature.

pub mod fixtures {
    //! Deterministic clocks, identities and aggregates.

    use std::sync::{Arc, Mutex, PoisonError};

    use chrono::{DateTime, Local, NaiveDate, TimeDelta, Utc};
    use mockable::Clock;

    use crate::domain::ports::NoQueryCache;
    use crate::domain::{
        AccountStatus, Club, ClubId, DisplayName, Email, Event, EventId, JoinPolicy,
        ModerationStatus, Money, Principal, PrincipalUser, QueryClient, Role, User,
    };

    /// 2026-03-01T12:00:00Z.
    const FIXTURE_EPOCH_SECONDS: i64 = 1_772_366_400;

    /// Instant every fixture clock starts at.
    pub fn fixture_now() -> DateTime<Utc> {
        DateTime::UNIX_EPOCH + TimeDelta::seconds(FIXTURE_EPOCH_SECONDS)
    }

    /// Clock that only moves when told to.
    #[derive(Debug)]
    pub struct FixtureClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl FixtureClock {
        /// Clock frozen at `now`.
        pub const fn at(now: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(now),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: TimeDelta) {
            let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
            *now += by;
        }
    }

    impl Default for FixtureClock {
        fn default() -> Self {
            Self::at(fixture_now())
        }
    }

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Shared fixture clock as the services expect it.
    pub fn fixture_clock() -> Arc<FixtureClock> {
        Arc::new(FixtureClock::default())
    }

    /// Query client that never caches.
    pub fn uncached_queries() -> QueryClient {
        QueryClient::new(Arc::new(NoQueryCache))
    }

    /// Parse a literal email.
    #[expect(clippy::expect_used, reason = "fixtures only receive literal addresses")]
    pub fn email(raw: &str) -> Email {
        Email::new(raw).expect("fixture email is valid")
    }

    /// Backend user record with `role`.
    pub fn user(raw_email: &str, role: Role) -> User {
        let address = email(raw_email);
        User {
            display_name: DisplayName::from_email(&address),
            email: address,
            photo_url: None,
            role,
            status: AccountStatus::Active,
            created_at: Some(fixture_now()),
        }
    }

    /// Signed-in principal with `role`.
    pub fn principal(raw_email: &str, role: Role) -> Principal {
        Principal::Authenticated(PrincipalUser::from(user(raw_email, role)))
    }

    /// Signed-in member.
    pub fn member(raw_email: &str) -> Principal {
        principal(raw_email, Role::Member)
    }

    /// Signed-in club manager.
    pub fn manager(raw_email: &str) -> Principal {
        principal(raw_email, Role::ClubManager)
    }

    /// Signed-in super admin.
    pub fn super_admin(raw_email: &str) -> Principal {
        principal(raw_email, Role::SuperAdmin)
    }

    /// Signed-in but banned account.
    pub fn banned(raw_email: &str, role: Role) -> Principal {
        let mut banned = user(raw_email, role);
        banned.status = AccountStatus::Banned;
        Principal::from(banned)
    }

    /// Parse a literal identifier.
    #[expect(clippy::expect_used, reason = "fixtures only receive literal identifiers")]
    pub fn club_id(raw: &str) -> ClubId {
        ClubId::new(raw).expect("fixture club id is valid")
    }

    /// Parse a literal identifier.
    #[expect(clippy::expect_used, reason = "fixtures only receive literal identifiers")]
    pub fn event_id(raw: &str) -> EventId {
        EventId::new(raw).expect("fixture event id is valid")
    }

    /// Club with the given status and fee, owned by `owner`.
    pub fn club(id: &str, owner: &str, status: ModerationStatus, fee: Money) -> Club {
        Club {
            id: club_id(id),
            name: format!("Club {id}"),
            description: "A club for testing".to_owned(),
            category: "Sports".to_owned(),
            location: "Harbour".to_owned(),
            banner_image: None,
            membership_fee: fee,
            owner_email: email(owner),
            status,
            join_policy: JoinPolicy::Open,
            created_at: Some(fixture_now()),
        }
    }

    /// Approved event a week after [`fixture_now`].
    pub fn event(id: &str, club: &str, fee: Money, max_attendees: Option<u32>) -> Event {
        Event {
            id: event_id(id),
            club_id: club_id(club),
            title: format!("Event {id}"),
            description: "An event for testing".to_owned(),
            event_date: fixture_today() + TimeDelta::days(7),
            location: "Harbour".to_owned(),
            is_paid: !fee.is_zero(),
            event_fee: fee,
            max_attendees,
            status: ModerationStatus::Approved,
            created_at: Some(fixture_now()),
        }
    }

    /// Calendar day of [`fixture_now`].
    pub fn fixture_today() -> NaiveDate {
        fixture_now().date_naive()
    }
}

pub mod payments {
    //! Scriptable payment provider.

    use std::collections::{HashMap, VecDeque};
    use std::sync::{Mutex, MutexGuard, PoisonError};

    use async_trait::async_trait;

    use crate::domain::Money;
    use crate::domain::idempotency::IdempotencyKey;
    use crate::domain::ports::{
        BillingDetails, ChargeConfirmation, ChargeStatus, ClientSecret, PaymentInstrument,
        PaymentIntent, PaymentProvider, PaymentProviderError,
    };

    #[derive(Debug, Default)]
    struct State {
        intents_created: usize,
        charges: usize,
        scripted: VecDeque<Result<ChargeStatus, PaymentProviderError>>,
        confirmed: HashMap<IdempotencyKey, ChargeConfirmation>,
    }

    /// Payment provider double.
    ///
    /// Charges succeed unless a failure was scripted with
    /// [`FakePaymentProvider::decline_next`] or [`FakePaymentProvider::push_outcome`].
    /// Confirmations are deduplicated on the idempotency key the way the
    /// real provider does.
    #[derive(Debug)]
    pub struct FakePaymentProvider {
        transaction_id: String,
        state: Mutex<State>,
    }

    impl FakePaymentProvider {
        /// Provider whose successful charges report `transaction_id`.
        pub fn new(transaction_id: impl Into<String>) -> Self {
            Self {
                transaction_id: transaction_id.into(),
                state: Mutex::new(State::default()),
            }
        }

        fn state(&self) -> MutexGuard<'_, State> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Decline the next confirmation with `reason`.
        pub fn decline_next(&self, reason: &str) {
            self.push_outcome(Err(PaymentProviderError::declined(reason)));
        }

        /// Script the outcome of the next confirmation.
        pub fn push_outcome(&self, outcome: Result<ChargeStatus, PaymentProviderError>) {
            self.state().scripted.push_back(outcome);
        }

        /// Number of intents created.
        pub fn intents_created(&self) -> usize {
            self.state().intents_created
        }

        /// Number of distinct charges taken.
        pub fn charges(&self) -> usize {
            self.state().charges
        }
    }

    impl Default for FakePaymentProvider {
        fn default() -> Self {
            Self::new("pi_123")
        }
    }

    #[async_trait]
    impl PaymentProvider for FakePaymentProvider {
        async fn create_intent(
            &self,
            amount: Money,
            key: &IdempotencyKey,
        ) -> Result<PaymentIntent, PaymentProviderError> {
            self.state().intents_created += 1;
            Ok(PaymentIntent {
                client_secret: ClientSecret::new(format!(
                    "{}_secret_{}",
                    self.transaction_id,
                    key.as_uuid().simple()
                )),
                amount,
            })
        }

        async fn confirm_charge(
            &self,
            _intent: &PaymentIntent,
            _instrument: &PaymentInstrument,
            _billing: &BillingDetails,
            key: &IdempotencyKey,
        ) -> Result<ChargeConfirmation, PaymentProviderError> {
            let mut state = self.state();
            if let Some(previous) = state.confirmed.get(key) {
                return Ok(previous.clone());
            }
            let status = state.scripted.pop_front().unwrap_or(Ok(ChargeStatus::Succeeded))?;
            let confirmation = ChargeConfirmation {
                transaction_id: self.transaction_id.clone(),
                status,
            };
            if status == ChargeStatus::Succeeded {
                state.charges += 1;
                state.confirmed.insert(key.clone(), confirmation.clone());
            }
            Ok(confirmation)
        }
    }
}

pub mod identity {
    //! In-process identity provider.

    use std::collections::HashMap;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    use async_trait::async_trait;
    use tokio::sync::watch;

    use crate::domain::ports::{AuthError, IdentityProvider, IdentitySession};
    use crate::domain::{
        AccessToken, DisplayName, Email, LoginCredentials, ProfilePatch, SignUpRequest,
    };

    #[derive(Debug, Clone)]
    struct Account {
        password: String,
        display_name: DisplayName,
        photo_url: Option<url::Url>,
    }

    /// Identity provider double keeping accounts in memory.
    ///
    /// Session changes are broadcast on the same kind of channel the real
    /// adapter uses.
    #[derive(Debug)]
    pub struct FakeIdentityProvider {
        accounts: Mutex<HashMap<Email, Account>>,
        popup_account: Mutex<Option<Email>>,
        offline: Mutex<bool>,
        sessions: watch::Sender<Option<IdentitySession>>,
    }

    impl Default for FakeIdentityProvider {
        fn default() -> Self {
            let (sessions, _) = watch::channel(None);
            Self {
                accounts: Mutex::new(HashMap::new()),
                popup_account: Mutex::new(None),
                offline: Mutex::new(false),
                sessions,
            }
        }
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    impl FakeIdentityProvider {
        /// Register an existing account.
        pub fn with_account(self, email: Email, password: &str) -> Self {
            lock(&self.accounts).insert(
                email.clone(),
                Account {
                    password: password.to_owned(),
                    display_name: DisplayName::from_email(&email),
                    photo_url: None,
                },
            );
            self
        }

        /// Account the federated popup signs in as. Without one the popup
        /// reports cancellation.
        pub fn with_popup_account(self, email: Email) -> Self {
            *lock(&self.popup_account) = Some(email);
            self
        }

        /// Make every call fail as unreachable.
        pub fn set_offline(&self, offline: bool) {
            *lock(&self.offline) = offline;
        }

        /// Push a session change as if it happened outside the app.
        pub fn push_session(&self, session: Option<IdentitySession>) {
            self.sessions.send_replace(session);
        }

        fn ensure_online(&self) -> Result<(), AuthError> {
            if *lock(&self.offline) {
                return Err(AuthError::network("offline"));
            }
            Ok(())
        }

        fn open_session(&self, email: &Email) -> Result<IdentitySession, AuthError> {
            let account = lock(&self.accounts)
                .get(email)
                .cloned()
                .ok_or_else(|| AuthError::invalid_credentials("no such account"))?;
            let session = IdentitySession {
                email: email.clone(),
                display_name: Some(account.display_name),
                photo_url: account.photo_url,
                access_token: AccessToken::new(format!("token-{email}")),
            };
            self.sessions.send_replace(Some(session.clone()));
            Ok(session)
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeIdentityProvider {
        async fn sign_in(
            &self,
            credentials: &LoginCredentials,
        ) -> Result<IdentitySession, AuthError> {
            self.ensure_online()?;
            let matches = lock(&self.accounts)
                .get(credentials.email())
                .is_some_and(|account| account.password == credentials.password());
            if !matches {
                return Err(AuthError::invalid_credentials("wrong email or password"));
            }
            self.open_session(credentials.email())
        }

        async fn sign_in_with_popup(&self) -> Result<IdentitySession, AuthError> {
            self.ensure_online()?;
            let email = lock(&self.popup_account)
                .clone()
                .ok_or(AuthError::PopupCancelled)?;
            lock(&self.accounts)
                .entry(email.clone())
                .or_insert_with(|| Account {
                    password: String::new(),
                    display_name: DisplayName::from_email(&email),
                    photo_url: None,
                });
            self.open_session(&email)
        }

        async fn sign_up(&self, request: &SignUpRequest) -> Result<IdentitySession, AuthError> {
            self.ensure_online()?;
            let email = request.credentials().email().clone();
            {
                let mut accounts = lock(&self.accounts);
                if accounts.contains_key(&email) {
                    return Err(AuthError::provider("email already in use"));
                }
                accounts.insert(
                    email.clone(),
                    Account {
                        password: request.credentials().password().to_owned(),
                        display_name: request.display_name().clone(),
                        photo_url: request.photo_url().cloned(),
                    },
                );
            }
            self.open_session(&email)
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            self.ensure_online()?;
            self.sessions.send_replace(None);
            Ok(())
        }

        async fn send_password_reset(&self, email: &Email) -> Result<(), AuthError> {
            self.ensure_online()?;
            if lock(&self.accounts).contains_key(email) {
                Ok(())
            } else {
                Err(AuthError::invalid_credentials("no such account"))
            }
        }

        async fn update_profile(&self, patch: &ProfilePatch) -> Result<(), AuthError> {
            self.ensure_online()?;
            let current = self
                .sessions
                .borrow()
                .clone()
                .ok_or_else(|| AuthError::provider("not signed in"))?;
            if let Some(account) = lock(&self.accounts).get_mut(&current.email) {
                if let Some(name) = &patch.display_name {
                    account.display_name = name.clone();
                }
                if let Some(photo) = &patch.photo_url {
                    account.photo_url = Some(photo.clone());
                }
            }
            Ok(())
        }

        fn current_session(&self) -> Option<IdentitySession> {
            self.sessions.borrow().clone()
        }

        fn subscribe(&self) -> watch::Receiver<Option<IdentitySession>> {
            self.sessions.subscribe()
        }
    }
}
