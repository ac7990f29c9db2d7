//! Domain primitives, aggregates and workflow services.
//!
//! Purpose: model clubs, memberships, events, registrations and payments,
//! the role policy that gates them, and the services that move each entity
//! through its lifecycle. Everything outside the process is reached through
//! [`ports`]; adapters live in `crate::outbound`.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure taxonomy.
//! - Principal / Capability / authorize / guard: the central role policy.
//! - ClubService, MembershipService, EventService, ApplicationService,
//!   UserAdminService, SessionStore: lifecycle services.
//! - checkout::CheckoutSequencer: the payment sequence.
//! - QueryClient / QueryKey / QueryScope: cached reads and invalidation.

pub mod application;
pub mod application_service;
pub mod auth;
pub mod authorization;
pub mod checkout;
pub mod club;
pub mod club_service;
pub mod error;
pub mod event;
pub mod event_service;
pub mod idempotency;
pub mod ids;
pub mod membership;
pub mod membership_service;
pub mod moderation;
pub mod money;
pub mod payment;
mod port_errors;
pub mod ports;
pub mod principal;
pub mod query;
pub mod registration;
pub mod session;
pub mod trace_id;
pub mod user;
pub mod user_admin_service;
pub mod validation;

pub use self::application::{ApplicationDraft, ClubManagerApplication, NewApplication};
pub use self::application_service::ApplicationService;
pub use self::auth::{
    AccessToken, CredentialsValidationError, LoginCredentials, PASSWORD_MIN, SignUpRequest,
};
pub use self::authorization::{
    Capability, GuardDecision, HOME_PATH, LOGIN_PATH, authorize, guard, require,
};
pub use self::club::{
    Club, ClubDraft, ClubPatch, ClubQuery, ClubSort, ClubStats, JoinPolicy, NewClub,
};
pub use self::club_service::ClubService;
pub use self::error::{Error, ErrorCode};
pub use self::event::{Event, EventDraft, EventPatch, EventQuery, NewEvent};
pub use self::event_service::EventService;
pub use self::ids::{
    ApplicationId, ClubId, EventId, IdValidationError, MembershipId, PaymentId, RegistrationId,
};
pub use self::membership::{JoinOutcome, Membership, MembershipStatus, NewMembership};
pub use self::membership_service::MembershipService;
pub use self::moderation::{ModerationDecision, ModerationStatus, Transition};
pub use self::money::{Money, MoneyError};
pub use self::payment::{CARD_PAYMENT_METHOD, NewPayment, Payment, PaymentTarget, PlatformStats};
pub use self::principal::{Principal, PrincipalUser};
pub use self::query::{QueryClient, QueryKey, QueryScope};
pub use self::registration::{
    EventRegistration, NewRegistration, RegistrationOutcome, RegistrationStatus,
};
pub use self::session::{SessionHandle, SessionSnapshot, SessionStore};
pub use self::trace_id::TraceId;
pub use self::user::{
    AccessUpdate, AccountStatus, DISPLAY_NAME_MAX, DisplayName, Email, ProfilePatch, Role, User,
    UserValidationError, parse_image_url,
};
pub use self::user_admin_service::UserAdminService;
pub use self::validation::ValidationError;
