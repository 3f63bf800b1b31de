//! Assertions on response shape shared by the end-to-end tests.
//!
//! These panic with a descriptive message, like `assert!`, and are meant to
//! be called from tests only. They are the one place in the library that
//! panics instead of returning `ApiError`; nothing else in the crate calls
//! them.

use chrono::Utc;

use crate::error::ApiError;
use crate::models::{ColorSchema, Rating, UserDetailsEnvelope, UserEnvelope, UserRole};

/// Rating of an account that has never been rated.
pub const INITIAL_RATING: Rating = Rating {
    enabled: true,
    quality: 0,
    quantity: 0,
};

/// Page size the service applies to every list by default.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

fn sorted_roles(roles: &[UserRole]) -> Vec<UserRole> {
    let mut roles = roles.to_vec();
    roles.sort();
    roles
}

/// Roles exactly equal to `expected`, ignoring order.
pub fn assert_roles(roles: &[UserRole], expected: &[UserRole]) {
    assert_eq!(
        sorted_roles(roles),
        sorted_roles(expected),
        "unexpected roles {roles:?}"
    );
}

/// Shape of a freshly registered and activated user, as returned by login or
/// activation.
pub fn check_new_user(envelope: &UserEnvelope, login: &str) {
    let user = &envelope.resource;
    let actual = user.login.as_deref().unwrap_or_default();
    assert!(actual.starts_with(login), "login {actual:?} does not start with {login:?}");
    assert_eq!(user.rating, INITIAL_RATING, "unexpected rating");

    let registration = user.registration.expect("registration timestamp missing");
    assert_eq!(
        registration.date_naive(),
        Utc::now().date_naive(),
        "registration {registration} is not today"
    );
}

/// Shape of `GET /v1/account` for an activated user with untouched settings.
pub fn check_account_details(envelope: &UserDetailsEnvelope, login: &str) {
    let details = &envelope.resource;
    let actual = details.login.as_deref().unwrap_or_default();
    assert!(actual.starts_with(login), "login {actual:?} does not start with {login:?}");
    assert_roles(&details.roles, &[UserRole::Guest, UserRole::Player]);
    assert!(details.online.is_some(), "online timestamp missing");
    assert!(details.registration.is_some(), "registration timestamp missing");
    assert_eq!(details.info, "", "info should be empty");
    for (field, value) in [
        ("mediumPictureUrl", &details.medium_picture_url),
        ("smallPictureUrl", &details.small_picture_url),
        ("originalPictureUrl", &details.original_picture_url),
        ("status", &details.status),
        ("name", &details.name),
        ("location", &details.location),
        ("icq", &details.icq),
        ("skype", &details.skype),
    ] {
        assert!(value.is_none(), "{field} should be null, got {value:?}");
    }
    assert_eq!(details.rating, INITIAL_RATING, "unexpected rating");

    let settings = &details.settings;
    assert_eq!(settings.color_schema, ColorSchema::Modern);
    assert!(settings.nanny_greetings_message.is_none());
    let paging = settings.paging;
    for (field, value) in [
        ("postsPerPage", paging.posts_per_page),
        ("commentsPerPage", paging.comments_per_page),
        ("topicsPerPage", paging.topics_per_page),
        ("messagesPerPage", paging.messages_per_page),
        ("entitiesPerPage", paging.entities_per_page),
    ] {
        assert_eq!(value, DEFAULT_PAGE_SIZE, "{field}");
    }
}

/// The call failed with `status`, and, when given, the service's error
/// message equals `message`.
pub fn expect_http_error<T: std::fmt::Debug>(result: Result<T, ApiError>, status: u16, message: Option<&str>) -> ApiError {
    let err = match result {
        Ok(value) => panic!("expected HTTP {status}, call succeeded with {value:?}"),
        Err(err) => err,
    };
    assert_eq!(err.status(), Some(status), "unexpected error: {err}");
    if let Some(message) = message {
        let service = err.service_error();
        assert_eq!(
            service.as_ref().map(|e| e.message()),
            Some(message),
            "unexpected error body: {err}"
        );
    }
    err
}
