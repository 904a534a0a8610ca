mod common;

use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header},
};
use common::{MockRepo, TEST_RESIDENT_ID, account, create_test_state};
use community_portal::{
    AppState,
    auth::{AuthUser, Claims, MaybeAuthUser},
    config::Env,
    models::Role,
    storage::MockStorageService,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Arc;
use std::time::SystemTime;
use uuid::Uuid;

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn create_token(account_id: Uuid, exp_offset: i64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: account_id,
        iat: now as usize,
        // A negative offset backdates the expiry to produce an expired token.
        exp: (now + exp_offset).max(0) as usize,
    };

    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn state_with(repo: MockRepo, env: Env) -> AppState {
    let mut state = create_test_state(Arc::new(repo), MockStorageService::new());
    state.config.jwt_secret = TEST_JWT_SECRET.to_string();
    state.config.env = env;
    state
}

async fn extract(state: &AppState, request: Request<()>) -> Result<AuthUser, StatusCode> {
    let (mut parts, _) = request.into_parts();
    AuthUser::from_request_parts(&mut parts, state).await
}

fn bearer_request(token: &str) -> Request<()> {
    Request::builder()
        .method(Method::GET)
        .uri(Uri::from_static("/me"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(())
        .unwrap()
}

#[tokio::test]
async fn test_valid_token_resolves_the_account() {
    let state = state_with(
        MockRepo::with_account(account(TEST_RESIDENT_ID, Role::Resident, true)),
        Env::Production,
    );

    let token = create_token(TEST_RESIDENT_ID, 3600);
    let user = extract(&state, bearer_request(&token))
        .await
        .expect("valid token must authenticate");

    assert_eq!(user.id, TEST_RESIDENT_ID);
    assert_eq!(user.role, Role::Resident);
    assert_eq!(user.email, format!("user-{TEST_RESIDENT_ID}@example.com"));
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let state = state_with(
        MockRepo::with_account(account(TEST_RESIDENT_ID, Role::Resident, true)),
        Env::Production,
    );

    let token = create_token(TEST_RESIDENT_ID, -3600);
    let result = extract(&state, bearer_request(&token)).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_authorization_header_is_rejected() {
    let state = state_with(
        MockRepo::with_account(account(TEST_RESIDENT_ID, Role::Resident, true)),
        Env::Production,
    );

    let request = Request::builder()
        .method(Method::GET)
        .uri(Uri::from_static("/me"))
        .body(())
        .unwrap();
    let result = extract(&state, request).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_token_is_rejected() {
    let state = state_with(
        MockRepo::with_account(account(TEST_RESIDENT_ID, Role::Resident, true)),
        Env::Production,
    );

    let result = extract(&state, bearer_request("not-a-jwt")).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_a_deleted_account_is_rejected() {
    // The JWT is valid but the account row is gone: access must be revoked.
    let state = state_with(MockRepo::default(), Env::Production);

    let token = create_token(TEST_RESIDENT_ID, 3600);
    let result = extract(&state, bearer_request(&token)).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_local_bypass_header_authenticates_in_local_env() {
    let state = state_with(
        MockRepo::with_account(account(TEST_RESIDENT_ID, Role::Resident, true)),
        Env::Local,
    );

    let request = Request::builder()
        .method(Method::GET)
        .uri(Uri::from_static("/me"))
        .header("x-user-id", TEST_RESIDENT_ID.to_string())
        .body(())
        .unwrap();

    let user = extract(&state, request)
        .await
        .expect("bypass must authenticate in local env");
    assert_eq!(user.id, TEST_RESIDENT_ID);
}

#[tokio::test]
async fn test_local_bypass_header_is_ignored_in_production() {
    let state = state_with(
        MockRepo::with_account(account(TEST_RESIDENT_ID, Role::Resident, true)),
        Env::Production,
    );

    let request = Request::builder()
        .method(Method::GET)
        .uri(Uri::from_static("/me"))
        .header("x-user-id", TEST_RESIDENT_ID.to_string())
        .body(())
        .unwrap();

    let result = extract(&state, request).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_optional_extractor_yields_none_for_anonymous() {
    let state = state_with(MockRepo::default(), Env::Production);

    let request = Request::builder()
        .method(Method::GET)
        .uri(Uri::from_static("/session"))
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();

    let MaybeAuthUser(user) = MaybeAuthUser::from_request_parts(&mut parts, &state)
        .await
        .expect("optional extraction never rejects");
    assert!(user.is_none());
}

#[tokio::test]
async fn test_optional_extractor_yields_the_user_when_authenticated() {
    let state = state_with(
        MockRepo::with_account(account(TEST_RESIDENT_ID, Role::Resident, true)),
        Env::Production,
    );

    let token = create_token(TEST_RESIDENT_ID, 3600);
    let (mut parts, _) = bearer_request(&token).into_parts();

    let MaybeAuthUser(user) = MaybeAuthUser::from_request_parts(&mut parts, &state)
        .await
        .expect("optional extraction never rejects");
    assert_eq!(user.expect("authenticated").id, TEST_RESIDENT_ID);
}
