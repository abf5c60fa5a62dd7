// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! End-to-end tests of the session lifecycle and authorization rules,
//! driven through the core stack over in-memory backends.

use std::time::Duration;

use kinopass_core::identity::IdentityStore;
use kinopass_core::token::TokenKind;
use kinopass_core::{AuthError, RevocationList};

use kinopass_tests::common::{auth_stack, default_auth_stack, TEST_PASSWORD};

// =============================================================================
// Issuance
// =============================================================================

#[tokio::test]
async fn issued_pair_is_fresh_and_whitelisted() {
    let stack = default_auth_stack();
    stack.seed_user("a@x.com", false).await;

    let (pair, user) = stack
        .sessions
        .login("a@x.com", TEST_PASSWORD, Some("integration-agent"))
        .await
        .unwrap();

    let access = stack.codec.decode(&pair.access_token).unwrap();
    let refresh = stack.codec.decode(&pair.refresh_token).unwrap();

    // Expiry sits exactly one configured lifetime beyond issuance.
    assert_eq!(access.exp - access.iat, 1200);
    assert_eq!(refresh.exp - refresh.iat, 3600);
    assert_eq!(access.kind, TokenKind::Access);
    assert_eq!(refresh.kind, TokenKind::Refresh);
    assert_eq!(access.sub, user.id);

    // The refresh jti is white-listed; the access jti is on neither list.
    assert!(stack
        .revocation
        .get(RevocationList::White, refresh.jti)
        .await
        .unwrap()
        .is_some());
    assert!(stack
        .revocation
        .get(RevocationList::Black, access.jti)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn whitelist_entry_expires_with_refresh_lifetime() {
    // A one-second refresh lifetime lets the test watch the TTL lapse.
    let stack = auth_stack(Duration::from_secs(60), Duration::from_secs(1));
    stack.seed_user("a@x.com", false).await;

    let (pair, _) = stack
        .sessions
        .login("a@x.com", TEST_PASSWORD, None)
        .await
        .unwrap();
    let refresh = stack.codec.decode(&pair.refresh_token).unwrap();

    assert!(stack
        .revocation
        .get(RevocationList::White, refresh.jti)
        .await
        .unwrap()
        .is_some());

    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert!(stack
        .revocation
        .get(RevocationList::White, refresh.jti)
        .await
        .unwrap()
        .is_none());
}

// =============================================================================
// Login Failures
// =============================================================================

#[tokio::test]
async fn login_with_unknown_email_is_not_found() {
    let stack = default_auth_stack();

    let err = stack
        .sessions
        .login("a@x.com", "p1", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound { .. }));
}

#[tokio::test]
async fn login_with_wrong_password_is_forbidden() {
    let stack = default_auth_stack();
    stack.seed_user("a@x.com", false).await;

    let err = stack
        .sessions
        .login("a@x.com", "not-the-password", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Forbidden { .. }));
}

// =============================================================================
// Expiry
// =============================================================================

#[tokio::test]
async fn expired_access_token_surfaces_expired() {
    let stack = auth_stack(Duration::from_secs(1), Duration::from_secs(3600));
    stack.seed_user("a@x.com", false).await;

    let (pair, _) = stack
        .sessions
        .login("a@x.com", TEST_PASSWORD, None)
        .await
        .unwrap();

    // Valid while fresh.
    assert!(stack.guard.authenticate(&pair.access_token).await.is_ok());

    tokio::time::sleep(Duration::from_millis(1100)).await;

    // Past its lifetime the same token is rejected with the distinct
    // expiry outcome, steering the client to the refresh flow.
    let err = stack
        .guard
        .authenticate(&pair.access_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Expired));

    // The refresh flow still works with the expired access token in hand.
    assert!(stack
        .sessions
        .refresh(&pair.access_token, &pair.refresh_token)
        .await
        .is_ok());
}

// =============================================================================
// Rotation
// =============================================================================

#[tokio::test]
async fn rotation_is_one_shot() {
    let stack = default_auth_stack();
    stack.seed_user("a@x.com", false).await;

    let (original, _) = stack
        .sessions
        .login("a@x.com", TEST_PASSWORD, None)
        .await
        .unwrap();

    let rotated = stack
        .sessions
        .refresh(&original.access_token, &original.refresh_token)
        .await
        .unwrap();
    assert_ne!(rotated.access_token, original.access_token);
    assert_ne!(rotated.refresh_token, original.refresh_token);

    // Replaying the original refresh token after the successful rotation
    // fails: its white-list entry was consumed by that rotation.
    let err = stack
        .sessions
        .refresh(&original.access_token, &original.refresh_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Forbidden { .. }));
}

#[tokio::test]
async fn rotation_invalidates_previous_access_token() {
    let stack = default_auth_stack();
    stack.seed_user("a@x.com", false).await;

    let (original, _) = stack
        .sessions
        .login("a@x.com", TEST_PASSWORD, None)
        .await
        .unwrap();

    let rotated = stack
        .sessions
        .refresh(&original.access_token, &original.refresh_token)
        .await
        .unwrap();

    // Old access token is revoked despite not having expired.
    let err = stack
        .guard
        .authenticate(&original.access_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized { .. }));

    // The new one authenticates.
    assert!(stack.guard.authenticate(&rotated.access_token).await.is_ok());
}

// =============================================================================
// Logout / Revocation
// =============================================================================

#[tokio::test]
async fn logout_revokes_access_and_refresh() {
    let stack = default_auth_stack();
    stack.seed_user("a@x.com", false).await;

    let (pair, _) = stack
        .sessions
        .login("a@x.com", TEST_PASSWORD, None)
        .await
        .unwrap();

    stack
        .sessions
        .logout(&pair.access_token, &pair.refresh_token)
        .await
        .unwrap();

    // That exact access token fails every privileged operation.
    let err = stack
        .guard
        .authenticate(&pair.access_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized { .. }));

    // That exact refresh token fails rotation.
    let err = stack
        .sessions
        .refresh(&pair.access_token, &pair.refresh_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Forbidden { .. }));

    // Repeating logout is a no-op.
    assert!(stack
        .sessions
        .logout(&pair.access_token, &pair.refresh_token)
        .await
        .is_ok());
}

// =============================================================================
// Privilege Rules
// =============================================================================

#[tokio::test]
async fn superuser_is_never_rejected_for_privilege() {
    let stack = default_auth_stack();
    stack.seed_roles().await;
    stack.seed_user("root@x.com", true).await;
    let admin = stack.seed_admin("admin@x.com").await;
    let plain = stack.seed_user("user@x.com", false).await;

    let (pair, _) = stack
        .sessions
        .login("root@x.com", TEST_PASSWORD, None)
        .await
        .unwrap();
    let claims = stack.guard.authenticate(&pair.access_token).await.unwrap();
    assert!(claims.is_superuser);

    assert!(stack.guard.authorize_admin(&claims).is_ok());
    assert!(stack
        .guard
        .authorize_role_change(&claims, plain.id)
        .await
        .is_ok());
    // Even the admin-target case that blocks admins.
    assert!(stack
        .guard
        .authorize_role_change(&claims, admin.id)
        .await
        .is_ok());
}

#[tokio::test]
async fn admin_cannot_reassign_admin_role_on_admin() {
    let stack = default_auth_stack();
    stack.seed_roles().await;
    stack.seed_admin("one@x.com").await;
    let other = stack.seed_admin("two@x.com").await;
    let plain = stack.seed_user("user@x.com", false).await;

    let (pair, _) = stack
        .sessions
        .login("one@x.com", TEST_PASSWORD, None)
        .await
        .unwrap();
    let claims = stack.guard.authenticate(&pair.access_token).await.unwrap();
    assert!(claims.is_admin);

    // Admin-on-admin is the escalation loop the guard closes.
    let err = stack
        .guard
        .authorize_role_change(&claims, other.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Forbidden { .. }));

    // Admin-on-plain-user is allowed.
    assert!(stack
        .guard
        .authorize_role_change(&claims, plain.id)
        .await
        .is_ok());
}

#[tokio::test]
async fn stale_admin_snapshot_is_trusted_until_rotation() {
    let stack = default_auth_stack();
    stack.seed_roles().await;
    let admin = stack.seed_admin("admin@x.com").await;

    let (pair, _) = stack
        .sessions
        .login("admin@x.com", TEST_PASSWORD, None)
        .await
        .unwrap();

    // Demote after issuance.
    stack.identity.unassign_role(admin.id).await.unwrap();

    // The snapshot still authorizes: staleness is bounded by the access
    // lifetime, not by the store.
    let claims = stack.guard.authenticate(&pair.access_token).await.unwrap();
    assert!(claims.is_admin);
    assert!(stack.guard.authorize_admin(&claims).is_ok());

    // Rotation re-reads the store and drops the stale privilege.
    let rotated = stack
        .sessions
        .refresh(&pair.access_token, &pair.refresh_token)
        .await
        .unwrap();
    let rotated_claims = stack
        .guard
        .authenticate(&rotated.access_token)
        .await
        .unwrap();
    assert!(!rotated_claims.is_admin);
}

// =============================================================================
// Fail-Closed
// =============================================================================

#[tokio::test]
async fn unreachable_cache_fails_closed_for_authentication() {
    let stack = default_auth_stack();
    stack.seed_user("a@x.com", false).await;

    let (pair, _) = stack
        .sessions
        .login("a@x.com", TEST_PASSWORD, None)
        .await
        .unwrap();

    // Exhaust the bounded retries on every upcoming cache call.
    stack.cache.fail_connections(100);

    let err = stack
        .guard
        .authenticate(&pair.access_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Unavailable { .. }));
}
