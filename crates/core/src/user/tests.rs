//! User service tests against in-memory stores.

use std::sync::Arc;

use super::*;
use crate::auth::verify_secret;
use crate::testing::{self, MemoryUsers, PASSWORD, PIN, RecordingNotifier};

const SECRET: &str = "test-signature-secret";

fn service(
    users: impl IntoIterator<Item = UserAccount>,
) -> (
    Arc<MemoryUsers>,
    Arc<RecordingNotifier>,
    UserService<MemoryUsers, RecordingNotifier>,
) {
    let users = Arc::new(MemoryUsers::with(users));
    let notifier = Arc::new(RecordingNotifier::default());
    let service = UserService::new(users.clone(), notifier.clone(), SECRET);
    (users, notifier, service)
}

fn signup_input() -> SignupInput {
    SignupInput {
        full_name: "Siti Aminah".to_string(),
        username: "siti".to_string(),
        email: "Siti@Example.com".to_string(),
        phone: "081355554444".to_string(),
        password: "rahasia123".to_string(),
        confirm_password: "rahasia123".to_string(),
    }
}

#[tokio::test]
async fn test_signup_creates_unverified_account_with_account_number() {
    let (_, _, service) = service(Vec::<UserAccount>::new());
    let user = service.signup(signup_input()).await.unwrap();

    assert_eq!(user.email, "siti@example.com");
    assert!(!user.email_verified);
    assert!(!user.has_pin());
    assert_eq!(user.account_number.len(), 10);
    assert!(!user.account_number.starts_with('0'));
    assert!(verify_secret("rahasia123", &user.password_hash).unwrap());
}

#[tokio::test]
async fn test_signup_rejects_duplicates() {
    let existing = testing::user("siti");
    let (_, _, service) = service([existing.clone()]);

    let err = service.signup(signup_input()).await.unwrap_err();
    assert_eq!(err.to_string(), "Username already taken");

    let err = service
        .signup(SignupInput {
            username: "siti2".to_string(),
            email: existing.email.clone(),
            ..signup_input()
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Email already registered");

    let err = service
        .signup(SignupInput {
            username: "siti2".to_string(),
            email: "siti2@example.com".to_string(),
            phone: existing.phone.clone(),
            ..signup_input()
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Phone number already registered");
}

#[tokio::test]
async fn test_signin() {
    let user = testing::user("budi");
    let (_, _, service) = service([user.clone()]);

    assert_eq!(service.signin("budi", PASSWORD).await.unwrap().id, user.id);
    assert!(matches!(
        service.signin("budi", "wrong-password1").await,
        Err(UserError::Unauthorized(_))
    ));
    assert!(matches!(
        service.signin("nobody", PASSWORD).await,
        Err(UserError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_set_pin_only_once() {
    let mut user = testing::user("budi");
    user.pin_hash = None;
    let (users, _, service) = service([user.clone()]);

    service.set_pin(user.id, "246810", "246810").await.unwrap();
    assert!(users.get(user.id).check_pin("246810").is_ok());

    let err = service.set_pin(user.id, "135790", "135790").await.unwrap_err();
    assert_eq!(err.to_string(), "PIN already set");
}

#[tokio::test]
async fn test_change_password_requires_fresh_signature() {
    let user = testing::user("budi");
    let (users, notifier, service) = service([user.clone()]);

    let err = service
        .change_password(user.id, None, "baru12345", "baru12345")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Signature is required");

    let err = service
        .change_password(user.id, Some("deadbeef"), "baru12345", "baru12345")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid signature");

    let signature = service.verify_password(user.id, PASSWORD).await.unwrap();

    let err = service
        .change_password(user.id, Some(&signature), PASSWORD, PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "New password must be different from the old password"
    );

    service
        .change_password(user.id, Some(&signature), "baru12345", "baru12345")
        .await
        .unwrap();
    assert!(verify_secret("baru12345", &users.get(user.id).password_hash).unwrap());
    assert_eq!(notifier.alerts().len(), 1);

    // the hash changed, so the signature is spent
    let err = service
        .change_password(user.id, Some(&signature), "lagi12345", "lagi12345")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid signature");
}

#[tokio::test]
async fn test_verify_password_rejects_wrong_password() {
    let user = testing::user("budi");
    let (_, _, service) = service([user.clone()]);
    let err = service
        .verify_password(user.id, "salah12345")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid password");
}

#[tokio::test]
async fn test_change_pin_flow() {
    let user = testing::user("budi");
    let (users, _, service) = service([user.clone()]);

    assert!(service.verify_pin(user.id, "000000").await.is_err());
    let signature = service.verify_pin(user.id, PIN).await.unwrap();

    let err = service
        .change_pin(user.id, Some(&signature), "654321", "654320")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "PIN confirmation does not match");

    let err = service
        .change_pin(user.id, Some(&signature), PIN, PIN)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "New PIN must be different from the old PIN");

    service
        .change_pin(user.id, Some(&signature), "654321", "654321")
        .await
        .unwrap();
    assert!(users.get(user.id).check_pin("654321").is_ok());
}

#[tokio::test]
async fn test_password_signature_does_not_unlock_pin_change() {
    let user = testing::user("budi");
    let (_, _, service) = service([user.clone()]);
    let signature = service.verify_password(user.id, PASSWORD).await.unwrap();

    let err = service
        .change_pin(user.id, Some(&signature), "654321", "654321")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid signature");
}

#[test]
fn test_display_name_prefers_alias() {
    let mut user = testing::user("budi");
    assert_eq!(user.display_name(), "budi Santoso");
    user.alias = Some("Bud".to_string());
    assert_eq!(user.display_name(), "Bud");
    user.alias = Some("   ".to_string());
    assert_eq!(user.display_name(), "budi Santoso");
}
