use std::path::PathBuf;
use std::sync::Arc;

use autoparts_hub_api::{
    db::create_pool,
    dto::applications::{ApplicationKind, ApplicationRequest, Upload},
    dto::profile::UpdateProfileRequest,
    error::{AppError, AttachmentError},
    middleware::auth::AuthUser,
    roles::RoleSet,
    services::{application_service, profile_service},
    state::AppState,
    storage::{FsStore, MAX_RESUME_BYTES},
};
use uuid::Uuid;

// Intake pipeline integration tests; they need a real Postgres and skip
// themselves when no TEST_DATABASE_URL/DATABASE_URL is configured.
async fn setup_state() -> anyhow::Result<Option<AppState>> {
    Ok(setup_state_with_root().await?.map(|(state, _)| state))
}

// Variant for tests that assert on what the store left on disk.
async fn setup_state_with_root() -> anyhow::Result<Option<(AppState, PathBuf)>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let upload_root = std::env::temp_dir().join(format!("autoparts-uploads-{}", Uuid::new_v4()));
    let state = AppState {
        pool,
        store: Arc::new(FsStore::new(&upload_root)),
    };
    Ok(Some((state, upload_root)))
}

async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, name, email, password_hash, role) VALUES ($1, $2, $3, 'dummy', $4)")
        .bind(id)
        .bind("Test User")
        .bind(format!("user-{id}@example.com"))
        .bind(role)
        .execute(&state.pool)
        .await?;
    Ok(AuthUser {
        user_id: id,
        roles: RoleSet::parse(role).unwrap(),
    })
}

fn admin_payload() -> ApplicationRequest {
    ApplicationRequest {
        name: "Asha Rao".into(),
        email: "asha@example.com".into(),
        reason: "I keep the marketplace tidy".into(),
        ..Default::default()
    }
}

fn support_payload() -> ApplicationRequest {
    ApplicationRequest {
        name: "Asha Rao".into(),
        email: "asha@example.com".into(),
        phone: "9876543210".into(),
        reason: "I want to help customers".into(),
        experience: "3 years in a parts shop".into(),
        availability: "Full-time (40+ hrs/week)".into(),
    }
}

fn pdf_of_len(len: usize) -> Vec<u8> {
    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.resize(len, b'x');
    bytes
}

fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0u8; 16]);
    bytes
}

fn profile_payload(user: &AuthUser) -> UpdateProfileRequest {
    UpdateProfileRequest {
        name: "Avatar User".into(),
        email: format!("user-{}@example.com", user.user_id),
        ..Default::default()
    }
}

#[tokio::test]
async fn duplicate_pending_rejected_until_resolved() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user = create_user(&state, "buyer").await?;

    let first =
        application_service::submit(&state, &user, ApplicationKind::Admin, admin_payload(), None)
            .await?;
    let first_id = first.data.unwrap().application_id;

    let err =
        application_service::submit(&state, &user, ApplicationKind::Admin, admin_payload(), None)
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::DuplicatePendingRequest(_)));

    // a different kind is still allowed while the admin one is pending
    application_service::submit(&state, &user, ApplicationKind::Seller, support_payload(), None)
        .await?;

    // once resolved, a fresh admin application goes through
    sqlx::query("UPDATE role_applications SET status = 'rejected' WHERE id = $1")
        .bind(first_id)
        .execute(&state.pool)
        .await?;
    application_service::submit(&state, &user, ApplicationKind::Admin, admin_payload(), None)
        .await?;
    Ok(())
}

#[tokio::test]
async fn holder_of_target_role_is_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let admin = create_user(&state, "buyer,admin").await?;
    let err =
        application_service::submit(&state, &admin, ApplicationKind::Admin, admin_payload(), None)
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::AuthorizationDenied(_)));
    Ok(())
}

#[tokio::test]
async fn missing_fields_reported_per_kind() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user = create_user(&state, "buyer").await?;
    // admin payload lacks the support-only fields
    let err = application_service::submit(
        &state,
        &user,
        ApplicationKind::Support,
        admin_payload(),
        None,
    )
    .await
    .unwrap_err();
    match err {
        AppError::ValidationFailed(fields) => {
            assert!(fields.contains(&"phone".to_string()));
            assert!(fields.contains(&"experience".to_string()));
            assert!(fields.contains(&"availability".to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn resume_sniffing_and_size_ceiling() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    // a renamed non-PDF is rejected on content, not extension
    let user = create_user(&state, "buyer").await?;
    let err = application_service::submit(
        &state,
        &user,
        ApplicationKind::Support,
        support_payload(),
        Some(Upload {
            file_name: "resume.pdf".into(),
            bytes: b"<html>not a pdf</html>".to_vec(),
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        AppError::AttachmentRejected(AttachmentError::WrongType)
    ));

    // one byte over the ceiling is rejected
    let err = application_service::submit(
        &state,
        &user,
        ApplicationKind::Support,
        support_payload(),
        Some(Upload {
            file_name: "resume.pdf".into(),
            bytes: pdf_of_len(MAX_RESUME_BYTES + 1),
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        AppError::AttachmentRejected(AttachmentError::TooLarge)
    ));

    // exactly at the ceiling is accepted and the path recorded
    let resp = application_service::submit(
        &state,
        &user,
        ApplicationKind::Support,
        support_payload(),
        Some(Upload {
            file_name: "resume.pdf".into(),
            bytes: pdf_of_len(MAX_RESUME_BYTES),
        }),
    )
    .await?;
    let app_id = resp.data.unwrap().application_id;
    let row: (Option<String>,) =
        sqlx::query_as("SELECT resume_path FROM role_applications WHERE id = $1")
            .bind(app_id)
            .fetch_one(&state.pool)
            .await?;
    let path = row.0.expect("resume path recorded");
    assert!(path.starts_with(&format!("resume_{}", user.user_id)));
    Ok(())
}

#[tokio::test]
async fn deletion_request_is_single_pending() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user = create_user(&state, "buyer").await?;
    application_service::submit_deletion(&state, &user).await?;

    let err = application_service::submit_deletion(&state, &user)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicatePendingRequest(_)));

    let listing = application_service::list_my_requests(&state, &user).await?;
    assert!(listing.data.unwrap().deletion_request.is_some());
    Ok(())
}

#[tokio::test]
async fn profile_update_is_all_or_nothing_on_wrong_password() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user = create_user(&state, "buyer").await?;
    let real_hash = profile_service::hash_password("original-pass")?;
    sqlx::query("UPDATE users SET password_hash = $2, name = 'Before' WHERE id = $1")
        .bind(user.user_id)
        .bind(real_hash)
        .execute(&state.pool)
        .await?;

    let payload = UpdateProfileRequest {
        name: "After".into(),
        email: format!("user-{}@example.com", user.user_id),
        current_password: "wrong-pass".into(),
        new_password: "brand-new-pw".into(),
        confirm_password: "brand-new-pw".into(),
        ..Default::default()
    };

    let err = profile_service::update_profile(&state, &user, payload, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // no partial save: the name change was rejected along with the password
    let row: (String,) = sqlx::query_as("SELECT name FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(row.0, "Before");
    Ok(())
}

#[tokio::test]
async fn profile_email_must_stay_unique() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user = create_user(&state, "buyer").await?;
    let other = create_user(&state, "buyer").await?;

    let payload = UpdateProfileRequest {
        name: "Any Name".into(),
        email: format!("user-{}@example.com", other.user_id),
        ..Default::default()
    };
    let err = profile_service::update_profile(&state, &user, payload, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    Ok(())
}

#[tokio::test]
async fn avatar_replacement_deletes_old_file_but_never_the_default() -> anyhow::Result<()> {
    let Some((state, root)) = setup_state_with_root().await? else {
        return Ok(());
    };

    let user = create_user(&state, "buyer").await?;
    std::fs::create_dir_all(&root)?;
    std::fs::write(root.join("default.png"), b"placeholder")?;
    sqlx::query("UPDATE users SET profile_picture = 'default.png' WHERE id = $1")
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    // replacing the placeholder stores the new file and leaves default.png alone
    let first = profile_service::update_profile(
        &state,
        &user,
        profile_payload(&user),
        Some(Upload {
            file_name: "me.png".into(),
            bytes: png_bytes(),
        }),
    )
    .await?;
    let first_name = first
        .data
        .unwrap()
        .profile_picture
        .expect("avatar recorded");
    assert!(first_name.starts_with(&format!("profile_{}", user.user_id)));
    assert!(root.join(&first_name).exists());
    assert!(root.join("default.png").exists());

    // replacing a real avatar removes the previous file
    let second = profile_service::update_profile(
        &state,
        &user,
        profile_payload(&user),
        Some(Upload {
            file_name: "me-again.png".into(),
            bytes: png_bytes(),
        }),
    )
    .await?;
    let second_name = second
        .data
        .unwrap()
        .profile_picture
        .expect("avatar recorded");
    assert_ne!(first_name, second_name);
    assert!(!root.join(&first_name).exists());
    assert!(root.join(&second_name).exists());
    assert!(root.join("default.png").exists());
    Ok(())
}

#[tokio::test]
async fn failed_profile_write_cleans_up_the_stored_avatar() -> anyhow::Result<()> {
    let Some((state, root)) = setup_state_with_root().await? else {
        return Ok(());
    };

    // A row trigger that rejects one sentinel name lets this test fail the
    // UPDATE deterministically after the avatar has already been stored. It
    // passes every other write through untouched.
    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION users_reject_sentinel() RETURNS trigger AS $fn$
        BEGIN
            IF NEW.name = 'reject-this-write' THEN
                RAISE EXCEPTION 'rejected by test trigger';
            END IF;
            RETURN NEW;
        END
        $fn$ LANGUAGE plpgsql
        "#,
    )
    .execute(&state.pool)
    .await?;
    sqlx::query("DROP TRIGGER IF EXISTS users_sentinel_guard ON users")
        .execute(&state.pool)
        .await?;
    sqlx::query(
        "CREATE TRIGGER users_sentinel_guard BEFORE UPDATE ON users \
         FOR EACH ROW EXECUTE FUNCTION users_reject_sentinel()",
    )
    .execute(&state.pool)
    .await?;

    let user = create_user(&state, "buyer").await?;
    let mut payload = profile_payload(&user);
    payload.name = "reject-this-write".into();

    let err = profile_service::update_profile(
        &state,
        &user,
        payload,
        Some(Upload {
            file_name: "me.png".into(),
            bytes: png_bytes(),
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Db(_)));

    // the avatar that was stored before the write failed is gone again
    let leftover = std::fs::read_dir(&root)?
        .filter_map(|entry| entry.ok())
        .any(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with(&format!("profile_{}", user.user_id))
        });
    assert!(!leftover);

    sqlx::query("DROP TRIGGER IF EXISTS users_sentinel_guard ON users")
        .execute(&state.pool)
        .await?;
    Ok(())
}
