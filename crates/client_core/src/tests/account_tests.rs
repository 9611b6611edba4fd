use super::*;
use crate::{
    error::{BusinessError, CONNECTION_ERROR_MESSAGE},
    test_support::{Call, FakeApi},
    view::NoticeTarget,
};

#[test]
fn typing_the_current_password_again_is_flagged() {
    assert_eq!(
        PasswordForm::check_new_password("secret", "secret"),
        Err(ValidationError::PasswordUnchanged)
    );
    assert_eq!(PasswordForm::check_new_password("secret", ""), Ok(()));
    assert_eq!(PasswordForm::check_new_password("secret", "other"), Ok(()));
}

#[tokio::test]
async fn mismatched_confirmation_makes_no_request() {
    let api = FakeApi::new();
    let mut form = PasswordForm::new();
    let err = form
        .submit(&api, "old", "new-one", "new-two")
        .await
        .expect_err("mismatch");

    assert!(matches!(
        err,
        WorkflowError::Validation(ValidationError::PasswordMismatch)
    ));
    assert_eq!(api.network_calls().await, 0);
    assert_eq!(
        form.notices()[0].target,
        NoticeTarget::Field("confirm_password")
    );
    assert_eq!(form.save_state(), ControlState::Enabled);
}

#[tokio::test]
async fn valid_change_posts_all_three_fields() {
    let api = FakeApi::new();
    let mut form = PasswordForm::new();
    form.submit(&api, "old", "new", "new").await.expect("changed");

    assert_eq!(
        api.calls().await,
        vec![Call::ChangePassword(PasswordChangeRequest {
            old_password: "old".to_string(),
            new_password: "new".to_string(),
            confirm_password: "new".to_string(),
        })]
    );
    assert_eq!(form.notices()[0].text, PASSWORD_UPDATED_MESSAGE);
}

#[tokio::test]
async fn wrong_current_password_targets_old_password_field() {
    let api = FakeApi::new();
    api.push_mutation(Err(RemoteError::Business(BusinessError {
        messages: vec!["Current password is incorrect".to_string()],
        error_type: Some("old_password".to_string()),
    })))
    .await;
    let mut form = PasswordForm::new();
    form.submit(&api, "bad", "new", "new").await.expect_err("refused");

    let notice = &form.notices()[0];
    assert_eq!(notice.target, NoticeTarget::Field("old_password"));
    assert_eq!(notice.text, "Current password is incorrect");
}

#[tokio::test]
async fn other_failures_become_a_form_error() {
    let api = FakeApi::new();
    api.push_mutation(Err(RemoteError::business(["Password too short"])))
        .await;
    api.push_mutation(Err(RemoteError::Transport("refused".into())))
        .await;
    let mut form = PasswordForm::new();

    form.submit(&api, "old", "new", "new").await.expect_err("refused");
    assert_eq!(form.notices()[0].target, NoticeTarget::Dialog);
    assert_eq!(form.notices()[0].text, "Password too short");

    form.submit(&api, "old", "new", "new").await.expect_err("transport");
    assert_eq!(form.notices().len(), 1);
    assert_eq!(form.notices()[0].text, CONNECTION_ERROR_MESSAGE);
}
