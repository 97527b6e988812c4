use crate::response::FieldErrors;

use super::{
    dto::{EditUserRequest, SignupRequest},
    repo_types::NewUser,
};

pub const MIN_PASSWORD_LEN: usize = 8;

const USERNAME_MISSING: &str = "Please provide your username.";
const NAME_MISSING: &str = "Please provide your name.";
const EMAIL_MISSING: &str = "Please provide your email.";
const PASSWORD_TOO_SHORT: &str = "Password must have at least 8 characters.";

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn is_short_password(value: &str) -> bool {
    value.trim().chars().count() < MIN_PASSWORD_LEN
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !is_blank(v))
}

/// Checks a signup body and turns it into a [`NewUser`], or reports every problem at once.
pub fn signup(payload: SignupRequest) -> Result<NewUser, FieldErrors> {
    let mut errors = FieldErrors::new();

    if present(&payload.username).is_none() {
        errors.insert("username", USERNAME_MISSING);
    }
    if present(&payload.name).is_none() {
        errors.insert("name", NAME_MISSING);
    }
    if present(&payload.email).is_none() {
        errors.insert("email", EMAIL_MISSING);
    }
    if payload.password.as_deref().map_or(true, is_short_password) {
        errors.insert("password", PASSWORD_TOO_SHORT);
    }

    match payload {
        SignupRequest {
            username: Some(username),
            name: Some(name),
            email: Some(email),
            password: Some(password),
            image_url,
        } if errors.is_empty() => Ok(NewUser {
            username: username.trim().to_owned(),
            email: email.trim().to_owned(),
            name: name.trim().to_owned(),
            password,
            is_admin: false,
            image_url,
        }),
        _ => Err(errors),
    }
}

/// Fields absent from an edit are fine; submitted ones follow the signup rules.
pub fn edit(payload: &EditUserRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if payload.username.as_deref().is_some_and(is_blank) {
        errors.insert("username", USERNAME_MISSING);
    }
    if payload.name.as_deref().is_some_and(is_blank) {
        errors.insert("name", NAME_MISSING);
    }
    if payload.email.as_deref().is_some_and(is_blank) {
        errors.insert("email", EMAIL_MISSING);
    }
    if payload.password.as_deref().is_some_and(is_short_password) {
        errors.insert("password", PASSWORD_TOO_SHORT);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> SignupRequest {
        SignupRequest {
            username: Some("foobar".into()),
            name: Some("Foo Bar".into()),
            email: Some("foo@example.com".into()),
            password: Some("foobarbazquay".into()),
            image_url: None,
        }
    }

    #[test]
    fn complete_signup_passes() {
        let user = signup(full()).unwrap();
        assert_eq!(user.username, "foobar");
        assert!(!user.is_admin);
    }

    #[test]
    fn each_missing_field_is_keyed() {
        let cases = [
            ("username", USERNAME_MISSING),
            ("name", NAME_MISSING),
            ("email", EMAIL_MISSING),
        ];
        for (key, message) in cases {
            let mut payload = full();
            match key {
                "username" => payload.username = None,
                "name" => payload.name = None,
                _ => payload.email = Some("   ".into()),
            }
            let errors = signup(payload).unwrap_err();
            assert_eq!(errors.len(), 1, "only {key} should fail");
            assert_eq!(errors[key], message);
        }
    }

    #[test]
    fn short_password_is_rejected_after_trim() {
        let mut payload = full();
        payload.password = Some("  1234567  ".into());
        assert_eq!(signup(payload).unwrap_err()["password"], PASSWORD_TOO_SHORT);
    }

    #[test]
    fn empty_body_reports_every_field() {
        let errors = signup(SignupRequest::default()).unwrap_err();
        let keys: Vec<_> = errors.keys().copied().collect();
        assert_eq!(keys, ["email", "name", "password", "username"]);
    }

    #[test]
    fn edit_ignores_absent_fields() {
        assert!(edit(&EditUserRequest::default()).is_ok());
    }

    #[test]
    fn edit_rejects_blank_and_short_values() {
        let payload = EditUserRequest {
            name: Some("".into()),
            password: Some("short".into()),
            ..Default::default()
        };
        let errors = edit(&payload).unwrap_err();
        assert_eq!(errors["name"], NAME_MISSING);
        assert_eq!(errors["password"], PASSWORD_TOO_SHORT);
        assert!(!errors.contains_key("email"));
    }
}
