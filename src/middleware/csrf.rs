/// CSRF (Cross-Site Request Forgery) protection
///
/// Votes are anonymous, so without a token any third-party page could post
/// to `/poll/{id}/vote` and stuff the tally through a visitor's browser. The
/// same goes for an admin's open session, where a forged form could create or
/// delete polls on their behalf.
///
/// Every POST form (voting, admin login, poll creation and deletion) carries
/// a hidden `csrf_token` field. The token is generated once per session,
/// stored in the signed session cookie, and compared by the handler before
/// the repository is touched. A request without a session token, with an
/// empty field, or with a mismatch is refused with 403.
///
/// ```html,ignore
/// <input type="hidden" name="csrf_token" value="{{ client.get_csrf_token() }}">
/// ```
use actix_web::{error, Error};
use rand::{distributions::Alphanumeric, Rng};

pub const CSRF_TOKEN_LENGTH: usize = 32;
const CSRF_SESSION_KEY: &str = "csrf_token";

pub fn generate_csrf_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CSRF_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Get or create CSRF token for the current session.
///
/// Called by ClientCtx for every request, so templates always have a token.
pub fn get_or_create_csrf_token(session: &actix_session::Session) -> Result<String, Error> {
    match session.get::<String>(CSRF_SESSION_KEY) {
        Ok(Some(token)) => Ok(token),
        _ => {
            let token = generate_csrf_token();
            session
                .insert(CSRF_SESSION_KEY, token.clone())
                .map_err(|_| error::ErrorInternalServerError("Failed to store CSRF token"))?;
            Ok(token)
        }
    }
}

/// Validate the CSRF token submitted with a form. Mismatch or absence is a 403.
pub fn validate_csrf_token(
    session: &actix_session::Session,
    provided_token: &str,
) -> Result<(), Error> {
    let expected_token = session
        .get::<String>(CSRF_SESSION_KEY)
        .map_err(|_| error::ErrorInternalServerError("Failed to get CSRF token"))?
        .ok_or_else(|| error::ErrorForbidden("CSRF token not found in session"))?;

    if provided_token.is_empty() || provided_token != expected_token {
        log::warn!("CSRF token validation failed");
        return Err(error::ErrorForbidden("Invalid CSRF token"));
    }

    Ok(())
}
