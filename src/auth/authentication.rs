use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use sqlx::SqlitePool;

use crate::db::get_user;
use crate::validation::{ApiError, ToValidationResponse};

use super::{TokenKeys, TokenType, User};

fn bearer_token<'r>(request: &'r Request<'_>) -> Option<&'r str> {
    request
        .headers()
        .get_one("Authorization")
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_span = tracing::info_span!("user_auth_guard");
        let _guard = auth_span.enter();

        let Some(token) = bearer_token(request) else {
            return Outcome::Error((Status::Unauthorized, ()));
        };

        let (db, keys) = match (
            request.rocket().state::<SqlitePool>(),
            request.rocket().state::<TokenKeys>(),
        ) {
            (Some(db), Some(keys)) => (db, keys),
            _ => {
                tracing::error!("Database pool or token keys not found in managed state");
                return Outcome::Error((Status::InternalServerError, ()));
            }
        };

        let user_id = match keys
            .decode(token, TokenType::Access)
            .and_then(|claims| claims.user_id())
        {
            Ok(user_id) => user_id,
            Err(err) => {
                tracing::warn!(error = %err, "Rejected bearer token");
                return Outcome::Error((Status::Unauthorized, ()));
            }
        };

        match get_user(db, user_id).await {
            Ok(user) if user.is_active => {
                tracing::info!(email = %user.email, role = ?user.role(), "User authenticated via bearer token");
                Outcome::Success(user)
            }
            Ok(user) => {
                tracing::warn!(email = %user.email, "Inactive user presented a token");
                Outcome::Error((Status::Unauthorized, ()))
            }
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = %err, "Token subject could not be loaded");
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}

#[catch(401)]
pub fn unauthorized_api(_req: &Request) -> ApiError {
    Status::Unauthorized.to_validation_response()
}

#[catch(403)]
pub fn forbidden_api(_req: &Request) -> ApiError {
    tracing::warn!("Forbidden access attempt");
    Status::Forbidden.to_validation_response()
}
