use rocket::serde::json::Json;
use rocket::{Route, State};
use sqlx::{Pool, Sqlite};

use crate::auth::{Role, User};
use crate::db::get_users_in_group;
use crate::models::UserSummary;
use crate::validation::ApiError;

#[get("/users/me")]
pub async fn me(user: User) -> Json<UserSummary> {
    Json(UserSummary::from(user))
}

async fn list_group(
    user: &User,
    db: &Pool<Sqlite>,
    role: Role,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    user.require_admin()?;

    let users = get_users_in_group(db, role).await?;

    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

#[get("/users/listar-alumnos")]
pub async fn list_students(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    list_group(&user, db, Role::Student).await
}

#[get("/users/listar-docentes")]
pub async fn list_teachers(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    list_group(&user, db, Role::Teacher).await
}

#[get("/users/listar-administradores")]
pub async fn list_admins(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    list_group(&user, db, Role::Admin).await
}

pub fn routes() -> Vec<Route> {
    routes![me, list_students, list_teachers, list_admins]
}
