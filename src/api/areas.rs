use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, Resource, User};
use crate::db::{create_area, delete_area, get_all_areas, get_area, update_area, AreaChanges};
use crate::models::Area;
use crate::validation::{ApiError, JsonValidateExt};

use super::{missing_fields_error, present, reject_blank};

#[derive(Debug, Deserialize, Validate, Default)]
pub struct AreaInput {
    #[validate(length(min = 1, max = 100, message = "El nombre debe tener entre 1 y 100 caracteres."))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub photo: Option<String>,
}

impl From<AreaInput> for AreaChanges {
    fn from(input: AreaInput) -> Self {
        AreaChanges {
            name: input.name,
            description: input.description,
            photo: input.photo,
        }
    }
}

#[get("/areas")]
pub async fn list_areas(db: &State<Pool<Sqlite>>) -> Result<Json<Vec<Area>>, ApiError> {
    Ok(Json(get_all_areas(db).await?))
}

#[get("/areas/<id>")]
pub async fn get_area_by_id(id: i64, db: &State<Pool<Sqlite>>) -> Result<Json<Area>, ApiError> {
    Ok(Json(get_area(db, id).await?))
}

#[post("/areas", data = "<input>")]
pub async fn create_area_route(
    input: Json<AreaInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<Area>>, ApiError> {
    user.require_permission(Permission::Add(Resource::Area))?;
    let input = input.validate_custom()?;

    let Some(name) = present(&input.name) else {
        return Err(missing_fields_error(&["name"]));
    };

    let area = create_area(
        db,
        name,
        input.description.as_deref(),
        input.photo.as_deref(),
    )
    .await?;

    Ok(Custom(Status::Created, Json(area)))
}

#[put("/areas/<id>", data = "<input>")]
pub async fn replace_area(
    id: i64,
    input: Json<AreaInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Area>, ApiError> {
    user.require_permission(Permission::Change(Resource::Area))?;
    let input = input.validate_custom()?;

    if present(&input.name).is_none() {
        return Err(missing_fields_error(&["name"]));
    }

    Ok(Json(update_area(db, id, &AreaChanges::from(input)).await?))
}

#[patch("/areas/<id>", data = "<input>")]
pub async fn patch_area(
    id: i64,
    input: Json<AreaInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Area>, ApiError> {
    user.require_permission(Permission::Change(Resource::Area))?;
    let input = input.validate_custom()?;
    reject_blank(&[("name", &input.name)])?;

    Ok(Json(update_area(db, id, &AreaChanges::from(input)).await?))
}

#[delete("/areas/<id>")]
pub async fn delete_area_route(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, ApiError> {
    user.require_permission(Permission::Delete(Resource::Area))?;

    delete_area(db, id).await?;

    Ok(Status::NoContent)
}

pub fn routes() -> Vec<Route> {
    routes![
        list_areas,
        get_area_by_id,
        create_area_route,
        replace_area,
        patch_area,
        delete_area_route
    ]
}
