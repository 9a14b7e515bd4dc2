use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, Resource, User};
use crate::db::{
    create_purchase, delete_purchase, get_all_purchases, get_purchase_detail,
    get_purchases_for_student, purchase_courses, update_purchase, PurchaseChanges,
};
use crate::error::AppError;
use crate::models::{BulkPurchaseResult, Purchase, PurchaseDetail};
use crate::validation::{ApiError, JsonValidateExt};

use super::missing_fields_error;

const NO_COURSES: &str = "No se enviaron cursos";

#[derive(Debug, Deserialize, Default)]
pub struct BulkPurchaseRequest {
    #[serde(default)]
    pub course_ids: Vec<i64>,
    #[serde(default)]
    pub is_trial: bool,
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct PurchaseInput {
    #[serde(alias = "student")]
    pub student_id: Option<i64>,
    #[serde(alias = "course")]
    pub course_id: Option<i64>,
    pub is_trial: Option<bool>,
}

impl PurchaseInput {
    fn missing_for_create(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.student_id.is_none() {
            missing.push("student_id");
        }
        if self.course_id.is_none() {
            missing.push("course_id");
        }
        missing
    }
}

impl From<PurchaseInput> for PurchaseChanges {
    fn from(input: PurchaseInput) -> Self {
        PurchaseChanges {
            student_id: input.student_id,
            course_id: input.course_id,
            is_trial: input.is_trial,
        }
    }
}

#[get("/compras")]
pub async fn list_purchases(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Purchase>>, ApiError> {
    let purchases = if user.is_admin() {
        get_all_purchases(db).await?
    } else {
        get_purchases_for_student(db, user.id).await?
    };

    Ok(Json(purchases))
}

/// Someone else's purchase looks exactly like a missing one.
#[get("/compras/<id>")]
pub async fn get_purchase_by_id(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<PurchaseDetail>, ApiError> {
    let detail = get_purchase_detail(db, id).await?;

    if !user.is_admin() && detail.purchase.student_id != user.id {
        tracing::warn!(email = %user.email, purchase_id = id, "Purchase of another student requested");
        return Err(AppError::NotFound(format!("No existe una compra con id {}.", id)).into());
    }

    Ok(Json(detail))
}

#[post("/compras/comprar-varios", data = "<request>")]
pub async fn buy_courses(
    request: Json<BulkPurchaseRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<BulkPurchaseResult>>, ApiError> {
    let request = request.into_inner();

    if request.course_ids.is_empty() {
        return Err(AppError::Validation(NO_COURSES.to_string()).into());
    }

    let result = purchase_courses(db, user.id, &request.course_ids, request.is_trial).await?;
    tracing::info!(
        email = %user.email,
        created = result.created.len(),
        rejected = result.errors.len(),
        "Bulk purchase processed"
    );

    Ok(Custom(Status::Created, Json(result)))
}

#[post("/compras", data = "<input>")]
pub async fn create_purchase_route(
    input: Json<PurchaseInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<Purchase>>, ApiError> {
    user.require_permission(Permission::Add(Resource::Purchase))?;
    let input = input.validate_custom()?;

    let (Some(student_id), Some(course_id)) = (input.student_id, input.course_id) else {
        return Err(missing_fields_error(&input.missing_for_create()));
    };

    let purchase =
        create_purchase(db, student_id, course_id, input.is_trial.unwrap_or(false)).await?;

    Ok(Custom(Status::Created, Json(purchase)))
}

#[put("/compras/<id>", data = "<input>")]
pub async fn replace_purchase(
    id: i64,
    input: Json<PurchaseInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Purchase>, ApiError> {
    user.require_permission(Permission::Change(Resource::Purchase))?;
    let input = input.validate_custom()?;

    let missing = input.missing_for_create();
    if !missing.is_empty() {
        return Err(missing_fields_error(&missing));
    }

    Ok(Json(update_purchase(db, id, &PurchaseChanges::from(input)).await?))
}

#[patch("/compras/<id>", data = "<input>")]
pub async fn patch_purchase(
    id: i64,
    input: Json<PurchaseInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Purchase>, ApiError> {
    user.require_permission(Permission::Change(Resource::Purchase))?;
    let input = input.validate_custom()?;

    Ok(Json(update_purchase(db, id, &PurchaseChanges::from(input)).await?))
}

#[delete("/compras/<id>")]
pub async fn delete_purchase_route(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, ApiError> {
    user.require_permission(Permission::Delete(Resource::Purchase))?;

    delete_purchase(db, id).await?;

    Ok(Status::NoContent)
}

pub fn routes() -> Vec<Route> {
    routes![
        list_purchases,
        get_purchase_by_id,
        buy_courses,
        create_purchase_route,
        replace_purchase,
        patch_purchase,
        delete_purchase_route
    ]
}
