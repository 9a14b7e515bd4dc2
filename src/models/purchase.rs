use chrono::NaiveDateTime;
use serde::Serialize;

use super::{Course, CourseDetail};

#[derive(Debug, Clone, Serialize)]
pub struct Purchase {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub course_id: i64,
    pub course_name: String,
    pub is_trial: bool,
    pub purchased_at: NaiveDateTime,
    pub course_detail: Course,
}

#[derive(sqlx::FromRow, Clone, Debug)]
pub struct DbPurchase {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub course_id: i64,
    pub course_name: String,
    pub is_trial: bool,
    pub purchased_at: NaiveDateTime,
}

impl DbPurchase {
    pub fn with_course(self, course: Course) -> Purchase {
        Purchase {
            id: self.id,
            student_id: self.student_id,
            student_name: self.student_name,
            course_id: self.course_id,
            course_name: self.course_name,
            is_trial: self.is_trial,
            purchased_at: self.purchased_at,
            course_detail: course,
        }
    }
}

/// A single purchase; full purchases also carry every course material.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseDetail {
    #[serde(flatten)]
    pub purchase: Purchase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_full_detail: Option<CourseDetail>,
}

/// Outcome of a bulk purchase: what was created and why the rest was not.
#[derive(Debug, Clone, Serialize)]
pub struct BulkPurchaseResult {
    pub created: Vec<Purchase>,
    pub errors: Vec<String>,
}
