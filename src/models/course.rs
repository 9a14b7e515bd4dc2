use chrono::NaiveDateTime;
use serde::Serialize;

use super::{Lesson, Price, Section};

#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub certifiable: bool,
    pub price: Price,
    pub trial_mode: bool,
    pub area_id: i64,
    pub area_name: String,
    pub teacher_id: Option<i64>,
    pub teacher_name: Option<String>,
    pub teacher_registration_number: Option<String>,
    pub photo: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(sqlx::FromRow, Clone, Debug)]
pub struct DbCourse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub certifiable: bool,
    pub price_cents: i64,
    pub trial_mode: bool,
    pub area_id: i64,
    pub area_name: String,
    pub teacher_id: Option<i64>,
    pub teacher_name: Option<String>,
    pub teacher_registration_number: Option<String>,
    pub photo: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<DbCourse> for Course {
    fn from(course: DbCourse) -> Self {
        Self {
            id: course.id,
            name: course.name,
            description: course.description,
            certifiable: course.certifiable,
            // the column is only ever written from a validated Price
            price: Price::from_cents(course.price_cents).unwrap_or_default(),
            trial_mode: course.trial_mode,
            area_id: course.area_id,
            area_name: course.area_name,
            teacher_id: course.teacher_id,
            teacher_name: course.teacher_name,
            teacher_registration_number: course.teacher_registration_number,
            photo: course.photo,
            created_at: course.created_at,
        }
    }
}

/// Which lesson materials a course detail exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialAccess {
    /// Only lessons of the first section carry their material.
    Preview,
    Full,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionDetail {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub sections: Vec<SectionDetail>,
}

impl CourseDetail {
    /// Assembles the detail from sections ordered by id and their lessons.
    pub fn assemble(
        course: Course,
        sections: Vec<Section>,
        mut lessons: Vec<Lesson>,
        access: MaterialAccess,
    ) -> Self {
        let first_section_id = sections.iter().map(|s| s.id).min();

        let sections = sections
            .into_iter()
            .map(|section| {
                let visible = access == MaterialAccess::Full || Some(section.id) == first_section_id;
                let (own, rest): (Vec<Lesson>, Vec<Lesson>) = lessons
                    .drain(..)
                    .partition(|lesson| lesson.section_id == section.id);
                lessons = rest;

                SectionDetail {
                    id: section.id,
                    name: section.name,
                    description: section.description,
                    lessons: own
                        .into_iter()
                        .map(|lesson| if visible { lesson } else { lesson.without_material() })
                        .collect(),
                }
            })
            .collect();

        Self { course, sections }
    }
}
