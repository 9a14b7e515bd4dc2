use serde::Serialize;

use super::MaterialKind;

#[derive(Debug, Clone, Serialize)]
pub struct Lesson {
    pub id: i64,
    pub section_id: i64,
    pub name: String,
    pub material: Option<String>,
    pub material_kind: Option<MaterialKind>,
}

#[derive(sqlx::FromRow, Clone, Debug)]
pub struct DbLesson {
    pub id: i64,
    pub section_id: i64,
    pub name: String,
    pub material: Option<String>,
}

impl Lesson {
    pub fn new(id: i64, section_id: i64, name: String, material: Option<String>) -> Self {
        let material = material.filter(|link| !link.trim().is_empty());
        let material_kind = material.as_deref().map(MaterialKind::from_link);

        Self {
            id,
            section_id,
            name,
            material,
            material_kind,
        }
    }

    pub fn without_material(self) -> Self {
        Self {
            material: None,
            material_kind: None,
            ..self
        }
    }
}

impl From<DbLesson> for Lesson {
    fn from(lesson: DbLesson) -> Self {
        Lesson::new(lesson.id, lesson.section_id, lesson.name, lesson.material)
    }
}
