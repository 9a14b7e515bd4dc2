#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Status};
    use serde_json::json;

    use crate::db::get_lesson;
    use crate::test::test_utils::{auth_header, body_json, create_standard_test_db, setup_test_client};

    #[rocket::async_test]
    async fn test_lesson_reads_need_view_permission() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let lesson_id = test_db.lesson_id("Instalación").expect("lesson id");

        let student = auth_header(&client, "alumno@test.com").await;
        let response = client.get("/api/lecciones").header(student.clone()).dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);

        let response = client
            .get(format!("/api/lecciones/{}", lesson_id))
            .header(student)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        let teacher = auth_header(&client, "otro.docente@test.com").await;
        let response = client.get("/api/lecciones").header(teacher.clone()).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(3));

        let response = client
            .get(format!("/api/lecciones/{}", lesson_id))
            .header(teacher)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body["name"], "Instalación");
        assert_eq!(body["material_kind"], "video");
    }

    #[rocket::async_test]
    async fn test_owner_manages_lessons() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let section_id = test_db.section_id("Ownership").expect("section id");
        let owner = auth_header(&client, "docente@test.com").await;

        let response = client
            .post("/api/lecciones")
            .header(ContentType::JSON)
            .header(owner.clone())
            .body(
                json!({
                    "section": section_id,
                    "name": "Lifetimes",
                    "material": "https://cdn.test/lifetimes.png"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        let body = body_json(response).await;
        assert_eq!(body["section_id"], section_id);
        assert_eq!(body["material_kind"], "image");
        let lesson_id = body["id"].as_i64().expect("id");

        let response = client
            .put(format!("/api/lecciones/{}", lesson_id))
            .header(ContentType::JSON)
            .header(owner.clone())
            .body(json!({ "material": "https://cdn.test/lifetimes.pdf" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        let body = body_json(response).await;
        assert_eq!(body["errors"]["section_id"][0], "Este campo es requerido.");
        assert_eq!(body["errors"]["name"][0], "Este campo es requerido.");

        let response = client
            .patch(format!("/api/lecciones/{}", lesson_id))
            .header(ContentType::JSON)
            .header(owner.clone())
            .body(json!({ "material": "https://cdn.test/lifetimes.pdf" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body["name"], "Lifetimes");
        assert_eq!(body["material_kind"], "document");

        let response = client
            .delete(format!("/api/lecciones/{}", lesson_id))
            .header(owner)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NoContent);

        assert!(get_lesson(&test_db.pool, lesson_id).await.is_err());
    }

    #[rocket::async_test]
    async fn test_lessons_of_other_teachers_are_off_limits() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let section_id = test_db.section_id("Introducción").expect("section id");
        let lesson_id = test_db.lesson_id("Instalación").expect("lesson id");
        let other = auth_header(&client, "otro.docente@test.com").await;

        let response = client
            .post("/api/lecciones")
            .header(ContentType::JSON)
            .header(other.clone())
            .body(json!({ "section": section_id, "name": "Intrusa" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
        assert_eq!(
            body_json(response).await["errors"]["permission"][0],
            "No puedes crear lecciones en cursos que no te pertenecen."
        );

        let response = client
            .patch(format!("/api/lecciones/{}", lesson_id))
            .header(ContentType::JSON)
            .header(other.clone())
            .body(json!({ "name": "Cambiada" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
        assert_eq!(
            body_json(response).await["errors"]["permission"][0],
            "No puedes editar lecciones de cursos que no te pertenecen."
        );

        let response = client
            .delete(format!("/api/lecciones/{}", lesson_id))
            .header(other)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
        assert_eq!(
            body_json(response).await["errors"]["permission"][0],
            "No puedes eliminar lecciones de cursos que no te pertenecen."
        );

        let admin = auth_header(&client, "admin@test.com").await;
        let response = client
            .patch(format!("/api/lecciones/{}", lesson_id))
            .header(ContentType::JSON)
            .header(admin)
            .body(json!({ "name": "Instalación de rustup" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn test_lesson_needs_existing_section() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let owner = auth_header(&client, "docente@test.com").await;
        let response = client
            .post("/api/lecciones")
            .header(ContentType::JSON)
            .header(owner.clone())
            .body(json!({ "section": 999, "name": "Perdida" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(
            body_json(response).await["errors"]["non_field_errors"][0],
            "Sección 999 no existe"
        );

        let lesson_id = test_db.lesson_id("Instalación").expect("lesson id");
        let foreign_section = test_db.section_id("Decoradores").expect("section id");
        let response = client
            .patch(format!("/api/lecciones/{}", lesson_id))
            .header(ContentType::JSON)
            .header(owner)
            .body(json!({ "section": foreign_section }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
    }
}
