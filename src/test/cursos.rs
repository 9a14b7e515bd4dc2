#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Status};
    use serde_json::{json, Value};

    use crate::db::{get_course, get_teacher};
    use crate::test::test_utils::{auth_header, body_json, create_standard_test_db, setup_test_client};

    fn lessons_of(section: &Value) -> &Vec<Value> {
        section["lessons"].as_array().expect("lessons")
    }

    #[rocket::async_test]
    async fn test_public_course_listings() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let response = client.get("/api/cursos").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(2));
        assert_eq!(body[0]["name"], "Rust desde cero");
        assert_eq!(body[0]["price"], "49.99");
        assert_eq!(body[0]["area_name"], "Programación");
        assert_eq!(body[0]["teacher_name"], "Docente Uno");

        let area_id = test_db.area_id("Programación").expect("area id");
        let response = client
            .get(format!("/api/cursos/por_area/{}", area_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(2));

        let teacher_id = test_db.teacher_id("docente@test.com").expect("teacher id");
        let teacher = get_teacher(&test_db.pool, teacher_id).await.expect("teacher");
        let response = client
            .get(format!("/api/cursos/docente/{}", teacher.registration_number))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body["teacher"]["full_name"], "Docente Uno");
        assert_eq!(body["teacher"]["registration_number"], teacher.registration_number);
        assert_eq!(body["courses"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["courses"][0]["name"], "Rust desde cero");

        let response = client.get("/api/cursos/docente/000000").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_public_detail_only_previews_first_section() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let course_id = test_db.course_id("Rust desde cero").expect("course id");
        let response = client
            .get(format!("/api/cursos/{}/detalle", course_id))
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body["name"], "Rust desde cero");

        let sections = body["sections"].as_array().expect("sections");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0]["name"], "Introducción");

        let first = &lessons_of(&sections[0])[0];
        assert_eq!(first["material"], "https://cdn.test/instalacion.mp4");
        assert_eq!(first["material_kind"], "video");

        let hidden = &lessons_of(&sections[1])[0];
        assert_eq!(hidden["name"], "Préstamos");
        assert!(hidden["material"].is_null());
        assert!(hidden["material_kind"].is_null());
    }

    #[rocket::async_test]
    async fn test_teacher_detail_is_owner_only() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let course_id = test_db.course_id("Rust desde cero").expect("course id");
        let path = format!("/api/cursos/{}/detalle_docente", course_id);

        let owner = auth_header(&client, "docente@test.com").await;
        let response = client.get(path.as_str()).header(owner).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        let sections = body["sections"].as_array().expect("sections");
        assert_eq!(
            lessons_of(&sections[1])[0]["material"],
            "https://cdn.test/prestamos.pdf"
        );
        assert_eq!(lessons_of(&sections[1])[0]["material_kind"], "document");

        let other = auth_header(&client, "otro.docente@test.com").await;
        let response = client.get(path.as_str()).header(other).dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);
        assert_eq!(
            body_json(response).await["errors"]["permission"][0],
            "No puedes acceder a cursos de otros docentes."
        );

        let admin = auth_header(&client, "admin@test.com").await;
        let response = client.get(path.as_str()).header(admin).dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let student = auth_header(&client, "alumno@test.com").await;
        let response = client.get(path.as_str()).header(student).dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);
    }

    #[rocket::async_test]
    async fn test_my_courses() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let teacher = auth_header(&client, "otro.docente@test.com").await;
        let response = client.get("/api/cursos/mis_cursos").header(teacher).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["name"], "Python avanzado");

        let student = auth_header(&client, "alumno@test.com").await;
        let response = client.get("/api/cursos/mis_cursos").header(student).dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);
    }

    #[rocket::async_test]
    async fn test_teacher_creates_own_course() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let area_id = test_db.area_id("Programación").expect("area id");
        let teacher_id = test_db.teacher_id("docente@test.com").expect("teacher id");
        let other_teacher_id = test_db.teacher_id("otro.docente@test.com").expect("teacher id");

        let teacher = auth_header(&client, "docente@test.com").await;
        let response = client
            .post("/api/cursos")
            .header(ContentType::JSON)
            .header(teacher)
            .body(
                json!({
                    "name": "Rust async",
                    "area": area_id,
                    "teacher": other_teacher_id,
                    "price": "19.90",
                    "certifiable": true
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Created);
        let body = body_json(response).await;
        assert_eq!(body["teacher_id"], teacher_id);
        assert_eq!(body["price"], "19.90");
        assert_eq!(body["certifiable"], true);
        assert_eq!(body["trial_mode"], true);
    }

    #[rocket::async_test]
    async fn test_course_creation_rules() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let area_id = test_db.area_id("Programación").expect("area id");
        let teacher_id = test_db.teacher_id("otro.docente@test.com").expect("teacher id");

        let student = auth_header(&client, "alumno@test.com").await;
        let response = client
            .post("/api/cursos")
            .header(ContentType::JSON)
            .header(student)
            .body(json!({ "name": "Nope", "area": area_id }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        let admin = auth_header(&client, "admin@test.com").await;
        let response = client
            .post("/api/cursos")
            .header(ContentType::JSON)
            .header(admin.clone())
            .body(json!({ "name": "Sin docente", "area": area_id }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(
            body_json(response).await["errors"]["teacher_id"][0],
            "Este campo es requerido."
        );

        let response = client
            .post("/api/cursos")
            .header(ContentType::JSON)
            .header(admin.clone())
            .body(
                json!({ "name": "Precio inválido", "area": area_id, "teacher": teacher_id, "price": "12.345" })
                    .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = client
            .post("/api/cursos")
            .header(ContentType::JSON)
            .header(admin.clone())
            .body(json!({ "name": "Área fantasma", "area": 999, "teacher": teacher_id }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = client
            .post("/api/cursos")
            .header(ContentType::JSON)
            .header(admin)
            .body(
                json!({ "name": "Curso asignado", "area": area_id, "teacher": teacher_id, "price": 25 })
                    .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        let body = body_json(response).await;
        assert_eq!(body["teacher_id"], teacher_id);
        assert_eq!(body["price"], "25.00");
    }

    #[rocket::async_test]
    async fn test_course_ownership_on_update_and_delete() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let course_id = test_db.course_id("Rust desde cero").expect("course id");
        let path = format!("/api/cursos/{}", course_id);

        let other = auth_header(&client, "otro.docente@test.com").await;
        let response = client
            .patch(path.as_str())
            .header(ContentType::JSON)
            .header(other.clone())
            .body(json!({ "name": "Secuestrado" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
        assert_eq!(
            body_json(response).await["errors"]["permission"][0],
            "No puedes editar cursos de otros docentes."
        );

        let response = client.delete(path.as_str()).header(other).dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);
        assert_eq!(
            body_json(response).await["errors"]["permission"][0],
            "No puedes eliminar cursos de otros docentes."
        );

        let owner = auth_header(&client, "docente@test.com").await;
        let response = client
            .put(path.as_str())
            .header(ContentType::JSON)
            .header(owner.clone())
            .body(json!({ "description": "Falta el nombre" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = client
            .patch(path.as_str())
            .header(ContentType::JSON)
            .header(owner.clone())
            .body(json!({ "price": 10.5 }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body["price"], "10.50");
        assert_eq!(body["name"], "Rust desde cero");

        let response = client.get(path.as_str()).header(owner.clone()).dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.delete(path.as_str()).header(owner.clone()).dispatch().await;
        assert_eq!(response.status(), Status::NoContent);

        let response = client.get(path.as_str()).header(owner).dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_admin_can_edit_any_course() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let course_id = test_db.course_id("Python avanzado").expect("course id");
        let new_teacher = test_db.teacher_id("docente@test.com").expect("teacher id");

        let admin = auth_header(&client, "admin@test.com").await;
        let response = client
            .patch(format!("/api/cursos/{}", course_id))
            .header(ContentType::JSON)
            .header(admin)
            .body(json!({ "teacher": new_teacher, "trial_mode": false }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body["teacher_id"], new_teacher);
        assert_eq!(body["trial_mode"], false);
    }

    #[rocket::async_test]
    async fn test_course_summary_requires_authentication() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let course_id = test_db.course_id("Rust desde cero").expect("course id");
        let response = client.get(format!("/api/cursos/{}", course_id)).dispatch().await;

        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn test_patch_rejects_blank_course_name() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let course_id = test_db.course_id("Rust desde cero").expect("course id");
        let owner = auth_header(&client, "docente@test.com").await;

        let response = client
            .patch(format!("/api/cursos/{}", course_id))
            .header(ContentType::JSON)
            .header(owner)
            .body(json!({ "name": "   " }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(
            body_json(response).await["errors"]["name"][0],
            "Este campo no puede estar en blanco."
        );

        let course = get_course(&test_db.pool, course_id).await.expect("course");
        assert_eq!(course.name, "Rust desde cero");
    }
}
