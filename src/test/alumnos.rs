#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Status};
    use serde_json::json;

    use crate::db::get_user;
    use crate::test::test_utils::{
        auth_header, body_json, create_standard_test_db, login_test_user, setup_test_client,
    };

    #[rocket::async_test]
    async fn test_public_student_registration() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let response = client
            .post("/api/alumnos")
            .header(ContentType::JSON)
            .body(
                json!({
                    "full_name": "Lucía Gómez",
                    "email": "lucia@test.com",
                    "secondary_email": "lucia.alt@test.com",
                    "password": "secreto123"
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Created);
        let body = body_json(response).await;
        assert_eq!(body["full_name"], "Lucía Gómez");
        assert_eq!(body["role"], "Alumno");
        assert_eq!(body["photo_profile"], "alumnos_fotos/profile_icon.png");
        assert_eq!(body["registration_number"].as_str().map(str::len), Some(6));

        let response = client
            .post("/api/alumnos")
            .header(ContentType::JSON)
            .body(json!({ "full_name": "Sin Datos" }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        let body = body_json(response).await;
        assert_eq!(body["errors"]["email"][0], "Este campo es requerido.");
        assert_eq!(body["errors"]["password"][0], "Este campo es requerido.");
    }

    #[rocket::async_test]
    async fn test_registration_rejects_taken_secondary_email() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let first = json!({
            "full_name": "Primero",
            "email": "primero@test.com",
            "secondary_email": "compartido@test.com",
            "password": "secreto123"
        });
        let response = client
            .post("/api/alumnos")
            .header(ContentType::JSON)
            .body(first.to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);

        let response = client
            .post("/api/alumnos")
            .header(ContentType::JSON)
            .body(
                json!({
                    "full_name": "Segundo",
                    "email": "compartido@test.com",
                    "secondary_email": "segundo.alt@test.com",
                    "password": "secreto123"
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        let body = body_json(response).await;
        assert_eq!(body["errors"]["non_field_errors"][0], "El email ya está registrado");
    }

    #[rocket::async_test]
    async fn test_own_profile_update_rehashes_password() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let student = auth_header(&client, "alumno@test.com").await;

        let response = client
            .get("/api/alumnos/mi_perfil")
            .header(student.clone())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body["email"], "alumno@test.com");

        let response = client
            .patch("/api/alumnos/actualizar_mi_perfil")
            .header(ContentType::JSON)
            .header(student)
            .body(json!({ "full_name": "Alumno Renombrado", "password": "nueva-clave" }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Perfil actualizado correctamente");
        assert_eq!(body["data"]["full_name"], "Alumno Renombrado");

        let user_id = test_db.user_id("alumno@test.com").expect("student id");
        let user = get_user(&test_db.pool, user_id).await.expect("student");
        assert_eq!(user.full_name, "Alumno Renombrado");

        let response = client
            .post("/api/token")
            .header(ContentType::JSON)
            .body(json!({ "email": "alumno@test.com", "password": "password123" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        login_test_user(&client, "alumno@test.com", "nueva-clave").await;
    }

    #[rocket::async_test]
    async fn test_admin_manages_students_by_registration_number() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let user_id = test_db.user_id("alumno@test.com").expect("student id");
        let registration_number = get_user(&test_db.pool, user_id)
            .await
            .expect("student")
            .registration_number;
        let path = format!("/api/alumnos/{}", registration_number);

        let admin = auth_header(&client, "admin@test.com").await;

        let response = client.get("/api/alumnos").header(admin.clone()).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(2));

        let response = client.get(path.as_str()).header(admin.clone()).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(body_json(response).await["email"], "alumno@test.com");

        let response = client
            .put(path.as_str())
            .header(ContentType::JSON)
            .header(admin.clone())
            .body(json!({ "full_name": "Solo Nombre" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        let body = body_json(response).await;
        assert_eq!(body["errors"]["email"][0], "Este campo es requerido.");
        assert_eq!(body["errors"]["secondary_email"][0], "Este campo es requerido.");

        let response = client
            .put(path.as_str())
            .header(ContentType::JSON)
            .header(admin.clone())
            .body(
                json!({
                    "full_name": "Alumno Editado",
                    "email": "alumno@test.com",
                    "secondary_email": "alumno.alt@test.com"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body["full_name"], "Alumno Editado");
        assert_eq!(body["secondary_email"], "alumno.alt@test.com");

        let response = client.delete(path.as_str()).header(admin.clone()).dispatch().await;
        assert_eq!(response.status(), Status::NoContent);

        let response = client.get(path.as_str()).header(admin).dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_student_endpoints_reject_non_admins() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let user_id = test_db.user_id("otro.alumno@test.com").expect("student id");
        let registration_number = get_user(&test_db.pool, user_id)
            .await
            .expect("student")
            .registration_number;

        let teacher = auth_header(&client, "docente@test.com").await;

        let response = client.get("/api/alumnos").header(teacher.clone()).dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);

        let response = client
            .delete(format!("/api/alumnos/{}", registration_number))
            .header(teacher)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
    }

    #[rocket::async_test]
    async fn test_non_numeric_registration_number_does_not_match() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let admin = auth_header(&client, "admin@test.com").await;
        let response = client.get("/api/alumnos/abc123").header(admin).dispatch().await;

        // the route forwards, so no handler runs
        assert!([Status::NotFound, Status::UnprocessableEntity].contains(&response.status()));
        assert_eq!(body_json(response).await["status"], "error");
    }

    #[rocket::async_test]
    async fn test_profile_update_rejects_blank_name() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let student = auth_header(&client, "alumno@test.com").await;
        let response = client
            .patch("/api/alumnos/actualizar_mi_perfil")
            .header(ContentType::JSON)
            .header(student)
            .body(json!({ "full_name": "   " }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(
            body_json(response).await["errors"]["full_name"][0],
            "Este campo no puede estar en blanco."
        );

        let user_id = test_db.user_id("alumno@test.com").expect("student id");
        let user = get_user(&test_db.pool, user_id).await.expect("student");
        assert_eq!(user.full_name, "Alumno Uno");
    }

    #[rocket::async_test]
    async fn test_secondary_email_cannot_reuse_another_account_address() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let response = client
            .post("/api/alumnos")
            .header(ContentType::JSON)
            .body(
                json!({
                    "full_name": "Tercero",
                    "email": "tercero@test.com",
                    "secondary_email": "alumno@test.com",
                    "password": "secreto123"
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(
            body_json(response).await["errors"]["non_field_errors"][0],
            "El email ya está registrado"
        );

        let student = auth_header(&client, "otro.alumno@test.com").await;
        let response = client
            .patch("/api/alumnos/actualizar_mi_perfil")
            .header(ContentType::JSON)
            .header(student)
            .body(json!({ "secondary_email": "docente@test.com" }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(
            body_json(response).await["errors"]["non_field_errors"][0],
            "El email ya está registrado"
        );
    }
}
