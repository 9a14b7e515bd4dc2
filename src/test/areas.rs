#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Status};
    use serde_json::json;

    use crate::test::test_utils::{auth_header, body_json, create_standard_test_db, setup_test_client};

    #[rocket::async_test]
    async fn test_areas_are_public() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;

        let response = client.get("/api/areas").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body[0]["name"], "Programación");

        let area_id = test_db.area_id("Programación").expect("area id");
        let response = client.get(format!("/api/areas/{}", area_id)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.get("/api/areas/999").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_admin_area_crud() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let admin = auth_header(&client, "admin@test.com").await;

        let response = client
            .post("/api/areas")
            .header(ContentType::JSON)
            .header(admin.clone())
            .body(json!({ "name": "Diseño", "description": "Diseño gráfico" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        let body = body_json(response).await;
        assert_eq!(body["name"], "Diseño");
        let area_id = body["id"].as_i64().expect("id");

        let response = client
            .post("/api/areas")
            .header(ContentType::JSON)
            .header(admin.clone())
            .body(json!({ "name": "Diseño" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        let body = body_json(response).await;
        assert_eq!(
            body["errors"]["non_field_errors"][0],
            "Ya existe un área con ese nombre."
        );

        let response = client
            .put(format!("/api/areas/{}", area_id))
            .header(ContentType::JSON)
            .header(admin.clone())
            .body(json!({ "description": "Sin nombre" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(
            body_json(response).await["errors"]["name"][0],
            "Este campo es requerido."
        );

        let response = client
            .patch(format!("/api/areas/{}", area_id))
            .header(ContentType::JSON)
            .header(admin.clone())
            .body(json!({ "description": "Diseño UX" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body["name"], "Diseño");
        assert_eq!(body["description"], "Diseño UX");

        let response = client
            .delete(format!("/api/areas/{}", area_id))
            .header(admin)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NoContent);

        let response = client.get(format!("/api/areas/{}", area_id)).dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_area_writes_need_permission() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        for email in ["alumno@test.com", "docente@test.com"] {
            let header = auth_header(&client, email).await;
            let response = client
                .post("/api/areas")
                .header(ContentType::JSON)
                .header(header)
                .body(json!({ "name": "Marketing" }).to_string())
                .dispatch()
                .await;

            assert_eq!(response.status(), Status::Forbidden);
            let body = body_json(response).await;
            assert_eq!(
                body["errors"]["permission"][0],
                "No tienes permiso para realizar esta acción."
            );
        }

        let response = client
            .post("/api/areas")
            .header(ContentType::JSON)
            .body(json!({ "name": "Marketing" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
    }
}
