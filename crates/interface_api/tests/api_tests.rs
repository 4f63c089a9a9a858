//! HTTP surface tests over the in-memory repository and cache

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Datelike, Utc};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use domain_rating::{CalculationService, InMemoryCalculationRepository, RatingConfig};
use infra_cache::{CacheSettings, CachedCalculationRepository, InMemoryCacheStore};
use interface_api::dto::calculation::CalculationResponse;
use interface_api::error::ErrorResponse;
use interface_api::{create_router, AppState};
use test_utils::ConfigFixtures;

struct TestApp {
    server: TestServer,
    repository: InMemoryCalculationRepository,
    cache: InMemoryCacheStore,
}

fn app() -> TestApp {
    app_with(ConfigFixtures::reference())
}

fn app_with(config: Arc<RatingConfig>) -> TestApp {
    let repository = InMemoryCalculationRepository::new();
    let cache = InMemoryCacheStore::default();
    let cached = CachedCalculationRepository::new(
        Arc::new(repository.clone()),
        Arc::new(cache.clone()),
        CacheSettings::default(),
    );
    let service = CalculationService::new(Arc::new(cached), config);
    let state = AppState::new(service, Arc::new(repository.clone()), Some(Arc::new(cache.clone())));

    TestApp {
        server: TestServer::new(create_router(state)).unwrap(),
        repository,
        cache,
    }
}

fn reference_body() -> Value {
    json!({
        "make": "Toyota",
        "model": "Corolla",
        "year": Utc::now().year() - 5,
        "value": 50000,
        "deductible_percentage": 0.1,
        "broker_fee": 100
    })
}

fn sao_paulo() -> Value {
    json!({
        "street": "Avenida Paulista",
        "number": "1578",
        "neighborhood": "Bela Vista",
        "city": "São Paulo",
        "state": "sp",
        "postal_code": "01310-200"
    })
}

async fn create(app: &TestApp, body: &Value) -> CalculationResponse {
    let response = app.server.post("/api/v1/calculations").json(body).await;
    response.assert_status(StatusCode::CREATED);
    response.json::<CalculationResponse>()
}

mod create {
    use super::*;

    #[tokio::test]
    async fn test_reference_premium() {
        let app = app();
        let created = create(&app, &reference_body()).await;

        assert_eq!(created.applied_rate, dec!(0.05));
        assert_eq!(created.calculated_premium, dec!(2350.00));
        assert_eq!(created.deductible_value, dec!(250.00));
        assert_eq!(created.policy_limit, dec!(49750.00));
        assert_eq!(created.gis_adjustment, None);
        assert!(created.registration_location.is_none());
    }

    #[tokio::test]
    async fn test_regional_adjustment_applies_with_address() {
        let app = app();
        let mut body = reference_body();
        body["registration_location"] = sao_paulo();

        let created = create(&app, &body).await;

        assert_eq!(created.applied_rate, dec!(0.07));
        assert_eq!(created.calculated_premium, dec!(3250.00));
        assert_eq!(created.policy_limit, dec!(49650.00));
        assert_eq!(created.gis_adjustment, Some(dec!(0.02)));
        let address = created.registration_location.unwrap();
        assert_eq!(address.state, "SP");
        assert_eq!(address.postal_code, "01310200");
        assert_eq!(address.country.as_deref(), Some("BR"));
    }

    #[tokio::test]
    async fn test_shape_errors_name_the_field() {
        let app = app();
        let mut body = reference_body();
        body["year"] = json!(1899);

        let response = app.server.post("/api/v1/calculations").json(&body).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let error = response.json::<ErrorResponse>();
        assert_eq!(error.error, "validation_error");
        assert_eq!(error.field.as_deref(), Some("year"));
    }

    #[tokio::test]
    async fn test_domain_errors_name_the_field() {
        let app = app();
        for (field, value) in [
            ("value", json!(-1)),
            ("deductible_percentage", json!(1.5)),
            ("broker_fee", json!(20000)),
        ] {
            let mut body = reference_body();
            body[field] = value;

            let response = app.server.post("/api/v1/calculations").json(&body).await;

            response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(response.json::<ErrorResponse>().field.as_deref(), Some(field));
        }
        let listed = app
            .server
            .get("/api/v1/calculations")
            .await
            .json::<Vec<CalculationResponse>>();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_formula_failure_has_its_own_error_type() {
        let vars = HashMap::from([("COVERAGE_PERCENTAGE".to_string(), "0".to_string())]);
        let app = app_with(Arc::new(RatingConfig::load(None, vars).unwrap()));

        let response = app.server.post("/api/v1/calculations").json(&reference_body()).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body = response.json::<ErrorResponse>();
        assert_eq!(body.error, "calculation_error");
        assert!(body.field.is_none());
    }

    #[tokio::test]
    async fn test_nested_address_error_path() {
        let app = app();
        let mut body = reference_body();
        let mut address = sao_paulo();
        address["state"] = json!("SPX");
        body["registration_location"] = address;

        let response = app.server.post("/api/v1/calculations").json(&body).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.json::<ErrorResponse>().field.as_deref(),
            Some("registration_location.state")
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = app();
        let response = app
            .server
            .post("/api/v1/calculations")
            .json(&json!({ "make": "Toyota" }))
            .await;
        assert!(response.status_code().is_client_error());
        assert_eq!(response.json::<ErrorResponse>().error, "bad_request");
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn test_get_created_calculation() {
        let app = app();
        let created = create(&app, &reference_body()).await;

        let response = app.server.get(&format!("/api/v1/calculations/{}", created.id)).await;

        response.assert_status_ok();
        assert_eq!(response.json::<CalculationResponse>(), created);
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let app = app();
        let response = app
            .server
            .get(&format!("/api/v1/calculations/{}", uuid::Uuid::new_v4()))
            .await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_list_paginates_newest_first() {
        let app = app();
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(create(&app, &reference_body()).await.id);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let response = app
            .server
            .get("/api/v1/calculations")
            .add_query_param("limit", 2)
            .await;
        response.assert_status_ok();
        let page = response.json::<Vec<CalculationResponse>>();
        assert_eq!(page.iter().map(|c| c.id).collect::<Vec<_>>(), vec![ids[2], ids[1]]);

        let rest = app
            .server
            .get("/api/v1/calculations")
            .add_query_param("offset", 2)
            .add_query_param("limit", 2)
            .await
            .json::<Vec<CalculationResponse>>();
        assert_eq!(rest.len(), 1);
    }

    #[tokio::test]
    async fn test_list_rejects_out_of_range_limit() {
        let app = app();
        for limit in [0, 101] {
            let response = app
                .server
                .get("/api/v1/calculations")
                .add_query_param("limit", limit)
                .await;
            response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(response.json::<ErrorResponse>().field.as_deref(), Some("limit"));
        }
    }

    #[tokio::test]
    async fn test_storage_failure_is_generic() {
        let app = app();
        app.repository.set_unavailable(true);

        let response = app.server.get("/api/v1/calculations").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let error = response.json::<ErrorResponse>();
        assert_eq!(error.message, "Internal server error");
        assert!(!error.message.contains("in-memory"));
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn test_update_recalculates() {
        let app = app();
        let created = create(&app, &reference_body()).await;
        let path = format!("/api/v1/calculations/{}", created.id);
        app.server.get(&path).await.assert_status_ok();

        let mut body = reference_body();
        body["registration_location"] = sao_paulo();
        let response = app.server.put(&path).json(&body).await;

        response.assert_status_ok();
        let updated = response.json::<CalculationResponse>();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.calculated_premium, dec!(3250.00));

        let fetched = app.server.get(&path).await.json::<CalculationResponse>();
        assert_eq!(fetched.calculated_premium, dec!(3250.00));
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let app = app();
        let response = app
            .server
            .put(&format!("/api/v1/calculations/{}", uuid::Uuid::new_v4()))
            .json(&reference_body())
            .await;
        response.assert_status_not_found();
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let app = app();
        let created = create(&app, &reference_body()).await;
        let path = format!("/api/v1/calculations/{}", created.id);

        app.server.delete(&path).await.assert_status(StatusCode::NO_CONTENT);
        app.server.delete(&path).await.assert_status(StatusCode::NO_CONTENT);
        app.server.get(&path).await.assert_status_not_found();

        let listed = app
            .server
            .get("/api/v1/calculations")
            .await
            .json::<Vec<CalculationResponse>>();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let app = app();
        app.server
            .delete(&format!("/api/v1/calculations/{}", uuid::Uuid::new_v4()))
            .await
            .assert_status_not_found();
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let app = app();
        let body = app.server.get("/health").await.json::<Value>();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_readiness_tracks_database_only() {
        let app = app();
        app.server.get("/health/ready").await.assert_status_ok();

        app.cache.set_unavailable(true);
        let response = app.server.get("/health/ready").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["cache"]["status"], "unhealthy");

        app.repository.set_unavailable(true);
        app.server
            .get("/health/ready")
            .await
            .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }
}
