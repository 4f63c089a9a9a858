//! Calculation use case tests against the in-memory repository

use chrono::{Datelike, Utc};
use rust_decimal_macros::dec;
use std::sync::Arc;

use core_kernel::CalculationId;
use domain_rating::{
    AddressData, CalculationInput, CalculationRepository, CalculationService,
    InMemoryCalculationRepository, PageRequest, RatingConfig, RatingError,
};

fn input() -> CalculationInput {
    CalculationInput {
        make: "Chevrolet".into(),
        model: "Onix".into(),
        year: Utc::now().year() - 5,
        value: dec!(50000.00),
        deductible_percentage: dec!(0.10),
        broker_fee: dec!(100.00),
        registration_address: None,
    }
}

fn address(state: &str) -> AddressData {
    AddressData {
        street: "Rua XV de Novembro".into(),
        number: "42".into(),
        complement: None,
        neighborhood: "Centro".into(),
        city: "Curitiba".into(),
        state: state.into(),
        postal_code: "80020310".into(),
        country: None,
    }
}

fn service() -> (CalculationService, InMemoryCalculationRepository) {
    let repository = InMemoryCalculationRepository::new();
    let config = RatingConfig::default().with_gis_rate("SP", dec!(0.02));
    let service = CalculationService::new(Arc::new(repository.clone()), Arc::new(config));
    (service, repository)
}

mod create {
    use super::*;

    #[tokio::test]
    async fn test_create_persists_calculation() {
        let (service, repository) = service();
        let created = service.create_calculation(input()).await.unwrap();

        assert_eq!(created.calculated_premium().amount(), dec!(2350.00));
        assert_eq!(created.policy_limit().amount(), dec!(49750.00));
        assert_eq!(created.created_at(), created.updated_at());
        assert!(repository.raw(created.id()).await.is_some());
    }

    #[tokio::test]
    async fn test_retried_create_is_duplicate() {
        let (service, _) = service();
        let id = CalculationId::new();
        service.create_calculation_with_id(id, input()).await.unwrap();

        let err = service.create_calculation_with_id(id, input()).await.unwrap_err();
        assert!(matches!(err, RatingError::Duplicate(dup) if dup == id));
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_repository() {
        let (service, repository) = service();
        let mut bad = input();
        bad.make = "   ".into();

        let err = service.create_calculation(bad).await.unwrap_err();
        assert!(err.is_validation());
        assert!(service.list_calculations(PageRequest::default()).await.unwrap().is_empty());
        assert_eq!(repository.read_count(), 1);
    }

    #[tokio::test]
    async fn test_repository_outage_is_persistence_error() {
        let (service, repository) = service();
        repository.set_unavailable(true);

        let err = service.create_calculation(input()).await.unwrap_err();
        assert!(matches!(err, RatingError::Persistence(_)));
        assert_eq!(err.to_string(), "Persistence failure");
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let (service, _) = service();
        let err = service.get_calculation(CalculationId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_is_paginated_newest_first() {
        let (service, _) = service();
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(service.create_calculation(input()).await.unwrap().id());
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let first_page = service.list_calculations(PageRequest::new(0, 2).unwrap()).await.unwrap();
        let second_page = service.list_calculations(PageRequest::new(2, 2).unwrap()).await.unwrap();

        assert_eq!(first_page.len(), 2);
        assert_eq!(first_page[0].id(), ids[2]);
        assert_eq!(first_page[1].id(), ids[1]);
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].id(), ids[0]);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn test_update_recomputes_everything() {
        let (service, _) = service();
        let created = service.create_calculation(input()).await.unwrap();

        let mut replacement = input();
        replacement.registration_address = Some(address("sp"));
        let updated = service.update_calculation(created.id(), replacement).await.unwrap();

        assert_eq!(updated.id(), created.id());
        assert_eq!(updated.created_at(), created.created_at());
        assert_eq!(updated.applied_rate().value(), dec!(0.07));
        assert_eq!(updated.registration_address().unwrap().state(), "SP");

        let fetched = service.get_calculation(created.id()).await.unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_update_drops_address_when_absent() {
        let (service, _) = service();
        let mut with_address = input();
        with_address.registration_address = Some(address("PR"));
        let created = service.create_calculation(with_address).await.unwrap();

        let updated = service.update_calculation(created.id(), input()).await.unwrap();
        assert!(updated.registration_address().is_none());
        assert!(updated.gis_adjustment().is_none());
    }

    #[tokio::test]
    async fn test_update_deleted_is_not_found() {
        let (service, _) = service();
        let created = service.create_calculation(input()).await.unwrap();
        service.delete_calculation(created.id()).await.unwrap();

        let err = service.update_calculation(created.id(), input()).await.unwrap_err();
        assert!(err.is_not_found());
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn test_soft_delete_is_idempotent() {
        let (service, repository) = service();
        let created = service.create_calculation(input()).await.unwrap();

        service.delete_calculation(created.id()).await.unwrap();
        service.delete_calculation(created.id()).await.unwrap();

        assert!(service.get_calculation(created.id()).await.unwrap_err().is_not_found());
        assert!(service.list_calculations(PageRequest::default()).await.unwrap().is_empty());
        assert!(repository.raw(created.id()).await.unwrap().is_deleted());
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let (service, _) = service();
        let err = service.delete_calculation(CalculationId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_purge_removes_deleted_row() {
        let (service, repository) = service();
        let created = service.create_calculation(input()).await.unwrap();
        service.delete_calculation(created.id()).await.unwrap();

        assert!(repository.purge(created.id()).await.unwrap());
        assert!(repository.raw(created.id()).await.is_none());
        assert!(!repository.purge(created.id()).await.unwrap());
    }
}
