use ferrous_ioc::DiError;
use std::error::Error as _;

#[test]
fn test_circular_display_joins_path() {
    let err = DiError::Circular(vec!["A".to_string(), "B".to_string(), "A".to_string()]);
    assert_eq!(err.to_string(), "Circular dependency: A -> B -> A");
}

#[test]
fn test_depth_and_mismatch_display() {
    assert_eq!(DiError::DepthExceeded(1024).to_string(), "Max depth 1024 exceeded");
    assert_eq!(DiError::TypeMismatch("u32".to_string()).to_string(), "Type mismatch for: u32");
    assert_eq!(DiError::NotFound("Db".to_string()).to_string(), "can't find Db");
}

#[test]
fn test_ambiguity_lists_candidates() {
    let err = DiError::AmbiguousImplementation {
        service: "dyn Shape".to_string(),
        candidates: vec!["Square".to_string(), "Triangle".to_string()],
    };
    let message = err.to_string();
    assert!(message.contains("dyn Shape"));
    assert!(message.contains("Square; Triangle"));
}

#[test]
fn test_factory_helper() {
    match DiError::factory("Mailer", "smtp unreachable") {
        DiError::Factory { service, message } => {
            assert_eq!(service, "Mailer");
            assert_eq!(message, "smtp unreachable");
        }
        other => panic!("unexpected variant {:?}", other),
    }
}

#[test]
fn test_disposal_exposes_source() {
    let err = DiError::Disposal {
        service: "Pool".to_string(),
        source: "socket closed".into(),
    };
    assert!(err.to_string().contains("Pool"));
    assert_eq!(err.source().unwrap().to_string(), "socket closed");
}

#[test]
fn test_categories_are_disjoint() {
    let samples = vec![
        DiError::DuplicateRegistration("a".into()),
        DiError::NoConstructor("a".into()),
        DiError::ConstructorMismatch {
            service: "a".into(),
            params: "b".into(),
        },
        DiError::AbstractRegistration("a".into()),
        DiError::NotAbstract("a".into()),
        DiError::NotAssignable {
            concrete: "a".into(),
            service: "b".into(),
        },
        DiError::UnknownType("a".into()),
        DiError::DuplicateContainerName("a".into()),
        DiError::NotRegistered("a".into()),
        DiError::NoImplementation("a".into()),
        DiError::AmbiguousImplementation {
            service: "a".into(),
            candidates: vec![],
        },
        DiError::AmbiguousConstructor("a".into()),
        DiError::EmptyCollection("a".into()),
        DiError::OpenGeneric("a".into()),
        DiError::GenericClosure {
            definition: "a".into(),
            arguments: "b".into(),
        },
        DiError::Circular(vec![]),
        DiError::DepthExceeded(1),
        DiError::TypeMismatch("a".into()),
        DiError::factory("a", "b"),
        DiError::NotFound("a".into()),
        DiError::ContainerNotFound("a".into()),
        DiError::Disposal {
            service: "a".into(),
            source: "b".into(),
        },
        DiError::Config("a".into()),
        DiError::Internal("a".into()),
    ];

    for err in &samples {
        let categories = [
            err.is_register_error(),
            err.is_resolve_error(),
            err.is_not_found(),
            err.is_fatal(),
        ];
        assert!(
            categories.iter().filter(|&&c| c).count() <= 1,
            "{:?} falls into several categories",
            err
        );
    }

    assert!(samples[0].is_register_error());
    assert!(samples[8].is_resolve_error());
    assert!(samples[19].is_not_found());
    assert!(samples[21].is_fatal());
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync + 'static>() {}
    assert_send_sync::<DiError>();
}
