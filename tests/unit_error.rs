/// Unit tests for DiError and DiResult types

use ferrous_container::{DiError, DiResult, Key, ValidationError, ValidationReport};
use std::error::Error;

#[test]
fn test_error_display_not_registered() {
    let error = DiError::NotRegistered(Key::of::<String>());
    let display_str = format!("{}", error);
    assert_eq!(display_str, "Service not registered: alloc::string::String");
    assert!(display_str.contains("not registered"));
}

#[test]
fn test_error_display_already_registered() {
    let error = DiError::AlreadyRegistered(Key::open("Repository", 1));
    assert_eq!(error.to_string(), "Service already registered: Repository<_>");
}

#[test]
fn test_error_display_type_mismatch() {
    let error = DiError::TypeMismatch("alloc::string::String");
    let display_str = format!("{}", error);
    assert_eq!(display_str, "Type mismatch for: alloc::string::String");
    assert!(display_str.contains("mismatch"));
}

#[test]
fn test_error_display_circular() {
    let a = Key::closed("Service", [Key::of::<u8>()]);
    let b = Key::closed("Service", [Key::of::<u16>()]);
    let error = DiError::CircularDependency(vec![a.clone(), b, a]);
    assert_eq!(
        error.to_string(),
        "Circular dependency: Service<u8> -> Service<u16> -> Service<u8>"
    );
}

#[test]
fn test_error_display_empty_circular_path() {
    let error = DiError::CircularDependency(Vec::new());
    assert_eq!(error.to_string(), "Circular dependency: ");
}

#[test]
fn test_error_display_arity_mismatch() {
    let error = DiError::ArityMismatch {
        service: Key::open("IPair", 2),
        service_arity: 2,
        implementation: Key::open("Single", 1),
        implementation_arity: 1,
    };
    let display_str = error.to_string();
    assert!(display_str.contains("IPair<_, _>"));
    assert!(display_str.contains("Single<_>"));
    assert!(display_str.contains("takes 2"));
    assert!(display_str.contains("takes 1"));
}

#[test]
fn test_error_display_ambiguous_constructor() {
    let error = DiError::AmbiguousConstructor {
        implementation: Key::of::<u32>(),
        parameters: 2,
        candidates: 3,
    };
    assert_eq!(
        error.to_string(),
        "Ambiguous constructor for u32: 3 constructors take 2 resolvable parameter(s)"
    );
}

#[test]
fn test_error_display_depth_exceeded() {
    let error = DiError::DepthExceeded(100);
    assert_eq!(error.to_string(), "Max depth 100 exceeded");
}

#[test]
fn test_error_display_construction() {
    let error = DiError::construction(Key::of::<u8>(), "disk full");
    assert_eq!(error.to_string(), "Construction of u8 failed: disk full");
}

#[test]
fn test_unresolvable_dependency_display_and_root_cause() {
    let error = DiError::UnresolvableDependency {
        chain: vec![Key::of::<u8>(), Key::of::<u16>()],
        dependency: Key::of::<u32>(),
        source: Box::new(DiError::NotRegistered(Key::of::<u32>())),
    };
    assert_eq!(
        error.to_string(),
        "Unable to resolve u32 while constructing u8 -> u16: Service not registered: u32"
    );
    assert!(matches!(error.root_cause(), DiError::NotRegistered(_)));
    assert!(error.source().is_some());

    let plain = DiError::DepthExceeded(3);
    assert!(matches!(plain.root_cause(), DiError::DepthExceeded(3)));
}

#[test]
fn test_validation_error_display() {
    let report = ValidationReport {
        errors: vec![ValidationError::MissingDependency {
            service: Key::of::<u8>(),
            dependency: Key::of::<u16>(),
        }],
        warnings: Vec::new(),
    };
    let error = DiError::Validation(report);
    let display_str = error.to_string();
    assert!(display_str.starts_with("Container validation failed:"));
    assert!(display_str.contains("u8 depends on unregistered u16"));
}

#[test]
fn test_diresult_ok() {
    let result: DiResult<i32> = Ok(42);
    assert!(result.is_ok());
    assert_eq!(result.unwrap(), 42);
}

#[test]
fn test_diresult_err() {
    let result: DiResult<i32> = Err(DiError::NotRegistered(Key::of::<i32>()));
    match result {
        Err(DiError::NotRegistered(key)) => assert_eq!(key, Key::of::<i32>()),
        _ => panic!("Expected NotRegistered error"),
    }
}

#[test]
fn test_error_debug_format() {
    let error = DiError::NotRegistered(Key::of::<u8>());
    let debug_str = format!("{:?}", error);
    assert!(debug_str.contains("NotRegistered"));
    assert!(debug_str.contains("u8"));
}

#[test]
fn test_error_clone() {
    let original = DiError::CircularDependency(vec![Key::of::<u8>(), Key::of::<u8>()]);
    let cloned = original.clone();
    assert_eq!(original.to_string(), cloned.to_string());
}

#[test]
fn test_error_as_std_error() {
    let error = DiError::NotRegistered(Key::of::<u8>());
    let std_error: &dyn Error = &error;
    assert_eq!(std_error.to_string(), "Service not registered: u8");
    assert!(std_error.source().is_none());
}
