use super::*;
use crate::spec::validate::{FieldError, FieldPath, PathElem};

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CanvasError::scene("x")
            .to_string()
            .contains("scene error:")
    );
    assert!(
        CanvasError::precondition("x")
            .to_string()
            .contains("precondition violated:")
    );
    assert!(
        CanvasError::export("x")
            .to_string()
            .contains("export error:")
    );
    assert!(
        CanvasError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CanvasError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn validation_variant_exposes_field_errors() {
    let errors = ValidationErrors {
        errors: vec![FieldError::new(
            FieldPath::root().field("width"),
            "positive integer",
        )],
    };
    let err = CanvasError::from(errors);
    assert!(err.to_string().starts_with("validation error: $.width"));
    assert_eq!(err.validation_errors().map(|e| e.len()), Some(1));
    assert_eq!(
        err.validation_errors().unwrap().errors[0].path.elems(),
        &[PathElem::Field("width".to_string())]
    );
    assert!(CanvasError::scene("x").validation_errors().is_none());
}
