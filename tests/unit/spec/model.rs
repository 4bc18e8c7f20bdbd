use super::*;

#[test]
fn font_weight_keywords_and_numbers() {
    assert_eq!(FontWeight::parse("normal"), Some(FontWeight::NORMAL));
    assert_eq!(FontWeight::parse("bold"), Some(FontWeight::BOLD));
    assert_eq!(FontWeight::parse("bolder"), Some(FontWeight::BOLD));
    assert_eq!(FontWeight::parse("lighter"), Some(FontWeight(100)));
    assert_eq!(FontWeight::parse(" 800 "), Some(FontWeight(800)));
    assert_eq!(FontWeight::parse("0"), None);
    assert_eq!(FontWeight::parse("heavy"), None);
    assert_eq!(FontWeight::from_number(1001.0), None);
    assert_eq!(FontWeight::default().to_string(), "400");
}

#[test]
fn anchor_factors() {
    assert_eq!(OriginX::Left.factor(), 0.0);
    assert_eq!(OriginX::Center.factor(), 0.5);
    assert_eq!(OriginX::Right.factor(), 1.0);
    assert_eq!(OriginY::Baseline.factor(), OriginY::Top.factor());
    assert_eq!(OriginY::Bottom.factor(), 1.0);
    assert_eq!("baseline".parse::<OriginY>(), Ok(OriginY::Baseline));
    assert!("middle".parse::<TextAlign>().is_err());
}

#[test]
fn json_entry_points() {
    let spec = Specification::from_json_str(
        r##"{"width": 64, "height": 32, "objects": [{"type": "circle", "left": 5, "top": 5, "radius": 4}]}"##,
    )
    .unwrap();
    assert_eq!(spec.canvas(), Canvas { width: 64, height: 32 });
    assert_eq!(spec.resolved_background(), Color::WHITE);
    assert_eq!(spec.objects()[0].kind(), "circle");

    let err = Specification::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, CanvasError::Serde(_)));

    let err = Specification::from_path("does/not/exist.json").unwrap_err();
    assert!(err.to_string().contains("does/not/exist.json"));
}
