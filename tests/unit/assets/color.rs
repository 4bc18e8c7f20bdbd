use super::*;

#[test]
fn parses_hex_forms() {
    assert_eq!(Color::parse("#fff").unwrap(), Color::WHITE);
    assert_eq!(Color::parse("#000000").unwrap(), Color::BLACK);
    assert_eq!(
        Color::parse("#ff000080").unwrap(),
        Color::rgba(255, 0, 0, 128)
    );
    assert_eq!(Color::parse("  #FF8800 ").unwrap(), Color::rgba(255, 136, 0, 255));
}

#[test]
fn parses_functional_and_named_forms() {
    assert_eq!(Color::parse("rgb(0, 128, 255)").unwrap(), Color::rgba(0, 128, 255, 255));
    assert_eq!(Color::parse("white").unwrap(), Color::WHITE);
    assert_eq!(Color::parse("red").unwrap(), Color::rgba(255, 0, 0, 255));
    assert!(Color::parse("transparent").unwrap().is_transparent());

    let c = Color::parse("hsl(0, 100%, 50%)").unwrap();
    assert_eq!((c.r, c.g, c.b, c.a), (255, 0, 0, 255));
}

#[test]
fn rejects_garbage() {
    assert!(Color::parse("").is_err());
    assert!(Color::parse("#12").is_err());
    assert!(Color::parse("not-a-color").is_err());
}

#[test]
fn display_uses_hex() {
    assert_eq!(Color::PLACEHOLDER_FILL.to_string(), "#cccccc");
    assert_eq!(Color::rgba(1, 2, 3, 4).to_string(), "#01020304");
    assert_eq!("#999999".parse::<Color>().unwrap(), Color::PLACEHOLDER_STROKE);
}

