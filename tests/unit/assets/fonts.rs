use super::*;

#[test]
fn empty_book_has_no_faces() {
    let book = FontBook::empty();
    assert!(book.is_empty());
    assert!(book.lookup("Arial", FontWeight::NORMAL).is_none());
}

#[test]
fn missing_font_dir_adds_nothing() {
    let book = FontBook::empty().with_font_dir("/definitely/not/a/font/dir");
    assert_eq!(book.len(), 0);
}

#[test]
fn generic_family_names_map_to_generic_queries() {
    assert!(matches!(
        generic_or_named("sans-serif"),
        fontdb::Family::SansSerif
    ));
    assert!(matches!(generic_or_named(" Serif "), fontdb::Family::Serif));
    assert!(matches!(
        generic_or_named("monospace"),
        fontdb::Family::Monospace
    ));
    assert!(matches!(
        generic_or_named(" Arial "),
        fontdb::Family::Name("Arial")
    ));
}

#[test]
fn lookup_falls_back_to_any_face() {
    let book = FontBook::shared();
    if book.is_empty() {
        return;
    }
    let face = book
        .lookup("No Such Family 1f3a", FontWeight::BOLD)
        .expect("fallback face");
    assert!(!face.data.is_empty());
}

#[test]
fn layout_measures_lines() {
    let book = FontBook::shared();
    let Some(face) = book.lookup("sans-serif", FontWeight::NORMAL) else {
        return;
    };
    let mut engine = TextLayoutEngine::new();
    let one = engine
        .layout(
            "Hello",
            &face,
            16.0,
            FontWeight::NORMAL,
            TextAlign::Left,
            TextBrushRgba8::from(Color::BLACK),
        )
        .unwrap();
    let two = engine
        .layout(
            "Hello\nWorld",
            &face,
            16.0,
            FontWeight::NORMAL,
            TextAlign::Center,
            TextBrushRgba8::from(Color::BLACK),
        )
        .unwrap();
    assert!(one.width() > 0.0);
    assert_eq!(one.lines().count(), 1);
    assert_eq!(two.lines().count(), 2);
    assert!(two.height() > one.height());
}

#[test]
fn layout_rejects_bad_sizes() {
    let face = FontFace {
        id: fontdb::ID::dummy(),
        data: Arc::new(Vec::new()),
        index: 0,
    };
    let mut engine = TextLayoutEngine::new();
    assert!(
        engine
            .layout(
                "x",
                &face,
                0.0,
                FontWeight::NORMAL,
                TextAlign::Left,
                TextBrushRgba8::default()
            )
            .is_err()
    );
}

fn family_of(book: &FontBook, face: &FontFace) -> String {
    book.database()
        .face(face.id)
        .and_then(|f| f.families.first().map(|(n, _)| n.clone()))
        .unwrap_or_default()
}

fn weight_of(book: &FontBook, face: &FontFace) -> u16 {
    book.database().face(face.id).map(|f| f.weight.0).unwrap_or(0)
}

fn has_installed_sans(book: &FontBook) -> bool {
    book.database().faces().any(|f| {
        f.families.iter().any(|(n, _)| {
            SANS_SERIF_FAMILIES
                .iter()
                .any(|c| c.eq_ignore_ascii_case(n))
        })
    })
}

#[test]
fn default_family_resolves_to_a_sans_serif_face() {
    let book = FontBook::shared();
    if !has_installed_sans(&book) {
        return;
    }
    for family in ["Arial", "sans-serif", "No Such Family 1f3a"] {
        let face = book.lookup(family, FontWeight::NORMAL).unwrap();
        let name = family_of(&book, &face);
        assert!(
            SANS_SERIF_FAMILIES
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&name)),
            "{family} resolved to {name}"
        );
    }
}

#[test]
fn bold_selects_a_heavier_face_when_one_is_installed() {
    let book = FontBook::shared();
    if !has_installed_sans(&book) {
        return;
    }
    let regular = book.lookup("Arial", FontWeight::NORMAL).unwrap();
    let bold = book.lookup("Arial", FontWeight::BOLD).unwrap();
    let family = family_of(&book, &regular);
    let family_has_bold = book.database().faces().any(|f| {
        f.weight.0 >= 600 && f.families.iter().any(|(n, _)| *n == family)
    });
    if !family_has_bold {
        return;
    }
    assert!(weight_of(&book, &bold) > weight_of(&book, &regular));
    assert_ne!(regular.id, bold.id);
}

#[test]
fn symbol_families_are_recognized() {
    assert!(is_symbol_family("DejaVu Math TeX Gyre"));
    assert!(is_symbol_family("Noto Color Emoji"));
    assert!(!is_symbol_family("DejaVu Sans"));
}

#[test]
fn assigning_generics_on_an_empty_database_keeps_it_empty() {
    let mut db = fontdb::Database::new();
    assign_generic_families(&mut db);
    assert_eq!(db.len(), 0);
}
