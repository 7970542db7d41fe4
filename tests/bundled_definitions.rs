use typist::definitions::DefinitionSource;
use typist::error::DefinitionKind;
use typist::keyboard::model::{KeyboardModel, Shape};

fn source() -> DefinitionSource {
    DefinitionSource::bundled_only()
}

#[test]
fn every_bundled_layout_resolves_on_both_shapes() {
    let source = source();
    let names = source.available(DefinitionKind::Layout);
    assert!(names.contains(&"qwerty".to_string()));

    for name in names {
        let doc = source
            .load_layout(&name)
            .unwrap_or_else(|e| panic!("layout {name}: {e}"));
        assert!(doc.default_variant().is_some(), "layout {name} has no variants");

        for shape in [Shape::Pc104, Shape::Pc105] {
            let model = KeyboardModel::new(shape);
            for (id, _) in doc.variant_options() {
                let keymap = doc
                    .resolve(id, &model)
                    .unwrap_or_else(|| panic!("{name}-{id} did not resolve"));
                for ch in 'a'..='z' {
                    assert!(
                        keymap.key_for(ch).is_some(),
                        "{name}-{id} on {shape:?} cannot type {ch:?}"
                    );
                }
                assert_eq!(keymap.key_for(' '), Some("SPCE"));
            }
        }
    }
}

#[test]
fn every_bundled_lesson_has_typable_levels() {
    let source = source();
    let qwerty = source.load_layout("qwerty").unwrap();
    let keymap = qwerty
        .resolve("us", &KeyboardModel::new(Shape::Pc104))
        .unwrap();

    let names = source.available(DefinitionKind::Lesson);
    assert!(names.contains(&"english".to_string()));

    for name in names {
        let doc = source
            .load_lesson(&name)
            .unwrap_or_else(|e| panic!("lesson {name}: {e}"));
        assert!(!doc.levels.is_empty(), "lesson {name} has no levels");
        assert!(!doc.title.is_empty());

        for level in &doc.levels {
            assert!(!level.lines.is_empty(), "{name} level {} is empty", level.label);
            for line in &level.lines {
                for ch in line.chars() {
                    assert!(
                        keymap.key_for(ch).is_some(),
                        "{name}: {ch:?} in {line:?} is not on qwerty-us"
                    );
                }
            }
        }
    }
}

#[test]
fn british_variant_moves_quote_and_at() {
    let doc = source().load_layout("qwerty").unwrap();
    let model = KeyboardModel::new(Shape::Pc105);
    let us = doc.resolve("us", &model).unwrap();
    let gb = doc.resolve("gb", &model).unwrap();

    assert_eq!(us.key_for('@'), Some("AE02"));
    assert_eq!(gb.key_for('@'), Some("AC11"));
    assert_eq!(gb.key_for('"'), Some("AE02"));
    assert_eq!(gb.key_for('£'), Some("AE03"));
    assert_eq!(us.key_for('£'), None);
    assert_eq!(gb.key_for('q'), us.key_for('q'));
}
