use curator::form::{
    FieldPath, FormDataExtractor, FormError, FormHost, Provenance, SchemaFormBuilder, SchemaNode,
    ValueType,
};
use serde_json::{json, Value};

fn parse(schema: Value) -> SchemaNode {
    SchemaNode::parse(&schema).expect("schema parses")
}

#[test]
fn test_scalar_round_trip() {
    let schema = parse(json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "count": {"type": "integer"},
            "big": {"type": "integer"},
            "price": {"type": "number"},
            "active": {"type": "boolean"},
            "archived": {"type": "boolean"},
            "color": {"type": "string", "enum": ["red", "green"]},
            "released": {"type": "string", "format": "date"},
            "description": {"type": "string"}
        }
    }));
    let data = json!({
        "name": "Widget",
        "count": 3,
        "big": 18446744073709551615u64,
        "price": 1.5,
        "active": true,
        "archived": false,
        "color": "green",
        "released": "2024-02-29",
        "description": "Line one\nLine two"
    });

    let form = SchemaFormBuilder::default().build(&schema, Some(&data));
    assert_eq!(form.extract(), Some(data));
}

#[test]
fn test_remove_middle_item_of_three() {
    let schema = parse(json!({
        "type": "object",
        "properties": {
            "steps": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "label": {"type": "string"},
                        "weight": {"type": "number"}
                    }
                }
            },
            "notes": {"type": "array", "items": {"type": "string"}}
        }
    }));
    let data = json!({
        "steps": [
            {"label": "one", "weight": 1},
            {"label": "two", "weight": 2},
            {"label": "three", "weight": 3}
        ],
        "notes": ["x", "y", "z"]
    });

    for removed in 0..3 {
        let mut form = SchemaFormBuilder::default().build(&schema, Some(&data));
        form.remove_item("steps", removed).unwrap();
        form.remove_item("notes", removed).unwrap();

        let mut expected = data.clone();
        expected["steps"].as_array_mut().unwrap().remove(removed);
        expected["notes"].as_array_mut().unwrap().remove(removed);
        assert_eq!(form.extract(), Some(expected));

        // Registry paths are contiguous after removal
        let paths: Vec<String> = form
            .registry()
            .iter()
            .map(|d| d.path.to_string())
            .filter(|p| p.starts_with("steps"))
            .collect();
        assert_eq!(
            paths,
            vec![
                "steps[0].label",
                "steps[0].weight",
                "steps[1].label",
                "steps[1].weight"
            ]
        );
    }
}

#[test]
fn test_append_then_fill_item() {
    let schema = parse(json!({
        "type": "object",
        "properties": {
            "notes": {"type": "array", "items": {"type": "string"}}
        }
    }));
    let mut form = SchemaFormBuilder::default().build(&schema, None);
    assert_eq!(form.extract(), Some(json!({"notes": []})));

    let index = form.append_item("notes").unwrap();
    assert_eq!(index, 0);
    form.set_value("notes[0]", json!("first")).unwrap();
    assert_eq!(form.extract(), Some(json!({"notes": ["first"]})));
}

#[test]
fn test_multi_select_scenario() {
    let schema = parse(json!({
        "type": "object",
        "properties": {
            "letters": {
                "type": "array",
                "items": {"type": "string", "enum": ["a", "b", "c"]}
            }
        }
    }));
    let mut form = SchemaFormBuilder::default().build(&schema, Some(&json!({"letters": ["b"]})));

    let descriptor = form.field("letters").unwrap();
    assert_eq!(descriptor.value_type, ValueType::ArrayOfEnum);
    assert_eq!(form.registry().len(), 1);

    let offered = |form: &curator::form::Form| -> Vec<String> {
        form.selector_options("letters")
            .unwrap()
            .into_iter()
            .map(|o| o.value)
            .collect()
    };
    assert_eq!(offered(&form), vec!["", "a", "c"]);

    form.select_option("letters", "a").unwrap();
    assert!(!offered(&form).contains(&"a".to_string()));
    form.deselect_option("letters", "b").unwrap();
    assert_eq!(offered(&form), vec!["", "b", "c"]);

    assert_eq!(form.extract(), Some(json!({"letters": ["a"]})));

    assert!(matches!(
        form.select_option("letters", "a"),
        Err(FormError::Rejected { .. })
    ));
    assert!(matches!(
        form.select_option("letters", "z"),
        Err(FormError::Rejected { .. })
    ));
}

#[test]
fn test_selection_order_is_kept() {
    let schema = parse(json!({
        "type": "object",
        "properties": {
            "letters": {"type": "array", "items": {"type": "string", "enum": ["a", "b", "c"]}}
        }
    }));
    let mut form = SchemaFormBuilder::default().build(&schema, None);
    form.select_option("letters", "c").unwrap();
    form.select_option("letters", "a").unwrap();
    assert_eq!(form.extract(), Some(json!({"letters": ["c", "a"]})));
}

#[test]
fn test_null_data_uses_defaults() {
    let schema = parse(json!({
        "type": "object",
        "required": ["title", "count"],
        "properties": {
            "title": {"type": "string"},
            "count": {"type": "integer"}
        }
    }));
    let form = SchemaFormBuilder::default().build(&schema, None);

    let title = form.field("title").unwrap();
    let control = form.controls().get(title.handle).unwrap();
    assert_eq!(control.provenance(), Provenance::Default);

    assert_eq!(form.extract(), Some(json!({"title": "", "count": null})));
}

#[test]
fn test_nested_object_paths() {
    let schema = parse(json!({
        "type": "object",
        "properties": {
            "a": {"type": "object", "properties": {"b": {"type": "string"}}}
        }
    }));
    let data = json!({"a": {"b": "x"}});
    let form = SchemaFormBuilder::default().build(&schema, Some(&data));

    assert!(form.field("a.b").is_ok());
    assert_eq!(form.extract(), Some(data));
}

#[test]
fn test_extract_is_idempotent() {
    let schema = parse(json!({
        "type": "object",
        "properties": {
            "items": {
                "type": "array",
                "items": {"type": "object", "properties": {"n": {"type": "integer"}}}
            }
        }
    }));
    let mut form = SchemaFormBuilder::default().build(
        &schema,
        Some(&json!({"items": [{"n": 1}, {"n": 2}]})),
    );
    form.set_value("items[1].n", json!(5)).unwrap();

    let first = form.extract();
    let second = form.extract();
    assert!(first.is_some());
    assert_eq!(first, second);

    let control = form.controls().get(form.field("items[1].n").unwrap().handle).unwrap();
    assert_eq!(control.provenance(), Provenance::Edited);
}

#[test]
fn test_malformed_property_is_isolated() {
    let schema = parse(json!({
        "type": "object",
        "properties": {
            "good": {"type": "string"},
            "broken": {"title": "No type here"},
            "also_good": {"type": "boolean"}
        }
    }));
    let form = SchemaFormBuilder::default().build(&schema, Some(&json!({"good": "yes"})));

    assert_eq!(form.build_errors().len(), 1);
    assert_eq!(form.build_errors()[0].path, "broken");
    assert!(matches!(form.field("broken"), Err(FormError::UnknownField(_))));
    assert_eq!(
        form.extract(),
        Some(json!({"good": "yes", "also_good": false}))
    );
}

#[test]
fn test_rejected_edits_leave_value() {
    let schema = parse(json!({
        "type": "object",
        "properties": {
            "when": {"type": "string", "format": "date"},
            "score": {"type": "integer", "minimum": 0, "maximum": 10}
        }
    }));
    let mut form = SchemaFormBuilder::default().build(
        &schema,
        Some(&json!({"when": "2024-01-01", "score": 4})),
    );

    assert!(form.set_value("when", json!("01/02/2024")).is_err());
    assert!(form.set_value("score", json!(11)).is_err());
    assert!(form.set_value("score", json!("abc")).is_err());
    assert_eq!(
        form.extract(),
        Some(json!({"when": "2024-01-01", "score": 4}))
    );
}

#[test]
fn test_registry_snapshot_extracts_against_controls() {
    let schema = parse(json!({
        "type": "object",
        "properties": {"name": {"type": "string"}}
    }));
    let form = SchemaFormBuilder::default().build(&schema, Some(&json!({"name": "n"})));

    let snapshot = form.registry().to_json().unwrap();
    let restored = curator::form::FieldRegistry::from_json(&snapshot).unwrap();
    assert_eq!(
        FormDataExtractor::extract(Some(&restored), form.controls()),
        Some(json!({"name": "n"}))
    );

    assert!(curator::form::FieldRegistry::from_json("not json").is_err());
    assert_eq!(FormDataExtractor::extract(None, form.controls()), None);
}

#[test]
fn test_host_remount_discards_previous_form() {
    let schema = parse(json!({
        "type": "object",
        "properties": {"name": {"type": "string"}}
    }));
    let mut host = FormHost::default();
    host.mount("editor", &schema, Some(&json!({"name": "first"})))
        .set_value("name", json!("edited"))
        .unwrap();
    host.mount("editor", &schema, Some(&json!({"name": "second"})));

    assert_eq!(host.save("editor"), Some(json!({"name": "second"})));
    assert!(host.unmount("editor").is_some());
    assert_eq!(host.save("editor"), None);
}

#[test]
fn test_path_syntax() {
    let path: FieldPath = "people[2].tags[0]".parse().unwrap();
    assert_eq!(path.to_string(), "people[2].tags[0]");
    assert!("people[x]".parse::<FieldPath>().is_err());
    assert!("[0]".parse::<FieldPath>().is_err());
}
