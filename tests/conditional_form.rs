//! End-to-end flow through an in-memory form host: subscribe to the values
//! conditions read, react to edits, and validate only visible fields

use form_conditions::{
    ConditionEngine, ConditionalForm, Conditions, FieldPath, FormLogicError, FormState, Result,
};
use serde_json::{Value, json};

fn default_values() -> Value {
    json!({
        "contactName": "",
        "contactEmail": "",
        "caterer": null,
        "guests": [{"name": "", "age": null}]
    })
}

fn form() -> ConditionalForm<FormState> {
    let conditions = Conditions::new()
        .when("otherCaterer", |gv| Ok(gv.read("caterer")? == "Other"))
        .unwrap()
        .when("guests.#.wine", |gv| Ok(gv.read("guests.#.age")? == "21+"))
        .unwrap();
    ConditionalForm::new(FormState::new(default_values()), ConditionEngine::new(conditions))
}

/// Rejects a visible `otherCaterer` shorter than two characters
fn validate(values: Value) -> Result<Value> {
    if let Some(other) = values.get("otherCaterer").and_then(Value::as_str) {
        if other.len() < 2 {
            return Err(FormLogicError::validation("otherCaterer is too short"));
        }
    }
    Ok(values)
}

fn p(text: &str) -> FieldPath {
    FieldPath::parse(text).unwrap()
}

#[test]
fn test_use_condition_subscribes_to_dependencies() {
    let mut form = form();
    let visibility = form.use_condition(&["otherCaterer"]).unwrap();
    assert_eq!(visibility[&p("otherCaterer")], false);

    let watched: Vec<_> = form.host().watched().cloned().collect();
    assert_eq!(watched, vec![p("caterer")]);

    // Editing an unrelated field needs no recomputation
    assert!(!form.host_mut().set_value("contactName", json!("Micah")).unwrap());
    assert!(form.host_mut().set_value("caterer", json!("Other")).unwrap());

    let visibility = form.use_condition(&["otherCaterer"]).unwrap();
    assert_eq!(visibility[&p("otherCaterer")], true);
}

#[test]
fn test_added_guest_gets_its_own_dependency() {
    let mut form = form();
    form.host_mut()
        .set_value("guests.1", json!({"name": "Ann", "age": "21+"}))
        .unwrap();

    let visibility = form.use_condition(&["guests.0.wine", "guests.1.wine"]).unwrap();
    assert_eq!(visibility[&p("guests.0.wine")], false);
    assert_eq!(visibility[&p("guests.1.wine")], true);

    let mut watched: Vec<_> = form.host().watched().cloned().collect();
    watched.sort();
    assert_eq!(watched, vec![p("guests.0.age"), p("guests.1.age")]);
}

#[test]
fn test_submit_ignores_invalid_hidden_values() {
    let mut form = form();
    form.host_mut().set_value("caterer", json!("Delta BBQ")).unwrap();
    form.host_mut().set_value("otherCaterer", json!("x")).unwrap();

    // Hidden, so its invalid value never reaches the validator
    let submitted = form.submit(&validate).unwrap();
    assert!(submitted.get("otherCaterer").is_none());
    assert_eq!(form.host().values()["otherCaterer"], json!("x"));

    form.host_mut().set_value("caterer", json!("Other")).unwrap();
    let err = form.submit(&validate).unwrap_err();
    assert_eq!(err, FormLogicError::validation("otherCaterer is too short"));
}

#[test]
fn test_submit_drops_minor_wine() {
    let mut form = form();
    form.host_mut().set_value("guests.0.age", json!("13-20")).unwrap();
    form.host_mut().set_value("guests.0.wine", json!("Red")).unwrap();

    let submitted = form.submit(&validate).unwrap();
    assert_eq!(submitted["guests"], json!([{"name": "", "age": "13-20"}]));
}
