use futures::executor::block_on;
use regform::form::{FieldKey, FormValues, validate};
use regform::prelude::*;
use regform::registration::{
    DATE, DISTRICT, EMAIL, FILES, GENDER, MOBILE, PASSWORD, USERNAME, registration_schema,
};

const VALID: [(&str, &str); 7] = [
    (USERNAME, "asha"),
    (EMAIL, "asha@example.com"),
    (PASSWORD, "s3cret"),
    (MOBILE, "9876543210"),
    (DATE, "2024-01-15"),
    (GENDER, "female"),
    (DISTRICT, "erode"),
];

fn filled(variant: FormVariant) -> RegistrationController {
    let controller = RegistrationController::new(variant).expect("default config is valid");
    for (name, value) in VALID {
        controller
            .register(name)
            .and_then(|field| field.set(value))
            .expect("field accepts text");
    }
    controller
}

fn valid_values() -> FormValues {
    VALID
        .into_iter()
        .fold(FormValues::new(), |values, (name, value)| values.with(name, value))
        .with(
            FILES,
            FieldValue::Files(vec![FileHandle::from_bytes("me.jpg", vec![0xff, 0xd8])]),
        )
}

#[test]
fn complete_registration_round_trip() {
    let controller = filled(FormVariant::Plain);
    let preview = controller
        .select_file(Some(FileHandle::from_bytes("me.jpg", vec![0xff, 0xd8])))
        .expect("select")
        .expect("preview task");
    assert_eq!(block_on(preview), PreviewStatus::Resolved);
    assert_eq!(
        controller.view().expect("view").selected_file.as_deref(),
        Some("me.jpg")
    );

    let report = controller.submit().expect("submit");
    assert!(report.is_success());

    let view = controller.view().expect("view");
    assert_eq!(
        view.notice.map(|notice| notice.message),
        Some("Form submitted successfully".to_string())
    );
    assert_eq!(view.preview.as_deref(), Some("data:image/jpeg;base64,/9g="));
    assert!(view.fields.iter().all(|field| field.value.is_empty()));
    assert_eq!(view.submit_state, SubmitState::Idle);
}

#[test]
fn bad_email_blocks_submission_without_touching_other_fields() {
    let controller = filled(FormVariant::Typed);
    controller.register(EMAIL).and_then(|field| field.set("not-an-email")).expect("set");

    let report = controller.submit().expect("submit");
    assert!(!report.is_success());
    let errors = report.outcome.errors().expect("errors");
    assert_eq!(errors.invalid_fields().count(), 1);
    assert_eq!(
        errors.message(FieldKey::new(EMAIL)).as_deref(),
        Some("Invalid email format")
    );
    for (name, value) in VALID.into_iter().filter(|(name, _)| *name != EMAIL) {
        assert_eq!(
            controller.store().value(name).expect("value"),
            FieldValue::text(value)
        );
    }
    assert!(controller.notices().current().is_none());
}

#[test]
fn strict_dates_accept_only_real_calendar_days() {
    let schema =
        registration_schema(FormVariant::Plain, &RegistrationConfig::default()).expect("schema");
    for (date, ok) in [
        ("2024-02-29", true),
        ("2023-02-29", false),
        ("2024-13-01", false),
        ("2024-1-5", false),
        ("15/01/2024", false),
        ("2024-01-15T00:00:00Z", false),
    ] {
        let result = validate(&valid_values().with(DATE, date), &schema);
        assert_eq!(result.is_valid(), ok, "{date}");
    }
}

#[test]
fn username_limit_counts_characters() {
    let schema =
        registration_schema(FormVariant::Typed, &RegistrationConfig::default()).expect("schema");
    for (name, ok) in [("", false), ("a", true), ("ääääääääää", true), ("abcdefghijk", false)] {
        let result = validate(&valid_values().with(USERNAME, name), &schema);
        assert_eq!(result.is_valid(), ok, "{name:?}");
    }
}

#[test]
fn validation_is_pure_and_repeatable() {
    let schema =
        registration_schema(FormVariant::Zod, &RegistrationConfig::default()).expect("schema");
    let values = valid_values().with(MOBILE, "12345").with(GENDER, "");
    let first = validate(&values, &schema);
    let second = validate(&values, &schema);
    assert_eq!(first, second);
    assert_eq!(first.len(), schema.fields().len());
    assert_eq!(
        first.invalid_fields().collect::<Vec<_>>(),
        vec![FieldKey::new(GENDER), FieldKey::new(MOBILE)]
    );
    assert_eq!(
        first.message(FieldKey::new(GENDER)).as_deref(),
        Some("Gender is required")
    );
}

#[test]
fn config_file_drives_options_and_limits() {
    let config = RegistrationConfig::from_toml_str(
        r#"
        districts = ["madurai"]
        password_max_len = 8
        success_message = "Welcome aboard"
        "#,
    )
    .expect("config");
    let controller =
        RegistrationController::with_config(FormVariant::Typed, config).expect("controller");
    for (name, value) in VALID {
        controller.set_value(name, value).expect("set");
    }
    controller.set_value(PASSWORD, "eightchr").expect("set");

    let rejected = controller.submit().expect("submit");
    assert_eq!(
        rejected
            .outcome
            .errors()
            .map(|errors| errors.invalid_fields().collect::<Vec<_>>()),
        Some(vec![FieldKey::new(DISTRICT)])
    );

    controller.set_value(DISTRICT, "madurai").expect("set");
    assert!(controller.submit().expect("submit").is_success());
    assert_eq!(
        controller.notices().current().map(|notice| notice.message),
        Some("Welcome aboard".to_string())
    );
}

const BOB: [(&str, &str); 7] = [
    (USERNAME, "bob"),
    (EMAIL, "bob@x.com"),
    (PASSWORD, "secret"),
    (MOBILE, "9876543210"),
    (DATE, "2024-05-01"),
    (GENDER, "male"),
    (DISTRICT, "salem"),
];

fn fill_bob(controller: &RegistrationController) {
    for (name, value) in BOB {
        controller.set_value(name, value).expect("set");
    }
    let _ = controller
        .select_file(Some(FileHandle::from_bytes("bob.png", vec![1])))
        .expect("select");
}

#[test]
fn bob_registers_successfully() {
    let controller = RegistrationController::new(FormVariant::Plain).expect("controller");
    fill_bob(&controller);

    let report = controller.submit().expect("submit");
    assert!(report.is_success());
    assert!(report.notice.is_some());
    assert_eq!(
        controller.notices().current().map(|notice| notice.message),
        Some("Form submitted successfully".to_string())
    );
    assert_eq!(
        controller.store().snapshot().expect("snapshot").model,
        RegistrationForm::default()
    );
}

#[test]
fn valid_submit_passes_through_submitting() {
    let controller = RegistrationController::new(FormVariant::Plain).expect("controller");
    fill_bob(&controller);

    let store = controller.store().clone();
    let seen = std::sync::Arc::new(std::sync::Mutex::new(None));
    let sink = seen.clone();
    let outcome = controller
        .store()
        .submit(move |values| {
            *sink.lock().expect("sink") = Some((store.submit_state(), values.username.clone()));
            Ok(())
        })
        .expect("submit");

    assert!(outcome.is_success());
    let seen = seen.lock().expect("seen").take().expect("handler ran");
    assert!(matches!(seen.0, Ok(SubmitState::Submitting)));
    assert_eq!(seen.1, "bob");
    assert_eq!(controller.store().submit_state().expect("state"), SubmitState::Idle);
}

#[test]
fn missing_required_field_is_the_only_one_reported() {
    let schema =
        registration_schema(FormVariant::Plain, &RegistrationConfig::default()).expect("schema");
    for (name, _) in VALID {
        let result = validate(&valid_values().with(name, ""), &schema);
        let invalid = result.invalid_fields().collect::<Vec<_>>();
        assert_eq!(invalid, vec![FieldKey::new(name)], "{name}");
        let message = result.message(FieldKey::new(name)).expect("message");
        assert!(message.ends_with("is required"), "{name}: {message}");
    }
}

#[test]
fn mobile_and_date_edge_values() {
    let schema =
        registration_schema(FormVariant::Plain, &RegistrationConfig::default()).expect("schema");
    let result = validate(&valid_values().with(MOBILE, "12345"), &schema);
    assert_eq!(
        result.message(FieldKey::new(MOBILE)).as_deref(),
        Some("Mobile number must be 10 digits")
    );
    assert!(validate(&valid_values().with(MOBILE, "1234567890"), &schema).is_valid());

    let result = validate(&valid_values().with(DATE, "2024-02-30"), &schema);
    assert_eq!(
        result.message(FieldKey::new(DATE)).as_deref(),
        Some("Invalid date format")
    );
    assert_eq!(regform::form::rules::normalize_date("2024-03-05"), "2024-03-05");
}
