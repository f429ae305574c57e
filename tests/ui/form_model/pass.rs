use regform::form::{FieldLens, FieldValue, FormModel};

#[derive(Clone, regform::form::FormModel)]
struct DemoForm {
    email: String,
    #[form(rename = "selectedDate")]
    selected_date: String,
}

fn main() {
    let fields = DemoForm::fields();
    let lens = fields.email();
    let mut model = DemoForm {
        email: "a@example.com".to_string(),
        selected_date: String::new(),
    };
    lens.set(&mut model, "b@example.com".to_string());
    assert_eq!(lens.key().as_str(), "email");
    assert_eq!(lens.get(&model), "b@example.com");

    let date = fields.selected_date().key();
    assert_eq!(date.as_str(), "selectedDate");
    model
        .set_field_value(date, FieldValue::text("2024-01-15"))
        .expect("text field accepts text");
    assert_eq!(model.selected_date, "2024-01-15");
    assert!(model.set_field_value(date, FieldValue::Files(Vec::new())).is_err());
    assert_eq!(model.values().len(), 2);
}
