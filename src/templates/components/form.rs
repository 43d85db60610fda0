use maud::{html, Markup};

pub fn text_input(label: &str, name: &str, value: Option<&str>, required: bool) -> Markup {
    html! {
        label {
            (label)
            @if required { " *" }
            input type="text" name=(name) value=[value] required[required];
        }
    }
}

/// `options` are `(value, label)` pairs.
pub fn select(label: &str, name: &str, options: &[(String, String)], selected: Option<&str>) -> Markup {
    html! {
        label {
            (label)
            select name=(name) {
                option value="" { "-" }
                @for (value, text) in options {
                    option value=(value) selected[selected == Some(value.as_str())] { (text) }
                }
            }
        }
    }
}
