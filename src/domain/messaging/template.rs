//! Message template rendering
//!
//! Store-owned template bodies carry `{placeholder}` markers that are filled
//! from per-send variables. Placeholders with no value render as the empty
//! string; `{customer_name}` falls back to a generic salutation so automated
//! messages never greet an empty name.

use serde::Deserialize;

pub const DEFAULT_CUSTOMER_NAME: &str = "Cliente";

/// Variables a caller may supply for a templated send. Unknown template
/// placeholders simply render empty, so templates and callers can evolve
/// independently.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TemplateVars {
    pub order_number: Option<String>,
    pub order_total: Option<String>,
    pub estimated_time: Option<String>,
    pub store_name: Option<String>,
    pub delivery_message: Option<String>,
    pub delivery_address: Option<String>,
    pub order_type: Option<String>,
    pub cart_total: Option<String>,
    pub recovery_link: Option<String>,
    pub promotion_message: Option<String>,
    pub store_link: Option<String>,
    pub custom_message: Option<String>,
}

impl TemplateVars {
    fn pairs(&self) -> [(&'static str, Option<&str>); 12] {
        [
            ("order_number", self.order_number.as_deref()),
            ("order_total", self.order_total.as_deref()),
            ("estimated_time", self.estimated_time.as_deref()),
            ("store_name", self.store_name.as_deref()),
            ("delivery_message", self.delivery_message.as_deref()),
            ("delivery_address", self.delivery_address.as_deref()),
            ("order_type", self.order_type.as_deref()),
            ("cart_total", self.cart_total.as_deref()),
            ("recovery_link", self.recovery_link.as_deref()),
            ("promotion_message", self.promotion_message.as_deref()),
            ("store_link", self.store_link.as_deref()),
            ("custom_message", self.custom_message.as_deref()),
        ]
    }
}

/// Fill a template body with the supplied variables and customer name.
pub fn render(body: &str, vars: &TemplateVars, customer_name: Option<&str>) -> String {
    let mut out = body.to_string();
    for (key, value) in vars.pairs() {
        let marker = format!("{{{key}}}");
        if out.contains(&marker) {
            out = out.replace(&marker, value.unwrap_or(""));
        }
    }
    let name = customer_name.filter(|n| !n.trim().is_empty()).unwrap_or(DEFAULT_CUSTOMER_NAME);
    out.replace("{customer_name}", name)
}
