use handlebars::{Handlebars, no_escape};
use serde::Serialize;
use std::sync::Arc;

use crate::error::JobError;

pub type Hbs = Arc<Handlebars<'static>>;

pub const PRICE_ALERT_TITLE: &str = "notifications/price_alert_title";
pub const PRICE_ALERT_BODY: &str = "notifications/price_alert_body";
pub const GRADING_STARTED_TITLE: &str = "notifications/grading_started_title";
pub const GRADING_STARTED_BODY: &str = "notifications/grading_started_body";

const TEMPLATES: [(&str, &str); 4] = [
    (
        PRICE_ALERT_TITLE,
        include_str!("../templates/notifications/price_alert_title.hbs"),
    ),
    (
        PRICE_ALERT_BODY,
        include_str!("../templates/notifications/price_alert_body.hbs"),
    ),
    (
        GRADING_STARTED_TITLE,
        include_str!("../templates/notifications/grading_started_title.hbs"),
    ),
    (
        GRADING_STARTED_BODY,
        include_str!("../templates/notifications/grading_started_body.hbs"),
    ),
];

pub fn build_handlebars() -> Result<Hbs, JobError> {
    let mut hb = Handlebars::new();

    // notification copy is plain text, not HTML
    hb.register_escape_fn(no_escape);

    for (name, source) in TEMPLATES {
        hb.register_template_string(name, source)
            .map_err(|e| JobError::Template(format!("{name}: {e}")))?;
    }

    Ok(Arc::new(hb))
}

pub fn render<T: Serialize>(hbs: &Hbs, name: &str, data: &T) -> Result<String, JobError> {
    hbs.render(name, data)
        .map_err(|e| JobError::Template(format!("{name}: {e}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn price_alert_body_mentions_both_prices() {
        let hbs = build_handlebars().unwrap();
        let body = render(
            &hbs,
            PRICE_ALERT_BODY,
            &json!({
                "item_name": "Charizard & Friends",
                "current_price": "95.00",
                "target_price": "100.00",
                "below": true,
            }),
        )
        .unwrap();

        assert_eq!(
            body,
            "Charizard & Friends dropped to $95.00 (your target: $100.00)"
        );
    }

    #[test]
    fn grading_body_omits_missing_card_name() {
        let hbs = build_handlebars().unwrap();
        let body = render(&hbs, GRADING_STARTED_BODY, &json!({ "tier": "express" })).unwrap();
        assert_eq!(body, "Your express grading order is now being graded.");
    }
}
