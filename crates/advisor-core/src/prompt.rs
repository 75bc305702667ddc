//! System-message composition and canned user prompts.
//!
//! The composed text is byte-stable for a given request: clause order is fixed so replies can be
//! golden-tested.

use crate::catalog::Catalog;
use crate::request::ChatRequest;
use crate::selection::SelectionState;
use crate::wire::Message;
use crate::{Error, Result};

pub const BRAND: &str = "L'Oréal";

pub const PREAMBLE: &str =
    "You are a helpful L'Oréal beauty advisor with access to current web information. ";

pub const INSTRUCTIONS: &str = "\n\nPlease:\n\
1. Provide helpful advice about L'Oréal products and skincare routines\n\
2. Include current information about new products, reviews, or trends when relevant\n\
3. Cite your sources when you use web information\n\
4. Focus on official L'Oréal information and reputable beauty sources\n\
5. Format your response with clear sections and bullet points for easy reading";

/// Preamble, context, selected items, focus area, concern, instruction block. In that order.
pub fn compose_system_message(req: &ChatRequest) -> String {
    let mut s = String::from(PREAMBLE);
    if let Some(context) = req.context() {
        s.push_str(context);
    }
    let items: Vec<&str> = req
        .selected_items
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect();
    if !items.is_empty() {
        s.push_str(&format!(" Selected products: {}.", items.join(", ")));
    }
    if let Some(area) = req.focus_area() {
        s.push_str(&format!(" User is focusing on: {area}."));
    }
    if let Some(concern) = req.concern() {
        s.push_str(&format!(" User's main concern: {concern}."));
    }
    s.push_str(INSTRUCTIONS);
    s
}

pub fn messages(req: &ChatRequest) -> Vec<Message> {
    vec![
        Message::system(compose_system_message(req)),
        Message::user(req.message.clone()),
    ]
}

/// Message asking for a full routine built from the selected products.
pub fn routine_prompt(
    catalog: &Catalog,
    selection: &SelectionState,
    focus_area: Option<&str>,
    concern: Option<&str>,
) -> Result<String> {
    let products = catalog.resolve(selection);
    if products.is_empty() {
        return Err(Error::Validation(
            "select some products first to generate a routine".to_string(),
        ));
    }
    let details = products
        .iter()
        .map(|p| format!("{} ({})", p.name, p.description))
        .collect::<Vec<_>>()
        .join(", ");
    let mut s =
        format!("Create a detailed skincare routine using these {BRAND} products: {details}.");
    if let Some(area) = given_str(focus_area) {
        s.push_str(&format!(" Focus especially on the {area} area."));
    }
    if let Some(concern) = given_str(concern) {
        s.push_str(&format!(" Address {concern} concerns."));
    }
    s.push_str(
        " Include step-by-step instructions, order of application, and timing for morning and evening routines.",
    );
    Ok(s)
}

/// Canned question for a skin concern picked without typing a message.
pub fn concern_prompt(concern: &str) -> String {
    let key = concern.trim().to_ascii_lowercase();
    match key.as_str() {
        "acne" => format!("I have acne-prone skin. What {BRAND} products would help me build an effective acne-fighting routine?"),
        "aging" => format!("I'm concerned about aging and want anti-aging products. What {BRAND} anti-aging routine would you recommend?"),
        "dryness" => format!("My skin is very dry. What {BRAND} products would help hydrate and moisturize my skin?"),
        "oily" => format!("I have oily skin that gets shiny throughout the day. What {BRAND} products would help control oil?"),
        "sensitive" => format!("I have sensitive skin that reacts easily. What gentle {BRAND} products would you recommend?"),
        _ => format!(
            "I have concerns about {}. What {BRAND} products would you recommend?",
            concern.trim()
        ),
    }
}

fn given_str(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use proptest::prelude::*;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Product::new(1, "Revitalift Serum", "serum", "A hyaluronic serum"),
            Product::new(2, "Micellar Water", "cleanser", "Gentle cleansing water"),
        ])
    }

    #[test]
    fn bare_request_is_preamble_plus_instructions() {
        let s = compose_system_message(&ChatRequest::new("hi"));
        assert_eq!(s, format!("{PREAMBLE}{INSTRUCTIONS}"));
    }

    #[test]
    fn full_request_golden() {
        let req = ChatRequest::new("Help with dry skin")
            .with_context("Be brief.")
            .with_selected_items(["Serum A", "Cream B"])
            .with_focus_area("cheeks")
            .with_concern("dryness");
        let s = compose_system_message(&req);
        assert_eq!(
            s,
            format!(
                "{PREAMBLE}Be brief. Selected products: Serum A, Cream B. User is focusing on: cheeks. User's main concern: dryness.{INSTRUCTIONS}"
            )
        );
    }

    #[test]
    fn user_message_is_sent_unchanged() {
        let m = messages(&ChatRequest::new("  Help with dry skin "));
        assert_eq!(m.len(), 2);
        assert_eq!(m[0].role, "system");
        assert_eq!(m[1].role, "user");
        assert_eq!(m[1].content, "  Help with dry skin ");
    }

    #[test]
    fn routine_prompt_lists_products_with_descriptions() {
        let sel = SelectionState::from_ids([2, 1]);
        let s = routine_prompt(&catalog(), &sel, Some("forehead"), Some("aging")).unwrap();
        assert!(s.starts_with(
            "Create a detailed skincare routine using these L'Oréal products: Micellar Water (Gentle cleansing water), Revitalift Serum (A hyaluronic serum)."
        ));
        assert!(s.contains(" Focus especially on the forehead area."));
        assert!(s.contains(" Address aging concerns."));
        assert!(s.ends_with("morning and evening routines."));
    }

    #[test]
    fn routine_prompt_needs_a_selection() {
        let err = routine_prompt(&catalog(), &SelectionState::default(), None, None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        // Unknown ids resolve to nothing.
        let err =
            routine_prompt(&catalog(), &SelectionState::from_ids([99]), None, None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn concern_prompt_known_and_unknown() {
        assert!(concern_prompt("Dryness").starts_with("My skin is very dry."));
        assert_eq!(
            concern_prompt("redness"),
            "I have concerns about redness. What L'Oréal products would you recommend?"
        );
    }

    fn opt_text() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[a-z]{1,12}")
    }

    proptest! {
        #[test]
        fn clauses_appear_in_fixed_order(
            context in opt_text(),
            items in proptest::collection::vec("[a-z]{1,8}", 0..4),
            focus in opt_text(),
            concern in opt_text(),
        ) {
            let req = ChatRequest {
                message: "m".to_string(),
                context: context.clone(),
                selected_items: items.clone(),
                focus_area: focus.clone(),
                concern: concern.clone(),
            };
            let s = compose_system_message(&req);
            prop_assert!(s.starts_with(PREAMBLE));
            prop_assert!(s.ends_with(INSTRUCTIONS));

            let mut cursor = PREAMBLE.len();
            if let Some(c) = &context {
                prop_assert_eq!(&s[cursor..cursor + c.len()], c.as_str());
                cursor += c.len();
            }
            let mut expect = Vec::new();
            if !items.is_empty() {
                expect.push(format!(" Selected products: {}.", items.join(", ")));
            }
            if let Some(f) = &focus {
                expect.push(format!(" User is focusing on: {f}."));
            }
            if let Some(c) = &concern {
                expect.push(format!(" User's main concern: {c}."));
            }
            for clause in expect {
                prop_assert_eq!(&s[cursor..cursor + clause.len()], clause.as_str());
                cursor += clause.len();
            }
            prop_assert_eq!(&s[cursor..], INSTRUCTIONS);
        }
    }
}
