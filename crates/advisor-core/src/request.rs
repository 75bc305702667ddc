use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::Catalog;
use crate::selection::SelectionState;
use crate::{Error, Result};

/// A prompt plus the selection context it was asked in.
///
/// Serde names follow the gateway's JSON body (`products`, `faceArea`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(
        default,
        rename = "products",
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub selected_items: Vec<String>,
    #[serde(default, rename = "faceArea", skip_serializing_if = "Option::is_none")]
    pub focus_area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concern: Option<String>,
}

fn null_as_default<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Blank optional strings count as "not given".
fn given(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Build a request from explicit selection state.
    ///
    /// Selected ids are resolved to product names through `catalog`; ids the catalog does not
    /// know are skipped.
    pub fn from_selection(
        message: impl Into<String>,
        catalog: &Catalog,
        selection: &SelectionState,
        focus_area: Option<String>,
        concern: Option<String>,
    ) -> Self {
        Self {
            message: message.into(),
            context: None,
            selected_items: catalog
                .resolve(selection)
                .into_iter()
                .map(|p| p.name.clone())
                .collect(),
            focus_area,
            concern,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_selected_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_items = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_focus_area(mut self, focus_area: impl Into<String>) -> Self {
        self.focus_area = Some(focus_area.into());
        self
    }

    pub fn with_concern(mut self, concern: impl Into<String>) -> Self {
        self.concern = Some(concern.into());
        self
    }

    pub fn context(&self) -> Option<&str> {
        given(&self.context)
    }

    pub fn focus_area(&self) -> Option<&str> {
        given(&self.focus_area)
    }

    pub fn concern(&self) -> Option<&str> {
        given(&self.concern)
    }

    /// The only input check: a non-empty message.
    pub fn validate(&self) -> Result<()> {
        if self.message.trim().is_empty() {
            return Err(Error::Validation("message must not be empty".to_string()));
        }
        Ok(())
    }
}

/// The answer to a [`ChatRequest`], independent of which upstream model served it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub text: String,
    pub used_primary_model: bool,
    pub search_results: Option<serde_json::Value>,
}

impl ChatResponse {
    /// Gateway success body.
    ///
    /// Primary replies always carry `webSearchResults` (possibly `null`); fallback replies omit it.
    pub fn to_envelope(&self) -> serde_json::Value {
        if self.used_primary_model {
            serde_json::json!({
                "response": self.text,
                "webSearchResults": self.search_results.clone().unwrap_or(serde_json::Value::Null),
                "hasWebSearch": true,
            })
        } else {
            serde_json::json!({
                "response": self.text,
                "hasWebSearch": false,
            })
        }
    }

    pub fn from_envelope(bytes: &[u8]) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Envelope {
            response: String,
            #[serde(default)]
            web_search_results: Option<serde_json::Value>,
            #[serde(default)]
            has_web_search: bool,
        }

        let env: Envelope = serde_json::from_slice(bytes).map_err(|e| Error::RequestFailed {
            status: None,
            message: format!("malformed gateway response: {e}"),
        })?;
        Ok(Self {
            text: env.response,
            used_primary_model: env.has_web_search,
            search_results: env.web_search_results.filter(|v| !v.is_null()),
        })
    }
}

/// Gateway failure body: a user-facing line plus diagnostic detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(default)]
    pub details: String,
}

impl ErrorEnvelope {
    pub fn from_error(e: &Error) -> Self {
        Self {
            error: crate::GENERIC_ERROR_TEXT.to_string(),
            details: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gateway_body_names() {
        let r: ChatRequest = serde_json::from_str(
            r#"{"message":"hi","context":"c","products":["A","B"],"faceArea":"eyes","concern":"dryness"}"#,
        )
        .unwrap();
        assert_eq!(r.message, "hi");
        assert_eq!(r.selected_items, vec!["A", "B"]);
        assert_eq!(r.focus_area(), Some("eyes"));
        assert_eq!(r.concern(), Some("dryness"));
    }

    #[test]
    fn null_and_missing_fields_are_absent() {
        let r: ChatRequest =
            serde_json::from_str(r#"{"message":"hi","products":null,"faceArea":""}"#).unwrap();
        assert!(r.selected_items.is_empty());
        assert_eq!(r.focus_area(), None);
        assert_eq!(r.context(), None);
    }

    #[test]
    fn blank_message_is_rejected() {
        assert!(matches!(
            ChatRequest::new("   ").validate(),
            Err(Error::Validation(_))
        ));
        assert!(ChatRequest::default().validate().is_err());
        assert!(ChatRequest::new("Help with dry skin").validate().is_ok());
    }

    #[test]
    fn serializes_with_gateway_names_and_skips_empty() {
        let v = serde_json::to_value(
            ChatRequest::new("m")
                .with_selected_items(["Serum"])
                .with_focus_area("cheeks"),
        )
        .unwrap();
        assert_eq!(
            v,
            serde_json::json!({ "message": "m", "products": ["Serum"], "faceArea": "cheeks" })
        );
    }

    #[test]
    fn envelope_shapes_differ_by_model() {
        let primary = ChatResponse {
            text: "a".to_string(),
            used_primary_model: true,
            search_results: None,
        };
        assert_eq!(
            primary.to_envelope(),
            serde_json::json!({ "response": "a", "webSearchResults": null, "hasWebSearch": true })
        );

        let fallback = ChatResponse {
            text: "Try X".to_string(),
            used_primary_model: false,
            search_results: None,
        };
        let v = fallback.to_envelope();
        assert_eq!(
            v,
            serde_json::json!({ "response": "Try X", "hasWebSearch": false })
        );
        let back = ChatResponse::from_envelope(v.to_string().as_bytes()).unwrap();
        assert_eq!(back, fallback);
    }

    #[test]
    fn malformed_envelope_is_request_failed() {
        let err = ChatResponse::from_envelope(b"{\"nope\":1}").unwrap_err();
        assert!(matches!(err, Error::RequestFailed { status: None, .. }));
    }

    #[test]
    fn error_envelope_keeps_detail() {
        let env = ErrorEnvelope::from_error(&Error::FallbackUnavailable {
            primary: "HTTP 503".to_string(),
            fallback: "HTTP 500".to_string(),
        });
        assert_eq!(env.error, crate::GENERIC_ERROR_TEXT);
        assert!(env.details.contains("HTTP 503"));
        assert!(env.details.contains("HTTP 500"));
    }
}
