//! Transition requests and the values returned for them
use super::document::DocumentType;
use super::error::LifecycleError;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use uuid7::uuid7;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// A proposed move of one document from the state the caller holds to a target.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    #[n(0)]
    pub request_id: String, // idempotency key, uuid7 unless the caller supplies one
    #[n(1)]
    pub doc_type: DocumentType,
    #[n(2)]
    pub document_id: String,
    #[n(3)]
    pub from_state: String,
    #[n(4)]
    pub to_state: String,
    #[n(5)]
    pub user_id: String,
    #[n(6)]
    pub reason: Option<String>,
    #[n(7)]
    pub metadata: BTreeMap<String, String>,
    #[n(8)]
    pub requested_at: TimeStamp<Utc>,
}

impl TransitionRequest {
    pub fn new(
        doc_type: DocumentType,
        document_id: &str,
        from_state: &str,
        to_state: &str,
        user_id: &str,
    ) -> Self {
        Self {
            request_id: uuid7().to_string(),
            doc_type,
            document_id: document_id.to_string(),
            from_state: from_state.to_string(),
            to_state: to_state.to_string(),
            user_id: user_id.to_string(),
            reason: None,
            metadata: BTreeMap::new(),
            requested_at: TimeStamp::new(),
        }
    }
    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = request_id.to_string();
        self
    }
    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
    /// A reason that is present and not just whitespace
    pub fn has_reason(&self) -> bool {
        self.reason.as_deref().is_some_and(|r| !r.trim().is_empty())
    }
}

/// Outcome of validating a request. Rejections are data, not `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionValidation {
    pub valid: bool,
    pub error: Option<LifecycleError>,
    pub permission: Option<String>,
}

impl TransitionValidation {
    pub(crate) fn accepted(permission: Option<&str>) -> Self {
        Self {
            valid: true,
            error: None,
            permission: permission.map(str::to_string),
        }
    }
    pub(crate) fn rejected(error: LifecycleError) -> Self {
        Self {
            valid: false,
            error: Some(error),
            permission: None,
        }
    }
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
    /// The legal alternatives when the edge itself was rejected.
    pub fn allowed_states(&self) -> &[String] {
        match &self.error {
            Some(LifecycleError::InvalidTransition { allowed, .. }) => allowed,
            _ => &[],
        }
    }
}

/// Everything a caller needs to commit a transition: the decision, the
/// permission to check and the hooks to run.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    #[n(0)]
    pub success: bool,
    #[n(1)]
    pub previous_state: String,
    #[n(2)]
    pub new_state: String, // equals previous_state when rejected
    #[n(3)]
    pub error: Option<String>,
    #[n(4)]
    pub warnings: Vec<String>,
    #[n(5)]
    pub hooks: Vec<String>,
    #[n(6)]
    pub permission: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_encoding() {
        let original = TimeStamp::new();

        let encoding = minicbor::to_vec(original.clone()).unwrap();
        let decode: TimeStamp<Utc> = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn blank_reason_is_no_reason() {
        let request = TransitionRequest::new(DocumentType::Sale, "sale_1", "BORRADOR", "CANCELADA", "u");
        assert!(!request.has_reason());
        assert!(!request.clone().with_reason("   ").has_reason());
        assert!(request.with_reason("cliente desistió").has_reason());
    }

    #[test]
    fn requests_get_distinct_ids() {
        let a = TransitionRequest::new(DocumentType::Sale, "sale_1", "BORRADOR", "CONFIRMADA", "u");
        let b = TransitionRequest::new(DocumentType::Sale, "sale_1", "BORRADOR", "CONFIRMADA", "u");
        assert_ne!(a.request_id, b.request_id);
    }
}
