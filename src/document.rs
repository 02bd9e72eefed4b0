//! Document type tags and the composite transition key
use super::error::LifecycleError;
use std::{fmt, str::FromStr};

/// The six document kinds of the order-to-cash pipeline. Each owns an
/// independent state space, even where state names coincide.
#[derive(
    minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub enum DocumentType {
    #[n(0)]
    Sale,
    #[n(1)]
    LoadOrder,
    #[n(2)]
    Delivery,
    #[n(3)]
    Remito,
    #[n(4)]
    Invoice,
    #[n(5)]
    Payment,
}

impl DocumentType {
    pub const ALL: [DocumentType; 6] = [
        DocumentType::Sale,
        DocumentType::LoadOrder,
        DocumentType::Delivery,
        DocumentType::Remito,
        DocumentType::Invoice,
        DocumentType::Payment,
    ];

    /// The tag used in permission keys and by API callers
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Sale => "sale",
            DocumentType::LoadOrder => "loadOrder",
            DocumentType::Delivery => "delivery",
            DocumentType::Remito => "remito",
            DocumentType::Invoice => "invoice",
            DocumentType::Payment => "payment",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::ALL
            .into_iter()
            .find(|doc_type| doc_type.as_str() == s)
            .ok_or_else(|| LifecycleError::UnknownDocumentType(s.to_string()))
    }
}

/// A single edge `from -> to` within one document type's graph.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionKey {
    #[n(0)]
    pub doc_type: DocumentType,
    #[n(1)]
    pub from: String,
    #[n(2)]
    pub to: String,
}

impl TransitionKey {
    pub fn new(doc_type: DocumentType, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            doc_type,
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}->{}", self.doc_type, self.from, self.to)
    }
}
