//! Identifier helpers

use super::document::DocumentType;
use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// A fresh document id whose prefix names the document type, e.g. `sale_1...`.
pub fn new_document_id(doc_type: DocumentType) -> anyhow::Result<String> {
    // bech32 prefixes cannot mix case
    new_uuid_to_bech32(&format!("{}_", doc_type.as_str().to_ascii_lowercase()))
}
