// ranmix/src/channel/message.rs

use crate::error::{RanmixError, RanmixResult};

/// Upper bound on an attached receipt image.
pub const MAX_EVIDENCE_BYTES: usize = 5 * 1024 * 1024;

/// A receipt image the customer attached as payment evidence.
#[derive(Clone, PartialEq, Eq)]
pub struct EvidenceImage {
  pub file_name: String,
  pub content_type: String,
  pub bytes: Vec<u8>,
}

impl EvidenceImage {
  /// Rejects empty and oversized attachments.
  pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> RanmixResult<Self> {
    if bytes.is_empty() {
      return Err(RanmixError::Validation("payment evidence image is empty".into()));
    }
    if bytes.len() > MAX_EVIDENCE_BYTES {
      return Err(RanmixError::Validation(format!(
        "payment evidence image is {} bytes, the limit is {}",
        bytes.len(),
        MAX_EVIDENCE_BYTES
      )));
    }
    Ok(Self {
      file_name: file_name.into(),
      content_type: content_type.into(),
      bytes,
    })
  }

  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }
}

impl std::fmt::Debug for EvidenceImage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("EvidenceImage")
      .field("file_name", &self.file_name)
      .field("content_type", &self.content_type)
      .field("len", &self.bytes.len())
      .finish()
  }
}

/// A labeled button carrying an opaque token back to us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAction {
  pub label: String,
  pub token: String,
}

#[derive(Debug, Clone)]
pub struct OutboundMessage {
  pub text: String,
  pub image: Option<EvidenceImage>,
  pub actions: Vec<MessageAction>,
}
