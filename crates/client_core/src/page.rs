//! Page addresses: the origin pages talk to and the question id they are about.

use shared::domain::QuestionId;
use url::Url;

use crate::error::PageAddressError;

/// Serialized origin (`scheme://host[:port]`, no trailing slash) of an absolute URL.
pub fn origin_of(raw: &str) -> Result<String, PageAddressError> {
    let url = Url::parse(raw.trim())?;
    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(PageAddressError::OpaqueOrigin(raw.to_string()));
    }
    Ok(origin.ascii_serialization())
}

/// A respondent or summary page address, e.g. `http://host/summary/q1`.
#[derive(Debug, Clone)]
pub struct PageAddress {
    origin: String,
    question_id: QuestionId,
}

impl PageAddress {
    pub fn parse(raw: &str) -> Result<Self, PageAddressError> {
        let url = Url::parse(raw.trim())?;
        if !url.origin().is_tuple() {
            return Err(PageAddressError::OpaqueOrigin(raw.to_string()));
        }
        let question_id = QuestionId::from_path(url.path())
            .ok_or_else(|| PageAddressError::MissingQuestionId(raw.to_string()))?;
        Ok(Self {
            origin: url.origin().ascii_serialization(),
            question_id,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }
}
