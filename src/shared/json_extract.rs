use serde_json::Value;
use thiserror::Error;

/// Which pass produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStage {
    Strict,
    ArraySpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub value: Value,
    pub stage: ExtractionStage,
    pub raw: String,
}

/// Neither pass produced JSON. `raw` is always the untouched input.
#[derive(Debug, Clone, Error)]
#[error("no JSON value could be extracted: {reason}")]
pub struct ExtractionFailure {
    pub reason: String,
    pub raw: String,
}

/// Best-effort JSON extraction from model output.
///
/// The whole text is parsed strictly first. Model answers often wrap the
/// payload in prose or code fences, so the widest `[ ... ]` span is tried
/// next.
pub fn extract_json(raw: &str) -> Result<Extracted, ExtractionFailure> {
    let strict_err = match serde_json::from_str::<Value>(raw) {
        Ok(value) => {
            return Ok(Extracted {
                value,
                stage: ExtractionStage::Strict,
                raw: raw.to_string(),
            })
        }
        Err(err) => err,
    };

    let Some(span) = array_span(raw) else {
        return Err(ExtractionFailure {
            reason: format!("{strict_err}; no bracketed array found"),
            raw: raw.to_string(),
        });
    };

    match serde_json::from_str::<Value>(span) {
        Ok(value) => Ok(Extracted {
            value,
            stage: ExtractionStage::ArraySpan,
            raw: raw.to_string(),
        }),
        Err(span_err) => Err(ExtractionFailure {
            reason: format!("{strict_err}; bracketed span: {span_err}"),
            raw: raw.to_string(),
        }),
    }
}

fn array_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
