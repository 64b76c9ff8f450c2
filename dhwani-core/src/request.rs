use crate::error::SynthesisError;

/// Raw form fields as they arrived. Everything optional so admission, not
/// the HTTP framework, decides what a missing field means.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    pub text: Option<String>,
    pub language: Option<String>,
    pub gender: Option<String>,
    pub alpha: Option<String>,
}

/// One admitted synthesis request. Immutable once validated.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub language: String,
    pub gender: String,
    /// Duration-control hyperparameter forwarded to the worker.
    pub alpha: f32,
}

impl SynthesisRequest {
    /// Validate raw fields into a request, or fail with the reason. Pure:
    /// no filesystem or pool interaction happens before this passes.
    pub fn validate(raw: RawRequest, max_text_chars: usize) -> Result<Self, SynthesisError> {
        let text = required(raw.text, "text")?;
        let language = required(raw.language, "language")?;
        let gender = required(raw.gender, "gender")?;

        if text.chars().count() > max_text_chars {
            return Err(SynthesisError::Validation(format!(
                "Text length exceeds maximum limit of {max_text_chars} characters"
            )));
        }

        let alpha = match raw.alpha.as_deref().map(str::trim) {
            None | Some("") => 1.0,
            Some(value) => value.parse::<f32>().map_err(|_| {
                SynthesisError::Validation(format!("Parameter 'alpha' must be a number, got {value:?}"))
            })?,
        };

        Ok(Self {
            text,
            language,
            gender,
            alpha,
        })
    }
}

fn required(field: Option<String>, name: &str) -> Result<String, SynthesisError> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SynthesisError::Validation(format!(
            "Missing required parameter '{name}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str, language: &str, gender: &str) -> RawRequest {
        RawRequest {
            text: Some(text.to_string()),
            language: Some(language.to_string()),
            gender: Some(gender.to_string()),
            alpha: None,
        }
    }

    #[test]
    fn accepts_a_plain_request_with_default_alpha() {
        let request = SynthesisRequest::validate(raw("namaste", "hindi", "female"), 500).unwrap();

        assert_eq!(request.text, "namaste");
        assert_eq!(request.language, "hindi");
        assert_eq!(request.gender, "female");
        assert_eq!(request.alpha, 1.0);
    }

    #[test]
    fn rejects_empty_text() {
        let err = SynthesisRequest::validate(raw("", "hindi", "female"), 500).unwrap_err();
        assert!(matches!(err, SynthesisError::Validation(_)));
    }

    #[test]
    fn rejects_whitespace_only_language() {
        let err = SynthesisRequest::validate(raw("hello", "  ", "male"), 500).unwrap_err();
        assert!(matches!(err, SynthesisError::Validation(_)));
    }

    #[test]
    fn rejects_missing_gender() {
        let raw = RawRequest {
            text: Some("hello".to_string()),
            language: Some("hindi".to_string()),
            gender: None,
            alpha: None,
        };
        let err = SynthesisRequest::validate(raw, 500).unwrap_err();
        assert!(matches!(err, SynthesisError::Validation(_)));
    }

    #[test]
    fn rejects_text_over_the_ceiling() {
        let long = "x".repeat(501);
        let err = SynthesisRequest::validate(raw(&long, "hindi", "female"), 500).unwrap_err();
        assert!(matches!(err, SynthesisError::Validation(_)));

        let at_limit = "x".repeat(500);
        assert!(SynthesisRequest::validate(raw(&at_limit, "hindi", "female"), 500).is_ok());
    }

    #[test]
    fn parses_explicit_alpha() {
        let mut fields = raw("hello", "hindi", "male");
        fields.alpha = Some("1.35".to_string());

        let request = SynthesisRequest::validate(fields, 500).unwrap();
        assert!((request.alpha - 1.35).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_alpha_means_default() {
        let mut fields = raw("hello", "hindi", "male");
        fields.alpha = Some("".to_string());

        let request = SynthesisRequest::validate(fields, 500).unwrap();
        assert_eq!(request.alpha, 1.0);
    }

    #[test]
    fn rejects_non_numeric_alpha() {
        let mut fields = raw("hello", "hindi", "male");
        fields.alpha = Some("fast".to_string());

        let err = SynthesisRequest::validate(fields, 500).unwrap_err();
        assert!(matches!(err, SynthesisError::Validation(_)));
    }
}
