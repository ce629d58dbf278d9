use crate::error::AppError;

/// The two languages served by the site.
///
/// Indonesian is the canonical language: content is authored in Indonesian
/// and the English variant is derived from it by the translation pipeline.
/// Untagged legacy documents are treated as Indonesian on the read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Indonesian,
    English,
}

impl Language {
    pub fn from_code(code: &str) -> Result<Self, AppError> {
        match code {
            "id" => Ok(Language::Indonesian),
            "en" => Ok(Language::English),
            other => Err(AppError::InvalidPayload(format!(
                "unsupported language code: '{other}'"
            ))),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Indonesian => "id",
            Language::English => "en",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Indonesian => "Indonesian",
            Language::English => "English",
        }
    }

    /// The language content is authored in.
    pub fn canonical() -> Language {
        Language::Indonesian
    }

    pub fn is_canonical(&self) -> bool {
        *self == Language::canonical()
    }
}
