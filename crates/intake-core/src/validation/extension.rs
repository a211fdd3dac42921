use std::collections::BTreeMap;
use std::path::Path;

/// Why a declared content type was refused.
///
/// This is a plain value, not an error: the two cases produce different
/// user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionRejection {
    MissingContentType,
    Unsupported(String),
}

/// Content type to extension mapping plus the extension allow-list.
///
/// A content type is accepted only if it is mapped AND its mapped extension is
/// currently allowed. Removing an extension from the allow-list therefore disables
/// the content type even though the mapping still names it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPolicy {
    content_types: BTreeMap<String, String>,
    allowed_extensions: Vec<String>,
}

pub fn default_content_type_map() -> BTreeMap<String, String> {
    [
        ("application/pdf", ".pdf"),
        ("image/jpeg", ".jpg"),
        ("image/png", ".png"),
    ]
    .into_iter()
    .map(|(ct, ext)| (ct.to_string(), ext.to_string()))
    .collect()
}

pub fn default_allowed_extensions() -> Vec<String> {
    vec![".pdf".to_string(), ".jpg".to_string(), ".png".to_string()]
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self::new(default_content_type_map(), default_allowed_extensions())
    }
}

impl ExtensionPolicy {
    pub fn new(content_types: BTreeMap<String, String>, allowed_extensions: Vec<String>) -> Self {
        let content_types = content_types
            .into_iter()
            .map(|(ct, ext)| (normalize_content_type(&ct), ext.trim().to_lowercase()))
            .collect();
        let allowed_extensions = allowed_extensions
            .into_iter()
            .map(|ext| ext.trim().to_lowercase())
            .collect();

        Self {
            content_types,
            allowed_extensions,
        }
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    pub fn is_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed == extension)
    }

    /// Resolve the extension for a declared content type.
    ///
    /// Lookup ignores case, surrounding whitespace and MIME parameters, so
    /// `Image/PNG; charset=binary` resolves like `image/png`.
    pub fn resolve(&self, content_type: Option<&str>) -> Result<String, ExtensionRejection> {
        let raw = match content_type.map(str::trim) {
            Some(ct) if !ct.is_empty() => ct,
            _ => return Err(ExtensionRejection::MissingContentType),
        };

        match self.content_types.get(&normalize_content_type(raw)) {
            Some(extension) if self.is_allowed(extension) => Ok(extension.clone()),
            _ => Err(ExtensionRejection::Unsupported(raw.to_string())),
        }
    }

    /// Extension of an already-stored key (`.png` for `123_abc.png`), if allowed.
    pub fn extension_for_key(&self, key: &str) -> Option<String> {
        let extension = Path::new(key)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))?;

        self.is_allowed(&extension).then_some(extension)
    }
}

fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_default_mapping() {
        let policy = ExtensionPolicy::default();
        assert_eq!(policy.resolve(Some("application/pdf")).unwrap(), ".pdf");
        assert_eq!(policy.resolve(Some("image/jpeg")).unwrap(), ".jpg");
        assert_eq!(policy.resolve(Some("image/png")).unwrap(), ".png");
    }

    #[test]
    fn test_missing_content_type() {
        let policy = ExtensionPolicy::default();
        assert_eq!(policy.resolve(None), Err(ExtensionRejection::MissingContentType));
        assert_eq!(policy.resolve(Some("   ")), Err(ExtensionRejection::MissingContentType));
    }

    #[test]
    fn test_unmapped_content_type_is_unsupported() {
        let policy = ExtensionPolicy::default();
        for ct in ["text/plain", "image/gif", "application/octet-stream", "png"] {
            assert_eq!(
                policy.resolve(Some(ct)),
                Err(ExtensionRejection::Unsupported(ct.to_string()))
            );
        }
    }

    #[test]
    fn test_mapped_but_disallowed_extension_is_rejected() {
        let policy = ExtensionPolicy::new(
            default_content_type_map(),
            vec![".pdf".to_string(), ".jpg".to_string()],
        );
        assert_eq!(
            policy.resolve(Some("image/png")),
            Err(ExtensionRejection::Unsupported("image/png".to_string()))
        );
        assert_eq!(policy.resolve(Some("image/jpeg")).unwrap(), ".jpg");
    }

    #[test]
    fn test_lookup_ignores_case_and_parameters() {
        let policy = ExtensionPolicy::default();
        assert_eq!(policy.resolve(Some("Image/PNG")).unwrap(), ".png");
        assert_eq!(
            policy.resolve(Some(" application/pdf; name=report.pdf ")).unwrap(),
            ".pdf"
        );
    }

    #[test]
    fn test_unsupported_keeps_raw_value() {
        let policy = ExtensionPolicy::default();
        assert_eq!(
            policy.resolve(Some("Text/Plain")),
            Err(ExtensionRejection::Unsupported("Text/Plain".to_string()))
        );
    }

    #[test]
    fn test_extension_for_key() {
        let policy = ExtensionPolicy::default();
        assert_eq!(
            policy.extension_for_key("1714564800000_abc123xyz.png").as_deref(),
            Some(".png")
        );
        assert_eq!(policy.extension_for_key("report.PDF").as_deref(), Some(".pdf"));
        assert_eq!(policy.extension_for_key("notes.txt"), None);
        assert_eq!(policy.extension_for_key("no-extension"), None);
        assert_eq!(policy.extension_for_key("archive.png.exe"), None);
    }
}
