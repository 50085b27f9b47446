//! Upload name validation and normalization.

use super::types::ValidationErrors;

/// Field name used in validation error maps.
pub const FILE_FIELD: &str = "file";

/// Longest accepted client file name, in characters.
pub const MAX_NAME_CHARS: usize = 100;

/// Reduce a client-supplied name to its final path component.
///
/// Both `/` and `\` count as separators so Windows paths from browsers are handled too.
pub(crate) fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim()
}

/// Validate an upload and return the cleaned original name.
pub(crate) fn validate_upload(
    bytes: &[u8],
    original_name: Option<&str>,
) -> Result<String, ValidationErrors> {
    let name = original_name.map(base_name).unwrap_or_default();
    if name.is_empty() {
        return Err(ValidationErrors::single(
            FILE_FIELD,
            "No filename could be determined.",
        ));
    }

    let length = name.chars().count();
    if length > MAX_NAME_CHARS {
        return Err(ValidationErrors::single(
            FILE_FIELD,
            format!(
                "Ensure this filename has at most {MAX_NAME_CHARS} characters (it has {length})."
            ),
        ));
    }

    if bytes.is_empty() {
        return Err(ValidationErrors::single(
            FILE_FIELD,
            "The submitted file is empty.",
        ));
    }

    Ok(name.to_string())
}

/// Map a validated name onto a filesystem-safe blob name, keeping its extension.
pub(crate) fn storage_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    // A leading dot would hide the blob and "." / ".." must never become path components.
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_directories() {
        assert_eq!(base_name("../../etc/passwd.txt"), "passwd.txt");
        assert_eq!(base_name(r"C:\Users\me\report.pdf"), "report.pdf");
        assert_eq!(base_name("notes.md"), "notes.md");
    }

    #[test]
    fn rejects_missing_and_blank_names() {
        for name in [None, Some(""), Some("   "), Some("dir/")] {
            let errors = validate_upload(b"data", name).expect_err("name required");
            assert_eq!(
                errors.field(FILE_FIELD),
                Some(&["No filename could be determined.".to_string()][..])
            );
        }
    }

    #[test]
    fn rejects_overlong_names() {
        let name = format!("{}.txt", "a".repeat(97));
        let errors = validate_upload(b"data", Some(&name)).expect_err("too long");
        assert_eq!(
            errors.field(FILE_FIELD),
            Some(
                &["Ensure this filename has at most 100 characters (it has 101).".to_string()][..]
            )
        );
    }

    #[test]
    fn rejects_empty_payload() {
        let errors = validate_upload(b"", Some("notes.txt")).expect_err("empty");
        assert_eq!(errors.to_string(), "file: The submitted file is empty.");
    }

    #[test]
    fn storage_name_keeps_extension_and_drops_unsafe_chars() {
        assert_eq!(storage_name("my report (v2).pdf"), "my_report__v2_.pdf");
        assert_eq!(storage_name("..hidden.txt"), "hidden.txt");
        assert_eq!(storage_name(".."), "upload");
    }
}
