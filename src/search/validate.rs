//! Parameter checks run before anything reaches the engine.

use crate::search::types::SearchParameters;
use thiserror::Error;

/// Longest search string the engine accepts, in UTF-8 bytes (1 GiB)
pub const MAX_SEARCH_STRING_BYTES: usize = 1 << 30;

/// Why a parameter set was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("nothing to search for: select files and/or directories")]
    NoSearchTarget,
    #[error("searching files needs at least one of: name, path, contents")]
    NoFileSearchMode,
    #[error("searching file contents needs UTF-8 and/or UTF-16 selected")]
    NoContentEncoding,
    #[error("searching directories needs at least one of: name, path")]
    NoDirectorySearchMode,
    #[error("search path must not be empty")]
    EmptyPath,
    #[error("search pattern must not be empty")]
    EmptyPattern,
    #[error("search string must not be empty")]
    EmptySearchString,
    #[error("search string is too long ({0} bytes)")]
    SearchStringTooLong(usize),
    #[error("searching contents as UTF-8 supports ASCII search strings only")]
    NonAsciiUtf8Contents,
}

/// Check every rule in order and report the first one that fails
pub fn validate(params: &SearchParameters) -> Result<(), ValidationError> {
    if !params.search_for_files && !params.search_for_directories {
        return Err(ValidationError::NoSearchTarget);
    }

    if params.search_for_files
        && !params.search_in_file_name
        && !params.search_in_file_path
        && !params.search_in_file_contents
    {
        return Err(ValidationError::NoFileSearchMode);
    }

    if params.search_in_file_contents && !params.contents_as_utf8 && !params.contents_as_utf16 {
        return Err(ValidationError::NoContentEncoding);
    }

    if params.search_for_directories
        && !params.search_in_directory_path
        && !params.search_in_directory_name
    {
        return Err(ValidationError::NoDirectorySearchMode);
    }

    if params.path.as_os_str().is_empty() {
        return Err(ValidationError::EmptyPath);
    }

    if params.pattern.is_empty() {
        return Err(ValidationError::EmptyPattern);
    }

    if params.search_string.is_empty() {
        return Err(ValidationError::EmptySearchString);
    }

    // String length is already the UTF-8 byte count
    check_search_string_len(params.search_string.len())?;

    if params.search_in_file_contents
        && params.contents_as_utf8
        && !params.search_string.is_ascii()
    {
        return Err(ValidationError::NonAsciiUtf8Contents);
    }

    Ok(())
}

fn check_search_string_len(len: usize) -> Result<(), ValidationError> {
    if len > MAX_SEARCH_STRING_BYTES {
        return Err(ValidationError::SearchStringTooLong(len));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn valid() -> SearchParameters {
        SearchParameters::new("/tmp", "needle")
    }

    #[test]
    fn test_defaults_with_string_are_valid() {
        assert_eq!(validate(&valid()), Ok(()));
    }

    #[test]
    fn test_no_target_selected() {
        let mut params = valid();
        params.search_for_files = false;
        params.search_for_directories = false;

        let err = validate(&params).unwrap_err();
        assert_eq!(err, ValidationError::NoSearchTarget);
        assert!(err.to_string().contains("select files and/or directories"));
    }

    #[test]
    fn test_files_without_mode() {
        let mut params = valid();
        params.search_in_file_name = false;
        assert_eq!(validate(&params), Err(ValidationError::NoFileSearchMode));
    }

    #[test]
    fn test_contents_without_encoding() {
        let mut params = valid();
        params.search_in_file_contents = true;
        assert_eq!(validate(&params), Err(ValidationError::NoContentEncoding));
    }

    #[test]
    fn test_directories_without_mode() {
        let mut params = valid();
        params.search_for_directories = true;
        assert_eq!(
            validate(&params),
            Err(ValidationError::NoDirectorySearchMode)
        );

        params.search_in_directory_name = true;
        assert_eq!(validate(&params), Ok(()));
    }

    #[test]
    fn test_directory_only_search_ignores_file_modes() {
        let mut params = valid();
        params.search_for_files = false;
        params.search_in_file_name = false;
        params.search_for_directories = true;
        params.search_in_directory_path = true;
        assert_eq!(validate(&params), Ok(()));
    }

    #[test]
    fn test_empty_fields() {
        let mut params = valid();
        params.path = PathBuf::new();
        assert_eq!(validate(&params), Err(ValidationError::EmptyPath));

        let mut params = valid();
        params.pattern.clear();
        assert_eq!(validate(&params), Err(ValidationError::EmptyPattern));

        let mut params = valid();
        params.search_string.clear();
        assert_eq!(validate(&params), Err(ValidationError::EmptySearchString));
    }

    #[test]
    fn test_search_string_length_limit() {
        assert_eq!(check_search_string_len(MAX_SEARCH_STRING_BYTES), Ok(()));
        let err = check_search_string_len(MAX_SEARCH_STRING_BYTES + 1).unwrap_err();
        assert_eq!(
            err,
            ValidationError::SearchStringTooLong(MAX_SEARCH_STRING_BYTES + 1)
        );
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn test_non_ascii_utf8_contents() {
        let mut params = valid();
        params.search_string = "héllo".to_string();
        params.search_in_file_contents = true;
        params.contents_as_utf8 = true;
        assert_eq!(validate(&params), Err(ValidationError::NonAsciiUtf8Contents));

        // UTF-16 only is fine with non-ASCII input
        params.contents_as_utf8 = false;
        params.contents_as_utf16 = true;
        assert_eq!(validate(&params), Ok(()));
    }

    #[test]
    fn test_first_failing_rule_wins() {
        let mut params = valid();
        params.search_for_files = false;
        params.search_string.clear();
        params.pattern.clear();
        assert_eq!(validate(&params), Err(ValidationError::NoSearchTarget));
    }
}
