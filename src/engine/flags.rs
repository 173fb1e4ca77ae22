//! Bit representation of search modes as the engine boundary expects it.

use crate::search::types::SearchParameters;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SearchFlags(u32);

impl SearchFlags {
    pub const NONE: Self = Self(0);
    pub const SEARCH_FOR_FILES: Self = Self(1 << 0);
    pub const SEARCH_IN_FILE_NAME: Self = Self(1 << 1);
    pub const SEARCH_IN_FILE_PATH: Self = Self(1 << 2);
    pub const SEARCH_IN_FILE_CONTENTS: Self = Self(1 << 3);
    pub const CONTENTS_AS_UTF8: Self = Self(1 << 4);
    pub const CONTENTS_AS_UTF16: Self = Self(1 << 5);
    pub const SEARCH_FOR_DIRECTORIES: Self = Self(1 << 6);
    pub const SEARCH_IN_DIRECTORY_PATH: Self = Self(1 << 7);
    pub const SEARCH_IN_DIRECTORY_NAME: Self = Self(1 << 8);
    pub const RECURSIVE: Self = Self(1 << 9);
    pub const IGNORE_CASE: Self = Self(1 << 10);
    pub const SKIP_DOT_ENTRIES: Self = Self(1 << 11);

    const NAMES: [(Self, &'static str); 12] = [
        (Self::SEARCH_FOR_FILES, "SEARCH_FOR_FILES"),
        (Self::SEARCH_IN_FILE_NAME, "SEARCH_IN_FILE_NAME"),
        (Self::SEARCH_IN_FILE_PATH, "SEARCH_IN_FILE_PATH"),
        (Self::SEARCH_IN_FILE_CONTENTS, "SEARCH_IN_FILE_CONTENTS"),
        (Self::CONTENTS_AS_UTF8, "CONTENTS_AS_UTF8"),
        (Self::CONTENTS_AS_UTF16, "CONTENTS_AS_UTF16"),
        (Self::SEARCH_FOR_DIRECTORIES, "SEARCH_FOR_DIRECTORIES"),
        (Self::SEARCH_IN_DIRECTORY_PATH, "SEARCH_IN_DIRECTORY_PATH"),
        (Self::SEARCH_IN_DIRECTORY_NAME, "SEARCH_IN_DIRECTORY_NAME"),
        (Self::RECURSIVE, "RECURSIVE"),
        (Self::IGNORE_CASE, "IGNORE_CASE"),
        (Self::SKIP_DOT_ENTRIES, "SKIP_DOT_ENTRIES"),
    ];

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Translate the boolean modes of a parameter set into flag bits
    pub fn from_parameters(params: &SearchParameters) -> Self {
        let mut flags = Self::NONE;
        let modes = [
            (params.search_for_files, Self::SEARCH_FOR_FILES),
            (params.search_in_file_name, Self::SEARCH_IN_FILE_NAME),
            (params.search_in_file_path, Self::SEARCH_IN_FILE_PATH),
            (params.search_in_file_contents, Self::SEARCH_IN_FILE_CONTENTS),
            (params.contents_as_utf8, Self::CONTENTS_AS_UTF8),
            (params.contents_as_utf16, Self::CONTENTS_AS_UTF16),
            (params.search_for_directories, Self::SEARCH_FOR_DIRECTORIES),
            (params.search_in_directory_path, Self::SEARCH_IN_DIRECTORY_PATH),
            (params.search_in_directory_name, Self::SEARCH_IN_DIRECTORY_NAME),
            (params.recursive, Self::RECURSIVE),
            (params.ignore_case, Self::IGNORE_CASE),
            (params.skip_dot_entries, Self::SKIP_DOT_ENTRIES),
        ];

        for (enabled, flag) in modes {
            if enabled {
                flags |= flag;
            }
        }
        flags
    }
}

impl BitOr for SearchFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SearchFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for SearchFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();

        if names.is_empty() {
            write!(f, "SearchFlags(NONE)")
        } else {
            write!(f, "SearchFlags({})", names.join(" | "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_values_match_engine_abi() {
        assert_eq!(SearchFlags::SEARCH_FOR_FILES.bits(), 0x001);
        assert_eq!(SearchFlags::SEARCH_IN_FILE_CONTENTS.bits(), 0x008);
        assert_eq!(SearchFlags::SEARCH_FOR_DIRECTORIES.bits(), 0x040);
        assert_eq!(SearchFlags::RECURSIVE.bits(), 0x200);
        assert_eq!(SearchFlags::SKIP_DOT_ENTRIES.bits(), 0x800);
    }

    #[test]
    fn test_default_parameters_translate() {
        let flags = SearchFlags::from_parameters(&SearchParameters::default());
        let expected = SearchFlags::SEARCH_FOR_FILES
            | SearchFlags::SEARCH_IN_FILE_NAME
            | SearchFlags::RECURSIVE
            | SearchFlags::IGNORE_CASE
            | SearchFlags::SKIP_DOT_ENTRIES;
        assert_eq!(flags, expected);
        assert!(!flags.contains(SearchFlags::SEARCH_FOR_DIRECTORIES));
    }

    #[test]
    fn test_every_mode_maps_to_its_own_bit() {
        let params = SearchParameters {
            search_for_files: true,
            search_in_file_name: true,
            search_in_file_path: true,
            search_in_file_contents: true,
            contents_as_utf8: true,
            contents_as_utf16: true,
            search_for_directories: true,
            search_in_directory_path: true,
            search_in_directory_name: true,
            recursive: true,
            ignore_case: true,
            skip_dot_entries: true,
            ..SearchParameters::default()
        };
        assert_eq!(SearchFlags::from_parameters(&params).bits(), 0xFFF);
    }

    #[test]
    fn test_debug_lists_names() {
        let flags = SearchFlags::SEARCH_FOR_FILES | SearchFlags::IGNORE_CASE;
        assert_eq!(
            format!("{:?}", flags),
            "SearchFlags(SEARCH_FOR_FILES | IGNORE_CASE)"
        );
        assert_eq!(format!("{:?}", SearchFlags::NONE), "SearchFlags(NONE)");
    }
}
