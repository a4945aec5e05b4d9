//! Bundle name derivation.
//!
//! A UMD bundle exposes a global whose name is derived from the package
//! name or the entry file name:
//!
//! - `@org/rna-cli` becomes `RnaCli`
//! - `components/foo-bar/baz_qux.js` becomes `BazQux`

use std::path::Path;

/// Name used when nothing usable is left after sanitizing.
const FALLBACK_NAME: &str = "Bundle";

/// Camel-case the last `/` segment of `name`.
///
/// The first character and every character following a separator (`-`,
/// `_`, or anything else that cannot appear in an identifier) are upper
/// cased; separators are dropped. A result starting with a digit gets a
/// leading underscore.
pub fn camelize(name: &str) -> String {
    let segment = name.rsplit('/').next().unwrap_or(name);

    let mut result = String::with_capacity(segment.len());
    let mut upper_next = true;
    for c in segment.chars() {
        if c.is_alphanumeric() || c == '$' {
            if upper_next {
                result.extend(c.to_uppercase());
            } else {
                result.push(c);
            }
            upper_next = false;
        } else {
            upper_next = true;
        }
    }

    if result.is_empty() {
        return FALLBACK_NAME.to_string();
    }
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    result
}

/// Derive a bundle name from an input path: the file stem, camel-cased.
pub fn derive_name(path: &Path) -> String {
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    camelize(&stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_name_from_nested_path() {
        assert_eq!(derive_name(Path::new("components/foo-bar/baz_qux.js")), "BazQux");
    }

    #[test]
    fn test_derive_name_strips_only_last_extension() {
        assert_eq!(derive_name(Path::new("/src/date-picker.min.js")), "DatePickerMin");
    }

    #[test]
    fn test_camelize_scoped_package() {
        assert_eq!(camelize("@chialab/rna-cli"), "RnaCli");
        assert_eq!(camelize("dna"), "Dna");
    }

    #[test]
    fn test_camelize_keeps_inner_case() {
        assert_eq!(camelize("myWidget"), "MyWidget");
        assert_eq!(camelize("x-HTTP-client"), "XHTTPClient");
    }

    #[test]
    fn test_camelize_collapses_separator_runs() {
        assert_eq!(camelize("foo--bar__baz"), "FooBarBaz");
        assert_eq!(camelize("-leading"), "Leading");
    }

    #[test]
    fn test_camelize_leading_digit() {
        assert_eq!(camelize("3d-viewer"), "_3dViewer");
    }

    #[test]
    fn test_camelize_empty() {
        assert_eq!(camelize(""), "Bundle");
        assert_eq!(camelize("@scope/"), "Bundle");
    }
}
