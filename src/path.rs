//! Path splitting for slash-delimited Drive directory paths.

/// Split a slash-delimited path into its non-empty segments, root to leaf.
///
/// Leading, trailing and repeated separators are ignored, as are `.`
/// segments, so `"/a//b/./c/"` yields `["a", "b", "c"]`. Empty input yields
/// an empty vector.
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path() {
        assert!(split_path("").is_empty());
    }

    #[test]
    fn test_root_only() {
        assert!(split_path("/").is_empty());
        assert!(split_path(".").is_empty());
    }

    #[test]
    fn test_absolute_path() {
        assert_eq!(split_path("/a/b/c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_trailing_separator() {
        assert_eq!(split_path("a/b/"), vec!["a", "b"]);
    }

    #[test]
    fn test_repeated_separators() {
        assert_eq!(split_path("a//b///c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dot_segments_dropped() {
        assert_eq!(split_path("./a/./b"), vec!["a", "b"]);
    }

    #[test]
    fn test_names_with_spaces() {
        assert_eq!(
            split_path("Fotos/2014 Portugalia"),
            vec!["Fotos", "2014 Portugalia"]
        );
    }
}
