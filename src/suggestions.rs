//! # Error Suggestions
//!
//! Helpers producing CLI errors that say what went wrong and how to fix it,
//! plus the edit distance used both for "did you mean" hints and for
//! scoring approximate name matches in the authority factory.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::suggestions;
//!
//! return Err(suggestions::unknown_convention("WKT3", &["WKT2_2018", "WKT1_GDAL"]));
//! ```

use std::path::Path;

/// Error for a metadata repository that cannot be found.
///
/// Includes hints about:
/// - Using the --database flag
/// - Using the CRS_TEXT_DATABASE environment variable
/// - Setting `database.path` in the settings file
pub fn database_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Metadata repository not found: {path}\n\n\
         hint: Use --database to specify the repository JSON file\n\
         hint: Set the CRS_TEXT_DATABASE environment variable\n\
         hint: Set database.path in the settings file",
        path = path.display()
    )
}

/// Error for an unknown output convention, with the closest valid one.
pub fn unknown_convention(name: &str, valid: &[&str]) -> anyhow::Error {
    let did_you_mean = did_you_mean(name, valid);
    anyhow::anyhow!(
        "Unknown convention: {name}{did_you_mean}\n\n\
         Valid conventions are: {all}",
        all = valid.join(", ")
    )
}

/// Error for an unknown object type, with the closest valid one.
pub fn unknown_object_type(name: &str, valid: &[&str]) -> anyhow::Error {
    let did_you_mean = did_you_mean(name, valid);
    anyhow::anyhow!(
        "Unknown object type: {name}{did_you_mean}\n\n\
         Valid object types are: {all}",
        all = valid.join(", ")
    )
}

/// Error for input that is neither WKT, a pipeline string nor a code.
///
/// `names` are registered names close to the input, if any.
pub fn unrecognized_input(input: &str, error: &crate::error::Error, names: &[String]) -> anyhow::Error {
    let hint = match names.first() {
        Some(name) => format!("\nhint: Did you mean '{name}'?"),
        None => String::new(),
    };
    anyhow::anyhow!(
        "Cannot interpret '{input}'\n\
         error: {error}{hint}\n\n\
         hint: Accepted forms are WKT, '+proj=...' strings and AUTHORITY:CODE"
    )
}

fn did_you_mean(input: &str, candidates: &[&str]) -> String {
    find_similar(input, candidates)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default()
}

/// Find a similar string from a list of candidates using edit distance,
/// ignoring case.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
pub(crate) fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let input = input.to_ascii_lowercase();
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(&input, &candidate.to_ascii_lowercase());
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
pub(crate) fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[a_len][b_len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_not_found_includes_hints() {
        let error = database_not_found(Path::new("/data/proj.json"));
        let message = error.to_string();

        assert!(message.contains("Metadata repository not found"));
        assert!(message.contains("/data/proj.json"));
        assert!(message.contains("--database"));
        assert!(message.contains("CRS_TEXT_DATABASE"));
    }

    #[test]
    fn test_unknown_convention_suggests_similar() {
        let valid = ["WKT2_2018", "WKT2_2015", "WKT1_GDAL", "WKT1_ESRI"];
        let message = unknown_convention("wkt1_gdl", &valid).to_string();

        assert!(message.contains("Unknown convention: wkt1_gdl"));
        assert!(message.contains("Did you mean 'WKT1_GDAL'?"));
        assert!(message.contains("Valid conventions are:"));
    }

    #[test]
    fn test_unknown_object_type_no_suggestion_for_very_different() {
        let message = unknown_object_type("foobar", &["crs", "ellipsoid"]).to_string();

        assert!(message.contains("Unknown object type: foobar"));
        assert!(!message.contains("Did you mean"));
    }

    #[test]
    fn test_unrecognized_input_mentions_names() {
        let error = crate::error::Error::parse("Unexpected end of input");
        let message = unrecognized_input("WGS 8", &error, &["WGS 84".to_string()]).to_string();

        assert!(message.contains("Cannot interpret 'WGS 8'"));
        assert!(message.contains("Did you mean 'WGS 84'?"));
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("wgs84", "wgs84"), 0);
        assert_eq!(edit_distance("wgs8", "wgs84"), 1);
        assert_eq!(edit_distance("wgs72", "wgs84"), 2);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("foobar", "etrs89"), 6);
    }

    #[test]
    fn test_find_similar() {
        let candidates = ["WKT2_2018", "WKT1_ESRI", "PROJ_5"];

        assert_eq!(find_similar("wkt2_2019", &candidates), Some("WKT2_2018"));
        assert_eq!(find_similar("proj5", &candidates), Some("PROJ_5"));
        assert_eq!(find_similar("foobar", &candidates), None);
    }
}
