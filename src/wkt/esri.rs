//! ESRI naming conventions.

/// Suffixes kept verbatim by [`morph_name_to_esri`].
const PRESERVED_SUFFIXES: &[&str] = &["(m)", "(ftUS)", "(E-N)", "(N-E)"];

/// Rewrite an object name the way ESRI spells names.
///
/// Runs of characters other than ASCII letters, digits, `+` and `-` become a
/// single underscore, and are dropped at both ends of the name.
pub fn morph_name_to_esri(name: &str) -> String {
    for suffix in PRESERVED_SUFFIXES {
        if let Some(stem) = name.strip_suffix(suffix) {
            let morphed = morph_name_to_esri(stem);
            return if morphed.is_empty() {
                suffix.to_string()
            } else {
                format!("{}_{}", morphed, suffix)
            };
        }
    }

    let mut out = String::with_capacity(name.len());
    let mut pending_underscore = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '+' || ch == '-' {
            if pending_underscore && !out.is_empty() {
                out.push('_');
            }
            out.push(ch);
            pending_underscore = false;
        } else {
            pending_underscore = true;
        }
    }
    out
}

/// CRS names: on top of [`morph_name_to_esri`], ESRI writes `WGS_1984`
/// for `WGS 84` and capitalizes `UTM_Zone`.
pub fn esri_crs_name(name: &str) -> String {
    let morphed = morph_name_to_esri(name);
    let morphed = match morphed.strip_prefix("WGS_84") {
        Some(rest) => format!("WGS_1984{}", rest),
        None => morphed,
    };
    morphed.replace("UTM_zone", "UTM_Zone")
}

/// Geographic CRS names carry a `GCS_` prefix.
pub fn esri_geographic_crs_name(name: &str) -> String {
    let morphed = esri_crs_name(name);
    if morphed.starts_with("GCS_") {
        morphed
    } else {
        format!("GCS_{}", morphed)
    }
}

/// Datum names carry a `D_` prefix.
pub fn esri_datum_name(name: &str) -> String {
    let morphed = morph_name_to_esri(&crate::mappings::wkt1_datum_name(name));
    if morphed.starts_with("D_") {
        morphed
    } else {
        format!("D_{}", morphed)
    }
}

pub fn esri_ellipsoid_name(name: &str) -> String {
    if name == "WGS 84" {
        return "WGS_1984".to_string();
    }
    morph_name_to_esri(name)
}

/// ESRI spellings of the most common units.
pub fn esri_unit_name(name: &str) -> String {
    match name {
        "metre" | "meter" => "Meter".to_string(),
        "degree" => "Degree".to_string(),
        "radian" => "Radian".to_string(),
        "US survey foot" => "Foot_US".to_string(),
        "foot" => "Foot".to_string(),
        other => morph_name_to_esri(other),
    }
}

/// Strip the ESRI decorations from a name, for matching it against an
/// official name when no alias is registered.
pub fn unmorph_esri_name(name: &str) -> String {
    let stem = name
        .strip_prefix("GCS_")
        .or_else(|| name.strip_prefix("D_"))
        .unwrap_or(name);
    stem.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_morph_name_to_esri() {
        assert_eq!(morph_name_to_esri("WGS 84 / UTM zone 31N"), "WGS_84_UTM_zone_31N");
        assert_eq!(morph_name_to_esri("  NAD83(HARN)  "), "NAD83_HARN");
        assert_eq!(morph_name_to_esri("RGF93 v1 / Lambert-93"), "RGF93_v1_Lambert-93");
        assert_eq!(morph_name_to_esri("NAD83 / Texas (ftUS)"), "NAD83_Texas_(ftUS)");
        assert_eq!(morph_name_to_esri("___"), "");
    }

    #[test]
    fn test_esri_crs_names() {
        assert_eq!(esri_crs_name("WGS 84 / UTM zone 31N"), "WGS_1984_UTM_Zone_31N");
        assert_eq!(esri_geographic_crs_name("WGS 84"), "GCS_WGS_1984");
        assert_eq!(esri_geographic_crs_name("GCS_Foo"), "GCS_Foo");
        assert_eq!(esri_datum_name("World Geodetic System 1984"), "D_WGS_1984");
        assert_eq!(esri_ellipsoid_name("WGS 84"), "WGS_1984");
        assert_eq!(esri_unit_name("metre"), "Meter");
    }

    #[test]
    fn test_unmorph() {
        assert_eq!(unmorph_esri_name("GCS_WGS_1984"), "WGS 1984");
        assert_eq!(unmorph_esri_name("D_European_Terrestrial_Reference_System_1989"), "European Terrestrial Reference System 1989");
    }
}
