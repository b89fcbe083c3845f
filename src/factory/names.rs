//! Name based object search.
//!
//! Candidates are ranked by match quality first (exact, case-insensitive,
//! canonical, then approximate scored by edit distance), non-deprecated
//! objects before deprecated ones, then by the order of the requested
//! object types, then authority and code.

use std::collections::HashMap;

use super::{AuthorityFactory, ObjectType};
use crate::database::rows::AliasRow;
use crate::database::str_col;
use crate::error::Result;
use crate::model::{canonicalize_name, Object};
use crate::suggestions::edit_distance;

/// How closely a registered name matches the searched one. Smaller is
/// better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchQuality {
    Exact,
    CaseInsensitive,
    /// Equal once reduced to lowercase alphanumerics
    Canonical,
    /// The searched name is contained in the registered one; the value is
    /// the edit distance between their canonical forms.
    Approximate(usize),
}

/// One registered object matching a name search.
#[derive(Debug, Clone, PartialEq)]
pub struct NameMatch {
    pub table: &'static str,
    pub authority: String,
    pub code: String,
    /// Official name, even when an alias matched
    pub name: String,
    pub quality: MatchQuality,
    pub deprecated: bool,
}

fn match_quality(
    candidate: &str,
    wanted: &str,
    wanted_canonical: &str,
    approximate: bool,
) -> Option<MatchQuality> {
    if candidate == wanted {
        return Some(MatchQuality::Exact);
    }
    if candidate.eq_ignore_ascii_case(wanted) {
        return Some(MatchQuality::CaseInsensitive);
    }
    let canonical = canonicalize_name(candidate);
    if canonical == wanted_canonical {
        return Some(MatchQuality::Canonical);
    }
    if approximate && !wanted_canonical.is_empty() && canonical.contains(wanted_canonical) {
        return Some(MatchQuality::Approximate(edit_distance(
            &canonical,
            wanted_canonical,
        )));
    }
    None
}

impl AuthorityFactory {
    /// Registered objects named `name`, restricted to `types` (every type
    /// when empty). `limit` of 0 means no limit.
    pub fn search_names(
        &self,
        name: &str,
        types: &[ObjectType],
        approximate: bool,
        limit: usize,
    ) -> Result<Vec<NameMatch>> {
        let types = if types.is_empty() {
            ObjectType::all()
        } else {
            types
        };
        let wanted_canonical = canonicalize_name(name);
        let store = self.db.store()?;

        let mut matches: Vec<(usize, NameMatch)> = Vec::new();
        let mut table_order = 0;
        for object_type in types {
            for table in object_type.tables() {
                table_order += 1;
                let aliases = self.aliases_by_code(table)?;
                for row in store.rows(table)? {
                    let (Some(auth), Some(code), Some(official)) = (
                        str_col(row, "auth_name"),
                        str_col(row, "code"),
                        str_col(row, "name"),
                    ) else {
                        continue;
                    };
                    if !self.authority.is_empty() && auth != self.authority {
                        continue;
                    }
                    if !object_type.accepts(table, row) {
                        continue;
                    }
                    let alias_names = aliases
                        .get(&(auth.to_string(), code.to_string()))
                        .map(Vec::as_slice)
                        .unwrap_or_default();
                    let best = std::iter::once(official)
                        .chain(alias_names.iter().map(String::as_str))
                        .filter_map(|candidate| {
                            match_quality(candidate, name, &wanted_canonical, approximate)
                        })
                        .min();
                    let Some(quality) = best else {
                        continue;
                    };
                    let deprecated = row
                        .get("deprecated")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false);
                    matches.push((
                        table_order,
                        NameMatch {
                            table,
                            authority: auth.to_string(),
                            code: code.to_string(),
                            name: official.to_string(),
                            quality,
                            deprecated,
                        },
                    ));
                }
            }
        }

        matches.sort_by(|(order_a, a), (order_b, b)| {
            a.quality
                .cmp(&b.quality)
                .then(a.deprecated.cmp(&b.deprecated))
                .then(order_a.cmp(order_b))
                .then_with(|| a.authority.cmp(&b.authority))
                .then_with(|| a.code.cmp(&b.code))
        });
        let mut results: Vec<NameMatch> = Vec::with_capacity(matches.len());
        for (_, found) in matches {
            let duplicate = results.iter().any(|r| {
                r.table == found.table && r.authority == found.authority && r.code == found.code
            });
            if !duplicate {
                results.push(found);
            }
        }
        if limit > 0 {
            results.truncate(limit);
        }
        log::debug!("Name search for '{}' found {} objects", name, results.len());
        Ok(results)
    }

    fn aliases_by_code(&self, table: &str) -> Result<HashMap<(String, String), Vec<String>>> {
        let rows: Vec<AliasRow> = self
            .db
            .query("alias_name", |row| str_col(row, "table_name") == Some(table))?;
        let mut aliases: HashMap<(String, String), Vec<String>> = HashMap::new();
        for row in rows {
            aliases
                .entry((row.auth_name, row.code))
                .or_default()
                .push(row.alt_name);
        }
        Ok(aliases)
    }

    /// Objects whose name or alias matches `name`, best match first.
    /// Registered rows that cannot be built are skipped with a warning.
    pub fn create_objects_from_name(
        &self,
        name: &str,
        types: &[ObjectType],
        approximate: bool,
        limit: usize,
    ) -> Result<Vec<Object>> {
        let mut objects = Vec::new();
        for found in self.search_names(name, types, approximate, 0)? {
            match self
                .for_authority(&found.authority)
                .create_object_from_table(found.table, &found.code)
            {
                Ok(object) => objects.push(object),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => log::warn!(
                    "Skipping {}:{} ({}): {}",
                    found.authority,
                    found.code,
                    found.name,
                    e
                ),
            }
            if limit > 0 && objects.len() == limit {
                break;
            }
        }
        Ok(objects)
    }

    /// Extents whose name matches `name`, as `(authority, code, name)`.
    pub fn list_area_of_use_from_name(
        &self,
        name: &str,
        approximate: bool,
    ) -> Result<Vec<(String, String, String)>> {
        Ok(self
            .search_names(name, &[ObjectType::Extent], approximate, 0)?
            .into_iter()
            .map(|found| (found.authority, found.code, found.name))
            .collect())
    }
}
