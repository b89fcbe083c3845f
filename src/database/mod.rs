//! # Metadata Repository
//!
//! [`DatabaseContext`] is the handle to the metadata repository: the tables
//! of registered objects, aliases, grid alternatives and provenance
//! metadata that the authority factory and the parsers query.
//!
//! ## Key Components
//!
//! - **`DatabaseContext`**: a lazily opened handle. The primary document and
//!   its auxiliary documents are read and merged on the first query; a
//!   failed open is reported as [`Error::Repository`] and retried on the
//!   next query.
//! - **`store`**: the [`MetadataStore`] query trait and the JSON-backed
//!   [`JsonStore`].
//! - **`rows`**: typed views of the table rows.
//!
//! Negative lookups (unknown alias, absent grid alternative, missing text
//! definition) return `Ok(None)`; only storage faults are errors.

pub mod rows;
pub mod store;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;

use crate::cache::ObjectCache;
use crate::error::{Error, Result};
use crate::model::{names_match, Object};

use rows::{decode, AliasRow, GridAlternativeRow, MetadataRow, ObjectKey};
pub use store::{JsonStore, MetadataStore, Row};

/// Tables holding registered objects, keyed by `(auth_name, code)`.
pub const OBJECT_TABLES: &[&str] = &[
    "unit_of_measure",
    "extent",
    "celestial_body",
    "prime_meridian",
    "ellipsoid",
    "geodetic_datum",
    "vertical_datum",
    "coordinate_system",
    "geodetic_crs",
    "projected_crs",
    "vertical_crs",
    "compound_crs",
    "conversion",
    "helmert_transformation",
    "grid_transformation",
    "other_transformation",
    "concatenated_operation",
];

/// Local replacement of a grid referenced by an official name.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAlternative {
    pub proj_filename: String,
    pub proj_format: String,
    /// True when the local file is defined in the reverse direction
    pub inverse: bool,
    pub direct_download: bool,
    pub open_license: bool,
    /// True when the file exists in one of the grid directories
    pub available: bool,
}

/// Where a grid file can be found or fetched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridInfo {
    /// Absolute path of the local copy, empty when not available
    pub full_filename: String,
    pub package_name: String,
    pub url: String,
    pub direct_download: bool,
    pub open_license: bool,
    pub available: bool,
}

/// Handle to the metadata repository.
#[derive(Debug)]
pub struct DatabaseContext {
    path: Option<PathBuf>,
    auxiliary: Vec<PathBuf>,
    store: Mutex<Option<Arc<dyn MetadataStore>>>,
    grid_directories: Mutex<Vec<PathBuf>>,
    cache: ObjectCache,
}

impl DatabaseContext {
    /// Handle on the JSON document at `path`. Nothing is read until the
    /// first query.
    pub fn create(path: impl Into<PathBuf>) -> Arc<Self> {
        Self::create_with_auxiliary(path, Vec::new())
    }

    /// Handle on a primary document merged with read-only auxiliary
    /// documents. On duplicate objects the primary row wins.
    pub fn create_with_auxiliary(path: impl Into<PathBuf>, auxiliary: Vec<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            path: Some(path.into()),
            auxiliary,
            store: Mutex::new(None),
            grid_directories: Mutex::new(Vec::new()),
            cache: ObjectCache::new(),
        })
    }

    /// Handle over an already opened store.
    pub fn from_store(store: impl MetadataStore + 'static) -> Arc<Self> {
        let store: Arc<dyn MetadataStore> = Arc::new(store);
        Arc::new(Self {
            path: None,
            auxiliary: Vec::new(),
            store: Mutex::new(Some(store)),
            grid_directories: Mutex::new(Vec::new()),
            cache: ObjectCache::new(),
        })
    }

    /// Path of the primary document, if the handle was opened from a file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn auxiliary_paths(&self) -> &[PathBuf] {
        &self.auxiliary
    }

    /// Cache of objects built by authority factories over this handle.
    pub fn cache(&self) -> &ObjectCache {
        &self.cache
    }

    fn lock<'a, T>(mutex: &'a Mutex<T>, context: &str) -> Result<MutexGuard<'a, T>> {
        mutex.lock().map_err(|_| Error::LockPoisoned {
            context: context.to_string(),
        })
    }

    /// The opened store, opening it on first use.
    pub(crate) fn store(&self) -> Result<Arc<dyn MetadataStore>> {
        let mut slot = Self::lock(&self.store, "metadata store")?;
        if let Some(store) = slot.as_ref() {
            return Ok(Arc::clone(store));
        }
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| Error::repository("No metadata repository location"))?;
        let mut store = JsonStore::load(path)?;
        for aux in &self.auxiliary {
            store.merge(JsonStore::load(aux)?);
        }
        log::debug!(
            "Opened metadata repository {} ({} auxiliary, {} tables)",
            path.display(),
            self.auxiliary.len(),
            store.table_names().len()
        );
        let store: Arc<dyn MetadataStore> = Arc::new(store);
        *slot = Some(Arc::clone(&store));
        Ok(store)
    }

    /// Decode every row of `table` accepted by `filter`.
    pub(crate) fn query<T: DeserializeOwned>(
        &self,
        table: &str,
        filter: impl Fn(&Row) -> bool,
    ) -> Result<Vec<T>> {
        let store = self.store()?;
        store
            .rows(table)?
            .iter()
            .filter(|row| filter(row))
            .map(|row| decode(table, row))
            .collect()
    }

    /// The row of `table` registered as `authority:code`, with its key.
    pub(crate) fn find_object<T: DeserializeOwned>(
        &self,
        table: &str,
        authority: &str,
        code: &str,
    ) -> Result<Option<(ObjectKey, T)>> {
        let store = self.store()?;
        let Some(row) = store
            .rows(table)?
            .iter()
            .find(|row| row_has_key(row, authority, code))
        else {
            return Ok(None);
        };
        Ok(Some((decode(table, row)?, decode(table, row)?)))
    }

    /// Value of a provenance key such as `VERSION`.
    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let rows: Vec<MetadataRow> = self.query("metadata", |row| str_col(row, "key") == Some(key))?;
        Ok(rows.into_iter().next().map(|row| row.value))
    }

    /// Authority names used by registered objects, sorted.
    pub fn get_authorities(&self) -> Result<Vec<String>> {
        let store = self.store()?;
        let mut authorities = Vec::new();
        for table in OBJECT_TABLES {
            for row in store.rows(table)? {
                if let Some(auth) = str_col(row, "auth_name") {
                    if !authorities.iter().any(|a: &String| a == auth) {
                        authorities.push(auth.to_string());
                    }
                }
            }
        }
        authorities.sort();
        Ok(authorities)
    }

    /// Names of the tables present in the repository.
    pub fn get_database_structure(&self) -> Result<Vec<String>> {
        Ok(self.store()?.table_names())
    }

    /// Directories searched for local grid files.
    pub fn set_grid_directories(&self, directories: Vec<PathBuf>) -> Result<()> {
        *Self::lock(&self.grid_directories, "grid directories")? = directories;
        Ok(())
    }

    pub fn grid_directories(&self) -> Result<Vec<PathBuf>> {
        Ok(Self::lock(&self.grid_directories, "grid directories")?.clone())
    }

    fn find_local_grid(&self, filename: &str) -> Result<Option<PathBuf>> {
        let mut candidates = self.grid_directories()?;
        if let Some(dir) = self.path.as_deref().and_then(Path::parent) {
            candidates.push(dir.to_path_buf());
        }
        Ok(candidates
            .into_iter()
            .map(|dir| dir.join(filename))
            .find(|path| path.is_file()))
    }

    /// Local replacement of the grid officially named `official_name`.
    pub fn look_for_grid_alternative(&self, official_name: &str) -> Result<Option<GridAlternative>> {
        let rows: Vec<GridAlternativeRow> = self.query("grid_alternatives", |row| {
            str_col(row, "original_grid_name") == Some(official_name)
        })?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let available = self.find_local_grid(&row.proj_grid_name)?.is_some();
        Ok(Some(GridAlternative {
            proj_filename: row.proj_grid_name,
            proj_format: row.proj_grid_format.unwrap_or_else(|| "GTiff".to_string()),
            inverse: row.inverse_direction,
            direct_download: row.direct_download,
            open_license: row.open_license,
            available,
        }))
    }

    /// Availability and provenance of the grid file `proj_filename`.
    pub fn look_for_grid_info(&self, proj_filename: &str) -> Result<GridInfo> {
        let rows: Vec<GridAlternativeRow> = self.query("grid_alternatives", |row| {
            str_col(row, "proj_grid_name") == Some(proj_filename)
        })?;
        let local = self.find_local_grid(proj_filename)?;
        let mut info = GridInfo {
            full_filename: local
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            available: local.is_some(),
            ..GridInfo::default()
        };
        if let Some(row) = rows.into_iter().next() {
            info.package_name = row.package_name.unwrap_or_default();
            info.url = row.url.unwrap_or_default();
            info.direct_download = row.direct_download;
            info.open_license = row.open_license;
        }
        Ok(info)
    }

    /// Aliases of the object `authority:code` of `table`, optionally
    /// restricted to one `source` such as `ESRI`.
    pub fn get_aliases(
        &self,
        authority: &str,
        code: &str,
        table: &str,
        source: Option<&str>,
    ) -> Result<Vec<String>> {
        let rows: Vec<AliasRow> = self.query("alias_name", |row| {
            str_col(row, "table_name") == Some(table) && row_has_key(row, authority, code)
        })?;
        Ok(rows
            .into_iter()
            .filter(|row| source_matches(row, source))
            .map(|row| row.alt_name)
            .collect())
    }

    /// The alias used by `source` for the object of `table` officially
    /// named `official`.
    pub fn get_alias_from_official_name(
        &self,
        official: &str,
        table: &str,
        source: &str,
    ) -> Result<Option<String>> {
        let keys: Vec<ObjectKey> = self.query(table, |row| str_col(row, "name") == Some(official))?;
        for key in keys {
            let aliases = self.get_aliases(&key.auth_name, &key.code, table, Some(source))?;
            if let Some(alias) = aliases.into_iter().next() {
                return Ok(Some(alias));
            }
        }
        Ok(None)
    }

    /// Official name of the object of `table` known as `alias` by
    /// `source`. An empty `table` or `source` matches any.
    pub fn get_official_name_from_alias(
        &self,
        alias: &str,
        table: &str,
        source: &str,
    ) -> Result<Option<String>> {
        let rows: Vec<AliasRow> = self.query("alias_name", |row| {
            str_col(row, "alt_name") == Some(alias)
                && (table.is_empty() || str_col(row, "table_name") == Some(table))
        })?;
        let source = (!source.is_empty()).then_some(source);
        for row in rows.into_iter().filter(|row| source_matches(row, source)) {
            if let Some((key, _)) =
                self.find_object::<ObjectKey>(&row.table_name, &row.auth_name, &row.code)?
            {
                return Ok(Some(key.name));
            }
        }
        Ok(None)
    }

    /// True when an object of `table` (any object table when empty) is
    /// officially named `name`, ignoring case and punctuation.
    pub fn is_known_name(&self, name: &str, table: &str) -> Result<bool> {
        let tables: Vec<&str> = if table.is_empty() {
            OBJECT_TABLES.to_vec()
        } else {
            vec![table]
        };
        let store = self.store()?;
        for table in tables {
            if store.rows(table)?.iter().any(|row| {
                str_col(row, "name").is_some_and(|candidate| names_match(candidate, name))
            }) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Stored WKT of `authority:code` in `table`, for objects whose
    /// canonical form is text rather than structured columns.
    pub fn get_text_definition(
        &self,
        table: &str,
        authority: &str,
        code: &str,
    ) -> Result<Option<String>> {
        let store = self.store()?;
        Ok(store
            .rows(table)?
            .iter()
            .find(|row| row_has_key(row, authority, code))
            .and_then(|row| str_col(row, "text_definition"))
            .map(str::to_string))
    }

    /// Build the object designated by `AUTH:CODE`.
    pub fn create_object(self: &Arc<Self>, text: &str) -> Result<Object> {
        let (authority, code) = text.split_once(':').ok_or_else(|| {
            Error::factory(format!("'{}' is not of the form AUTHORITY:CODE", text))
        })?;
        crate::factory::AuthorityFactory::create(Arc::clone(self), authority).create_object(code)
    }
}

/// String value of `column`.
pub(crate) fn str_col<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column).and_then(|v| v.as_str())
}

fn row_has_key(row: &Row, authority: &str, code: &str) -> bool {
    str_col(row, "auth_name") == Some(authority) && str_col(row, "code") == Some(code)
}

fn source_matches(row: &AliasRow, source: Option<&str>) -> bool {
    match source {
        None => true,
        Some(source) => row
            .source
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(source)),
    }
}
