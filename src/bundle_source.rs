//! Bundle sources: embedded catalogues and on-disk bundle directories.
//!
//! Built-in bundles are compiled into the binary from `locales/<code>.json`.
//! A bundle directory holds one `<code>.json` per locale and may carry an
//! `aliases.json` that extends the region alias table.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use futures::FutureExt;
use std::io;
use std::sync::Arc;
use tracing::debug;

use crate::alias_table::RegionAliasTable;
use crate::bundle::Bundle;
use crate::error::{BundleError, ConfigError};
use crate::locale_code::LocaleCode;
use crate::registry::{BundleFuture, BundleRegistry};

const EN: &str = include_str!("../locales/en.json");
const DE: &str = include_str!("../locales/de.json");
const NL: &str = include_str!("../locales/nl.json");
const ES: &str = include_str!("../locales/es.json");

/// Embedded bundle documents keyed by canonical locale code.
pub const BUILTIN_BUNDLES: &[(&str, &str)] = &[("en", EN), ("de", DE), ("nl", NL), ("es", ES)];

/// File name of the optional alias table inside a bundle directory.
pub const ALIAS_FILE: &str = "aliases.json";

const BUNDLE_EXTENSION: &str = "json";

/// Loader that parses an in-memory bundle document on each invocation.
pub fn embedded_loader(
    locale: LocaleCode,
    document: &'static str,
) -> impl Fn() -> BundleFuture + Send + Sync + 'static {
    move || {
        let locale = locale.clone();
        async move { Bundle::from_json(locale, document) }.boxed()
    }
}

/// Register every embedded bundle with `registry`.
pub fn register_builtin(registry: &BundleRegistry) {
    for (code, document) in BUILTIN_BUNDLES {
        if let Ok(locale) = LocaleCode::new(*code) {
            registry.register(locale.clone(), embedded_loader(locale, document));
        }
    }
}

/// Loader that reads `<dir>/<locale>.json` on each invocation.
pub fn directory_loader(
    dir: Utf8PathBuf,
    locale: LocaleCode,
) -> impl Fn() -> BundleFuture + Send + Sync + 'static {
    let dir = Arc::new(dir);
    move || {
        let dir = Arc::clone(&dir);
        let locale = locale.clone();
        async move {
            let file_name = format!("{locale}.{BUNDLE_EXTENSION}");
            let path = dir.join(&file_name);
            let document = read_file(&dir, &file_name).map_err(|err| BundleError::Io {
                locale: locale.clone(),
                path,
                source: Arc::new(err),
            })?;
            Bundle::from_json(locale, &document)
        }
        .boxed()
    }
}

/// Register one loader per `<code>.json` file found in `dir`.
///
/// Returns the alias table from `aliases.json` when the directory has one.
/// Files whose stem is not a valid locale code are skipped.
///
/// # Errors
///
/// Returns [`ConfigError::AliasTableIo`] when the directory cannot be listed
/// or the alias file cannot be read, and [`ConfigError::AliasTable`] when the
/// alias file is malformed.
pub fn register_directory(
    registry: &BundleRegistry,
    dir: &Utf8Path,
) -> Result<Option<RegionAliasTable>, ConfigError> {
    let io_error = |source: io::Error| ConfigError::AliasTableIo {
        path: dir.to_path_buf(),
        source,
    };
    let handle = Dir::open_ambient_dir(dir, ambient_authority()).map_err(io_error)?;
    for entry in handle.entries().map_err(io_error)? {
        let name = entry.and_then(|e| e.file_name()).map_err(io_error)?;
        let Some(stem) = bundle_stem(&name) else {
            continue;
        };
        match LocaleCode::new(stem) {
            Ok(locale) => {
                debug!(locale = %locale, dir = %dir, "registering directory bundle");
                registry.register(
                    locale.clone(),
                    directory_loader(dir.to_path_buf(), locale),
                );
            }
            Err(err) => debug!(file = %name, error = %err, "skipping non-locale bundle file"),
        }
    }
    match handle.read_to_string(ALIAS_FILE) {
        Ok(document) => {
            let origin = dir.join(ALIAS_FILE);
            RegionAliasTable::from_json(origin.as_str(), &document).map(Some)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::AliasTableIo {
            path: dir.join(ALIAS_FILE),
            source,
        }),
    }
}

fn bundle_stem(name: &str) -> Option<&str> {
    if name == ALIAS_FILE {
        return None;
    }
    let path = Utf8Path::new(name);
    if path.extension() != Some(BUNDLE_EXTENSION) {
        return None;
    }
    path.file_stem()
}

fn read_file(dir: &Utf8Path, file_name: &str) -> io::Result<String> {
    Dir::open_ambient_dir(dir, ambient_authority())?.read_to_string(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::fs;
    use tempfile::TempDir;

    fn utf8_dir(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("temp dir is UTF-8")
    }

    #[test]
    fn builtin_bundles_parse() {
        let registry = BundleRegistry::new();
        register_builtin(&registry);
        for (code, _) in BUILTIN_BUNDLES {
            let locale = LocaleCode::new(*code).expect("valid code");
            let bundle = block_on(registry.load(&locale)).expect("embedded bundle parses");
            assert!(bundle.contains_key("app.greeting"), "{code} lacks app.greeting");
        }
    }

    #[test]
    fn directory_bundles_register_and_load() {
        let temp = TempDir::new().expect("temp dir");
        fs::write(temp.path().join("pt.json"), r#"{"nav": {"home": "Início"}}"#)
            .expect("write bundle");
        fs::write(temp.path().join("notes.txt"), "ignored").expect("write note");
        fs::write(temp.path().join(ALIAS_FILE), r#"{"pt-BR": "pt"}"#).expect("write aliases");

        let registry = BundleRegistry::new();
        let aliases = register_directory(&registry, &utf8_dir(&temp))
            .expect("directory registers")
            .expect("alias file present");

        assert_eq!(registry.registered_locales().len(), 1);
        assert_eq!(aliases.len(), 1);
        let pt = LocaleCode::new("pt").expect("valid code");
        let bundle = block_on(registry.load(&pt)).expect("bundle loads");
        assert_eq!(bundle.get("nav.home"), Some("Início"));
    }

    #[test]
    fn missing_bundle_files_surface_io_errors() {
        let temp = TempDir::new().expect("temp dir");
        let registry = BundleRegistry::new();
        let fr = LocaleCode::new("fr").expect("valid code");
        registry.register(fr.clone(), directory_loader(utf8_dir(&temp), fr.clone()));

        let err = block_on(registry.load(&fr)).expect_err("file is absent");
        assert!(matches!(err, BundleError::Io { .. }));
    }
}
