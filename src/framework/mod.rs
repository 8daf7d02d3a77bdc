//! Assemblies that ship with the target framework
//!
//! Reference-assembly directories may carry `RedistList/FrameworkList.xml`
//! listing the assemblies the framework provides. Those never need a
//! reference of their own.

use crate::error::{Error, Result};
use crate::names::AssemblyName;
use quick_xml::encoding::{decode, detect_encoding};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Ambient assemblies collected from framework manifests
#[derive(Debug, Default, Clone)]
pub struct FrameworkCatalog {
    assemblies: HashSet<AssemblyName>,
}

impl FrameworkCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the manifests of every framework directory that has one
    pub fn load(directories: &[PathBuf]) -> Result<Self> {
        let mut catalog = Self::new();

        for directory in directories {
            let manifest = manifest_path(directory);
            if !manifest.is_file() {
                debug!("No framework list under {}", directory.display());
                continue;
            }

            let bytes = std::fs::read(&manifest).map_err(|e| Error::ManifestParse {
                path: manifest.clone(),
                reason: e.to_string(),
            })?;
            let contents = decode_manifest(&manifest, &bytes)?;
            let names = parse_framework_list(&manifest, &contents)?;
            debug!("{}: {} framework assemblies", manifest.display(), names.len());
            catalog.assemblies.extend(names);
        }

        Ok(catalog)
    }

    pub fn contains(&self, name: &AssemblyName) -> bool {
        self.assemblies.contains(name)
    }

    pub fn len(&self) -> usize {
        self.assemblies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assemblies.is_empty()
    }
}

impl FromIterator<AssemblyName> for FrameworkCatalog {
    fn from_iter<I: IntoIterator<Item = AssemblyName>>(iter: I) -> Self {
        Self {
            assemblies: iter.into_iter().collect(),
        }
    }
}

fn manifest_path(directory: &Path) -> PathBuf {
    directory.join("RedistList").join("FrameworkList.xml")
}

/// Decode a manifest by its BOM or leading `<?`; UTF-8 otherwise
fn decode_manifest<'a>(path: &Path, bytes: &'a [u8]) -> Result<Cow<'a, str>> {
    let decoded = match detect_encoding(bytes) {
        Some((encoding, bom_len)) => decode(&bytes[bom_len..], encoding),
        None => std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|e| quick_xml::Error::NonDecodable(Some(e))),
    };

    decoded.map_err(|e| Error::ManifestParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Collect `AssemblyName` attributes of the root's `File` children,
/// skipping analyzer entries
pub fn parse_framework_list(path: &Path, contents: &str) -> Result<Vec<AssemblyName>> {
    let mut names = Vec::new();
    let mut reader = Reader::from_str(contents);
    reader.trim_text(true);

    let mut buf = Vec::new();
    // Number of currently open elements
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if depth == 1 && e.name().as_ref() == b"File" {
                    names.extend(file_entry_name(e));
                }
                depth += 1;
            }
            Ok(Event::Empty(ref e)) => {
                if depth == 1 && e.name().as_ref() == b"File" {
                    names.extend(file_entry_name(e));
                }
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::ManifestParse {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(names)
}

fn file_entry_name(e: &BytesStart<'_>) -> Option<AssemblyName> {
    let mut file_type = None;
    let mut assembly_name = None;

    for attr in e.attributes().filter_map(|a| a.ok()) {
        match attr.key.as_ref() {
            b"Type" => file_type = Some(String::from_utf8_lossy(&attr.value).to_string()),
            b"AssemblyName" => assembly_name = Some(String::from_utf8_lossy(&attr.value).to_string()),
            _ => {}
        }
    }

    if file_type.is_some_and(|t| t.eq_ignore_ascii_case("Analyzer")) {
        return None;
    }

    assembly_name.filter(|n| !n.is_empty()).map(AssemblyName::new)
}
