// OUI vendor lookup
//
// Resolves the manufacturer of a hardware address from the IEEE `oui.txt`
// registry. Only lines of the form `00-1A-2B   (hex)\t\tVendor Name` are used.

use super::DiscoveryError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const HEX_MARKER: &str = "(hex)";

/// Prefix → vendor table
#[derive(Debug, Clone, Default)]
pub struct OuiResolver {
    vendors: HashMap<String, String>,
}

impl OuiResolver {
    /// Resolver with no entries; every lookup misses
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a registry file
    ///
    /// A missing file yields an empty resolver. Other read failures are
    /// reported. Invalid UTF-8 is replaced rather than rejected.
    pub fn load(path: &Path) -> Result<Self, DiscoveryError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "OUI database not found, vendors will be blank");
                return Ok(Self::empty());
            }
            Err(source) => {
                return Err(DiscoveryError::OuiDatabase {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let resolver = Self::parse(&String::from_utf8_lossy(&bytes));
        tracing::info!(path = %path.display(), entries = resolver.len(), "Loaded OUI database");
        Ok(resolver)
    }

    /// Build a resolver from registry text
    pub fn parse(content: &str) -> Self {
        let vendors = content
            .lines()
            .filter_map(|line| {
                let (prefix, vendor) = line.trim().split_once(HEX_MARKER)?;
                let prefix = prefix.trim().replace('-', "").to_ascii_uppercase();
                let vendor = vendor.trim();
                if prefix.is_empty() || vendor.is_empty() {
                    return None;
                }
                Some((prefix, vendor.to_string()))
            })
            .collect();
        Self { vendors }
    }

    /// Vendor for a MAC address in any common notation
    pub fn resolve(&self, mac: &str) -> Option<&str> {
        let clean: String = mac
            .chars()
            .filter(|c| *c != ':' && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let prefix = clean.get(..6)?;
        self.vendors.get(prefix).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }
}
