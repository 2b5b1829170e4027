//! Metadata interchange formats.
//!
//! Munki metadata is normally an XML property list; repositories may also
//! carry YAML files. Reading picks the format from the identifier's
//! extension, writing uses whatever the caller asks for.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{MunkiError, Result};

/// Serialization format for manifests, pkginfo and catalogs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MetadataFormat {
    /// XML property list (binary plists are accepted on read)
    #[default]
    Plist,
    Yaml,
}

impl MetadataFormat {
    /// Guess the format of a stored resource from its identifier.
    pub fn for_identifier(identifier: &str) -> Self {
        let lower = identifier.to_ascii_lowercase();
        if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            MetadataFormat::Yaml
        } else {
            MetadataFormat::Plist
        }
    }
}

/// Deserialize a stored resource.
pub fn decode<T: DeserializeOwned>(identifier: &str, data: &[u8]) -> Result<T> {
    let parse_error = |source: Box<dyn std::error::Error + Send + Sync>| MunkiError::Parse {
        identifier: identifier.to_string(),
        source,
    };

    match MetadataFormat::for_identifier(identifier) {
        MetadataFormat::Plist => {
            plist::from_bytes(data).map_err(|err| parse_error(Box::new(err)))
        }
        MetadataFormat::Yaml => {
            serde_yaml::from_slice(data).map_err(|err| parse_error(Box::new(err)))
        }
    }
}

/// Serialize `value` in `format`. `what` names the value in error messages.
pub fn encode<T: Serialize>(what: &str, value: &T, format: MetadataFormat) -> Result<Vec<u8>> {
    let serialization_error =
        |source: Box<dyn std::error::Error + Send + Sync>| MunkiError::Serialization {
            what: what.to_string(),
            source,
        };

    match format {
        MetadataFormat::Plist => {
            let mut buffer = Vec::new();
            plist::to_writer_xml(&mut buffer, value)
                .map_err(|err| serialization_error(Box::new(err)))?;
            Ok(buffer)
        }
        MetadataFormat::Yaml => serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|err| serialization_error(Box::new(err))),
    }
}
