use crate::collection::Document;
use crate::common::{SortOrder, SortSpec, Value};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64, Engine};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Decoded content of a pagination cursor: the sort it was issued under and
/// the sort field values of the document it points after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorToken {
    sort: SortSpec,
    values: Vec<Value>,
}

impl CursorToken {
    pub fn new(sort: SortSpec, values: Vec<Value>) -> CursorToken {
        CursorToken { sort, values }
    }

    /// Builds the token for `document` by reading every sort field from it.
    /// A missing field is recorded as null.
    pub fn from_document(sort: &SortSpec, document: &Document) -> CursorToken {
        let values = sort
            .sorting_order()
            .iter()
            .map(|(field, _)| document.get(field))
            .collect();
        CursorToken::new(sort.clone(), values)
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Pairs each sort field with its direction and recorded value.
    pub fn entries(&self) -> impl Iterator<Item = (&str, SortOrder, &Value)> {
        self.sort
            .sorting_order()
            .iter()
            .zip(self.values.iter())
            .map(|((field, order), value)| (field.as_str(), *order, value))
    }

    /// Encodes the token as URL safe text: JSON, zlib compressed, base64
    /// without padding.
    pub fn encode(&self) -> RepoResult<String> {
        let json = serde_json::to_vec(self).map_err(|err| {
            log::error!("Failed to serialize cursor: {}", err);
            RepoError::new(&format!("Failed to serialize cursor: {}", err), ErrorKind::EncodingError)
        })?;

        let compress = |json: &[u8]| -> std::io::Result<Vec<u8>> {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(json)?;
            encoder.finish()
        };

        let compressed = compress(&json).map_err(|err| {
            log::error!("Failed to compress cursor: {}", err);
            RepoError::new(&format!("Failed to compress cursor: {}", err), ErrorKind::EncodingError)
        })?;
        Ok(BASE64.encode(compressed))
    }

    pub fn decode(cursor: &str) -> RepoResult<CursorToken> {
        let compressed = BASE64.decode(cursor.trim()).map_err(|err| invalid_cursor(&err.to_string()))?;

        let mut json = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut json)
            .map_err(|err| invalid_cursor(&err.to_string()))?;

        let token: CursorToken =
            serde_json::from_slice(&json).map_err(|err| invalid_cursor(&err.to_string()))?;
        if token.sort.len() != token.values.len() {
            return Err(invalid_cursor("field and value counts differ"));
        }
        Ok(token)
    }
}

fn invalid_cursor(reason: &str) -> RepoError {
    log::error!("Invalid cursor: {}", reason);
    RepoError::new(&format!("Invalid cursor: {}", reason), ErrorKind::InvalidCursor)
}
