//! Encoding snapshot returned by the high-level client

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::constants::{DASH_MANIFEST, HLS_MANIFEST};
use crate::models::{Process, ProcessStatus};

/// Status of one encoding, with the URLs of its streaming manifests
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    pub group_name: String,
    pub encode_name: String,
    pub status: ProcessStatus,
    /// CDN base URL; absent until the platform assigns an output location
    pub content_url: Option<String>,
}

impl Encoding {
    pub fn from_process(process: &Process, group_name: &str, encode_name: &str) -> Self {
        Self {
            group_name: group_name.to_string(),
            encode_name: encode_name.to_string(),
            status: process.status(),
            content_url: process.content_url(),
        }
    }

    pub fn hls_url(&self) -> Option<String> {
        self.content_url
            .as_ref()
            .map(|base| format!("{}{}", base, HLS_MANIFEST))
    }

    pub fn dash_url(&self) -> Option<String> {
        self.content_url
            .as_ref()
            .map(|base| format!("{}{}", base, DASH_MANIFEST))
    }

    /// Whether encoding and publishing have finished
    pub fn complete(&self) -> bool {
        self.status.is_complete()
    }
}

impl Serialize for Encoding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Encoding", 7)?;
        state.serialize_field("group_name", &self.group_name)?;
        state.serialize_field("encode_name", &self.encode_name)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("content_url", &self.content_url)?;
        state.serialize_field("hls_url", &self.hls_url())?;
        state.serialize_field("dash_url", &self.dash_url())?;
        state.serialize_field("complete", &self.complete())?;
        state.end()
    }
}
