//! Platform constants and SDK defaults.

/// Group used when the caller does not name one.
pub const DEFAULT_GROUP: &str = "default_group";

/// Encoding template for standard VOD/CMAF adaptive bitrate output.
pub const DEFAULT_TEMPLATE: &str = "cmaf-abr";

/// Publish destination; the CloudFront origin for VOD streaming.
pub const DEFAULT_DESTINATION: &str = "vod";

/// Extra workflow parameters, sent as an AWSJSON string.
pub const DEFAULT_FORMAT_SPECIFIC_DATA: &str = "{}";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// How long to wait for a freshly started workflow to show up as a process.
pub const DEFAULT_PROCESS_WAIT_SECS: u64 = 10;

pub const DEFAULT_PRESIGNED_POST_EXPIRY_SECS: u64 = 3600;

/// Header carrying the keypair signature during credential exchange.
pub const SIGNATURE_HEADER: &str = "X-Castlabs-Keypair-Signature";

/// Header scoping every GraphQL request to an organization.
pub const ORGANIZATION_HEADER: &str = "x-castlabs-organization";

/// Output bucket prefix that is served through the VOD CDN.
pub const VOD_OUTPUT_PREFIX: &str = "content-repo-prod-output-castlabs-vod/castlabs-vod";
pub const VOD_CDN_BASE: &str = "https://vod.cp.castlabs.com";

pub const HLS_MANIFEST: &str = "hls.m3u8";
pub const DASH_MANIFEST: &str = "dash.mpd";

/// Region of the upload buckets behind upload tickets.
pub const UPLOAD_REGION: &str = "us-east-1";

/// Process action of the encoding sub-process.
pub const ENCODING_ACTION: &str = "start_workflow_vod_default";

/// Process action of the publish sub-process.
pub const PUBLISH_ACTION: &str = "publishPo";
