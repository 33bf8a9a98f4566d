//! Centralized constants for request keys, OIDs and container magic bytes.
//! Keep this intentionally small; only broadly reused literals should live here.

use der::asn1::ObjectIdentifier;

// === Request parameter keys ===

pub const PARAM_OPERATION: &str = "cop";
pub const PARAM_FORMAT: &str = "format";
pub const PARAM_ALGORITHM: &str = "algorithm";
pub const PARAM_FILENAME: &str = "filename";
pub const PARAM_ID: &str = "id";
pub const PARAM_VERSION: &str = "ver";
pub const PARAM_STICKY: &str = "sticky";
pub const PARAM_RESET_STICKY: &str = "resetsticky";
pub const PARAM_PROPERTIES: &str = "properties";
pub const PARAM_DATA: &str = "data";
pub const PARAM_GZIPPED_DATA: &str = "gzippedData";
pub const PARAM_RETRIEVE_SERVLET: &str = "rtservlet";
pub const PARAM_STORAGE_SERVLET: &str = "stservlet";
pub const PARAM_KEY: &str = "key";
pub const PARAM_FILE_ID: &str = "fileId";
pub const PARAM_KEYSTORE_OLD: &str = "keystoreOld";
pub const PARAM_KEYSTORE: &str = "keystore";
pub const PARAM_ACTIVE_WAITING: &str = "activeWaiting";
pub const PARAM_MINIMUM_CLIENT_VERSION: &str = "minimumClientVersion";

/// Every key the request validator understands; anything else is preserved verbatim.
pub const KNOWN_PARAMETERS: &[&str] = &[
    PARAM_OPERATION,
    PARAM_FORMAT,
    PARAM_ALGORITHM,
    PARAM_FILENAME,
    PARAM_ID,
    PARAM_VERSION,
    PARAM_STICKY,
    PARAM_RESET_STICKY,
    PARAM_PROPERTIES,
    PARAM_DATA,
    PARAM_GZIPPED_DATA,
    PARAM_RETRIEVE_SERVLET,
    PARAM_STORAGE_SERVLET,
    PARAM_KEY,
    PARAM_FILE_ID,
    PARAM_KEYSTORE_OLD,
    PARAM_KEYSTORE,
    PARAM_ACTIVE_WAITING,
    PARAM_MINIMUM_CLIENT_VERSION,
];

// === Extra-parameter keys ===

pub const EXTRA_PROFILE: &str = "profile";
pub const EXTRA_CHECK_SIGNATURES: &str = "checkSignatures";
pub const EXTRA_TARGET: &str = "target";
pub const EXTRA_MODE: &str = "mode";
pub const EXTRA_MIME_TYPE: &str = "mimeType";
pub const EXTRA_HEADLESS: &str = "headless";
pub const EXTRA_FILTER: &str = "filter";
pub const EXTRA_FILTERS: &str = "filters";
pub const EXTRA_MANDATORY_CERT_SELECTION: &str = "mandatoryCertSelection";
pub const EXTRA_ALLOW_EXTERNAL_STORES: &str = "allowExternalStores";
pub const EXTRA_VISIBLE_SIGNATURE: &str = "visibleSignature";

pub const SIGN_MODE_EXPLICIT: &str = "explicit";
pub const TARGET_TREE: &str = "tree";
pub const MIME_TYPE_SHA1_HASH: &str = "hash/sha1";

// === Request limits ===

/// Longest accepted session identifier (used as an on-disk filename component)
pub const MAX_SESSION_ID_LENGTH: usize = 20;

/// Characters never allowed in an output filename
pub const RESERVED_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Protocol version assumed when `ver` is absent
pub const BASELINE_PROTOCOL_VERSION: &str = "0";

/// Length of the cipher key handed to the response post-processor
pub const CIPHER_KEY_LENGTH: usize = 8;

/// Signature algorithms a caller may request
pub const SUPPORTED_SIGNATURE_ALGORITHMS: &[&str] = &[
    "SHA1withRSA",
    "SHA256withRSA",
    "SHA384withRSA",
    "SHA512withRSA",
];

/// Stem used for the saved file when nothing better is known
pub const DEFAULT_SIGNED_FILE_STEM: &str = "signature";

/// Field separator in the rendered response
pub const RESULT_SEPARATOR: char = '|';

// === CMS object identifiers ===

/// id-signedData (1.2.840.113549.1.7.2)
pub const ID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");

/// id-data (1.2.840.113549.1.7.1)
pub const ID_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");

/// id-aa-ets-sigPolicyId (1.2.840.113549.1.9.16.2.15)
pub const ID_AA_ETS_SIG_POLICY_ID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.2.15");

// === Container magic ===

/// PDF header
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Local file header of a ZIP archive
pub const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Root element of a Spanish electronic invoice
pub const FACTURAE_ROOT: &[u8] = b"Facturae";

/// Entry naming the media type of an OpenDocument package
pub const ODF_MIMETYPE_ENTRY: &str = "mimetype";

/// Prefix of every OpenDocument media type
pub const ODF_MIMETYPE_PREFIX: &str = "application/vnd.oasis.opendocument";

/// Content-types part present in every OOXML package
pub const OOXML_CONTENT_TYPES_ENTRY: &str = "[Content_Types].xml";
