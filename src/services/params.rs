//! Parameter validation: untrusted string map to typed request.
//!
//! Checks run in a fixed order and the first failure wins. Keys outside the
//! known set are captured before any check runs, so they survive even when
//! validation fails.

use crate::domain::constants::*;
use crate::domain::encoding::{decode_base64_lenient, decode_gzipped_base64};
use crate::domain::extra_params::{parse_permissive_bool, ExtraParams};
use crate::domain::format::SignFormat;
use crate::domain::request::{ParameterMap, SignRequest, StoredConfigRequest, ValidatedRequest};
use crate::domain::types::{
    validate_url, CipherKey, ClientVersion, Filename, KeyStoreSelection, SessionId,
    SignatureAlgorithm,
};
use crate::infra::config::HandlerConfiguration;
use crate::infra::error::{SigningError, SigningResult};
use url::Url;

/// Validation outcome plus the parameters nobody claimed.
#[derive(Debug)]
pub struct ParameterReport {
    pub unrecognized: ParameterMap,
    pub outcome: SigningResult<ValidatedRequest>,
}

impl ParameterReport {
    /// Drop the unrecognized map and keep the outcome.
    pub fn into_result(self) -> SigningResult<ValidatedRequest> {
        self.outcome
    }
}

pub struct ParameterValidator<'a> {
    config: &'a HandlerConfiguration,
}

impl<'a> ParameterValidator<'a> {
    pub fn new(config: &'a HandlerConfiguration) -> Self {
        Self { config }
    }

    /// Validate a raw parameter map.
    pub fn validate(&self, params: &ParameterMap) -> ParameterReport {
        let unrecognized = unrecognized_parameters(params);
        let outcome = self.validate_inner(params, &unrecognized);
        if let Err(e) = &outcome {
            log::warn!("Request rejected: {e}");
        }
        ParameterReport {
            unrecognized,
            outcome,
        }
    }

    fn validate_inner(
        &self,
        params: &ParameterMap,
        unrecognized: &ParameterMap,
    ) -> SigningResult<ValidatedRequest> {
        let get = |key: &str| params.get(key).map(String::as_str);

        let session_id = get(PARAM_ID)
            .or_else(|| get(PARAM_FILE_ID))
            .map(SessionId::new)
            .transpose()?;

        let protocol_version = get(PARAM_VERSION)
            .unwrap_or(BASELINE_PROTOCOL_VERSION)
            .to_string();

        let raw_operation = get(PARAM_OPERATION).map(str::to_string);

        if let Some(file_id) = get(PARAM_FILE_ID) {
            log::debug!("Request refers to stored configuration {file_id}");
            return Ok(ValidatedRequest::StoredConfig(StoredConfigRequest {
                file_id: file_id.to_string(),
                session_id,
                raw_operation,
                protocol_version,
                retrieve_servlet: self.servlet_url(get(PARAM_RETRIEVE_SERVLET), "retrieve")?,
                unrecognized: unrecognized.clone(),
            }));
        }

        let storage_servlet = self.servlet_url(get(PARAM_STORAGE_SERVLET), "storage")?;

        let format = get(PARAM_FORMAT)
            .map(SignFormat::new)
            .ok_or(SigningError::MissingFormat)?;

        let algorithm: SignatureAlgorithm = get(PARAM_ALGORITHM)
            .ok_or(SigningError::MissingAlgorithm)?
            .parse()?;

        let extra_params = match get(PARAM_PROPERTIES).filter(|p| !p.is_empty()) {
            Some(encoded) => ExtraParams::from_base64(encoded).unwrap_or_else(|e| {
                log::error!("The '{PARAM_PROPERTIES}' block could not be loaded: {e}");
                ExtraParams::new()
            }),
            None => ExtraParams::new(),
        };

        let sticky = get(PARAM_STICKY).is_some_and(parse_permissive_bool);
        let reset_sticky = get(PARAM_RESET_STICKY).is_some_and(parse_permissive_bool);

        let keystore = get(PARAM_KEYSTORE)
            .or_else(|| get(PARAM_KEYSTORE_OLD))
            .filter(|ks| !ks.is_empty())
            .map(str::parse::<KeyStoreSelection>)
            .transpose()?;

        let filename = get(PARAM_FILENAME).map(Filename::new).transpose()?;

        // Parameters shared with the other protocol operations
        let data = decode_data(get(PARAM_GZIPPED_DATA), get(PARAM_DATA))?;
        let retrieve_servlet = self.servlet_url(get(PARAM_RETRIEVE_SERVLET), "retrieve")?;
        let cipher_key = get(PARAM_KEY).map(CipherKey::new).transpose()?;
        let active_waiting = get(PARAM_ACTIVE_WAITING).is_some_and(parse_permissive_bool);
        let minimum_client_version = get(PARAM_MINIMUM_CLIENT_VERSION)
            .filter(|v| !v.is_empty())
            .map(str::parse::<ClientVersion>)
            .transpose()?;

        Ok(ValidatedRequest::Sign(Box::new(SignRequest {
            raw_operation,
            format,
            algorithm,
            data,
            session_id,
            protocol_version,
            extra_params,
            sticky,
            reset_sticky,
            keystore,
            filename,
            retrieve_servlet,
            storage_servlet,
            cipher_key,
            active_waiting,
            minimum_client_version,
            unrecognized: unrecognized.clone(),
        })))
    }

    fn servlet_url(&self, raw: Option<&str>, role: &str) -> SigningResult<Option<Url>> {
        raw.map(|url| {
            validate_url(url, self.config.allow_local_storage_urls).map_err(|e| match e {
                SigningError::LocalAccessNotAllowed(u) => SigningError::LocalAccessNotAllowed(
                    format!("{role} service URL cannot be local: {u}"),
                ),
                SigningError::InvalidParameter(msg) => {
                    SigningError::InvalidParameter(format!("{role} service URL: {msg}"))
                }
                other => other,
            })
        })
        .transpose()
    }
}

/// Every parameter whose key is outside the known set, in arrival order.
#[must_use]
pub fn unrecognized_parameters(params: &ParameterMap) -> ParameterMap {
    params
        .iter()
        .filter(|(key, _)| !KNOWN_PARAMETERS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn decode_data(gzipped: Option<&str>, plain: Option<&str>) -> SigningResult<Option<Vec<u8>>> {
    if let Some(encoded) = gzipped {
        return decode_gzipped_base64(encoded).map(Some);
    }
    plain
        .map(|encoded| {
            decode_base64_lenient(encoded).map_err(|e| {
                SigningError::InvalidParameter(format!("'{PARAM_DATA}' is not valid base64: {e}"))
            })
        })
        .transpose()
}

/// Split a protocol URI (`scheme://op?k=v&...`) or a bare query string into
/// a parameter map. Later duplicates overwrite earlier values.
///
/// # Errors
/// [`SigningError::InvalidParameter`] when the input is neither.
pub fn parse_query(input: &str) -> SigningResult<ParameterMap> {
    let query = match Url::parse(input) {
        Ok(url) => url.query().unwrap_or_default().to_string(),
        Err(_) if input.contains('=') => input.trim_start_matches('?').to_string(),
        Err(e) => return Err(e.into()),
    };

    Ok(url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect())
}
