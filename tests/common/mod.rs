//! Shared fakes and fixtures for the integration tests.
//!
//! Every collaborator is an in-memory fake that records how it was called,
//! so tests can assert on interactions without a GUI or a real keystore.

#![allow(dead_code)]

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use cms::cert::IssuerAndSerialNumber;
use cms::content_info::{CmsVersion, ContentInfo};
use cms::signed_data::{
    EncapsulatedContentInfo, SignedData, SignerIdentifier, SignerInfo, SignerInfos,
};
use der::asn1::{Any, BitString, ObjectIdentifier, OctetString, SetOfVec, UtcTime};
use der::Encode;
use protocol_signer::adapters::engine::{EngineFault, SignValidator, SignValidity, SignerEngine};
use protocol_signer::adapters::expander::{ExtraParamsExpander, IncompatiblePolicy};
use protocol_signer::adapters::interaction::{
    FileChooser, InteractionFault, LoadRequest, LoadedFile, Placement, SaveProposal, SaveTarget,
    VisibleSignaturePlacer,
};
use protocol_signer::adapters::keystore::{
    CachedPasswordCallback, CertificateSelectionHints, CertificateSelector, KeyStoreManager,
    KeyStoreProvider, KeystoreFault, PasswordCallback, PrivateKey, PrivateKeyEntry,
    SelectionFault,
};
use protocol_signer::adapters::processor::{
    DataCipher, InlinePlugin, Permission, PluginFault, PostProcessFault, SignDataProcessor,
};
use protocol_signer::adapters::registry::InMemorySignerRegistry;
use protocol_signer::adapters::{RetrievalFault, StoredRequestSource};
use protocol_signer::domain::constants::{ID_AA_ETS_SIG_POLICY_ID, ID_DATA, ID_SIGNED_DATA};
use protocol_signer::domain::extra_params::ExtraParams;
use protocol_signer::domain::types::{CipherKey, KeyStoreSelection};
use protocol_signer::{
    Collaborators, CounterSignTarget, CryptoOperation, HandlerConfiguration, ParameterMap,
    SignAndSavePipeline, SignOperation, SignResult, SignatureAlgorithm,
};
use std::io::{Cursor, Write};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;
use x509_cert::certificate::{TbsCertificate, Version};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::{Time, Validity};
use x509_cert::Certificate;

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const SHA256_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");
const SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");
const POLICY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.724.1.3.1.1.2.1.9");
const CONTENT_TYPE_ATTR: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.3");

// 2020-01-01T00:00:00Z and 2040-01-01T00:00:00Z
const JAN_2020: u64 = 1_577_836_800;
const JAN_2040: u64 = 2_208_988_800;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn algorithm(oid: ObjectIdentifier) -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid,
        parameters: None,
    }
}

fn utc(seconds: u64) -> Time {
    Time::UtcTime(UtcTime::from_unix_duration(Duration::from_secs(seconds)).expect("utc time"))
}

/// Self-issued certificate valid between the two Unix timestamps.
pub fn certificate_valid_between(common_name: &str, not_before: u64, not_after: u64) -> Certificate {
    let name = Name::from_str(&format!("CN={common_name}")).expect("name");
    let tbs_certificate = TbsCertificate {
        version: Version::V3,
        serial_number: SerialNumber::new(&[0x01, 0x23]).expect("serial"),
        signature: algorithm(SHA256_WITH_RSA),
        issuer: name.clone(),
        validity: Validity {
            not_before: utc(not_before),
            not_after: utc(not_after),
        },
        subject: name,
        subject_public_key_info: SubjectPublicKeyInfoOwned {
            algorithm: algorithm(RSA_ENCRYPTION),
            subject_public_key: BitString::from_bytes(&[0x30, 0x03, 0x02, 0x01, 0x03])
                .expect("key"),
        },
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions: None,
    };
    Certificate {
        tbs_certificate,
        signature_algorithm: algorithm(SHA256_WITH_RSA),
        signature: BitString::from_bytes(&[0xAA; 16]).expect("signature"),
    }
}

/// Certificate valid from 2020 to 2040.
pub fn test_certificate(common_name: &str) -> Certificate {
    certificate_valid_between(common_name, JAN_2020, JAN_2040)
}

fn signer_info(with_policy: bool) -> SignerInfo {
    let mut attributes = vec![x509_cert::attr::Attribute {
        oid: CONTENT_TYPE_ATTR,
        values: SetOfVec::try_from(vec![Any::encode_from(&ID_DATA).expect("any")])
            .expect("values"),
    }];
    if with_policy {
        attributes.push(x509_cert::attr::Attribute {
            oid: ID_AA_ETS_SIG_POLICY_ID,
            values: SetOfVec::try_from(vec![Any::encode_from(&POLICY_OID).expect("any")])
                .expect("values"),
        });
    }

    SignerInfo {
        version: CmsVersion::V1,
        sid: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
            issuer: Name::from_str("CN=Signer").expect("name"),
            serial_number: SerialNumber::new(&[0x05]).expect("serial"),
        }),
        digest_alg: algorithm(SHA256),
        signed_attrs: Some(SetOfVec::try_from(attributes).expect("attributes")),
        signature_algorithm: algorithm(RSA_ENCRYPTION),
        signature: OctetString::new(vec![0x5A; 32]).expect("signature"),
        unsigned_attrs: None,
    }
}

/// DER `ContentInfo` wrapping a `SignedData` with one signer per entry;
/// `true` entries carry the signature-policy attribute.
pub fn cms_signed_data(signers: &[bool]) -> Vec<u8> {
    let infos: Vec<SignerInfo> = signers.iter().map(|policy| signer_info(*policy)).collect();
    let signed_data = SignedData {
        version: CmsVersion::V1,
        digest_algorithms: SetOfVec::try_from(vec![algorithm(SHA256)]).expect("digests"),
        encap_content_info: EncapsulatedContentInfo {
            econtent_type: ID_DATA,
            econtent: None,
        },
        certificates: None,
        crls: None,
        signer_infos: SignerInfos(SetOfVec::try_from(infos).expect("signer infos")),
    };
    ContentInfo {
        content_type: ID_SIGNED_DATA,
        content: Any::encode_from(&signed_data).expect("signed data"),
    }
    .to_der()
    .expect("content info")
}

/// Tag byte and content octets of the definite-length TLV at the start of `der`.
fn split_tlv(der: &[u8]) -> (u8, &[u8]) {
    let (start, len) = match der[1] {
        short @ 0..=0x7f => (2, usize::from(short)),
        long => {
            let count = usize::from(long & 0x7f);
            let len = der[2..2 + count]
                .iter()
                .fold(0usize, |acc, byte| (acc << 8) | usize::from(*byte));
            (2 + count, len)
        }
    };
    (der[0], &der[start..start + len])
}

/// Re-encodes a [`cms_signed_data`] buffer as BER: the outer `ContentInfo`
/// and its `[0]` wrapper switch to indefinite lengths.
pub fn indefinite_length(der: &[u8]) -> Vec<u8> {
    let (outer_tag, outer) = split_tlv(der);
    assert_eq!(outer_tag, 0x30);
    let oid_len = 2 + usize::from(outer[1]);
    let (wrapper_tag, signed_data) = split_tlv(&outer[oid_len..]);
    assert_eq!(wrapper_tag, 0xa0);

    let mut ber = vec![0x30, 0x80];
    ber.extend_from_slice(&outer[..oid_len]);
    ber.extend_from_slice(&[0xa0, 0x80]);
    ber.extend_from_slice(signed_data);
    ber.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    ber
}

/// Stored (uncompressed) zip archive with the given entries, in order.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    for (name, content) in entries {
        writer.start_file(*name, options).expect("start entry");
        writer.write_all(content).expect("write entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

pub fn odf_document() -> Vec<u8> {
    zip_archive(&[
        ("mimetype", b"application/vnd.oasis.opendocument.text".as_slice()),
        ("content.xml", b"<office:document-content/>".as_slice()),
    ])
}

pub fn ooxml_document() -> Vec<u8> {
    zip_archive(&[
        ("[Content_Types].xml", b"<Types/>".as_slice()),
        ("word/document.xml", b"<w:document/>".as_slice()),
    ])
}

pub fn b64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn properties(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

pub fn params(pairs: &[(&str, &str)]) -> ParameterMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Split a native response into its decoded fields.
pub fn decode_response(response: &str) -> Vec<Vec<u8>> {
    response
        .split('|')
        .map(|field| URL_SAFE.decode(field).expect("base64url field"))
        .collect()
}

// ---------------------------------------------------------------------------
// Keys and keystores
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct FakeKey(pub String);

impl PrivateKey for FakeKey {
    fn alias(&self) -> &str {
        &self.0
    }

    fn sign(&self, _algorithm: SignatureAlgorithm, data: &[u8]) -> Result<Vec<u8>, String> {
        Ok(data.iter().rev().copied().collect())
    }
}

pub fn key_entry(alias: &str) -> PrivateKeyEntry {
    key_entry_with(alias, test_certificate(alias))
}

pub fn key_entry_with(alias: &str, certificate: Certificate) -> PrivateKeyEntry {
    PrivateKeyEntry {
        key: Arc::new(FakeKey(alias.to_string())),
        chain: vec![certificate],
    }
}

struct FakeManager {
    name: String,
    entry: PrivateKeyEntry,
}

impl KeyStoreManager for FakeManager {
    fn name(&self) -> &str {
        &self.name
    }

    fn aliases(&self) -> Result<Vec<String>, KeystoreFault> {
        Ok(vec![self.entry.alias().to_string()])
    }

    fn key_entry(&self, alias: &str) -> Result<PrivateKeyEntry, KeystoreFault> {
        if alias == self.entry.alias() {
            Ok(self.entry.clone())
        } else {
            Err(KeystoreFault::Access(format!("no entry {alias}")))
        }
    }
}

pub struct FakeKeyStoreProvider {
    pub known: Vec<String>,
    pub open_fault: Option<KeystoreFault>,
    pub entry: PrivateKeyEntry,
    pub opened: Mutex<Vec<KeyStoreSelection>>,
}

impl FakeKeyStoreProvider {
    pub fn new(known: &[&str]) -> Self {
        Self {
            known: known.iter().map(|s| (*s).to_string()).collect(),
            open_fault: None,
            entry: key_entry("default"),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, fault: KeystoreFault) -> Self {
        self.open_fault = Some(fault);
        self
    }
}

impl KeyStoreProvider for FakeKeyStoreProvider {
    fn is_known(&self, name: &str) -> bool {
        self.known.iter().any(|k| k.eq_ignore_ascii_case(name))
    }

    fn open(
        &self,
        selection: &KeyStoreSelection,
        _password: &dyn PasswordCallback,
    ) -> Result<Box<dyn KeyStoreManager>, KeystoreFault> {
        self.opened.lock().unwrap().push(selection.clone());
        if let Some(fault) = &self.open_fault {
            return Err(fault.clone());
        }
        Ok(Box::new(FakeManager {
            name: selection.name.clone(),
            entry: self.entry.clone(),
        }))
    }

    fn password_callback(&self, _name: &str) -> Box<dyn PasswordCallback> {
        Box::new(CachedPasswordCallback::new("changeit"))
    }
}

/// Hands out credentials from a queue; the last one repeats.
pub struct FakeCertificateSelector {
    outcomes: Mutex<Vec<Result<PrivateKeyEntry, SelectionFault>>>,
    pub calls: AtomicUsize,
    pub hints: Mutex<Vec<CertificateSelectionHints>>,
}

impl FakeCertificateSelector {
    pub fn returning(outcomes: Vec<Result<PrivateKeyEntry, SelectionFault>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            calls: AtomicUsize::new(0),
            hints: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CertificateSelector for FakeCertificateSelector {
    fn select(
        &self,
        _manager: &dyn KeyStoreManager,
        hints: &CertificateSelectionHints,
    ) -> Result<PrivateKeyEntry, SelectionFault> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.hints.lock().unwrap().push(hints.clone());
        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.len() > 1 {
            outcomes.remove(0)
        } else {
            outcomes
                .first()
                .cloned()
                .unwrap_or_else(|| Err(SelectionFault::Failed("no outcome".to_string())))
        }
    }
}

// ---------------------------------------------------------------------------
// Engines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCall {
    pub operation: CryptoOperation,
    pub data: Vec<u8>,
    pub algorithm: SignatureAlgorithm,
    pub params: ExtraParams,
    pub target: Option<CounterSignTarget>,
}

pub struct FixedValidator(pub SignValidity);

impl SignValidator for FixedValidator {
    fn validate(&self, _data: &[u8]) -> std::io::Result<SignValidity> {
        Ok(self.0.clone())
    }
}

/// Engine that prefixes its marker to the input and recognises that marker.
pub struct FakeEngine {
    pub format: String,
    pub marker: Vec<u8>,
    pub needs_data: bool,
    pub failure: Option<(Vec<u8>, EngineFault)>,
    pub validator: Option<FixedValidator>,
    pub calls: Mutex<Vec<EngineCall>>,
}

impl FakeEngine {
    pub fn new(format: &str, marker: &[u8]) -> Self {
        Self {
            format: format.to_string(),
            marker: marker.to_vec(),
            needs_data: true,
            failure: None,
            validator: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail with `fault` whenever the input equals `data`.
    pub fn failing_on(mut self, data: &[u8], fault: EngineFault) -> Self {
        self.failure = Some((data.to_vec(), fault));
        self
    }

    pub fn with_validator(mut self, validity: SignValidity) -> Self {
        self.validator = Some(FixedValidator(validity));
        self
    }

    pub fn without_data(mut self) -> Self {
        self.needs_data = false;
        self
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    fn run(
        &self,
        operation: CryptoOperation,
        data: &[u8],
        algorithm: SignatureAlgorithm,
        params: &ExtraParams,
        target: Option<CounterSignTarget>,
    ) -> Result<Vec<u8>, EngineFault> {
        self.calls.lock().unwrap().push(EngineCall {
            operation,
            data: data.to_vec(),
            algorithm,
            params: params.clone(),
            target,
        });
        if let Some((trigger, fault)) = &self.failure {
            if trigger.as_slice() == data {
                return Err(fault.clone());
            }
        }
        Ok([self.marker.as_slice(), data].concat())
    }
}

impl SignerEngine for FakeEngine {
    fn format(&self) -> &str {
        &self.format
    }

    fn sign(
        &self,
        data: &[u8],
        algorithm: SignatureAlgorithm,
        _key: &PrivateKeyEntry,
        params: &ExtraParams,
    ) -> Result<Vec<u8>, EngineFault> {
        self.run(CryptoOperation::Sign, data, algorithm, params, None)
    }

    fn cosign(
        &self,
        signature: &[u8],
        algorithm: SignatureAlgorithm,
        _key: &PrivateKeyEntry,
        params: &ExtraParams,
    ) -> Result<Vec<u8>, EngineFault> {
        self.run(CryptoOperation::Cosign, signature, algorithm, params, None)
    }

    fn countersign(
        &self,
        signature: &[u8],
        algorithm: SignatureAlgorithm,
        target: CounterSignTarget,
        _key: &PrivateKeyEntry,
        params: &ExtraParams,
    ) -> Result<Vec<u8>, EngineFault> {
        self.run(
            CryptoOperation::Countersign,
            signature,
            algorithm,
            params,
            Some(target),
        )
    }

    fn is_sign(&self, data: &[u8]) -> bool {
        !self.marker.is_empty() && data.starts_with(&self.marker)
    }

    fn needs_data(&self, _operation: CryptoOperation, _params: &ExtraParams) -> bool {
        self.needs_data
    }

    fn signed_name(&self, stem: &str) -> String {
        format!("{stem}_signed.{}", self.format.to_ascii_lowercase())
    }

    fn validator(&self) -> Option<&dyn SignValidator> {
        self.validator.as_ref().map(|v| v as &dyn SignValidator)
    }
}

// ---------------------------------------------------------------------------
// Interaction
// ---------------------------------------------------------------------------

pub struct FakeFileChooser {
    pub outcome: Result<LoadedFile, InteractionFault>,
    pub requests: Mutex<Vec<LoadRequest>>,
}

impl FakeFileChooser {
    pub fn returning(outcome: Result<LoadedFile, InteractionFault>) -> Self {
        Self {
            outcome,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn file(name: &str, data: &[u8]) -> Self {
        Self::returning(Ok(LoadedFile {
            name: name.to_string(),
            data: data.to_vec(),
        }))
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl FileChooser for FakeFileChooser {
    fn load_file(&self, request: &LoadRequest) -> Result<LoadedFile, InteractionFault> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcome.clone()
    }
}

pub struct RecordingSaveTarget {
    pub outcome: Result<(), InteractionFault>,
    pub saved: Mutex<Vec<(Vec<u8>, SaveProposal)>>,
}

impl RecordingSaveTarget {
    pub fn returning(outcome: Result<(), InteractionFault>) -> Self {
        Self {
            outcome,
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn proposals(&self) -> Vec<SaveProposal> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .map(|(_, proposal)| proposal.clone())
            .collect()
    }
}

impl SaveTarget for RecordingSaveTarget {
    fn save(&self, data: &[u8], proposal: &SaveProposal) -> Result<(), InteractionFault> {
        self.saved
            .lock()
            .unwrap()
            .push((data.to_vec(), proposal.clone()));
        self.outcome.clone()
    }
}

pub struct FixedPlacer {
    pub outcome: Result<Placement, InteractionFault>,
    pub calls: Mutex<Vec<bool>>,
}

impl FixedPlacer {
    pub fn returning(outcome: Result<Placement, InteractionFault>) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `massive` flag of every call, in order.
    pub fn massive_flags(&self) -> Vec<bool> {
        self.calls.lock().unwrap().clone()
    }
}

impl VisibleSignaturePlacer for FixedPlacer {
    fn place(
        &self,
        _document: &[u8],
        _params: &ExtraParams,
        massive: bool,
    ) -> Result<Placement, InteractionFault> {
        self.calls.lock().unwrap().push(massive);
        self.outcome.clone()
    }
}

pub struct RejectingExpander;

impl ExtraParamsExpander for RejectingExpander {
    fn expand(
        &self,
        _params: &ExtraParams,
        _data: Option<&[u8]>,
        format: &protocol_signer::SignFormat,
    ) -> Result<ExtraParams, IncompatiblePolicy> {
        Err(IncompatiblePolicy(format!("policy not applicable to {format}")))
    }
}

// ---------------------------------------------------------------------------
// Processors and plugins
// ---------------------------------------------------------------------------

pub struct HexCipher;

impl DataCipher for HexCipher {
    fn cipher(&self, data: &[u8], key: &CipherKey) -> Result<String, String> {
        Ok(format!("{}:{}", key.expose(), hex::encode(data)))
    }
}

/// Expands one request into one operation per payload and renders the
/// signatures as a comma-separated hex list.
pub struct BatchProcessor {
    pub payloads: Vec<Vec<u8>>,
    pub errors_allowed: bool,
}

impl SignDataProcessor for BatchProcessor {
    fn name(&self) -> &str {
        "batch"
    }

    fn check_trigger(&self, operation: &SignOperation) -> Result<bool, PluginFault> {
        Ok(operation.extra_params.contains_key("batch"))
    }

    fn pre_process(&self, operation: SignOperation) -> Vec<SignOperation> {
        self.payloads
            .iter()
            .map(|payload| SignOperation {
                data: Some(payload.clone()),
                ..operation.clone()
            })
            .collect()
    }

    fn is_errors_allowed(&self) -> bool {
        self.errors_allowed
    }

    fn post_process(
        &self,
        results: &[SignResult],
        _operation: &SignOperation,
    ) -> Result<String, PostProcessFault> {
        Ok(results
            .iter()
            .map(|r| hex::encode(&r.signature))
            .collect::<Vec<_>>()
            .join(","))
    }

    fn set_cipher_key(&mut self, _key: Option<CipherKey>) {}
}

pub struct BatchPlugin {
    pub payloads: Vec<Vec<u8>>,
    pub errors_allowed: bool,
    pub permissions: Vec<Permission>,
}

impl BatchPlugin {
    pub fn new(payloads: &[&[u8]], errors_allowed: bool) -> Self {
        Self {
            payloads: payloads.iter().map(|p| p.to_vec()).collect(),
            errors_allowed,
            permissions: vec![Permission::InlineProcess],
        }
    }
}

impl InlinePlugin for BatchPlugin {
    fn name(&self) -> &str {
        "batch-plugin"
    }

    fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    fn inline_processor(
        &self,
        _protocol_version: u32,
    ) -> Result<Option<Box<dyn SignDataProcessor>>, PluginFault> {
        Ok(Some(Box::new(BatchProcessor {
            payloads: self.payloads.clone(),
            errors_allowed: self.errors_allowed,
        })))
    }
}

pub struct StaticStoredRequests(pub ParameterMap);

impl StoredRequestSource for StaticStoredRequests {
    fn fetch(
        &self,
        file_id: &str,
        _retrieve_servlet: Option<&Url>,
    ) -> Result<ParameterMap, RetrievalFault> {
        if file_id == "missing" {
            Err(RetrievalFault(format!("{file_id} not found")))
        } else {
            Ok(self.0.clone())
        }
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub const CADES_MARKER: &[u8] = b"CADES:";

/// Fully wired happy-path collaborators; replace fields before building.
pub struct Harness {
    pub engines: Vec<Arc<FakeEngine>>,
    pub keystores: Arc<FakeKeyStoreProvider>,
    pub selector: Arc<FakeCertificateSelector>,
    pub chooser: Arc<FakeFileChooser>,
    pub saver: Arc<RecordingSaveTarget>,
    pub placer: Arc<FixedPlacer>,
    pub expander: Option<Arc<dyn ExtraParamsExpander>>,
    pub plugins: Vec<Arc<dyn InlinePlugin>>,
    pub cipher: Option<Arc<dyn DataCipher>>,
    pub stored: Option<Arc<dyn StoredRequestSource>>,
    pub config: HandlerConfiguration,
}

impl Harness {
    pub fn new() -> Self {
        let engines = [
            ("PAdES", b"PADES:".as_slice()),
            ("CAdES", CADES_MARKER),
            ("CMS/PKCS#7", b"CMS:".as_slice()),
            ("XAdES", b"XADES:".as_slice()),
            ("FacturaE", b"FACTURAE:".as_slice()),
            ("ODF (Open Document Format)", b"ODF:".as_slice()),
            ("OOXML (Office Open XML)", b"OOXML:".as_slice()),
        ]
        .into_iter()
        .map(|(format, marker)| Arc::new(FakeEngine::new(format, marker)))
        .collect();

        Self {
            engines,
            keystores: Arc::new(FakeKeyStoreProvider::new(&["SYSTEM", "PKCS12"])),
            selector: Arc::new(FakeCertificateSelector::returning(vec![Ok(key_entry(
                "alice",
            ))])),
            chooser: Arc::new(FakeFileChooser::returning(Err(InteractionFault::Cancelled))),
            saver: Arc::new(RecordingSaveTarget::returning(Ok(()))),
            placer: Arc::new(FixedPlacer::returning(Ok(Placement::Dismissed))),
            expander: None,
            plugins: Vec::new(),
            cipher: None,
            stored: None,
            config: HandlerConfiguration::default(),
        }
    }

    /// Swap the engine registered for `engine.format`.
    pub fn replace_engine(&mut self, engine: FakeEngine) -> Arc<FakeEngine> {
        let engine = Arc::new(engine);
        self.engines.retain(|e| e.format != engine.format);
        self.engines.insert(0, Arc::clone(&engine));
        engine
    }

    pub fn engine(&self, format: &str) -> Arc<FakeEngine> {
        self.engines
            .iter()
            .find(|e| e.format == format)
            .cloned()
            .expect("engine registered")
    }

    pub fn collaborators(&self) -> Collaborators {
        let mut registry = InMemorySignerRegistry::new();
        for engine in &self.engines {
            let engine: Arc<dyn SignerEngine> = engine.clone();
            registry.register(engine);
        }

        let mut collaborators = Collaborators::new(
            Arc::new(registry),
            self.keystores.clone(),
            self.selector.clone(),
            self.chooser.clone(),
            self.saver.clone(),
            self.placer.clone(),
        );
        if let Some(expander) = &self.expander {
            collaborators = collaborators.with_expander(expander.clone());
        }
        for plugin in &self.plugins {
            collaborators = collaborators.with_plugin(plugin.clone());
        }
        if let Some(cipher) = &self.cipher {
            collaborators = collaborators.with_cipher(cipher.clone());
        }
        if let Some(stored) = &self.stored {
            collaborators = collaborators.with_stored_requests(stored.clone());
        }
        collaborators
    }

    pub fn pipeline(&self) -> SignAndSavePipeline {
        SignAndSavePipeline::new(self.config.clone(), self.collaborators()).expect("pipeline")
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
