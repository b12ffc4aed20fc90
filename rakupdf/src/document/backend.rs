//! `lopdf`-backed documents.
//!
//! Assembling copies whole source documents into the output, rewires the
//! planned pages under a fresh page tree and prunes whatever is no longer
//! reachable. Inherited page attributes are pushed down onto each page first,
//! since the pages leave their original tree.

use lopdf::xref::XrefEntry;
use lopdf::{
    Dictionary, Document, EncryptionState, EncryptionVersion, Object, ObjectId, Permissions,
    Reader, StringFormat, dictionary,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use tracing::{debug, trace, warn};

use super::{DocumentError, EncryptionSettings, PdfDocument, PermissionSet, display_name};
use crate::io::{PdfWriter, WriteOptions};
use crate::pages::PagePlan;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic `/Parent` chains.
const MAX_TREE_DEPTH: usize = 64;

/// A PDF document loaded through `lopdf`.
#[derive(Debug, Clone)]
pub struct LopdfDocument {
    name: String,
    inner: Document,
    /// Raw file bytes, kept for encrypted sources whose objects `lopdf`
    /// could not parse without the user password.
    source: Option<Vec<u8>>,
    locked: bool,
    sealed: bool,
}

impl LopdfDocument {
    /// Parse the PDF at `path`.
    ///
    /// Encrypted files load successfully but stay locked until
    /// [`PdfDocument::decrypt`] accepts a password.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Load`] if the file is not a readable PDF.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let load_error = |reason: String| DocumentError::Load {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = std::fs::read(path).map_err(|err| load_error(err.to_string()))?;
        let inner = Document::load_mem(&bytes).map_err(|err| load_error(err.to_string()))?;

        let mut doc = Self::from_document(display_name(path), inner);
        if doc.locked && doc.inner.encryption_state.is_none() {
            doc.source = Some(bytes);
        }
        Ok(doc)
    }

    /// Wrap an already parsed document.
    pub fn from_document(name: impl Into<String>, inner: Document) -> Self {
        let locked = inner.is_encrypted();
        Self {
            name: name.into(),
            inner,
            source: None,
            locked,
            sealed: false,
        }
    }

    /// The underlying `lopdf` document.
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Consume the wrapper.
    pub fn into_inner(self) -> Document {
        self.inner
    }

    /// PDF version string of the document, e.g. `1.7`.
    pub fn version(&self) -> &str {
        &self.inner.version
    }

    /// Parse the objects `lopdf` skipped because the user password was
    /// unknown at load time. They stay encrypted until `Document::decrypt`.
    fn parse_encrypted_objects(&mut self) {
        let Some(source) = self.source.as_deref() else {
            return;
        };

        let mut table = Document::new();
        table.reference_table = self.inner.reference_table.clone();
        let reader = Reader {
            buffer: source,
            document: table,
            encryption_state: None,
            raw_objects: BTreeMap::new(),
        };

        for (&number, entry) in &reader.document.reference_table.entries {
            let XrefEntry::Normal { generation, .. } = *entry else {
                continue;
            };
            let id = (number, generation);
            if self.inner.objects.contains_key(&id) {
                continue;
            }
            match reader.get_object(id, &mut HashSet::new()) {
                Ok(object) => {
                    self.inner.objects.insert(id, object);
                }
                Err(err) => {
                    warn!(name = %self.name, object = ?id, error = %err, "skipping unreadable object");
                }
            }
        }

        trace!(name = %self.name, objects = self.inner.objects.len(), "parsed encrypted objects");
    }

    fn decryption_error(&self, reason: String) -> DocumentError {
        DocumentError::Decryption {
            name: self.name.clone(),
            reason,
        }
    }
}

impl PdfDocument for LopdfDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    fn is_encrypted(&self) -> bool {
        self.locked
    }

    fn decrypt(&mut self, password: &str) -> Result<bool, DocumentError> {
        if !self.locked {
            return Ok(true);
        }

        if let Err(err) = self.inner.authenticate_password(password) {
            debug!(name = %self.name, error = %err, "password rejected");
            return Ok(false);
        }

        if self.inner.encryption_state.is_some() {
            // Opened with the empty user password: objects are plain already.
            drop_encryption(&mut self.inner);
        } else {
            self.parse_encrypted_objects();
            self.inner
                .decrypt(password)
                .map_err(|err| self.decryption_error(err.to_string()))?;
            drop_encryption(&mut self.inner);
            self.source = None;
        }

        if self.inner.get_pages().is_empty() {
            return Err(self.decryption_error("no pages after decryption".to_string()));
        }

        self.locked = false;
        Ok(true)
    }

    fn assemble(sources: &[&Self], plan: &PagePlan) -> Result<Self, DocumentError> {
        let first = sources.first().ok_or(DocumentError::MissingSource(0))?;

        let mut out = Document::with_version(first.inner.version.clone());
        let pages_id = out.new_object_id();

        let used: BTreeSet<usize> = plan.iter().map(|page| page.document).collect();
        let mut page_ids: BTreeMap<usize, Vec<ObjectId>> = BTreeMap::new();

        for &document in &used {
            let source = sources
                .get(document)
                .ok_or(DocumentError::MissingSource(document))?;
            if source.locked {
                return Err(DocumentError::Locked(source.name.clone()));
            }

            let mut copy = source.inner.clone();
            copy.renumber_objects_with(out.max_id + 1);
            flatten_inherited(&mut copy)?;

            out.max_id = copy.max_id;
            page_ids.insert(document, copy.get_pages().into_values().collect());
            out.objects.extend(copy.objects);
            trace!(name = %source.name, "copied source objects");
        }

        let mut kids = Vec::with_capacity(plan.len());
        let mut placed: HashSet<ObjectId> = HashSet::new();

        for planned in plan {
            let source = sources
                .get(planned.document)
                .ok_or(DocumentError::MissingSource(planned.document))?;
            let mut page_id = page_ids
                .get(&planned.document)
                .and_then(|ids| ids.get(planned.index))
                .copied()
                .ok_or_else(|| DocumentError::MissingPage {
                    name: source.name.clone(),
                    index: planned.index,
                })?;

            // A page used twice gets its own dictionary.
            if !placed.insert(page_id) {
                let dict = page_dict(&out, page_id)?.clone();
                page_id = out.add_object(dict);
            }

            let page = out
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(structure)?;
            page.set("Parent", pages_id);

            if !planned.rotation.is_none() {
                let current = page
                    .get(b"Rotate")
                    .and_then(Object::as_i64)
                    .unwrap_or(0);
                page.set("Rotate", planned.rotation.apply_to(current));
            }

            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        out.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = out.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        out.trailer = Dictionary::new();
        out.trailer.set("Root", catalog_id);

        out.prune_objects();
        out.renumber_objects();

        debug!(pages = count, sources = used.len(), "assembled document");

        Ok(Self {
            name: first.name.clone(),
            inner: out,
            source: None,
            locked: false,
            sealed: false,
        })
    }

    fn encrypt(&mut self, settings: &EncryptionSettings) -> Result<(), DocumentError> {
        ensure_file_id(&mut self.inner);

        let version = EncryptionVersion::V2 {
            document: &self.inner,
            owner_password: &settings.owner_password,
            user_password: &settings.user_password,
            key_length: 128,
            permissions: to_lopdf_permissions(settings.permissions),
        };
        let state = EncryptionState::try_from(version)
            .map_err(|err| DocumentError::Encryption(err.to_string()))?;

        self.inner
            .encrypt(&state)
            .map_err(|err| DocumentError::Encryption(err.to_string()))?;
        self.sealed = true;

        Ok(())
    }

    fn write(&self, path: &Path) -> Result<u64, DocumentError> {
        // Encrypted object keys depend on object numbers, so sealed documents
        // are written exactly as they are.
        let options = if self.sealed {
            WriteOptions::verbatim()
        } else {
            WriteOptions::default()
        };

        let stats = PdfWriter::with_options(options)
            .save(&self.inner, path)
            .map_err(|err| DocumentError::Write {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;

        Ok(stats.file_size)
    }
}

fn structure(err: lopdf::Error) -> DocumentError {
    DocumentError::Structure(err.to_string())
}

fn page_dict(doc: &Document, id: ObjectId) -> Result<&Dictionary, DocumentError> {
    doc.get_object(id)
        .and_then(Object::as_dict)
        .map_err(structure)
}

/// Look up `key` on a page or, failing that, on its ancestors.
fn resolve_inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = page_dict(doc, current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// Copy inherited attributes onto every page of `doc`.
fn flatten_inherited(doc: &mut Document) -> Result<(), DocumentError> {
    for page_id in doc.get_pages().into_values() {
        let missing: Vec<(&[u8], Object)> = INHERITABLE
            .into_iter()
            .filter(|key| {
                page_dict(doc, page_id)
                    .map(|dict| !dict.has(key))
                    .unwrap_or(false)
            })
            .filter_map(|key| resolve_inherited(doc, page_id, key).map(|value| (key, value)))
            .collect();

        if missing.is_empty() {
            continue;
        }

        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(structure)?;
        for (key, value) in missing {
            page.set(key.to_vec(), value);
        }
    }
    Ok(())
}

/// Remove the encryption dictionary once the objects are plain.
fn drop_encryption(doc: &mut Document) {
    if let Some(Ok(id)) = doc.trailer.remove(b"Encrypt").map(|entry| entry.as_reference()) {
        doc.objects.remove(&id);
    }
    doc.encryption_state = None;
}

/// Encryption keys are derived from the first file identifier.
fn ensure_file_id(doc: &mut Document) {
    if doc.trailer.has(b"ID") {
        return;
    }

    let id = uuid::Uuid::new_v4().as_bytes().to_vec();
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(id.clone(), StringFormat::Hexadecimal),
            Object::String(id, StringFormat::Hexadecimal),
        ]),
    );
}

fn to_lopdf_permissions(set: PermissionSet) -> Permissions {
    let pairs = [
        (PermissionSet::PRINT, Permissions::PRINTABLE),
        (PermissionSet::MODIFY, Permissions::MODIFIABLE),
        (PermissionSet::COPY, Permissions::COPYABLE),
        (PermissionSet::ANNOTATE, Permissions::ANNOTABLE),
        (PermissionSet::FILL_FORMS, Permissions::FILLABLE),
        (
            PermissionSet::EXTRACT_FOR_ACCESSIBILITY,
            Permissions::COPYABLE_FOR_ACCESSIBILITY,
        ),
        (PermissionSet::ASSEMBLE, Permissions::ASSEMBLABLE),
        (
            PermissionSet::PRINT_HIGH_QUALITY,
            Permissions::PRINTABLE_IN_HIGH_QUALITY,
        ),
    ];

    pairs
        .into_iter()
        .filter(|(ours, _)| set.contains(*ours))
        .fold(Permissions::empty(), |acc, (_, theirs)| acc | theirs)
}
