// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF assembler — collect single-page PDFs into one output document with
// `lopdf`, preserving append order.

use std::io::{BufWriter, Write};
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use spaltwerk_core::error::{Result, SpaltwerkError};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"Resources", b"CropBox", b"Rotate"];

/// Output document under construction.
///
/// Every appended PDF contributes its pages, in order, to the end of the
/// document.
pub struct PdfAssembler {
    document: Document,
    pages_id: ObjectId,
    page_count: usize,
}

impl Default for PdfAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfAssembler {
    pub fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        Self {
            document,
            pages_id,
            page_count: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Append every page of the PDF in `bytes`.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn append_page(&mut self, bytes: &[u8]) -> Result<()> {
        let source = Document::load_mem(bytes).map_err(|err| {
            SpaltwerkError::PdfError(format!("failed to load section PDF: {}", err))
        })?;

        // lopdf pages are keyed by 1-indexed page number, already in order.
        let pages = source.get_pages();
        if pages.is_empty() {
            return Err(SpaltwerkError::PdfError("section PDF has no pages".into()));
        }
        for page_id in pages.into_values() {
            self.clone_page(&source, page_id)?;
        }
        Ok(())
    }

    /// Write the document to `path`.
    ///
    /// The bytes go to a temporary file beside `path` that is renamed into
    /// place once complete, so a failed write leaves no partial output.
    #[instrument(skip(self), fields(path = %path.as_ref().display(), pages = self.page_count))]
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let mut staging = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(staging.as_file_mut());
            self.document
                .save_to(&mut writer)
                .map_err(|err| write_error(&format!("failed to write {}", path.display()), lopdf::Error::IO(err)))?;
            writer.flush()?;
        }
        staging.persist(path).map_err(|err| SpaltwerkError::Io(err.error))?;

        info!("Wrote {} pages to {}", self.page_count, path.display());
        Ok(())
    }

    /// Serialise the document to bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|err| write_error("failed to serialise output PDF", lopdf::Error::IO(err)))?;
        Ok(output)
    }

    /// Deep-clone one page of `source` and add it as the last page.
    fn clone_page(&mut self, source: &Document, page_id: ObjectId) -> Result<()> {
        let page_dict = source.get_dictionary(page_id).map_err(|err| {
            SpaltwerkError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
        })?;

        let mut page = page_dict.clone();
        for key in INHERITABLE {
            if !page.has(key)
                && let Some(value) = inherited_attribute(source, page_dict, key)
            {
                page.set(key.to_vec(), value);
            }
        }

        let Object::Dictionary(mut cloned) =
            deep_clone_object(source, &mut self.document, &Object::Dictionary(page))?
        else {
            return Err(SpaltwerkError::PdfError("page is not a dictionary".into()));
        };
        cloned.set("Parent", Object::Reference(self.pages_id));
        let cloned_id = self.document.add_object(cloned);

        let pages = self
            .document
            .get_object_mut(self.pages_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| SpaltwerkError::PdfError(format!("no /Pages: {}", err)))?;
        if let Ok(Object::Array(kids)) = pages.get_mut(b"Kids") {
            kids.push(Object::Reference(cloned_id));
        }
        self.page_count += 1;
        pages.set("Count", self.page_count as i64);

        debug!(page = self.page_count, "Page appended");
        Ok(())
    }
}

/// I/O failures keep their `io::Error`; anything else is a PDF fault.
fn write_error(context: &str, err: lopdf::Error) -> SpaltwerkError {
    match err {
        lopdf::Error::IO(err) => SpaltwerkError::Io(err),
        other => SpaltwerkError::PdfError(format!("{context}: {other}")),
    }
}

/// Look up `key` on the ancestors of `page`.
fn inherited_attribute(source: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    // Bounded walk; malformed trees may loop.
    for _ in 0..32 {
        let node = source.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// Deep-clone a lopdf Object, copying every referenced object into `target`.
/// /Parent entries are skipped; the caller patches them.
fn deep_clone_object(source: &Document, target: &mut Document, object: &Object) -> Result<Object> {
    match object {
        Object::Dictionary(dict) => Ok(Object::Dictionary(clone_dictionary(source, target, dict)?)),
        Object::Array(items) => {
            let mut cloned = Vec::with_capacity(items.len());
            for item in items {
                cloned.push(deep_clone_object(source, target, item)?);
            }
            Ok(Object::Array(cloned))
        }
        Object::Reference(ref_id) => match source.get_object(*ref_id) {
            Ok(referenced) => {
                let cloned = deep_clone_object(source, target, referenced)?;
                Ok(Object::Reference(target.add_object(cloned)))
            }
            Err(err) => {
                warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                Ok(Object::Null)
            }
        },
        Object::Stream(stream) => {
            let dict = clone_dictionary(source, target, &stream.dict)?;
            Ok(Object::Stream(Stream::new(dict, stream.content.clone())))
        }
        other => Ok(other.clone()),
    }
}

fn clone_dictionary(
    source: &Document,
    target: &mut Document,
    dict: &Dictionary,
) -> Result<Dictionary> {
    let mut cloned = Dictionary::new();
    for (key, value) in dict.iter() {
        if key == b"Parent" {
            continue;
        }
        cloned.set(key.clone(), deep_clone_object(source, target, value)?);
    }
    Ok(cloned)
}
