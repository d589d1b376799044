//! Line-oriented contact export and import.
//!
//! # Responsibility
//! - Write one single-line JSON object per contact.
//! - Parse such lines back into drafts, collecting per-line failures.
//!
//! # Invariants
//! - Field order is `id, name, phone, email, group_id, group_name, photo_ref`.
//! - A bad line never aborts parsing; only reader I/O errors do.
//! - Imported ids are informational; the store assigns new ones.

use crate::model::contact::{Contact, ContactDraft, ContactId};
use crate::model::group::GroupId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{BufRead, Write};

/// Wire shape of one transferred contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    #[serde(default)]
    pub id: Option<ContactId>,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub photo_ref: Option<String>,
}

impl From<&Contact> for TransferRecord {
    fn from(contact: &Contact) -> Self {
        Self {
            id: Some(contact.id),
            name: contact.name.clone(),
            phone: contact.phone.clone(),
            email: contact.email.clone(),
            group_id: contact.group_id,
            group_name: contact.group_name.clone(),
            photo_ref: contact.photo_ref.clone(),
        }
    }
}

impl TransferRecord {
    /// Converts to a draft, normalizing whitespace the way manual entry does.
    pub fn into_draft(self) -> ContactDraft {
        let mut draft = ContactDraft::new(self.name, self.phone);
        if let Some(email) = self.email {
            draft = draft.with_email(email);
        }
        draft.group_id = self.group_id;
        draft.group_name = self
            .group_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        draft.photo_ref = self.photo_ref;
        draft
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    /// 1-based line number in the input.
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub drafts: Vec<ContactDraft>,
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
pub enum TransferError {
    Io(std::io::Error),
    Encode(serde_json::Error),
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "transfer i/o failed: {err}"),
            Self::Encode(err) => write!(f, "failed to encode contact: {err}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for TransferError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Writes every contact as one line and returns how many were written.
pub fn export_contacts<W: Write>(mut writer: W, contacts: &[Contact]) -> Result<usize, TransferError> {
    for contact in contacts {
        let line =
            serde_json::to_string(&TransferRecord::from(contact)).map_err(TransferError::Encode)?;
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(contacts.len())
}

/// Parses every non-blank line into a validated draft.
pub fn parse_import<R: BufRead>(reader: R) -> Result<ImportReport, TransferError> {
    let mut report = ImportReport::default();

    for (index, raw) in reader.split(b'\n').enumerate() {
        let raw = raw?;
        let line_number = index + 1;
        let line = match String::from_utf8(raw) {
            Ok(line) => line,
            Err(_) => {
                report.failures.push(ImportFailure {
                    line: line_number,
                    message: "invalid UTF-8".to_string(),
                });
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let draft = match serde_json::from_str::<TransferRecord>(&line) {
            Ok(record) => record.into_draft(),
            Err(err) => {
                report.failures.push(ImportFailure {
                    line: line_number,
                    message: format!("malformed record: {err}"),
                });
                continue;
            }
        };

        match draft.validate() {
            Ok(()) => report.drafts.push(draft),
            Err(err) => report.failures.push(ImportFailure {
                line: line_number,
                message: err.to_string(),
            }),
        }
    }

    Ok(report)
}
