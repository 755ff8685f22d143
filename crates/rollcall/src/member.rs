//! Member records.
//!
//! A [`Member`] is one registration: biographical fields plus the photo and
//! signature captured by the widgets, both held as encoded images.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::media::EncodedImage;

/// Marital status, labelled the way the registration sheet prints it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaritalStatus {
    /// Single.
    #[serde(rename = "SOLTERO(A)")]
    Single,
    /// Married.
    #[serde(rename = "CASADO(A)")]
    Married,
    /// Divorced.
    #[serde(rename = "DIVORCIADO(A)")]
    Divorced,
    /// Widowed.
    #[serde(rename = "VIUDO(A)")]
    Widowed,
    /// Common-law union.
    #[serde(rename = "UNIÓN LIBRE")]
    CommonLaw,
}

impl MaritalStatus {
    /// Every status, in sheet order.
    pub const ALL: [Self; 5] = [
        Self::Single,
        Self::Married,
        Self::Divorced,
        Self::Widowed,
        Self::CommonLaw,
    ];

    /// The printed label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "SOLTERO(A)",
            Self::Married => "CASADO(A)",
            Self::Divorced => "DIVORCIADO(A)",
            Self::Widowed => "VIUDO(A)",
            Self::CommonLaw => "UNIÓN LIBRE",
        }
    }
}

impl fmt::Display for MaritalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaritalStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::validation("marital_status", format!("unknown status: {s}")))
    }
}

/// Ministry group a member belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Group {
    /// EVG.
    Evg,
    /// FTU.
    Ftu,
    /// FJU.
    Fju,
    /// EBI.
    Ebi,
    /// CALEB.
    Caleb,
    /// No group.
    Ninguno,
}

impl Group {
    /// Every group, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Evg,
        Self::Ftu,
        Self::Fju,
        Self::Ebi,
        Self::Caleb,
        Self::Ninguno,
    ];

    /// The printed label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Evg => "EVG",
            Self::Ftu => "FTU",
            Self::Fju => "FJU",
            Self::Ebi => "EBI",
            Self::Caleb => "CALEB",
            Self::Ninguno => "NINGUNO",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|group| group.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::validation("group", format!("unknown group: {s}")))
    }
}

/// A registered (or draft) member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Storage identifier, assigned on create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Free-form serial number printed on the card.
    pub serial_number: String,
    /// Photo as captured or selected.
    pub photo: Option<EncodedImage>,
    /// Full name. Required.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Neighborhood.
    pub neighborhood: String,
    /// City.
    pub city: String,
    /// Department (region).
    pub department: String,
    /// Mobile phone.
    pub cellphone: String,
    /// Email address.
    pub email: String,
    /// Date of birth.
    pub birth_date: Option<NaiveDate>,
    /// Marital status.
    pub marital_status: Option<MaritalStatus>,
    /// Date of baptism.
    pub baptism_date: Option<NaiveDate>,
    /// Church name.
    pub church: String,
    /// How long the member has attended, as written.
    pub time_in_church: String,
    /// Ministry group.
    pub group: Option<Group>,
    /// Handwritten signature.
    pub signature: Option<EncodedImage>,
    /// Date the sheet was filled in.
    pub update_date: NaiveDate,
    /// When the record was stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Member {
    /// An empty draft dated `update_date` for `church`.
    #[must_use]
    pub fn draft(update_date: NaiveDate, church: impl Into<String>) -> Self {
        Self {
            id: None,
            serial_number: String::new(),
            photo: None,
            name: String::new(),
            address: String::new(),
            neighborhood: String::new(),
            city: String::new(),
            department: String::new(),
            cellphone: String::new(),
            email: String::new(),
            birth_date: None,
            marital_status: None,
            baptism_date: None,
            church: church.into(),
            time_in_church: String::new(),
            group: None,
            signature: None,
            update_date,
            created_at: None,
        }
    }

    /// Check the record before it is stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the name is blank, or if
    /// `require_email_format` is set and a non-empty email is malformed.
    pub fn validate(&self, require_email_format: bool) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("name", "is required"));
        }
        if require_email_format && !self.email.is_empty() && !email_regex()?.is_match(&self.email) {
            return Err(Error::validation(
                "email",
                format!("not an email address: {}", self.email),
            ));
        }
        Ok(())
    }

    /// Whether a photo is attached.
    #[must_use]
    pub fn has_photo(&self) -> bool {
        self.photo.is_some()
    }

    /// Whether a signature is attached.
    #[must_use]
    pub fn has_signature(&self) -> bool {
        self.signature.is_some()
    }
}

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn email_regex() -> Result<&'static Regex> {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    if let Some(regex) = EMAIL.get() {
        return Ok(regex);
    }
    let regex = Regex::new(EMAIL_PATTERN)
        .map_err(|e| Error::internal(format!("email pattern: {e}")))?;
    Ok(EMAIL.get_or_init(|| regex))
}

/// Criteria for listing members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFilter {
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    /// Exact group.
    pub group: Option<Group>,
}

impl MemberFilter {
    /// A filter that matches everyone.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Set the name search.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Set the group.
    #[must_use]
    pub fn with_group(mut self, group: Group) -> Self {
        self.group = Some(group);
        self
    }

    /// Whether `member` satisfies every criterion.
    #[must_use]
    pub fn matches(&self, member: &Member) -> bool {
        let name_ok = self.search.as_deref().is_none_or(|search| {
            member
                .name
                .to_lowercase()
                .contains(&search.to_lowercase())
        });
        let group_ok = self.group.is_none_or(|group| member.group == Some(group));
        name_ok && group_ok
    }
}
