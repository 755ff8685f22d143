//! The registration form.
//!
//! [`RegistrationForm`] holds the draft record. Capture widgets write into it
//! through the listeners it hands out; submitting validates the draft, stores
//! it and starts a fresh one.

use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::FormConfig;
use crate::error::{Error, Result};
use crate::media::ImageCallback;
use crate::member::Member;
use crate::storage::Storage;

/// Draft state shared between the form and its capture listeners.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    draft: Arc<Mutex<Member>>,
    config: FormConfig,
}

impl RegistrationForm {
    /// A form with a fresh draft dated today.
    #[must_use]
    pub fn new(config: FormConfig) -> Self {
        let draft = Member::draft(today(), config.default_church.clone());
        Self {
            draft: Arc::new(Mutex::new(draft)),
            config,
        }
    }

    /// A copy of the current draft.
    #[must_use]
    pub fn draft(&self) -> Member {
        self.draft.lock().clone()
    }

    /// Change draft fields in place.
    pub fn edit(&self, change: impl FnOnce(&mut Member)) {
        change(&mut self.draft.lock());
    }

    /// Callback for the photo widget: replaces the draft's photo.
    #[must_use]
    pub fn photo_listener(&self) -> ImageCallback {
        let draft = Arc::clone(&self.draft);
        Box::new(move |image| {
            debug!("Draft photo {}", if image.is_some() { "set" } else { "cleared" });
            draft.lock().photo = image;
        })
    }

    /// Callback for the signature pad: replaces the draft's signature.
    #[must_use]
    pub fn signature_listener(&self) -> ImageCallback {
        let draft = Arc::clone(&self.draft);
        Box::new(move |image| {
            debug!(
                "Draft signature {}",
                if image.is_some() { "set" } else { "cleared" }
            );
            draft.lock().signature = image;
        })
    }

    /// Replace the draft with a stored member for editing.
    pub fn load(&self, member: Member) {
        debug!("Loaded member {:?} into the form", member.id);
        *self.draft.lock() = member;
    }

    /// Discard the draft and start a new one dated today.
    pub fn reset(&self) {
        *self.draft.lock() = Member::draft(today(), self.config.default_church.clone());
    }

    /// Validate and store the draft, then reset the form.
    ///
    /// A loaded member is updated in place; a new draft is created. The
    /// draft is left untouched when anything fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an invalid draft,
    /// [`Error::NotFound`] if a loaded member was deleted meanwhile, or a
    /// storage error.
    pub fn submit(&self, storage: &Storage) -> Result<i64> {
        let mut member = self.draft();
        member.validate(self.config.require_email_format)?;

        let id = if let Some(id) = member.id {
            if !storage.update(&member)? {
                return Err(Error::NotFound { id });
            }
            id
        } else {
            member.created_at = Some(Utc::now());
            storage.create(&member)?
        };

        info!("Saved registration for {} as member {}", member.name, id);
        self.reset();
        Ok(id)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
