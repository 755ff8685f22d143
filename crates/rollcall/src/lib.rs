//! `rollcall` - Member registration with photo and signature capture
//!
//! This library provides the pieces behind the registration form: a signature
//! pad that rasterizes pointer strokes to PNG, a photo widget that snapshots a
//! camera stream or takes an image file, and a SQLite store for the records.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod form;
pub mod logging;
pub mod media;
pub mod member;
pub mod photo;
pub mod signature;
pub mod storage;

pub use config::Config;
pub use dashboard::Dashboard;
pub use error::{Error, Result};
pub use form::RegistrationForm;
pub use logging::init_logging;
pub use media::EncodedImage;
pub use member::{Group, MaritalStatus, Member, MemberFilter};
pub use photo::PhotoCapture;
pub use signature::SignaturePad;
pub use storage::{Storage, StorageStats};
