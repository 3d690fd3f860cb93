// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Uploaded-file intake for pre-filling the subscription form.
//!
//! This is a name lookup, not document analysis. Image uploads are matched
//! by file name against [`KNOWN_SERVICES`]; PDF and plain-text uploads get a
//! fixed placeholder per file kind. File contents are never read.

use chrono::NaiveDate;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::BillingCycle;
use crate::time_utils::one_month_after;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Upload metadata needed for intake.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
}

/// Intake rejections.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntakeError {
    #[error("Unsupported file type '{0}'. Please upload an image, PDF, or text file.")]
    UnsupportedType(String),

    #[error("File is too large ({size} bytes). Maximum size is 10MB.")]
    TooLarge { size: u64 },

    /// The request body hit the transport limit before the size was known.
    #[error("File is too large. Maximum size is 10MB.")]
    UploadTooLarge,
}

/// A service the lookup table knows about.
#[derive(Debug, Clone, Copy)]
pub struct KnownService {
    /// Lowercase substrings that identify the service in a file name
    pub keywords: &'static [&'static str],
    pub name: &'static str,
    pub cost: f64,
    pub currency: &'static str,
    pub billing_cycle: BillingCycle,
    pub category: &'static str,
    pub description: &'static str,
}

/// Lookup table, searched in order; the first match wins.
pub const KNOWN_SERVICES: [KnownService; 12] = [
    KnownService {
        keywords: &["netflix"],
        name: "Netflix",
        cost: 15.99,
        currency: "USD",
        billing_cycle: BillingCycle::Monthly,
        category: "Entertainment",
        description: "Streaming service for movies and TV shows",
    },
    KnownService {
        keywords: &["spotify"],
        name: "Spotify",
        cost: 9.99,
        currency: "USD",
        billing_cycle: BillingCycle::Monthly,
        category: "Music",
        description: "Music streaming service",
    },
    KnownService {
        keywords: &["disney"],
        name: "Disney+",
        cost: 7.99,
        currency: "USD",
        billing_cycle: BillingCycle::Monthly,
        category: "Entertainment",
        description: "Disney, Marvel, Star Wars and Pixar streaming",
    },
    KnownService {
        keywords: &["hulu"],
        name: "Hulu",
        cost: 7.99,
        currency: "USD",
        billing_cycle: BillingCycle::Monthly,
        category: "Entertainment",
        description: "TV and movie streaming service",
    },
    KnownService {
        keywords: &["amazon", "prime"],
        name: "Amazon Prime",
        cost: 14.99,
        currency: "USD",
        billing_cycle: BillingCycle::Monthly,
        category: "Shopping",
        description: "Free shipping, Prime Video and more",
    },
    KnownService {
        keywords: &["youtube"],
        name: "YouTube Premium",
        cost: 11.99,
        currency: "USD",
        billing_cycle: BillingCycle::Monthly,
        category: "Entertainment",
        description: "Ad-free YouTube and YouTube Music",
    },
    KnownService {
        keywords: &["apple music", "applemusic", "itunes"],
        name: "Apple Music",
        cost: 10.99,
        currency: "USD",
        billing_cycle: BillingCycle::Monthly,
        category: "Music",
        description: "Music streaming service",
    },
    KnownService {
        keywords: &["adobe", "creative cloud"],
        name: "Adobe Creative Cloud",
        cost: 54.99,
        currency: "USD",
        billing_cycle: BillingCycle::Monthly,
        category: "Software",
        description: "Creative apps and cloud storage",
    },
    KnownService {
        keywords: &["microsoft", "office"],
        name: "Microsoft 365",
        cost: 99.99,
        currency: "USD",
        billing_cycle: BillingCycle::Annual,
        category: "Productivity",
        description: "Office apps and OneDrive storage",
    },
    KnownService {
        keywords: &["dropbox"],
        name: "Dropbox",
        cost: 11.99,
        currency: "USD",
        billing_cycle: BillingCycle::Monthly,
        category: "Storage",
        description: "Cloud file storage",
    },
    KnownService {
        keywords: &["chatgpt", "openai"],
        name: "ChatGPT Plus",
        cost: 20.0,
        currency: "USD",
        billing_cycle: BillingCycle::Monthly,
        category: "Productivity",
        description: "AI assistant subscription",
    },
    KnownService {
        keywords: &["hbo"],
        name: "HBO Max",
        cost: 15.99,
        currency: "USD",
        billing_cycle: BillingCycle::Monthly,
        category: "Entertainment",
        description: "Streaming service for HBO series and films",
    },
];

/// Whether the fields came from the lookup table or a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum IntakeSource {
    KnownService,
    Placeholder,
}

/// Pre-filled subscription form values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DetectedSubscription {
    pub name: String,
    pub cost: f64,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub category: String,
    pub description: String,
    pub next_billing: NaiveDate,
    pub source: IntakeSource,
}

enum FileKind {
    Image,
    Pdf,
    Text,
}

/// Validate an upload and derive form values from it.
pub fn analyze(file: &UploadedFile, today: NaiveDate) -> Result<DetectedSubscription, IntakeError> {
    let kind = classify(&file.mime_type)?;
    if file.size > MAX_UPLOAD_BYTES {
        return Err(IntakeError::TooLarge { size: file.size });
    }

    let next_billing = one_month_after(today);
    let detected = match kind {
        FileKind::Image => match match_known_service(&file.file_name) {
            Some(service) => DetectedSubscription {
                name: service.name.to_string(),
                cost: service.cost,
                currency: service.currency.to_string(),
                billing_cycle: service.billing_cycle,
                category: service.category.to_string(),
                description: service.description.to_string(),
                next_billing,
                source: IntakeSource::KnownService,
            },
            None => placeholder(
                "New Subscription",
                "Detected from image - please review the details",
                next_billing,
            ),
        },
        FileKind::Pdf => placeholder(
            "Subscription from PDF",
            "Imported from PDF document - please review the details",
            next_billing,
        ),
        FileKind::Text => placeholder(
            "Subscription from Text",
            "Imported from text file - please review the details",
            next_billing,
        ),
    };

    tracing::debug!(
        file_name = %file.file_name,
        detected = %detected.name,
        source = ?detected.source,
        "File intake complete"
    );
    Ok(detected)
}

/// First table entry whose keyword appears in the extension-less file name.
pub fn match_known_service(file_name: &str) -> Option<&'static KnownService> {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    let stem = stem.to_lowercase();

    KNOWN_SERVICES
        .iter()
        .find(|service| service.keywords.iter().any(|k| stem.contains(k)))
}

fn classify(mime_type: &str) -> Result<FileKind, IntakeError> {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    if essence.starts_with("image/") {
        Ok(FileKind::Image)
    } else if essence == "application/pdf" {
        Ok(FileKind::Pdf)
    } else if essence == "text/plain" {
        Ok(FileKind::Text)
    } else {
        Err(IntakeError::UnsupportedType(mime_type.to_string()))
    }
}

fn placeholder(name: &str, description: &str, next_billing: NaiveDate) -> DetectedSubscription {
    DetectedSubscription {
        name: name.to_string(),
        cost: 9.99,
        currency: "USD".to_string(),
        billing_cycle: BillingCycle::Monthly,
        category: "Other".to_string(),
        description: description.to_string(),
        next_billing,
        source: IntakeSource::Placeholder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
    }

    fn upload(name: &str, mime: &str, size: u64) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            mime_type: mime.to_string(),
            size,
        }
    }

    #[test]
    fn test_netflix_receipt() {
        let detected = analyze(&upload("Netflix-receipt.png", "image/png", 2048), today()).unwrap();
        assert_eq!(detected.name, "Netflix");
        assert_eq!(detected.cost, 15.99);
        assert_eq!(detected.billing_cycle, BillingCycle::Monthly);
        assert_eq!(detected.source, IntakeSource::KnownService);
        assert_eq!(detected.next_billing, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
    }

    #[test]
    fn test_unknown_image_gets_placeholder() {
        let detected = analyze(&upload("random-doc.png", "image/png", 2048), today()).unwrap();
        assert_eq!(detected.source, IntakeSource::Placeholder);
        assert_eq!(detected.name, "New Subscription");
    }

    #[test]
    fn test_table_order_breaks_ties() {
        // Mentions both Spotify and Hulu; Spotify comes first in the table.
        let service = match_known_service("hulu_and_spotify_bundle.jpg").unwrap();
        assert_eq!(service.name, "Spotify");
    }

    #[test]
    fn test_extension_is_ignored() {
        // The keyword only appears in the extension.
        assert!(match_known_service("statement.hbo").is_none());
        assert!(match_known_service("HBO.jpeg").is_some());
    }

    #[test]
    fn test_pdf_and_text_ignore_names() {
        let pdf = analyze(&upload("netflix.pdf", "application/pdf", 10), today()).unwrap();
        assert_eq!(pdf.name, "Subscription from PDF");
        assert_eq!(pdf.source, IntakeSource::Placeholder);

        let txt = analyze(&upload("netflix.txt", "text/plain; charset=utf-8", 10), today()).unwrap();
        assert_eq!(txt.name, "Subscription from Text");
    }

    #[test]
    fn test_rejections() {
        let err = analyze(&upload("Netflix.zip", "application/zip", 10), today()).unwrap_err();
        assert_eq!(err, IntakeError::UnsupportedType("application/zip".to_string()));

        let err = analyze(
            &upload("Netflix.png", "image/png", MAX_UPLOAD_BYTES + 1),
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, IntakeError::TooLarge { .. }));

        assert!(analyze(&upload("Netflix.png", "image/png", MAX_UPLOAD_BYTES), today()).is_ok());
    }
}
