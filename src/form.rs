//! # Postcard Form
//!
//! The controlled form behind the "Create Postcard" button: free-text fields,
//! two closed enumerations (holiday, vibe) and the artwork toggle.
//!
//! A [`FormModel`] is the mutable, possibly-invalid state the user is editing.
//! [`FormModel::to_request`] validates it and freezes it into a
//! [`GenerationRequest`], which is what the rest of the pipeline consumes.
//!
//! ```
//! use holicard::form::{FormModel, Holiday};
//!
//! let form = FormModel {
//!     recipient: "Sam".into(),
//!     sender: "Ana".into(),
//!     holiday: Holiday::Hanukkah,
//!     ..Default::default()
//! };
//! let request = form.to_request()?;
//! assert_eq!(request.recipient(), "Sam");
//! assert!(request.include_image());
//! # Ok::<(), holicard::CardError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CardError;

/// Lowercase a user-supplied name and keep only letters and digits, so that
/// "New Year", "new-year" and "NEW_YEAR" all compare equal.
fn normalize_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Holidays offered by the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Holiday {
    #[default]
    Christmas,
    #[serde(rename = "New Year")]
    NewYear,
    Hanukkah,
    Kwanzaa,
    #[serde(rename = "Winter Solstice")]
    WinterSolstice,
    Thanksgiving,
}

impl Holiday {
    pub const ALL: [Holiday; 6] = [
        Holiday::Christmas,
        Holiday::NewYear,
        Holiday::Hanukkah,
        Holiday::Kwanzaa,
        Holiday::WinterSolstice,
        Holiday::Thanksgiving,
    ];

    /// Display name, also used verbatim in prompts and on the card.
    pub fn label(self) -> &'static str {
        match self {
            Holiday::Christmas => "Christmas",
            Holiday::NewYear => "New Year",
            Holiday::Hanukkah => "Hanukkah",
            Holiday::Kwanzaa => "Kwanzaa",
            Holiday::WinterSolstice => "Winter Solstice",
            Holiday::Thanksgiving => "Thanksgiving",
        }
    }

    /// Look up a holiday by a loosely-formatted name.
    pub fn from_name(name: &str) -> Option<Holiday> {
        let key = normalize_key(name);
        Holiday::ALL
            .into_iter()
            .find(|h| normalize_key(h.label()) == key)
    }
}

impl fmt::Display for Holiday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Holiday {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Holiday::from_name(s)
            .ok_or_else(|| CardError::Validation(format!("Unknown holiday '{}'", s)))
    }
}

/// Tone of the generated wish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vibe {
    #[default]
    Heartfelt,
    Funny,
    Professional,
    Poetic,
    #[serde(rename = "Short & Sweet")]
    ShortAndSweet,
}

impl Vibe {
    pub const ALL: [Vibe; 5] = [
        Vibe::Heartfelt,
        Vibe::Funny,
        Vibe::Professional,
        Vibe::Poetic,
        Vibe::ShortAndSweet,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Vibe::Heartfelt => "Heartfelt",
            Vibe::Funny => "Funny",
            Vibe::Professional => "Professional",
            Vibe::Poetic => "Poetic",
            Vibe::ShortAndSweet => "Short & Sweet",
        }
    }

    pub fn from_name(name: &str) -> Option<Vibe> {
        match normalize_key(name).as_str() {
            "heartfelt" => Some(Vibe::Heartfelt),
            "funny" => Some(Vibe::Funny),
            "professional" => Some(Vibe::Professional),
            "poetic" => Some(Vibe::Poetic),
            "shortsweet" | "shortandsweet" => Some(Vibe::ShortAndSweet),
            _ => None,
        }
    }
}

impl fmt::Display for Vibe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Vibe {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Vibe::from_name(s).ok_or_else(|| CardError::Validation(format!("Unknown vibe '{}'", s)))
    }
}

fn default_true() -> bool {
    true
}

/// Form state as the user edits it.
///
/// Field names serialize in camelCase to match the browser form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormModel {
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub holiday: Holiday,
    #[serde(default)]
    pub vibe: Vibe,
    /// Optional theme ("Snowy Cabin", "Cyberpunk Santa").
    #[serde(default)]
    pub theme: String,
    /// When non-blank, used verbatim instead of asking the provider.
    #[serde(default)]
    pub custom_message: String,
    #[serde(default = "default_true")]
    pub include_image: bool,
}

impl Default for FormModel {
    fn default() -> Self {
        Self {
            recipient: String::new(),
            sender: String::new(),
            holiday: Holiday::default(),
            vibe: Vibe::default(),
            theme: String::new(),
            custom_message: String::new(),
            include_image: true,
        }
    }
}

impl FormModel {
    /// Check required fields.
    pub fn validate(&self) -> Result<(), CardError> {
        if self.recipient.trim().is_empty() {
            return Err(CardError::Validation("Recipient is required".to_string()));
        }
        if self.sender.trim().is_empty() {
            return Err(CardError::Validation("Sender is required".to_string()));
        }
        Ok(())
    }

    /// Validate and freeze into an immutable request.
    pub fn to_request(&self) -> Result<GenerationRequest, CardError> {
        self.validate()?;
        Ok(GenerationRequest {
            recipient: self.recipient.trim().to_string(),
            sender: self.sender.trim().to_string(),
            holiday: self.holiday,
            vibe: self.vibe,
            theme: non_blank(&self.theme),
            custom_message: non_blank(&self.custom_message),
            include_image: self.include_image,
        })
    }

    /// Placeholder for the theme input, which doubles as the image theme
    /// when artwork is requested.
    pub fn theme_hint(&self) -> &'static str {
        if self.include_image {
            "e.g. Snowy Cabin, Cyberpunk Santa"
        } else {
            "e.g. Traditional, Modern"
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A validated submission. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    recipient: String,
    sender: String,
    holiday: Holiday,
    vibe: Vibe,
    theme: Option<String>,
    custom_message: Option<String>,
    include_image: bool,
}

impl GenerationRequest {
    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn holiday(&self) -> Holiday {
        self.holiday
    }

    pub fn vibe(&self) -> Vibe {
        self.vibe
    }

    pub fn theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }

    /// The trimmed custom message, if the user wrote one.
    pub fn custom_message(&self) -> Option<&str> {
        self.custom_message.as_deref()
    }

    pub fn include_image(&self) -> bool {
        self.include_image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> FormModel {
        FormModel {
            recipient: "  Sam ".into(),
            sender: "Ana".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_match_form() {
        let form = FormModel::default();
        assert_eq!(form.holiday, Holiday::Christmas);
        assert_eq!(form.vibe, Vibe::Heartfelt);
        assert!(form.include_image);
    }

    #[test]
    fn test_required_fields() {
        let mut form = filled();
        form.sender = "   ".into();
        assert!(matches!(form.validate(), Err(CardError::Validation(_))));

        let mut form = filled();
        form.recipient.clear();
        assert!(matches!(form.to_request(), Err(CardError::Validation(_))));
    }

    #[test]
    fn test_blank_optionals_become_none() {
        let mut form = filled();
        form.theme = "  ".into();
        form.custom_message = "\n".into();
        let request = form.to_request().unwrap();
        assert_eq!(request.recipient(), "Sam");
        assert_eq!(request.theme(), None);
        assert_eq!(request.custom_message(), None);
    }

    #[test]
    fn test_custom_message_is_trimmed() {
        let mut form = filled();
        form.custom_message = "  Merry Christmas, Sam! ".into();
        let request = form.to_request().unwrap();
        assert_eq!(request.custom_message(), Some("Merry Christmas, Sam!"));
    }

    #[test]
    fn test_holiday_names() {
        assert_eq!(Holiday::from_name("new-year"), Some(Holiday::NewYear));
        assert_eq!(Holiday::from_name("Winter Solstice"), Some(Holiday::WinterSolstice));
        assert_eq!(Holiday::from_name("easter"), None);
        assert!("diwali".parse::<Holiday>().is_err());
    }

    #[test]
    fn test_vibe_names() {
        assert_eq!(Vibe::from_name("Short & Sweet"), Some(Vibe::ShortAndSweet));
        assert_eq!(Vibe::from_name("short-and-sweet"), Some(Vibe::ShortAndSweet));
        assert_eq!("FUNNY".parse::<Vibe>().unwrap(), Vibe::Funny);
    }

    #[test]
    fn test_deserialize_browser_form() {
        let json = r#"{
            "recipient": "Sam",
            "sender": "Ana",
            "holiday": "New Year",
            "vibe": "Short & Sweet",
            "theme": "",
            "customMessage": ""
        }"#;
        let form: FormModel = serde_json::from_str(json).unwrap();
        assert_eq!(form.holiday, Holiday::NewYear);
        assert_eq!(form.vibe, Vibe::ShortAndSweet);
        assert!(form.include_image);
    }

    #[test]
    fn test_theme_hint_follows_image_toggle() {
        let mut form = filled();
        assert!(form.theme_hint().contains("Snowy Cabin"));
        form.include_image = false;
        assert!(form.theme_hint().contains("Traditional"));
    }
}
