//! The finished postcard and its presentation choices.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::CardError;
use crate::form::{GenerationRequest, Holiday};

/// Typeface used for the message on the back of the card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostcardFont {
    #[default]
    Nunito,
    #[serde(rename = "Great Vibes")]
    GreatVibes,
    #[serde(rename = "Mountains of Christmas")]
    MountainsOfChristmas,
    #[serde(rename = "Dancing Script")]
    DancingScript,
}

impl PostcardFont {
    pub const ALL: [PostcardFont; 4] = [
        PostcardFont::Nunito,
        PostcardFont::GreatVibes,
        PostcardFont::MountainsOfChristmas,
        PostcardFont::DancingScript,
    ];

    /// Family name as published by Google Fonts.
    pub fn family(self) -> &'static str {
        match self {
            PostcardFont::Nunito => "Nunito",
            PostcardFont::GreatVibes => "Great Vibes",
            PostcardFont::MountainsOfChristmas => "Mountains of Christmas",
            PostcardFont::DancingScript => "Dancing Script",
        }
    }

    /// Button label in the style picker.
    pub fn label(self) -> &'static str {
        match self {
            PostcardFont::Nunito => "Simple",
            PostcardFont::GreatVibes => "Elegant",
            PostcardFont::MountainsOfChristmas => "Festive",
            PostcardFont::DancingScript => "Script",
        }
    }

    /// CSS font-family stack for the browser preview.
    pub fn css_family(self) -> &'static str {
        match self {
            PostcardFont::Nunito => "'Nunito', sans-serif",
            PostcardFont::GreatVibes => "'Great Vibes', cursive",
            PostcardFont::MountainsOfChristmas => "'Mountains of Christmas', cursive",
            PostcardFont::DancingScript => "'Dancing Script', cursive",
        }
    }

    /// TTF path relative to the font source root (google/fonts layout).
    pub fn font_file(self) -> &'static str {
        match self {
            PostcardFont::Nunito => "ofl/nunito/Nunito%5Bwght%5D.ttf",
            PostcardFont::GreatVibes => "ofl/greatvibes/GreatVibes-Regular.ttf",
            PostcardFont::MountainsOfChristmas => {
                "ofl/mountainsofchristmas/MountainsofChristmas-Regular.ttf"
            }
            PostcardFont::DancingScript => "ofl/dancingscript/DancingScript%5Bwght%5D.ttf",
        }
    }

    /// Accepts the family name or the picker label, case-insensitively.
    pub fn from_name(name: &str) -> Option<PostcardFont> {
        let name = name.trim();
        PostcardFont::ALL.into_iter().find(|f| {
            f.family().eq_ignore_ascii_case(name) || f.label().eq_ignore_ascii_case(name)
        })
    }
}

impl fmt::Display for PostcardFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.family())
    }
}

impl FromStr for PostcardFont {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PostcardFont::from_name(s)
            .ok_or_else(|| CardError::Validation(format!("Unknown font '{}'", s)))
    }
}

/// One printable side of the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardFace {
    Front,
    Back,
}

impl CardFace {
    pub fn name(self) -> &'static str {
        match self {
            CardFace::Front => "front",
            CardFace::Back => "back",
        }
    }

    /// Download name, e.g. `holiday-card-front-new-year.png`.
    pub fn download_name(self, holiday: Holiday, extension: &str) -> String {
        let slug = holiday.label().to_lowercase().replace(' ', "-");
        format!("holiday-card-{}-{}.{}", self.name(), slug, extension)
    }
}

impl FromStr for CardFace {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" => Ok(CardFace::Front),
            "back" => Ok(CardFace::Back),
            _ => Err(CardError::Validation(format!("Unknown card face '{}'", s))),
        }
    }
}

/// Reference to background artwork: an inline `data:` URI or a remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Wrap base64 image bytes as returned by the provider.
    pub fn from_base64(mime_type: &str, data: &str) -> Self {
        Self(format!("data:{};base64,{}", mime_type, data))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_data_uri(&self) -> bool {
        self.0.starts_with("data:")
    }

    /// Decode the payload of a base64 `data:` URI.
    ///
    /// Returns `None` for remote URLs.
    pub fn decode_data_uri(&self) -> Option<Result<Vec<u8>, CardError>> {
        let rest = self.0.strip_prefix("data:")?;
        Some(match rest.split_once(";base64,") {
            Some((_, payload)) => STANDARD
                .decode(payload.trim())
                .map_err(|e| CardError::Export(format!("Invalid image data: {}", e))),
            None => Err(CardError::Export(
                "Only base64 data URIs are supported".to_string(),
            )),
        })
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A finished postcard.
///
/// Only the font can change after creation; everything else is fixed until
/// the user starts over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostcardRecord {
    pub recipient: String,
    pub sender: String,
    pub holiday: Holiday,
    pub message: String,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub font: PostcardFont,
}

impl PostcardRecord {
    pub fn new(request: &GenerationRequest, message: String, image: Option<ImageRef>) -> Self {
        Self {
            recipient: request.recipient().to_string(),
            sender: request.sender().to_string(),
            holiday: request.holiday(),
            message,
            image,
            font: PostcardFont::default(),
        }
    }

    /// Front headline.
    pub fn headline(&self) -> String {
        format!("Happy {}", self.holiday)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_lookup() {
        assert_eq!(PostcardFont::from_name("great vibes"), Some(PostcardFont::GreatVibes));
        assert_eq!(PostcardFont::from_name("Festive"), Some(PostcardFont::MountainsOfChristmas));
        assert!("Comic Sans".parse::<PostcardFont>().is_err());
    }

    #[test]
    fn test_font_serde_uses_family() {
        let json = serde_json::to_string(&PostcardFont::DancingScript).unwrap();
        assert_eq!(json, "\"Dancing Script\"");
    }

    #[test]
    fn test_download_name() {
        assert_eq!(
            CardFace::Front.download_name(Holiday::NewYear, "png"),
            "holiday-card-front-new-year.png"
        );
        assert_eq!(
            CardFace::Back.download_name(Holiday::Christmas, "jpg"),
            "holiday-card-back-christmas.jpg"
        );
    }

    #[test]
    fn test_data_uri_decoding() {
        let image = ImageRef::from_base64("image/png", "aGVsbG8=");
        assert!(image.is_data_uri());
        assert_eq!(image.decode_data_uri().unwrap().unwrap(), b"hello");

        let remote = ImageRef::new("https://picsum.photos/800/600?random=7");
        assert!(remote.decode_data_uri().is_none());

        let bad = ImageRef::new("data:text/plain,hello");
        assert!(bad.decode_data_uri().unwrap().is_err());
    }

    #[test]
    fn test_record_image_serializes_as_image_url() {
        let record = PostcardRecord {
            recipient: "Sam".into(),
            sender: "Ana".into(),
            holiday: Holiday::Christmas,
            message: "Hi".into(),
            image: Some(ImageRef::new("https://example.com/a.png")),
            font: PostcardFont::Nunito,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["imageUrl"], "https://example.com/a.png");
        assert_eq!(value["font"], "Nunito");
        assert_eq!(record.headline(), "Happy Christmas");
    }
}
