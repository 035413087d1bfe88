//! Admin game form: field state, pre-filling for edits and submit-time validation.

use thiserror::Error;
use time::OffsetDateTime;

use crate::dao::{
    blob::BlobRef,
    models::{GameEntity, ImageRef, Platform},
};

/// Whether the form adds a new game or edits an existing one.
#[derive(Debug, Clone)]
pub enum FormMode {
    /// Empty form for a new listing.
    Create,
    /// Form pre-filled from the stored record.
    Edit(GameEntity),
}

/// Submit-time validation failures, reported before any store call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// A required field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),
    /// A new listing was submitted without an image.
    #[error("an image is required when adding a game")]
    MissingImage,
    /// The price is not a non-negative integer.
    #[error("price `{0}` must be a non-negative integer")]
    InvalidPrice(String),
}

/// Raw form fields as entered by the admin.
#[derive(Debug, Clone)]
pub struct GameForm {
    mode: FormMode,
    /// Identifier for new listings; generated when blank.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Price as typed.
    pub price: String,
    /// Description.
    pub description: String,
    /// Selected platform.
    pub platform: Option<Platform>,
    /// Trailer URL, blank for none.
    pub trailer_url: String,
    /// On-sale toggle.
    pub on_sale: bool,
    /// Newly selected image, if any.
    pub image: Option<BlobRef>,
}

/// Where the validated listing gets its image from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// A newly selected image that still has to go through the blob store.
    Upload(BlobRef),
    /// The image already attached to the edited record.
    Keep(ImageRef),
}

/// A validated form ready to be persisted once its image is resolved.
#[derive(Debug, Clone)]
pub struct GameDraft {
    /// Record identifier.
    pub id: String,
    /// Whether the draft adds a new record.
    pub is_new: bool,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Platform.
    pub platform: Platform,
    /// Optional trailer URL.
    pub trailer_url: Option<String>,
    /// Integer price.
    pub price: u64,
    /// On-sale flag.
    pub on_sale: bool,
    /// Image to attach.
    pub image: ImageSource,
}

impl GameForm {
    /// Empty form for adding a game. The on-sale toggle starts off.
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            id: None,
            name: String::new(),
            price: String::new(),
            description: String::new(),
            platform: None,
            trailer_url: String::new(),
            on_sale: false,
            image: None,
        }
    }

    /// Form pre-filled from `game`.
    pub fn edit(game: GameEntity) -> Self {
        Self {
            id: Some(game.id.clone()),
            name: game.name.clone(),
            price: game.price.to_string(),
            description: game.description.clone(),
            platform: Some(game.platform),
            trailer_url: game.trailer_url.clone().unwrap_or_default(),
            on_sale: game.on_sale,
            image: None,
            mode: FormMode::Edit(game),
        }
    }

    /// Check required fields, then convert the price. Nothing is persisted here.
    pub fn validate(self) -> Result<GameDraft, FormError> {
        require("name", &self.name)?;
        require("price", &self.price)?;
        require("description", &self.description)?;
        let platform = self.platform.ok_or(FormError::MissingField("platform"))?;

        let (id, is_new, image) = match self.mode {
            FormMode::Create => {
                let image = self.image.ok_or(FormError::MissingImage)?;
                let id = self
                    .id
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_else(generate_game_id);
                (id, true, ImageSource::Upload(image))
            }
            FormMode::Edit(existing) => {
                let image = match self.image {
                    Some(blob) => ImageSource::Upload(blob),
                    None => ImageSource::Keep(existing.image),
                };
                (existing.id, false, image)
            }
        };

        let price = parse_price(&self.price)?;
        let trailer_url = Some(self.trailer_url.trim().to_owned()).filter(|url| !url.is_empty());

        Ok(GameDraft {
            id,
            is_new,
            name: self.name,
            description: self.description,
            platform,
            trailer_url,
            price,
            on_sale: self.on_sale,
            image,
        })
    }
}

impl GameDraft {
    /// Build the record to persist once the image has been resolved to a URL.
    pub fn into_entity(self, image: ImageRef) -> GameEntity {
        GameEntity {
            id: self.id,
            name: self.name,
            description: self.description,
            platform: self.platform,
            trailer_url: self.trailer_url,
            image,
            price: self.price,
            on_sale: self.on_sale,
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<(), FormError> {
    if value.trim().is_empty() {
        return Err(FormError::MissingField(field));
    }
    Ok(())
}

/// Parse a price string into the integer representation.
pub fn parse_price(raw: &str) -> Result<u64, FormError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| FormError::InvalidPrice(raw.to_owned()))
}

/// `game-<unix millis>`.
pub fn generate_game_id() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("game-{millis}")
}
