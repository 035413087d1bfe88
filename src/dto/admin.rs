//! DTO definitions used by the admin REST API and documentation layer.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::{
        blob::BlobRef,
        models::{Platform, Principal, UserRole},
    },
    dto::validation::{validate_game_id, validate_http_url, validate_max_chars},
};

const MAX_NAME_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 5_000;

/// Price as typed in the form: a JSON number or a numeric string.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PriceInput {
    /// Integer number.
    Integer(i64),
    /// Non-integer number, always rejected later.
    Decimal(f64),
    /// Numeric string.
    Text(String),
}

impl PriceInput {
    /// Textual form fed to the price parser.
    pub fn into_form_value(self) -> String {
        match self {
            PriceInput::Integer(value) => value.to_string(),
            PriceInput::Decimal(value) => value.to_string(),
            PriceInput::Text(value) => value,
        }
    }
}

/// Newly selected cover image.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum ImageInput {
    /// Raw bytes, base64 encoded.
    Bytes {
        /// Base64 payload.
        data: String,
    },
    /// Content already reachable at a URL.
    Url {
        /// Absolute http(s) URL, or a path served by this backend.
        url: String,
    },
}

impl ImageInput {
    /// Decode into a blob reference.
    pub fn into_blob(self) -> Result<BlobRef, base64::DecodeError> {
        match self {
            ImageInput::Bytes { data } => Ok(BlobRef::from_bytes(STANDARD.decode(data.trim())?)),
            ImageInput::Url { url } => Ok(BlobRef::from_url(url)),
        }
    }
}

/// Add/edit form submitted by an admin.
///
/// On edit, absent fields keep the value pre-filled from the stored record.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct GameFormRequest {
    /// Identifier for a new listing; generated when absent. Ignored on edit.
    pub id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Price.
    pub price: Option<PriceInput>,
    /// Description.
    pub description: Option<String>,
    /// Platform.
    pub platform: Option<Platform>,
    /// Trailer URL; blank means none.
    pub trailer_url: Option<String>,
    /// On-sale flag.
    pub on_sale: Option<bool>,
    /// Newly selected image; omit on edit to keep the current one.
    pub image: Option<ImageInput>,
}

impl Validate for GameFormRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            if let Err(e) = validate_game_id(id) {
                errors.add("id", e);
            }
        }

        if let Some(Err(e)) = self
            .name
            .as_deref()
            .map(|name| validate_max_chars(name, MAX_NAME_CHARS))
        {
            errors.add("name", e);
        }

        if let Some(Err(e)) = self
            .description
            .as_deref()
            .map(|description| validate_max_chars(description, MAX_DESCRIPTION_CHARS))
        {
            errors.add("description", e);
        }

        if let Some(url) = self.trailer_url.as_deref().map(str::trim).filter(|url| !url.is_empty())
        {
            if let Err(e) = validate_http_url(url) {
                errors.add("trailer_url", e);
            }
        }

        match &self.image {
            Some(ImageInput::Bytes { data }) if data.trim().is_empty() => {
                errors.add("image", ValidationError::new("image_empty"));
            }
            Some(ImageInput::Url { url }) if !url.starts_with('/') => {
                if let Err(e) = validate_http_url(url) {
                    errors.add("image", e);
                }
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Single-use confirmation issued before deleting a game.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteConfirmationResponse {
    /// Game the token is bound to.
    pub game_id: String,
    /// Name shown in the confirmation prompt.
    pub game_name: String,
    /// Token to pass as `confirmation` to the delete call.
    pub token: String,
    /// Seconds until the token expires.
    pub expires_in_secs: u64,
}

/// Query string of the confirmed delete call.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteGameQuery {
    /// Token obtained from the delete request.
    pub confirmation: Option<String>,
}

/// Role assignment performed by an admin.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRoleRequest {
    /// Target caller.
    pub principal: Principal,
    /// Role to assign.
    pub role: UserRole,
}
