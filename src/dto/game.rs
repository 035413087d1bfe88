//! Public projections of game listings.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::dao::{
    blob::BlobRef,
    models::{GameEntity, Platform},
};

/// Game listing as exposed over HTTP.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct GameSummary {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Platform.
    pub platform: Platform,
    /// Optional trailer URL.
    pub trailer_url: Option<String>,
    /// Directly usable cover image URL.
    pub image_url: String,
    /// Integer price.
    pub price: u64,
    /// Whether the listing is on sale.
    pub on_sale: bool,
}

impl From<&GameEntity> for GameSummary {
    fn from(game: &GameEntity) -> Self {
        Self {
            id: game.id.clone(),
            name: game.name.clone(),
            description: game.description.clone(),
            platform: game.platform,
            trailer_url: game.trailer_url.clone(),
            image_url: BlobRef::from(game.image.clone()).direct_url(),
            price: game.price,
            on_sale: game.on_sale,
        }
    }
}

impl From<GameEntity> for GameSummary {
    fn from(game: GameEntity) -> Self {
        Self::from(&game)
    }
}

/// Outbound "buy now" messaging link for a listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct ContactLinkResponse {
    /// Listing the link refers to.
    pub game_id: String,
    /// Plain-text message embedded in the link.
    pub message: String,
    /// Deep link to open in a new browsing context.
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::ImageRef;

    #[test]
    fn summary_exposes_the_direct_image_url() {
        let game = GameEntity {
            id: "g1".into(),
            name: "Alpha".into(),
            description: String::new(),
            platform: Platform::Ps4,
            trailer_url: None,
            image: ImageRef {
                url: "/blobs/abc".into(),
            },
            price: 5,
            on_sale: true,
        };
        let summary = GameSummary::from(&game);
        assert_eq!(summary.image_url, "/blobs/abc");
        assert_eq!(summary.platform, Platform::Ps4);
    }
}
