use mongodb::bson::{Document, doc};
use serde::{Deserialize, Serialize};

use super::error::MongoDaoError;
use crate::dao::models::{GameEntity, ImageRef, Platform, UserProfileEntity, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    description: String,
    platform: Platform,
    #[serde(default)]
    trailer_url: Option<String>,
    image_url: String,
    price: i64,
    #[serde(default)]
    on_sale: bool,
}

impl TryFrom<GameEntity> for MongoGameDocument {
    type Error = MongoDaoError;

    fn try_from(value: GameEntity) -> Result<Self, Self::Error> {
        let price = i64::try_from(value.price)
            .map_err(|_| MongoDaoError::PriceOutOfRange { id: value.id.clone() })?;
        Ok(Self {
            id: value.id,
            name: value.name,
            description: value.description,
            platform: value.platform,
            trailer_url: value.trailer_url,
            image_url: value.image.url,
            price,
            on_sale: value.on_sale,
        })
    }
}

impl TryFrom<MongoGameDocument> for GameEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGameDocument) -> Result<Self, Self::Error> {
        // Negative prices can only come from out-of-band writes.
        let price = u64::try_from(value.price).map_err(|_| MongoDaoError::CorruptDocument {
            id: value.id.clone(),
            reason: format!("negative price {}", value.price),
        })?;
        Ok(Self {
            id: value.id,
            name: value.name,
            description: value.description,
            platform: value.platform,
            trailer_url: value.trailer_url,
            image: ImageRef {
                url: value.image_url,
            },
            price,
            on_sale: value.on_sale,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoProfileDocument {
    #[serde(rename = "_id")]
    pub principal: String,
    pub name: String,
}

impl From<MongoProfileDocument> for UserProfileEntity {
    fn from(value: MongoProfileDocument) -> Self {
        Self { name: value.name }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoleDocument {
    #[serde(rename = "_id")]
    pub principal: String,
    pub role: UserRole,
}

pub fn doc_id(id: &str) -> Document {
    doc! {"_id": id}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(price: u64) -> GameEntity {
        GameEntity {
            id: "g1".into(),
            name: "Alpha".into(),
            description: "First".into(),
            platform: Platform::Xbox,
            trailer_url: None,
            image: ImageRef {
                url: "/blobs/abc".into(),
            },
            price,
            on_sale: true,
        }
    }

    #[test]
    fn stored_games_convert_back_unchanged() {
        let document = MongoGameDocument::try_from(entity(1_999)).unwrap();
        assert_eq!(GameEntity::try_from(document).unwrap(), entity(1_999));
    }

    #[test]
    fn negative_stored_prices_are_corrupt_documents() {
        let mut document = MongoGameDocument::try_from(entity(5)).unwrap();
        document.price = -5;
        let err = GameEntity::try_from(document).unwrap_err();
        assert!(matches!(err, MongoDaoError::CorruptDocument { ref id, .. } if id == "g1"));
    }

    #[test]
    fn prices_beyond_i64_are_refused_on_write() {
        assert!(matches!(
            MongoGameDocument::try_from(entity(u64::MAX)),
            Err(MongoDaoError::PriceOutOfRange { .. })
        ));
    }
}
