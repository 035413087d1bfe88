//! "Buy now" deep links into the configured messaging app.

use reqwest::Url;

use crate::{
    config::ContactConfig,
    dao::models::GameEntity,
    dto::game::ContactLinkResponse,
    error::ServiceError,
    services::data_access::{self, QueryOutcome},
    state::SharedState,
};

const MESSAGING_BASE_URL: &str = "https://wa.me";

/// Render the purchase enquiry for `game`.
pub fn render_message(config: &ContactConfig, game: &GameEntity) -> String {
    let price = config
        .price_template
        .replace("{price}", &game.price.to_string());
    config
        .message_template
        .replace("{price}", &price)
        .replace("{name}", &game.name)
}

/// Build the messaging deep link carrying the enquiry for `game`.
pub fn build_contact_link(
    config: &ContactConfig,
    game: &GameEntity,
) -> Result<ContactLinkResponse, ServiceError> {
    let message = render_message(config, game);
    let base = format!("{MESSAGING_BASE_URL}/{}", config.phone_number);
    let url = Url::parse_with_params(&base, [("text", message.as_str())]).map_err(|err| {
        ServiceError::InvalidState(format!("invalid contact phone number configured: {err}"))
    })?;

    Ok(ContactLinkResponse {
        game_id: game.id.clone(),
        message,
        url: url.into(),
    })
}

/// Contact link for the stored game `id`.
pub async fn contact_link(state: &SharedState, id: &str) -> Result<ContactLinkResponse, ServiceError> {
    let game = match data_access::get_game(state, id).await? {
        QueryOutcome::Skipped => return Err(ServiceError::Degraded),
        QueryOutcome::Ready(game) => game,
    };

    match game.as_ref() {
        Some(game) => build_contact_link(&state.config().contact, game),
        None => Err(ServiceError::NotFound(format!("game `{id}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{ImageRef, Platform};

    fn game(name: &str, price: u64) -> GameEntity {
        GameEntity {
            id: "g1".into(),
            name: name.into(),
            description: String::new(),
            platform: Platform::Ps5,
            trailer_url: None,
            image: ImageRef {
                url: "/blobs/abc".into(),
            },
            price,
            on_sale: true,
        }
    }

    #[test]
    fn message_embeds_name_and_price_label() {
        let message = render_message(&ContactConfig::default(), &game("Alpha", 999));
        assert_eq!(message, "Hi! I'm interested in buying Alpha for ₹999/- only");
    }

    #[test]
    fn placeholders_in_names_are_not_expanded() {
        let message = render_message(&ContactConfig::default(), &game("{price} Pack", 5));
        assert_eq!(message, "Hi! I'm interested in buying {price} Pack for ₹5/- only");
    }

    #[test]
    fn link_encodes_the_message_as_text_parameter() {
        let link = build_contact_link(&ContactConfig::default(), &game("Alpha & Omega", 1299)).unwrap();
        let url = Url::parse(&link.url).unwrap();

        assert_eq!(url.host_str(), Some("wa.me"));
        assert_eq!(url.path(), "/910000000000");
        let text: Vec<_> = url
            .query_pairs()
            .filter(|(key, _)| key == "text")
            .map(|(_, value)| value.into_owned())
            .collect();
        assert_eq!(text, vec![link.message.clone()]);
        assert!(link.message.contains("Alpha & Omega"));
    }
}
