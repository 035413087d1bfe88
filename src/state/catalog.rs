//! Catalog view model: local name search and grouping into fixed-size rows.

use crate::dao::models::GameEntity;

/// What the catalog currently knows about the full game listing.
#[derive(Debug, Clone, Copy)]
pub enum CatalogSource<'a> {
    /// The listing has not been fetched yet.
    Loading,
    /// The listing fetch failed.
    Failed(&'a str),
    /// The listing was fetched.
    Loaded(&'a [GameEntity]),
}

/// Distinct user-visible catalog states.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogContent {
    /// Waiting for the listing.
    Loading,
    /// The listing could not be fetched.
    Error(String),
    /// The store holds no games at all.
    Empty,
    /// Games exist but none match the query.
    NoMatches {
        /// The search query.
        query: String,
    },
    /// Matching games grouped into rows.
    Rows {
        /// Number of games in the store.
        total: usize,
        /// Number of games matching the query.
        matched: usize,
        /// Matching games, `row_size` per row.
        rows: Vec<Vec<GameEntity>>,
    },
}

/// Games whose name contains `query`, ignoring case. An empty query matches everything.
pub fn filter_by_name<'a>(games: &'a [GameEntity], query: &str) -> Vec<&'a GameEntity> {
    let needle = query.to_lowercase();
    games
        .iter()
        .filter(|game| game.name.to_lowercase().contains(&needle))
        .collect()
}

/// Split `items` into consecutive rows of at most `row_size` elements.
pub fn group_rows<T: Clone>(items: &[T], row_size: usize) -> Vec<Vec<T>> {
    items
        .chunks(row_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Derive the catalog state from the listing and the current search query.
pub fn build_catalog(source: CatalogSource<'_>, query: &str, row_size: usize) -> CatalogContent {
    let games = match source {
        CatalogSource::Loading => return CatalogContent::Loading,
        CatalogSource::Failed(message) => return CatalogContent::Error(message.to_owned()),
        CatalogSource::Loaded(games) => games,
    };

    if games.is_empty() {
        return CatalogContent::Empty;
    }

    let matches: Vec<GameEntity> = filter_by_name(games, query).into_iter().cloned().collect();
    if matches.is_empty() {
        return CatalogContent::NoMatches {
            query: query.to_owned(),
        };
    }

    CatalogContent::Rows {
        total: games.len(),
        matched: matches.len(),
        rows: group_rows(&matches, row_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{ImageRef, Platform};

    fn game(id: &str, name: &str) -> GameEntity {
        GameEntity {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            platform: Platform::Pc,
            trailer_url: None,
            image: ImageRef {
                url: "https://cdn.example.com/x.png".into(),
            },
            price: 1,
            on_sale: false,
        }
    }

    fn library() -> Vec<GameEntity> {
        vec![
            game("1", "Alpha Strike"),
            game("2", "Beta Racer"),
            game("3", "alphabet soup"),
            game("4", "Gamma"),
            game("5", "Delta"),
        ]
    }

    #[test]
    fn empty_query_returns_everything() {
        let games = library();
        assert_eq!(filter_by_name(&games, "").len(), games.len());
    }

    #[test]
    fn search_ignores_case() {
        let games = library();
        let ids: Vec<_> = filter_by_name(&games, "ALPHA")
            .into_iter()
            .map(|game| game.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn rows_hold_at_most_row_size_games() {
        let rows = group_rows(&library(), 4);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 4);
        assert_eq!(rows[1].len(), 1);
        assert!(group_rows::<GameEntity>(&[], 4).is_empty());
    }

    #[test]
    fn states_are_distinct() {
        let games = library();
        assert_eq!(build_catalog(CatalogSource::Loading, "", 4), CatalogContent::Loading);
        assert_eq!(
            build_catalog(CatalogSource::Failed("boom"), "", 4),
            CatalogContent::Error("boom".into())
        );
        assert_eq!(build_catalog(CatalogSource::Loaded(&[]), "", 4), CatalogContent::Empty);
        assert_eq!(
            build_catalog(CatalogSource::Loaded(&games), "zzz", 4),
            CatalogContent::NoMatches { query: "zzz".into() }
        );

        match build_catalog(CatalogSource::Loaded(&games), "a", 4) {
            CatalogContent::Rows {
                total,
                matched,
                rows,
            } => {
                assert_eq!(total, 5);
                assert_eq!(matched, 5);
                assert_eq!(rows.len(), 2);
            }
            other => panic!("unexpected catalog state: {other:?}"),
        }
    }
}
