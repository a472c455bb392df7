use anyhow::Result;
use serde::Deserialize;
use tracing::info;

use crate::configuration::ShoppingSettings;
use crate::server::surface::{call_token, Component, ComponentEntry, Fragment, TextContent};

use super::ToolOutcome;

pub struct ProductSearchService {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    items: Vec<ProductItem>,
}

#[derive(Debug, Deserialize)]
struct ProductItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    price: f64,
    #[serde(default)]
    image_url: String,
}

impl ProductSearchService {
    pub fn new(settings: &ShoppingSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Test constructor pointing at a mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn search_products(&self, query: &str) -> Result<ToolOutcome> {
        info!(%query, "searching products");

        let url = format!("{}/products", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("query", query)])
            .send()
            .await?
            .error_for_status()?;
        let body: ProductResponse = response.json().await?;

        if body.items.is_empty() {
            return Ok(ToolOutcome::text(
                format!("No products found for \"{query}\"."),
                format!("The product search for \"{query}\" returned nothing."),
            ));
        }

        let top = &body.items[0];
        let context = format!(
            "Found {} products for \"{query}\"; the top result is {} at ${:.2}.",
            body.items.len(),
            top.name,
            top.price
        );
        Ok(ToolOutcome::surface(
            build_products_card(query, &body.items),
            context,
        ))
    }
}

fn build_products_card(query: &str, items: &[ProductItem]) -> Fragment {
    let token = call_token();
    let id = |suffix: String| format!("shop_{suffix}_{token}");

    let mut components = vec![ComponentEntry::new(
        id("title".to_string()),
        Component::Text {
            usage_hint: Some("heading".to_string()),
            text: TextContent::literal(format!("Results for \"{query}\"")),
        },
    )];
    let mut rows = vec![id("title".to_string())];

    for (index, item) in items.iter().enumerate() {
        let image_id = id(format!("image_{index}"));
        let name_id = id(format!("name_{index}"));
        let price_id = id(format!("price_{index}"));
        let info_id = id(format!("info_{index}"));
        let row_id = id(format!("row_{index}"));

        components.push(ComponentEntry::new(
            image_id.clone(),
            Component::Image {
                url: TextContent::literal(&item.image_url),
                alt_text: Some(TextContent::literal(&item.name)),
            },
        ));
        components.push(ComponentEntry::new(
            name_id.clone(),
            Component::text(TextContent::literal(&item.name)),
        ));
        components.push(ComponentEntry::new(
            price_id.clone(),
            Component::text(TextContent::literal(format!("${:.2}", item.price))),
        ));
        components.push(ComponentEntry::new(
            info_id.clone(),
            Component::column(vec![name_id, price_id]),
        ));
        components.push(ComponentEntry::new(
            row_id.clone(),
            Component::row(vec![image_id, info_id]),
        ));
        rows.push(row_id);
    }

    let root = id("card".to_string());
    components.push(ComponentEntry::new(root.clone(), Component::column(rows)));

    Fragment {
        surface_id: "shopping".to_string(),
        components,
        data_model: Vec::new(),
        root,
    }
}
