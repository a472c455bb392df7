use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Static or data-model-bound text. Externally tagged so the wire shape is
/// `{"literalString": "..."}` or `{"path": "namespace.field"}`. Paths are
/// resolved by the client against the surface's data model; the server only
/// guarantees that any path it emits has a matching entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TextContent {
    #[serde(rename = "literalString")]
    Literal(String),
    #[serde(rename = "path")]
    Path(String),
}

impl TextContent {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionContext {
    pub key: String,
    pub value: TextContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub context: Vec<ActionContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Children {
    #[serde(rename = "explicitList")]
    pub explicit_list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    pub label: String,
    pub value: f64,
}

/// One node of the component graph. Externally tagged serde representation,
/// so a node serializes as `{"Text": {...}}`, `{"Column": {...}}`, etc.
/// Exactly one variant per node is guaranteed by the type itself.
///
/// Nodes relate to each other only through string ids: `Button::child` and
/// the `Column`/`Row` child lists name other nodes, never embed them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    Text {
        #[serde(
            rename = "usageHint",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        usage_hint: Option<String>,
        text: TextContent,
    },
    TextField {
        label: TextContent,
        text: TextContent,
    },
    Button {
        action: Action,
        child: String,
    },
    Column {
        children: Children,
    },
    Row {
        children: Children,
    },
    Image {
        url: TextContent,
        #[serde(rename = "altText", default, skip_serializing_if = "Option::is_none")]
        alt_text: Option<TextContent>,
    },
    Chart {
        data: Vec<ChartDataPoint>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
}

impl Component {
    /// Ids of every node this component references.
    pub fn child_ids(&self) -> Vec<&str> {
        match self {
            Component::Button { child, .. } => vec![child.as_str()],
            Component::Column { children } | Component::Row { children } => {
                children.explicit_list.iter().map(String::as_str).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn column(child_ids: Vec<String>) -> Self {
        Component::Column {
            children: Children {
                explicit_list: child_ids,
            },
        }
    }

    pub fn row(child_ids: Vec<String>) -> Self {
        Component::Row {
            children: Children {
                explicit_list: child_ids,
            },
        }
    }

    pub fn text(content: TextContent) -> Self {
        Component::Text {
            usage_hint: None,
            text: content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentEntry {
    pub id: String,
    pub component: Component,
}

impl ComponentEntry {
    pub fn new(id: impl Into<String>, component: Component) -> Self {
        Self {
            id: id.into(),
            component,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValue {
    pub key: String,
    #[serde(rename = "valueString")]
    pub value_string: String,
}

/// One namespace of the surface's data model: an ordered field map that
/// `TextContent::Path` references can resolve against on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataModelEntry {
    pub key: String,
    #[serde(rename = "valueMap")]
    pub value_map: Vec<DataValue>,
}

impl DataModelEntry {
    pub fn new(key: impl Into<String>, fields: Vec<(&str, String)>) -> Self {
        Self {
            key: key.into(),
            value_map: fields
                .into_iter()
                .map(|(key, value_string)| DataValue {
                    key: key.to_string(),
                    value_string,
                })
                .collect(),
        }
    }
}

/// A complete renderable UI graph. The structural invariant: `root` and every
/// id referenced by any component must resolve within `components`.
///
/// A tool invocation produces one of these as its fragment; the aggregator
/// consumes fragments and owns their nodes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub surface_id: String,
    pub components: Vec<ComponentEntry>,
    pub data_model: Vec<DataModelEntry>,
    pub root: String,
}

/// The partial surface produced by one tool invocation, pre-merge.
pub type Fragment = Surface;

impl Surface {
    pub fn into_a2ui(self) -> A2uiData {
        A2uiData {
            surface_update: SurfaceUpdate {
                surface_id: self.surface_id.clone(),
                components: self.components,
            },
            data_model_update: if self.data_model.is_empty() {
                None
            } else {
                Some(DataModelUpdate {
                    surface_id: self.surface_id.clone(),
                    contents: self.data_model,
                })
            },
            begin_rendering: BeginRendering {
                surface_id: self.surface_id,
                root: self.root,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceUpdate {
    pub surface_id: String,
    pub components: Vec<ComponentEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataModelUpdate {
    pub surface_id: String,
    pub contents: Vec<DataModelEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginRendering {
    pub surface_id: String,
    pub root: String,
}

/// The A2UI wire envelope for one surface snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct A2uiData {
    pub surface_update: SurfaceUpdate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_model_update: Option<DataModelUpdate>,
    pub begin_rendering: BeginRendering,
}

/// Top-level chat response, discriminated on `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ChatResponse {
    #[serde(rename = "a2ui")]
    A2ui { data: A2uiData },
    #[serde(rename = "text")]
    Text { text: String },
}

impl ChatResponse {
    pub fn text(text: impl Into<String>) -> Self {
        ChatResponse::Text { text: text.into() }
    }

    pub fn surface(surface: Surface) -> Self {
        ChatResponse::A2ui {
            data: surface.into_a2ui(),
        }
    }
}

/// Short opaque token used to namespace ids within one tool call (and the
/// dashboard root). 8 hex chars of a v4 uuid, 32 bits of entropy.
pub fn call_token() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_component_wire_shape() {
        let entry = ComponentEntry::new("t1", Component::text(TextContent::literal("hello")));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "t1",
                "component": { "Text": { "text": { "literalString": "hello" } } }
            })
        );
    }

    #[test]
    fn column_wire_shape_uses_explicit_list() {
        let entry = ComponentEntry::new(
            "c1",
            Component::column(vec!["a".to_string(), "b".to_string()]),
        );
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "c1",
                "component": { "Column": { "children": { "explicitList": ["a", "b"] } } }
            })
        );
    }

    #[test]
    fn chat_response_is_discriminated_on_kind() {
        let text = ChatResponse::text("hi");
        assert_eq!(
            serde_json::to_value(&text).unwrap(),
            json!({ "kind": "text", "text": "hi" })
        );

        let surface = Surface {
            surface_id: "s".to_string(),
            components: vec![ComponentEntry::new(
                "root",
                Component::text(TextContent::literal("x")),
            )],
            data_model: Vec::new(),
            root: "root".to_string(),
        };
        let value = serde_json::to_value(ChatResponse::surface(surface)).unwrap();
        assert_eq!(value["kind"], "a2ui");
        assert_eq!(value["data"]["beginRendering"]["root"], "root");
        assert_eq!(value["data"]["surfaceUpdate"]["surfaceId"], "s");
        assert!(value["data"].get("dataModelUpdate").is_none());
    }

    #[test]
    fn child_ids_cover_buttons_and_containers() {
        let button = Component::Button {
            action: Action {
                name: "recalculate".to_string(),
                context: Vec::new(),
            },
            child: "label".to_string(),
        };
        assert_eq!(button.child_ids(), vec!["label"]);
        assert_eq!(
            Component::row(vec!["x".to_string(), "y".to_string()]).child_ids(),
            vec!["x", "y"]
        );
        assert!(Component::text(TextContent::literal("t"))
            .child_ids()
            .is_empty());
    }

    #[test]
    fn call_tokens_are_short_and_distinct() {
        let a = call_token();
        let b = call_token();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
    }
}
