use crate::{GraphError, TextureFormat, layout::PrimitiveType};
use serde::{
    Deserialize, Deserializer,
    de::{MapAccess, Visitor},
};
use std::{fmt, marker::PhantomData};

/// One entry of the flat declaration list fed to [`ResourceGraph::compile`](crate::ResourceGraph::compile).
#[derive(Clone, Debug, Deserialize)]
pub struct Declaration {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Declaration {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            data,
        }
    }

    /// Resolve the declared type string, splitting `Texture` into its static and dynamic kinds.
    pub fn resource_type(&self) -> Result<ResourceType, GraphError> {
        let ty = match self.kind.as_str() {
            "Texture" if self.data.get("drawOps").is_some() => ResourceType::DynamicTexture,
            "Texture" => ResourceType::StaticTexture,
            "VertexSignature" => ResourceType::VertexSignature,
            "InstanceSignature" => ResourceType::InstanceSignature,
            "GlobalSignature" => ResourceType::GlobalSignature,
            "TextureSignature" => ResourceType::TextureSignature,
            "Program" => ResourceType::Program,
            "Vertex" => ResourceType::Vertex,
            "Instance" => ResourceType::Instance,
            "Global" => ResourceType::Global,
            "StaticTexture" => ResourceType::StaticTexture,
            "DynamicTexture" => ResourceType::DynamicTexture,
            _ => {
                return Err(GraphError::UnknownType {
                    id: self.id.clone(),
                    kind: self.kind.clone(),
                });
            }
        };

        Ok(ty)
    }

    pub(crate) fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T, GraphError> {
        T::deserialize(&self.data).map_err(|source| GraphError::InvalidDeclaration {
            id: self.id.clone(),
            source,
        })
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ResourceType {
    VertexSignature,
    InstanceSignature,
    GlobalSignature,
    TextureSignature,
    Program,
    Vertex,
    Instance,
    Global,
    StaticTexture,
    DynamicTexture,
}

impl ResourceType {
    pub fn is_variable(&self) -> bool {
        matches!(
            self,
            ResourceType::Vertex
                | ResourceType::Instance
                | ResourceType::Global
                | ResourceType::StaticTexture
                | ResourceType::DynamicTexture
        )
    }

    pub fn is_texture(&self) -> bool {
        matches!(self, ResourceType::StaticTexture | ResourceType::DynamicTexture)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A JSON object read as a list of entries in document order.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[(String, V)] {
        &self.0
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    if entries.iter().any(|(k, _): &(String, V)| *k == key) {
                        return Err(serde::de::Error::custom(format!("duplicate key `{}`", key)));
                    }
                    entries.push((key, value));
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexSignatureData {
    pub attributes: OrderedMap<PrimitiveType>,
    pub max_vertex_count: u32,
    pub max_triangle_count: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSignatureData {
    pub attributes: OrderedMap<PrimitiveType>,
    pub max_instance_count: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(transparent)]
pub struct GlobalSignatureData {
    pub fields: OrderedMap<PrimitiveType>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TextureSignatureData {
    #[serde(rename = "type")]
    pub format: TextureFormat,
    pub size: [u32; 2],
}

/// Payload of `Vertex`, `Instance`, `Global` and static `Texture` declarations.
#[derive(Clone, Debug, Deserialize)]
pub struct SignatureRef {
    pub signature: String,
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureWrap {
    Repeat,
    #[default]
    Clamp,
}

/// Per-sampler filtering declared by a program.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Deserialize)]
pub struct TextureSampling {
    #[serde(default)]
    pub filter: TextureFilter,
    #[serde(default)]
    pub wrap: TextureWrap,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramData {
    pub vertex_signature: String,
    #[serde(default)]
    pub instance_signature: Option<String>,
    #[serde(default)]
    pub global_signature: Option<String>,
    #[serde(default)]
    pub textures: OrderedMap<TextureSampling>,
    pub vertex_shader: String,
    pub fragment_shader: String,
}

/// One draw call of a dynamic texture, by resource id.
#[derive(Clone, Debug, Deserialize)]
pub struct DrawOperation {
    pub program: String,
    pub vertex: String,
    #[serde(default, alias = "instances")]
    pub instance: Option<String>,
    #[serde(default)]
    pub global: Option<String>,
    #[serde(default)]
    pub textures: OrderedMap<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicTextureData {
    pub signature: String,
    pub draw_ops: Vec<DrawOperation>,
}

/// Parse a JSON array of `{id, type, data}` objects.
pub fn parse_declarations(json: &str) -> Result<Vec<Declaration>, GraphError> {
    serde_json::from_str(json).map_err(GraphError::Parse)
}
