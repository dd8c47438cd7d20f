use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Female,
    Male,
    Diverse,
}

/// Which foot (or both) the image shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    #[default]
    Both,
}

impl Side {
    pub fn is_single(&self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Light,
    #[default]
    Medium,
    Strong,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TattooOptions {
    pub enabled: bool,
    pub motif: String,
    pub placement: Vec<String>,
    pub intensity: Intensity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JewelryOptions {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: String,
    pub material: String,
    pub style: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BondageOptions {
    pub enabled: bool,
    pub level: Intensity,
    pub material: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NailOptions {
    pub enabled: bool,
    pub color: String,
    pub finish: String,
    pub french: bool,
}

/// Structured user selections the prompt builder renders from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationSettings {
    pub gender: Gender,
    pub side: Side,
    /// EU shoe size.
    pub size: f32,
    pub skin_tone: String,
    pub angle: String,
    /// Insertion-ordered, deduplicated.
    pub visual_details: IndexSet<String>,
    pub scene: String,
    pub lighting: String,
    pub style_vibe: Option<String>,
    pub action_moment: Option<String>,
    /// Id into the age option table.
    pub age: Option<String>,
    pub tattoos: Option<TattooOptions>,
    pub jewelry: Option<JewelryOptions>,
    pub bondage: Option<BondageOptions>,
    pub nails: Option<NailOptions>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            gender: Gender::default(),
            side: Side::default(),
            size: 38.0,
            skin_tone: "fair".to_string(),
            angle: "side view".to_string(),
            visual_details: IndexSet::new(),
            scene: "Studio".to_string(),
            lighting: "Natürlich".to_string(),
            style_vibe: None,
            action_moment: None,
            age: None,
            tattoos: None,
            jewelry: None,
            bondage: None,
            nails: None,
        }
    }
}

impl GenerationSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn with_detail(mut self, tag: impl Into<String>) -> Self {
        self.visual_details.insert(tag.into());
        self
    }

    pub fn has_detail(&self, tag: &str) -> bool {
        self.visual_details.contains(tag)
    }

    pub fn tattoo_enabled(&self) -> bool {
        self.tattoos.as_ref().is_some_and(|t| t.enabled)
    }

    pub fn jewelry_enabled(&self) -> bool {
        self.jewelry.as_ref().is_some_and(|j| j.enabled)
    }

    pub fn bondage_enabled(&self) -> bool {
        self.bondage.as_ref().is_some_and(|b| b.enabled)
    }

    pub fn nails_enabled(&self) -> bool {
        self.nails.as_ref().is_some_and(|n| n.enabled)
    }
}
