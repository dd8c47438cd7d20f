use super::catalog;
use super::is_sole_focus;
use crate::models::{
    BondageOptions, Gender, GenerationSettings, Intensity, JewelryOptions, NailOptions, Side,
    TattooOptions,
};

const ANATOMY_REINFORCEMENT: &str =
    "anatomically correct foot, exactly five toes, natural arch, no extra digits";

const SOLE_VIEW: &str = "(sole view from below:1.3), soles facing the camera, toes gently curled";

const QUALITY_BOOSTERS: &str = "masterpiece, best quality, ultra detailed, photorealistic, sharp focus, realistic skin texture, 8k";

fn person(gender: Gender) -> &'static str {
    match gender {
        Gender::Female => "woman",
        Gender::Male => "man",
        Gender::Diverse => "person",
    }
}

// Cardinality goes first: early tokens weigh most and foot-count errors are
// the most visible failure.
fn subject_clause(settings: &GenerationSettings) -> String {
    let who = person(settings.gender);
    match settings.side {
        Side::Left | Side::Right => {
            let side = if settings.side == Side::Left { "left" } else { "right" };
            format!(
                "(single standalone {side} foot of a {who}:1.4), (one foot only:1.3), exactly one foot in frame"
            )
        }
        Side::Both => format!(
            "(pair of feet of a {who}:1.3), both feet side by side, symmetrical matching pair"
        ),
    }
}

fn jewelry_clause(jewelry: &JewelryOptions) -> String {
    let kind = non_empty(&jewelry.kind).unwrap_or("anklet");
    let mut parts = vec![format!("(wearing {kind}:1.2)")];
    if let Some(material) = non_empty(&jewelry.material) {
        parts.push(format!("{material} {kind}"));
    }
    if let Some(style) = non_empty(&jewelry.style) {
        parts.push(format!("{style} style jewelry"));
    }
    parts.join(", ")
}

fn bondage_clause(bondage: &BondageOptions) -> String {
    let material = bondage.material.to_lowercase();
    let term = if material.contains("rope") || material.contains("seil") {
        "rope"
    } else {
        "leather straps"
    };
    let binding = match bondage.level {
        Intensity::Light => "simple binding",
        Intensity::Medium | Intensity::Strong => "complex intricate binding",
    };
    match non_empty(&bondage.color) {
        Some(color) => format!("(bound feet:1.2), {color} {term}, {binding}"),
        None => format!("(bound feet:1.2), {term}, {binding}"),
    }
}

fn nail_clause(nails: &NailOptions) -> String {
    if nails.french {
        let base = non_empty(&nails.color).unwrap_or("nude");
        format!("french pedicure, {base} base with white tips")
    } else {
        let color = non_empty(&nails.color).unwrap_or("red");
        let finish = non_empty(&nails.finish).unwrap_or("glossy");
        format!("toenails painted with {color} nail polish, {finish} finish")
    }
}

fn tattoo_clause(tattoo: &TattooOptions) -> String {
    let placements: Vec<&str> = tattoo
        .placement
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    let placement = if placements.is_empty() {
        "foot".to_string()
    } else {
        placements.join(" and ")
    };
    let motif = non_empty(&tattoo.motif).unwrap_or("small");
    let ink = match tattoo.intensity {
        Intensity::Light => "fine delicate linework",
        Intensity::Medium => "clearly visible ink",
        Intensity::Strong => "bold saturated ink",
    };
    format!("{motif} tattoo on {placement}, {ink}")
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Renders the positive prompt. Segment order is fixed; empty segments are
/// left out so the output never carries dangling separators.
pub fn build_positive(settings: &GenerationSettings) -> String {
    let mut segments: Vec<String> = Vec::with_capacity(16);

    segments.push(subject_clause(settings));
    segments.push(format!("EU shoe size {}", settings.size));
    segments.push(ANATOMY_REINFORCEMENT.to_string());
    if let Some(skin) = non_empty(&settings.skin_tone) {
        segments.push(format!("{skin} skin tone"));
    }

    if is_sole_focus(settings) {
        segments.push(SOLE_VIEW.to_string());
    } else if let Some(angle) = non_empty(&settings.angle) {
        segments.push(angle.to_string());
    }

    for tag in &settings.visual_details {
        match catalog::detail_rule(tag) {
            Some(fragment) => segments.push(fragment.to_string()),
            None => log::debug!("No prompt rule for visual detail '{}', skipping", tag),
        }
    }

    if let Some(jewelry) = settings.jewelry.as_ref().filter(|j| j.enabled) {
        segments.push(jewelry_clause(jewelry));
    }
    if let Some(bondage) = settings.bondage.as_ref().filter(|b| b.enabled) {
        segments.push(bondage_clause(bondage));
    }

    if let Some(scene) = non_empty(&settings.scene) {
        segments.push(catalog::translate_scene(scene).to_string());
    }
    if let Some(lighting) = non_empty(&settings.lighting) {
        segments.push(catalog::translate_lighting(lighting).to_string());
    }
    if let Some(style) = settings.style_vibe.as_deref().and_then(non_empty) {
        segments.push(catalog::translate_style(style).to_string());
    }

    segments.push(catalog::age_clause(settings.age.as_deref()).to_string());

    if let Some(nails) = settings.nails.as_ref().filter(|n| n.enabled) {
        segments.push(nail_clause(nails));
    }
    if let Some(tattoo) = settings.tattoos.as_ref().filter(|t| t.enabled) {
        segments.push(tattoo_clause(tattoo));
    }
    if let Some(action) = settings
        .action_moment
        .as_deref()
        .and_then(catalog::action_clause)
    {
        segments.push(action.to_string());
    }

    segments.push(QUALITY_BOOSTERS.to_string());
    segments.join(", ")
}
