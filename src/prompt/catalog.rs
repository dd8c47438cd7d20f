//! Fixed lookup tables the prompt builder renders from.
//!
//! Keys are the option labels the UI sends (German), values are the English
//! fragments fed to the image model.

pub const DETAIL_FLAT_SOLES: &str = "Flache Sohlen";
pub const DETAIL_WRINKLED_SOLES: &str = "Faltige Sohlen";
pub const DETAIL_WET: &str = "Nass";
pub const DETAIL_OILY: &str = "Geölt";

/// Positive fragment per visual-detail tag.
pub const DETAIL_RULES: &[(&str, &str)] = &[
    (DETAIL_FLAT_SOLES, "(smooth flat soles:1.2), even sole surface"),
    (DETAIL_WRINKLED_SOLES, "(wrinkled soles:1.3), detailed sole creases"),
    (DETAIL_WET, "wet skin, glistening water droplets"),
    (DETAIL_OILY, "oiled skin, glossy sheen"),
    ("Hoher Spann", "high arched instep"),
    ("Lange Zehen", "long slender toes"),
    ("Gespreizte Zehen", "toes spread apart"),
    ("Gepflegt", "well groomed pedicured feet"),
    ("Sandig", "fine grains of sand on the skin"),
    ("Adern", "subtle visible veins"),
];

/// Tags whose rendering is owned by a feature toggle instead of a detail rule.
pub const TOGGLE_BACKED_DETAILS: &[&str] = &["Tätowiert", "Lackierte Nägel", "Schmuck", "Gefesselt"];

pub const SCENES: &[(&str, &str)] = &[
    ("Strand", "on a sunny sandy beach"),
    ("Schlafzimmer", "in a cozy bedroom on soft white sheets"),
    ("Studio", "in a clean photo studio with seamless backdrop"),
    ("Pool", "at the edge of a turquoise swimming pool"),
    ("Garten", "on fresh green grass in a garden"),
    ("Wald", "on a mossy forest floor"),
    ("Badezimmer", "in a bright marble bathroom"),
    ("Spa", "in a calm spa with warm towels"),
];

pub const LIGHTING: &[(&str, &str)] = &[
    ("Natürlich", "soft natural daylight"),
    ("Goldene Stunde", "warm golden hour light"),
    ("Studio", "professional softbox studio lighting"),
    ("Kerzenlicht", "warm flickering candlelight"),
    ("Neon", "moody neon lighting"),
    ("Dramatisch", "dramatic low key lighting with deep shadows"),
];

pub const STYLE_VIBES: &[(&str, &str)] = &[
    ("Elegant", "elegant refined aesthetic"),
    ("Verspielt", "playful lighthearted mood"),
    ("Natürlich", "natural candid look"),
    ("Glamourös", "glamorous editorial style"),
    ("Künstlerisch", "artistic fine art photography"),
];

/// Age options; the first entry is the fallback for unknown or missing ids.
pub const AGE_OPTIONS: &[(&str, &str)] = &[
    ("20s", "adult in their twenties"),
    ("30s", "adult in their thirties"),
    ("40s", "mature adult in their forties"),
    ("50s", "mature adult in their fifties"),
];

pub const ACTION_MOMENTS: &[(&str, &str)] = &[
    ("washing", "feet being gently washed with soap and water"),
    ("painting", "toenails being carefully painted with a small brush"),
    ("oiling", "hands massaging oil into the skin"),
    ("touching", "fingertips lightly touching the sole"),
    ("massaging", "hands giving a relaxing foot massage"),
    ("pointing", "toes pointed elegantly"),
    ("stretching", "toes stretched and spread"),
    ("dipping", "foot dipping into calm water"),
    ("walking", "mid step while walking barefoot"),
];

/// Action moments that cannot render without hands in frame.
pub const HAND_ACTIONS: &[&str] = &["washing", "painting", "oiling", "touching", "massaging"];

fn lookup(table: &[(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, value)| *value)
}

pub fn detail_rule(tag: &str) -> Option<&'static str> {
    lookup(DETAIL_RULES, tag)
}

pub fn is_known_detail(tag: &str) -> bool {
    detail_rule(tag).is_some() || TOGGLE_BACKED_DETAILS.contains(&tag)
}

pub fn translate_scene(scene: &str) -> &str {
    lookup(SCENES, scene).unwrap_or(scene)
}

pub fn translate_lighting(lighting: &str) -> &str {
    lookup(LIGHTING, lighting).unwrap_or(lighting)
}

pub fn translate_style(style: &str) -> &str {
    lookup(STYLE_VIBES, style).unwrap_or(style)
}

pub fn age_clause(id: Option<&str>) -> &'static str {
    id.and_then(|id| lookup(AGE_OPTIONS, id))
        .unwrap_or(AGE_OPTIONS[0].1)
}

pub fn action_clause(id: &str) -> Option<&'static str> {
    lookup(ACTION_MOMENTS, id)
}

pub fn action_requires_hands(id: Option<&str>) -> bool {
    id.is_some_and(|id| HAND_ACTIONS.contains(&id))
}
