use std::collections::HashSet;

use super::catalog::{self, DETAIL_OILY, DETAIL_WET};
use super::is_sole_focus;
use crate::models::GenerationSettings;

const BASE_QUALITY: &str = "lowres, worst quality, low quality, blurry, jpeg artifacts, watermark, text, signature, deformed, disfigured, bad anatomy";
const TOE_MALFORMATIONS: &str = "extra toes, missing toes, fused toes, six toes, four toes, malformed toes, mutated feet, deformed feet, extra digits";
// Safety floor, always present.
const MINORS: &str = "child, children, kid, kids, minor, underage, teen, teenager, baby, toddler, infant, childlike";
const ANIMAL_FEET: &str = "animal feet, paws, hooves, claws";

pub(crate) const SINGLE_FOOT_EXCLUSIONS: &str =
    "two feet, second foot, mirrored foot, twin feet, duplicate foot, pair of feet";
pub(crate) const PAIR_EXCLUSIONS: &str =
    "missing foot, single foot, amputee, amputated foot, one foot only";

const FRONTAL_TOES: &str = "visible toenails, toes pointing at camera, frontal toe view, top of foot";
pub(crate) const TATTOO_EXCLUSIONS: &str = "tattoos, tattoo, body art";
pub(crate) const JEWELRY_EXCLUSIONS: &str = "jewelry, anklet, toe ring, ankle bracelet";
pub(crate) const BONDAGE_EXCLUSIONS: &str = "bondage, rope, restraints, straps, tied feet";
pub(crate) const NAIL_EXCLUSIONS: &str = "nail polish, painted toenails, nail art";
const WET_EXCLUSIONS: &str = "wet skin, water droplets";
const OILY_EXCLUSIONS: &str = "oily skin, shiny oil";
const FOOTWEAR: &str = "shoes, socks, sandals, high heels, stockings, footwear";
const HANDS: &str = "hands, fingers, extra hands, other person";

/// Renders the negative prompt. Every optional feature that is not enabled
/// contributes its exclusion terms; an enabled feature contributes none.
pub fn build_negative(settings: &GenerationSettings) -> String {
    let mut groups: Vec<&str> = vec![BASE_QUALITY, TOE_MALFORMATIONS, MINORS, ANIMAL_FEET];

    groups.push(if settings.side.is_single() {
        SINGLE_FOOT_EXCLUSIONS
    } else {
        PAIR_EXCLUSIONS
    });

    if is_sole_focus(settings) {
        groups.push(FRONTAL_TOES);
    }

    if !settings.tattoo_enabled() {
        groups.push(TATTOO_EXCLUSIONS);
    }
    if !settings.jewelry_enabled() {
        groups.push(JEWELRY_EXCLUSIONS);
    }
    if !settings.bondage_enabled() {
        groups.push(BONDAGE_EXCLUSIONS);
    }
    if !settings.nails_enabled() {
        groups.push(NAIL_EXCLUSIONS);
    }
    if !settings.has_detail(DETAIL_WET) {
        groups.push(WET_EXCLUSIONS);
    }
    if !settings.has_detail(DETAIL_OILY) {
        groups.push(OILY_EXCLUSIONS);
    }

    groups.push(FOOTWEAR);

    if !catalog::action_requires_hands(settings.action_moment.as_deref()) {
        groups.push(HANDS);
    }

    dedupe_terms(&groups.join(", "))
}

/// Terms given up first when a provider caps the negative prompt length,
/// most expendable first. The safety floor, cardinality, feature, footwear and
/// hand groups are never listed here.
const SHED_ORDER: &[&str] = &[BASE_QUALITY, TOE_MALFORMATIONS, FRONTAL_TOES, ANIMAL_FEET];

/// Shortens a negative prompt to `limit` characters by dropping whole terms
/// from the low-priority groups, each from its last term backwards. Text that is
/// still too long (caller-supplied terms) is cut at a term boundary.
pub fn fit_negative(negative: &str, limit: usize) -> String {
    let mut terms: Vec<&str> = negative
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .collect();
    for group in SHED_ORDER {
        for shed in group.rsplit(", ") {
            if rendered_len(&terms) <= limit {
                return terms.join(", ");
            }
            terms.retain(|term| !term.eq_ignore_ascii_case(shed));
        }
    }

    let joined = terms.join(", ");
    if joined.chars().count() <= limit {
        return joined;
    }
    let cut: String = joined.chars().take(limit).collect();
    match cut.rfind(',') {
        Some(idx) if idx > 0 => cut[..idx].trim_end().to_string(),
        _ => cut.trim_end().to_string(),
    }
}

fn rendered_len(terms: &[&str]) -> usize {
    terms.iter().map(|t| t.chars().count()).sum::<usize>() + terms.len().saturating_sub(1) * 2
}

/// Splits on commas, trims, drops empties and removes case-insensitive
/// duplicates while keeping the first spelling seen.
pub fn dedupe_terms(raw: &str) -> String {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .filter(|term| seen.insert(term.to_lowercase()))
        .collect::<Vec<_>>()
        .join(", ")
}
