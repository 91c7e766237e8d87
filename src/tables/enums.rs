//! `Enums.d.ts`: TypeScript `const enum` declarations for the app.
//!
//! ```text
//! InventoryItemHashes          every named item, {Name}{ItemType} = hash
//! MomentHashes                 \
//! DeepsightItemSourceType       |
//! DeepsightItemSourceCategory   |  the crate's own exported enums
//! FoundryHashes                 |
//! DeepsightPerkEffectType      /
//! ```
//!
//! The full item list is large. [`prune`] rewrites a built file so that
//! `InventoryItemHashes` keeps only the hashes the app actually refers to,
//! leaving the unpruned copy next to it.

use crate::context::BuildContext;
use crate::hashes;
use crate::manifest::{InventoryItem, Table};
use crate::tables::foundries::FoundryHash;
use crate::tables::item_sources::{ItemSourceCategory, ItemSourceType};
use crate::tables::moments::MomentHash;
use crate::tables::perks::PerkEffectType;
use crate::tables::{Artifact, BuildError, ExportedEnum};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const FILE_NAME: &str = "Enums.d.ts";

/// Backup written by [`prune`] before rewriting.
pub const UNPRUNED_FILE_NAME: &str = "Enums.unpruned.temp";

const ITEM_HASHES: &str = "InventoryItemHashes";

static ITEM_HASHES_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(export declare const enum InventoryItemHashes \{)([\s\S]*?)(\})").expect("valid regex")
});

// ============================================================================
// Identifiers
// ============================================================================

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// `"Hawthorne's Field-Forged Shotgun"` → `"HawthornesFieldForgedShotgun"`.
pub fn pascal_case(text: &str) -> String {
    let folded: String = text
        .chars()
        .filter(|c| *c != '\'' && *c != '’')
        .map(fold_diacritic)
        .collect();

    let mut out = String::new();
    for word in folded.split(|c: char| !c.is_ascii_alphanumeric()).filter(|w| !w.is_empty()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars.map(|c| c.to_ascii_lowercase()));
        }
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Member names for every named item. Names shared by several items get the
/// hash appended.
pub fn item_hash_members(items: &Table<InventoryItem>) -> BTreeMap<String, u32> {
    let named: Vec<(String, u32)> = items
        .values()
        .filter(|item| !item.name().trim().is_empty())
        .map(|item| {
            let name = pascal_case(&format!("{} {}", item.name(), item.item_type_display_name));
            (name, item.hash)
        })
        .filter(|(name, _)| !name.is_empty())
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (name, _) in &named {
        *counts.entry(name.as_str()).or_default() += 1;
    }

    named
        .iter()
        .map(|(name, hash)| {
            let member = if counts[name.as_str()] > 1 {
                format!("{name}{hash}")
            } else {
                name.clone()
            };
            (member, *hash)
        })
        .collect()
}

// ============================================================================
// Rendering
// ============================================================================

fn render_enum<'a>(out: &mut String, name: &str, members: impl IntoIterator<Item = (&'a str, u32)>) {
    let _ = writeln!(out, "export declare const enum {name} {{");
    for (member, value) in members {
        let _ = writeln!(out, "\t{member} = {value},");
    }
    let _ = writeln!(out, "}}");
    out.push('\n');
}

fn render_exported<T: ExportedEnum>(out: &mut String) {
    render_enum(out, T::NAME, T::members());
}

pub fn render(items: &Table<InventoryItem>) -> String {
    let mut out = String::new();
    let members = item_hash_members(items);
    render_enum(&mut out, ITEM_HASHES, members.iter().map(|(name, hash)| (name.as_str(), *hash)));
    render_exported::<MomentHash>(&mut out);
    render_exported::<ItemSourceType>(&mut out);
    render_exported::<ItemSourceCategory>(&mut out);
    render_exported::<FoundryHash>(&mut out);
    render_exported::<PerkEffectType>(&mut out);
    out
}

pub fn build(ctx: &BuildContext) -> Result<Vec<Artifact>, BuildError> {
    let items = ctx.manifest().inventory_items()?;
    Ok(vec![Artifact::text(FILE_NAME, render(&items))])
}

// ============================================================================
// Pruning
// ============================================================================

/// Item hashes the app refers to: the crate's own named hashes, every
/// collections item and every variant group member.
pub fn referenced_item_hashes(ctx: &BuildContext) -> Result<BTreeSet<u32>, BuildError> {
    let mut used: BTreeSet<u32> = hashes::item::ALL.iter().copied().collect();
    used.extend(ctx.collections()?.item_hashes().iter().copied());
    used.extend(ctx.variants()?.variant_group_lookup_table.keys().copied());
    Ok(used)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneReport {
    pub kept: usize,
    pub total: usize,
}

/// Drop unused `InventoryItemHashes` members from declaration text.
pub fn prune_text(text: &str, used: &BTreeSet<u32>) -> Result<(String, PruneReport), BuildError> {
    let captures = ITEM_HASHES_BLOCK
        .captures(text)
        .ok_or_else(|| BuildError::Unresolved(format!("Failed to find {ITEM_HASHES} enum in {FILE_NAME}")))?;
    let body = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

    let mut total = 0;
    let mut pruned = String::from("\n");
    for line in body.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let line = line.replacen(',', "", 1);
        let Some((name, value)) = line.split_once('=') else {
            continue;
        };
        total += 1;
        if let Ok(hash) = value.trim().parse::<u32>()
            && used.contains(&hash)
        {
            let _ = writeln!(pruned, "\t{} = {hash},", name.trim());
        }
    }
    let kept = pruned.lines().filter(|line| !line.is_empty()).count();

    let replaced = ITEM_HASHES_BLOCK.replace(text, |caps: &regex::Captures| format!("{}{pruned}{}", &caps[1], &caps[3]));
    Ok((replaced.into_owned(), PruneReport { kept, total }))
}

/// Prune `definitions_dir/Enums.d.ts` in place, backing up the original.
pub fn prune(definitions_dir: &Path, used: &BTreeSet<u32>) -> Result<PruneReport, BuildError> {
    let path = definitions_dir.join(FILE_NAME);
    let text = fs::read_to_string(&path)?;
    fs::write(backup_path(definitions_dir), &text)?;
    let (pruned, report) = prune_text(&text, used)?;
    fs::write(&path, pruned)?;
    Ok(report)
}

pub fn backup_path(definitions_dir: &Path) -> PathBuf {
    definitions_dir.join(UNPRUNED_FILE_NAME)
}
