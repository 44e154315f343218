//! Compact file-name stems derived from taxon names.
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Returned when a name has nothing left after cleanup. Callers must treat it
/// as a data-quality failure, never as a usable code.
pub const SHORT_CODE_ERROR: &str = "Error";

const SEGMENT_LENGTH: usize = 5;

static STRIP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&|\.|-|_|spp|ssp").expect("valid short code regex"));

/// Generates a short code such as `parme_pseud` from a taxon name.
///
/// Codes are not unique across a corpus; see [`SequenceAssigner`].
pub fn generate_short_code(taxon_name: &str) -> String {
    let processed = STRIP_REGEX.replace_all(taxon_name, "").to_lowercase();
    let mut parts: Vec<&str> = processed.split_whitespace().collect();

    match parts.len() {
        0 => SHORT_CODE_ERROR.to_string(),
        1 => parts[0].to_string(),
        _ => {
            // "Genus a & Genus b" keeps the genus once
            if parts.len() > 2 && parts[0] == parts[2] {
                parts.remove(2);
            }
            parts
                .iter()
                .map(|part| truncate(part))
                .collect::<Vec<_>>()
                .join("_")
        }
    }
}

pub fn is_short_code_error(code: &str) -> bool {
    code == SHORT_CODE_ERROR
}

fn truncate(part: &str) -> &str {
    match part.char_indices().nth(SEGMENT_LENGTH) {
        Some((idx, _)) => &part[..idx],
        None => part,
    }
}

/// Hands out 1-based sequence numbers per short code, in the order codes are
/// first seen.
#[derive(Debug, Default)]
pub struct SequenceAssigner {
    counts: HashMap<String, u32>,
}

impl SequenceAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, code: &str) -> u32 {
        let count = self.counts.entry(code.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

/// `parme_pseud` + 3 + `.jpg` → `parme_pseud03.jpg`
pub fn sequenced_name(code: &str, sequence: u32, extension: &str) -> String {
    format!("{code}{sequence:02}{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_returns_sentinel() {
        assert_eq!(generate_short_code(""), "Error");
        assert_eq!(generate_short_code(" & . - _ "), "Error");
        assert_eq!(generate_short_code("spp."), "Error");
        assert!(is_short_code_error(&generate_short_code("")));
    }

    #[test]
    fn single_part_is_not_truncated() {
        assert_eq!(generate_short_code("Stereocaulon spp."), "stereocaulon");
        assert_eq!(generate_short_code("_Xanthoparmelia_"), "xanthoparmelia");
    }

    #[test]
    fn two_parts_are_truncated_and_joined() {
        assert_eq!(generate_short_code("Parmelia pseudosulcata"), "parme_pseud");
        assert_eq!(generate_short_code("_ Parmelia pseudosulcata "), "parme_pseud");
        assert_eq!(generate_short_code("Usnea sp"), "usnea_sp");
    }

    #[test]
    fn duplicate_genus_is_dropped() {
        // once '&' is removed the second genus sits at index 2
        assert_eq!(
            generate_short_code("Calicium tigillare & Calicium pinicola"),
            "calic_tigil_pinic"
        );
        assert_eq!(
            generate_short_code("_Lobaria linita & Lobaria tenuior"),
            "lobar_linit_tenui"
        );
    }

    #[test]
    fn distinct_genera_keep_every_part() {
        assert_eq!(
            generate_short_code("Acolium inquinans & Pseudothelomma occidentale"),
            "acoli_inqui_pseud_occid"
        );
    }

    #[test]
    fn subspecies_marker_is_removed() {
        assert_eq!(
            generate_short_code("_Alectoria sarmentosa ssp. vexillifera"),
            "alect_sarme_vexil"
        );
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(generate_short_code("Äöüßéa ëlan"), "äöüßé_ëlan");
    }

    #[test]
    fn is_deterministic() {
        let name = "Rusavskia elegans & Rusavskia sorediata";
        assert_eq!(generate_short_code(name), generate_short_code(name));
    }

    #[test]
    fn sequence_numbers_are_per_code() {
        let mut assigner = SequenceAssigner::new();
        assert_eq!(assigner.assign("parme_pseud"), 1);
        assert_eq!(assigner.assign("parme_pseud"), 2);
        assert_eq!(assigner.assign("stereocaulon"), 1);
        assert_eq!(assigner.assign("parme_pseud"), 3);
    }

    #[test]
    fn sequenced_name_is_zero_padded() {
        assert_eq!(sequenced_name("parme_pseud", 3, ".jpg"), "parme_pseud03.jpg");
        assert_eq!(sequenced_name("usnea", 12, ".png"), "usnea12.png");
    }
}
