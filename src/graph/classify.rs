//! Identifier classification and normalization (pure functions).

use regex::Regex;
use std::sync::OnceLock;

/// Semantic category and stable display group for an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: &'static str,
    pub group: u8,
}

const OTHER: Classification = Classification {
    category: "Other",
    group: 7,
};

// prefix -> (category, group)
const PREFIX_TABLE: &[(&str, &str, u8)] = &[
    ("DRUGBANK", "Drug", 1),
    ("CHEBI", "Drug", 1),
    ("CHEMBL.COMPOUND", "Drug", 1),
    ("PUBCHEM.COMPOUND", "Drug", 1),
    ("RXCUI", "Drug", 1),
    ("UNII", "Drug", 1),
    ("HGNC", "Gene", 2),
    ("NCBIGENE", "Gene", 2),
    ("ENSEMBL", "Gene", 2),
    ("UNIPROTKB", "Gene", 2),
    ("PR", "Gene", 2),
    ("MONDO", "Disease", 3),
    ("DOID", "Disease", 3),
    ("HP", "Disease", 3),
    ("OMIM", "Disease", 3),
    ("ORPHANET", "Disease", 3),
    ("EFO", "Disease", 3),
    ("UMLS", "UMLS Concept", 4),
    ("REACT", "Reaction", 5),
    ("NCIT", "Cancer Concept", 6),
];

/// Map an identifier to its category by the namespace before the first `:`.
///
/// Total: unknown prefixes and ids without a namespace classify as "Other" (group 7).
pub fn classify(id: &str) -> Classification {
    let Some((prefix, _)) = id.split_once(':') else {
        return OTHER;
    };
    let prefix = prefix.to_ascii_uppercase();
    PREFIX_TABLE
        .iter()
        .find(|(p, _, _)| *p == prefix)
        .map(|(_, category, group)| Classification {
            category: *category,
            group: *group,
        })
        .unwrap_or(OTHER)
}

fn version_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^((?:UniProtKB|PR):[A-Za-z0-9]+)-\d+$|^(ENSEMBL:ENSP\d+)\.\d+$")
            .expect("Invalid regex pattern")
    })
}

/// Strip isoform/version suffixes from protein identifiers.
///
/// `UniProtKB:P04637-2` -> `UniProtKB:P04637`, `ENSEMBL:ENSP00000269305.4` ->
/// `ENSEMBL:ENSP00000269305`. Everything else is returned unchanged.
pub fn normalize_id(id: &str) -> String {
    match version_suffix().captures(id) {
        Some(caps) => caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| id.to_string()),
        None => id.to_string(),
    }
}
