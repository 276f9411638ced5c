//! Name handling for store lookups and wildcard matching.
//!
//! Stored owner names carry no trailing dot, while query names arrive fully
//! qualified. Everything here works on the bare (dotless) form.

/// Strip the trailing dot from a fully-qualified name, leaving the root
/// untouched. Stored rows use the bare form for their owner names.
pub fn bare_name(qname: &str) -> &str {
    if qname == "." {
        qname
    } else {
        qname.strip_suffix('.').unwrap_or(qname)
    }
}

/// The next ancestor candidate for the wildcard zone walk.
///
/// Strips the leftmost label, but only while the current name still has more
/// than one label left. The walk never descends to a bare top-level label, so
/// a record under `*.example.org` can match, but a stray zone named `org`
/// cannot capture every query.
pub(crate) fn parent_candidate(name: &str) -> Option<&str> {
    let idx = name.find('.')?;
    if idx == 0 || name.matches('.').count() <= 1 {
        return None;
    }
    Some(&name[idx + 1..])
}

/// Label-wise wildcard comparison between a concrete name and a stored
/// pattern.
///
/// The root matches anything. Otherwise both sides must have the same number
/// of labels, and each pair of labels must be equal (ASCII case-insensitive)
/// or be `*` on either side.
pub fn wildcard_match(name: &str, pattern: &str) -> bool {
    if name == "." || pattern == "." {
        return true;
    }

    let name_labels = split_labels(name);
    let pattern_labels = split_labels(pattern);

    if name_labels.len() != pattern_labels.len() {
        return false;
    }

    name_labels
        .iter()
        .zip(pattern_labels.iter())
        .all(|(a, b)| label_match(a, b))
}

fn label_match(a: &str, b: &str) -> bool {
    a == "*" || b == "*" || a.eq_ignore_ascii_case(b)
}

fn split_labels(name: &str) -> Vec<&str> {
    name.trim_end_matches('.').split('.').collect()
}
