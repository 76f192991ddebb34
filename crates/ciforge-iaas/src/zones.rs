//! Hosted zone matching.

use crate::provider::HostedZone;

/// Pick the zone whose name is the longest label-aligned suffix of `domain`.
///
/// Zone names may carry a trailing dot (`google.com.`) and ids may carry a
/// `/hostedzone/` path prefix; both are stripped from the result.
pub fn longest_matching_zone<'a, I>(domain: &str, zones: I) -> Option<HostedZone>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    let mut best: Option<HostedZone> = None;

    for (name, id) in zones {
        let zone = name.trim_end_matches('.').to_ascii_lowercase();
        if zone.is_empty() || !is_label_suffix(&domain, &zone) {
            continue;
        }
        if best.as_ref().is_none_or(|b| zone.len() > b.name.len()) {
            best = Some(HostedZone {
                name: zone,
                id: id.rsplit('/').next().unwrap_or(id).to_string(),
            });
        }
    }

    best
}

fn is_label_suffix(domain: &str, zone: &str) -> bool {
    if domain == zone {
        return true;
    }
    domain
        .strip_suffix(zone)
        .is_some_and(|rest| rest.ends_with('.'))
}
