//! Source-boost lookup table: `score = pos_sim -
//! 0.5*neg_sim + boost`. Priority order when resolving a boost for a given
//! source: `id:<source-id>` -> source name (lowercased) -> source-type ->
//! `source_type:<type>`.

use std::collections::HashMap;

use newsloom_common::SourceType;
use uuid::Uuid;

/// Parsed from the `key=float,key=float,...` env format.
#[derive(Debug, Clone, Default)]
pub struct SourceBoostMap {
    boosts: HashMap<String, f64>,
}

impl SourceBoostMap {
    pub fn parse(spec: &str) -> Self {
        let mut boosts = HashMap::new();
        for entry in spec.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            if let Some((key, value)) = entry.split_once('=') {
                if let Ok(v) = value.trim().parse::<f64>() {
                    boosts.insert(key.trim().to_string(), v);
                }
            }
        }
        Self { boosts }
    }

    /// Resolve a boost by priority: `id:<source-id>`, lowercased source
    /// name, `source_type:<type>`. Defaults to 0.0 when nothing matches.
    pub fn resolve(&self, source_id: Uuid, source_name: &str, source_type: SourceType) -> f64 {
        if let Some(v) = self.boosts.get(&format!("id:{source_id}")) {
            return *v;
        }
        if let Some(v) = self.boosts.get(&source_name.to_lowercase()) {
            return *v;
        }
        if let Some(v) = self.boosts.get(&source_type.to_string()) {
            return *v;
        }
        if let Some(v) = self.boosts.get(&format!("source_type:{source_type}")) {
            return *v;
        }
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_pairs() {
        let map = SourceBoostMap::parse("hacker-news=0.2,reddit=-0.1,source_type:forge-releases=0.3");
        assert_eq!(map.resolve(Uuid::nil(), "Hacker News", SourceType::SocialAggregator), 0.2);
    }

    #[test]
    fn id_prefix_wins_over_name() {
        let id = Uuid::new_v4();
        let spec = format!("id:{id}=0.9,somesource=0.1");
        let map = SourceBoostMap::parse(&spec);
        assert_eq!(map.resolve(id, "somesource", SourceType::Syndication), 0.9);
    }

    #[test]
    fn falls_back_to_source_type_prefix() {
        let map = SourceBoostMap::parse("source_type:forge-releases=0.3");
        assert_eq!(map.resolve(Uuid::new_v4(), "unknown", SourceType::ForgeReleases), 0.3);
    }

    #[test]
    fn falls_back_to_bare_source_type() {
        let map = SourceBoostMap::parse("forge-releases=0.25");
        assert_eq!(map.resolve(Uuid::new_v4(), "unknown", SourceType::ForgeReleases), 0.25);
    }

    #[test]
    fn unmatched_defaults_to_zero() {
        let map = SourceBoostMap::parse("");
        assert_eq!(map.resolve(Uuid::new_v4(), "anything", SourceType::Syndication), 0.0);
    }

    #[test]
    fn ignores_malformed_entries() {
        let map = SourceBoostMap::parse("no-equals-sign,good=0.5");
        assert_eq!(map.resolve(Uuid::new_v4(), "good", SourceType::Syndication), 0.5);
    }
}
