//! Deterministic local markdown, used when `generate_briefing` itself
//! fails.

use newsloom_llm::BriefingSectionInput;

pub fn build_markdown(sections: &[BriefingSectionInput]) -> String {
    let mut out = String::from("# Daily Briefing\n\n");
    for section in sections {
        out.push_str(&format!("## {}\n\n", section.section_display_name));
        for item in &section.summaries {
            out.push_str(&format!("- [{}]({}) ({}): {}\n", item.title, item.url, item.source_name, item.summary));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsloom_llm::ArticleSummary;

    #[test]
    fn builds_one_heading_per_section_with_linked_bullets() {
        let sections = vec![BriefingSectionInput {
            section_display_name: "Tech".to_string(),
            summaries: vec![ArticleSummary {
                title: "Widgets ship".to_string(),
                url: "https://example.com/a".to_string(),
                summary: "Widgets shipped today.".to_string(),
                source_name: "Example".to_string(),
            }],
        }];

        let md = build_markdown(&sections);
        assert!(md.starts_with("# Daily Briefing"));
        assert!(md.contains("## Tech"));
        assert!(md.contains("[Widgets ship](https://example.com/a) (Example): Widgets shipped today."));
    }

    #[test]
    fn empty_sections_produce_just_the_title() {
        assert_eq!(build_markdown(&[]), "# Daily Briefing\n\n");
    }
}
