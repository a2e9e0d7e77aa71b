//! Shared prompt text for the three LLM operations. Kept provider-agnostic
//! so both wire adapters send identical instructions and only differ in
//! how they're framed on the wire (system+messages vs. one message array).

use crate::{BriefingSectionInput, ClassifyInput, SummarizeInput};

pub fn classify_system_prompt() -> String {
    "You are a news editor triaging articles for a daily briefing. For each \
     article, decide: is it genuinely relevant to its assigned section, and \
     is its title clickbait (sensational, withholds the point, uses a \
     curiosity gap)? You may also suggest a better-fitting section name if \
     one is obviously more appropriate. Respond with ONLY a JSON array, one \
     object per article, each with the exact keys: article_id, relevant \
     (bool), section (string), clickbait (bool), reason (short string). No \
     prose outside the JSON."
        .to_string()
}

pub fn classify_user_prompt(articles: &[ClassifyInput]) -> String {
    let mut out = String::from("Classify these articles:\n\n");
    for a in articles {
        out.push_str(&format!(
            "- id: {}\n  section: {}\n  title: {}\n  excerpt: {}\n\n",
            a.article_id, a.current_section, a.title, a.excerpt
        ));
    }
    out
}

pub fn summarize_system_prompt() -> String {
    "You write tight 2-3 sentence summaries of news articles for a daily \
     briefing reader who wants the point immediately. No preamble like \
     'This article discusses'. State the news, then the one detail that \
     matters most. Plain prose, no markdown, no bullet points."
        .to_string()
}

pub fn summarize_user_prompt(input: &SummarizeInput) -> String {
    format!(
        "Section: {}\nTitle: {}\n\nContent:\n{}",
        input.section, input.title, input.content
    )
}

pub fn briefing_system_prompt() -> String {
    "You compose a daily news briefing in markdown from pre-written \
     per-article summaries, grouped by section. Produce one `##` heading \
     per section (in the order given), then a bullet per article linking \
     its title to its URL followed by its summary. Keep the whole document \
     scannable in under two minutes; do not add commentary beyond what the \
     summaries already say."
        .to_string()
}

pub fn briefing_user_prompt(sections: &[BriefingSectionInput]) -> String {
    let mut out = String::from("Compose the briefing from these sections:\n\n");
    for section in sections {
        out.push_str(&format!("### {}\n", section.section_display_name));
        for item in &section.summaries {
            out.push_str(&format!(
                "- [{}]({}) ({}): {}\n",
                item.title, item.url, item.source_name, item.summary
            ));
        }
        out.push('\n');
    }
    out
}
