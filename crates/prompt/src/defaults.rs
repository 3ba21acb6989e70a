//! Built-in template texts.

use crate::types::PromptKind;

pub const SUB_QUERY: &str = r#"You turn a user's question into search queries for a vector database that holds chunks of technical documents.
Write {{num_queries}} distinct search queries, each aimed at a different aspect, keyword or concept of the question, so that each one can retrieve relevant chunks on its own.
Reply with the queries only, one per line. No numbering, labels, explanations or any other text.

User Query: "{{query}}"

Search Queries:"#;

pub const SYNTHESIS: &str = r#"You are a knowledgeable engineering tutor writing for an academic audience, from undergraduates to doctoral researchers. Answer the user's question by combining the document context below, the web search results (when present) and your general knowledge. Be precise, technical and well structured.

USER QUERY:
"{{query}}"

DOCUMENT CONTEXT:
--- START DOCUMENT CONTEXT ---
{{context}}
--- END DOCUMENT CONTEXT ---

WEB SEARCH RESULTS (background only, do not quote them in the answer):
--- START WEB SEARCH RESULTS ---
{{web_search_context}}
--- END WEB SEARCH RESULTS ---

STEP 1, REASONING (mandatory):
Before answering, reason step by step about which context chunks, web results and background knowledge you will use.
Put all of that reasoning between <thinking> and </thinking> and nowhere else.

STEP 2, ANSWER (after </thinking>):
- Base the answer primarily on the document context and cite chunks by number, e.g. [1] or [1][3].
- Use web results when the documents fall short; refer to them in general terms ("recent sources indicate...") instead of quoting snippets or URLs.
- Fill remaining gaps with general knowledge and say when you do.
- If nothing available answers the question, say what is missing. Do not invent facts.
- Use Markdown for readability.

Begin immediately with the <thinking> tag.
<thinking>"#;

pub const DEEP_THINK_SYNTHESIS: &str = r#"You are an assistant that answers academic engineering questions with a structured deep-thinking process.

USER QUERY:
"{{query}}"

DOCUMENT CONTEXT (internal knowledge base, cite as [1], [2], ...):
--- START DOCUMENT CONTEXT ---
{{context}}
--- END DOCUMENT CONTEXT ---

WEB SEARCH RESULTS (external information):
--- START WEB SEARCH RESULTS ---
{{web_search_context}}
--- END WEB SEARCH RESULTS ---

STEP 1, DEEP THINKING (mandatory, entirely between <thinking> and </thinking>):
Phase 1, factual: extract the facts, definitions and figures relevant to the query from the documents and the web results. Attribute every fact to its source and flag missing, conflicting or unreliable information.
Phase 2, conceptual: place the question in its theoretical framework. Name the underlying principles and models, how they relate, and which assumptions they rest on.
Phase 3, practical: cover applications, real-world limits, engineering trade-offs and open problems.

STEP 2, FINAL ANSWER (after </thinking>):
Give a concise, direct, well-structured answer to "{{query}}" that integrates the conclusions of all three phases without repeating the phase headings. Cite document chunks like [1] for key facts, refer to web findings in general terms, state low confidence where the evidence is thin, and use Markdown.

Begin immediately with the <thinking> tag.
<thinking>"#;

const ANALYSIS_PREAMBLE: &str = r#"STEP 1, PLANNING (optional):
You may outline your plan between <thinking> and </thinking>. If you do, put the analysis after </thinking>.

STEP 2, ANALYSIS:
Work strictly from the document text below and follow the output format exactly.

--- START DOCUMENT TEXT ---
{{document_text}}
--- END DOCUMENT TEXT ---
"#;

const ANALYSIS_FAQ_TASK: &str = r#"
TASK: Write 5 to 7 frequently asked questions with short answers, using only the text above.

OUTPUT FORMAT:
Start with the first question, no preamble. Format each entry as
Q: <question taken from the text>
A: <concise answer taken from the text>
Do not invent answers the text does not support.

Begin with 'Q:' or <thinking>."#;

const ANALYSIS_TOPICS_TASK: &str = r#"
TASK: Identify the 5 to 8 most important topics of the text and explain each in one or two sentences drawn only from the text.

OUTPUT FORMAT:
A Markdown bullet list with no preamble, one entry per topic:
*   **Topic name:** short explanation.

Begin with '*   **' or <thinking>."#;

const ANALYSIS_MINDMAP_TASK: &str = r#"
TASK: Produce a hierarchical mind map outline of the text using Markdown headings (#, ##, ###) and '-' bullets.
Mirror the document's own structure: its title, sections, headings and listed items. Do not invent top-level categories the document does not name.

OUTPUT FORMAT:
If you used a <thinking> block, start the outline on the line right after </thinking>. Otherwise start directly with the first heading. The outline is the only content allowed.

Begin now."#;

/// Built-in template text for a kind.
pub fn template_for(kind: PromptKind) -> String {
    match kind {
        PromptKind::SubQuery => SUB_QUERY.to_string(),
        PromptKind::Synthesis => SYNTHESIS.to_string(),
        PromptKind::DeepThinkSynthesis => DEEP_THINK_SYNTHESIS.to_string(),
        PromptKind::AnalysisFaq => format!("{}{}", ANALYSIS_PREAMBLE, ANALYSIS_FAQ_TASK),
        PromptKind::AnalysisTopics => format!("{}{}", ANALYSIS_PREAMBLE, ANALYSIS_TOPICS_TASK),
        PromptKind::AnalysisMindmap => format!("{}{}", ANALYSIS_PREAMBLE, ANALYSIS_MINDMAP_TASK),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PromptTemplate;

    #[test]
    fn test_every_default_validates() {
        for kind in PromptKind::ALL {
            let template = PromptTemplate::new(kind, template_for(kind));
            assert!(template.is_ok(), "{kind}: {:?}", template.err());
        }
    }

    #[test]
    fn test_synthesis_prompts_end_inside_reasoning_block() {
        assert!(SYNTHESIS.ends_with("<thinking>"));
        assert!(DEEP_THINK_SYNTHESIS.ends_with("<thinking>"));
    }
}
