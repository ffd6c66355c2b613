//! HTML main-content detection
//!
//! Scores candidate containers by visible text density and link density,
//! picks the best one and collects its text blocks.

use scraper::{ElementRef, Html, Node, Selector};

use crate::{ArticleExtractor, ExtractedArticle, ParserError, Result};

/// Elements whose text is never visible content
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg", "iframe"];

/// Structural elements that hold site chrome rather than content
const CHROME_TAGS: &[&str] = &["nav", "header", "footer", "aside", "form"];

/// Class/id fragments typical of navigation widgets and page furniture
const CHROME_HINTS: &[&str] = &[
    "nav",
    "menu",
    "footer",
    "header",
    "sidebar",
    "breadcrumb",
    "comment",
    "cookie",
    "banner",
    "share",
    "social",
    "related",
    "advert",
    "promo",
    "newsletter",
    "subscribe",
];

/// Elements treated as one block of article text
const BLOCK_TAGS: &[&str] = &[
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "p",
    "li",
    "blockquote",
    "pre",
];

const CONTAINER_SELECTOR: &str = "article, main, section, div";
const BLOCK_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li, blockquote, pre";

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ParserError::InvalidSelector(format!("{css}: {e:?}")))
}

/// Extract the article from a document
pub(crate) fn extract_article(html: &str, config: &ArticleExtractor) -> Result<ExtractedArticle> {
    let doc = Html::parse_document(html);
    let title = document_title(&doc)?;

    let block_sel = selector(BLOCK_SELECTOR)?;
    let mut blocks = match pick_main_container(&doc, config)? {
        Some(container) => collect_blocks(container, &block_sel),
        None => Vec::new(),
    };

    if blocks.is_empty() {
        tracing::debug!("No main container found, falling back to all paragraphs");
        let para_sel = selector("p")?;
        blocks = doc
            .select(&para_sel)
            .filter(|p| !in_chrome(*p, None))
            .map(visible_text)
            .filter(|t| !t.is_empty())
            .collect();
    }

    if blocks.is_empty() {
        return Err(ParserError::NoContent);
    }

    Ok(ExtractedArticle {
        title,
        block_count: blocks.len(),
        text: blocks.join("\n\n"),
    })
}

fn document_title(doc: &Html) -> Result<Option<String>> {
    let title_sel = selector("title")?;
    Ok(doc
        .select(&title_sel)
        .next()
        .map(visible_text)
        .filter(|t| !t.is_empty()))
}

/// Pick the container with the densest non-link text
fn pick_main_container<'a>(
    doc: &'a Html,
    config: &ArticleExtractor,
) -> Result<Option<ElementRef<'a>>> {
    let container_sel = selector(CONTAINER_SELECTOR)?;
    let link_sel = selector("a")?;

    let mut best: Option<(i64, ElementRef<'a>)> = None;

    for el in doc.select(&container_sel).take(config.max_candidates) {
        if is_chrome(el) || has_ancestor_tag(el, CHROME_TAGS) {
            continue;
        }

        let text_chars = visible_text(el).chars().count();
        if text_chars < config.min_container_chars {
            continue;
        }

        let link_chars: usize = el
            .select(&link_sel)
            .map(|a| visible_text(a).chars().count())
            .sum();

        let mut score = text_chars as i64 - 2 * link_chars as i64;
        match el.value().name() {
            "article" => score += 500,
            "main" => score += 300,
            _ => {}
        }
        if link_chars > text_chars / 2 {
            score -= 500;
        }

        // Ties go to the outer container, which was visited first
        if best.as_ref().map(|(s, _)| score > *s).unwrap_or(score > 0) {
            best = Some((score, el));
        }
    }

    Ok(best.map(|(_, el)| el))
}

/// Text of every outermost block inside the container
fn collect_blocks(container: ElementRef<'_>, block_sel: &Selector) -> Vec<String> {
    container
        .select(block_sel)
        .filter(|block| !has_block_ancestor_within(*block, container))
        .filter(|block| !in_chrome(*block, Some(container)))
        .map(visible_text)
        .filter(|t| !t.is_empty())
        .collect()
}

fn has_block_ancestor_within(block: ElementRef<'_>, container: ElementRef<'_>) -> bool {
    for ancestor in block.ancestors() {
        if ancestor.id() == container.id() {
            return false;
        }
        if let Some(el) = ancestor.value().as_element() {
            if BLOCK_TAGS.contains(&el.name()) {
                return true;
            }
        }
    }
    false
}

fn has_ancestor_tag(el: ElementRef<'_>, tags: &[&str]) -> bool {
    el.ancestors().any(|node| {
        node.value()
            .as_element()
            .map(|e| tags.contains(&e.name()))
            .unwrap_or(false)
    })
}

/// Whether the element, or an ancestor below `stop` (or below `body`), is chrome
fn in_chrome(el: ElementRef<'_>, stop: Option<ElementRef<'_>>) -> bool {
    if is_chrome(el) {
        return true;
    }

    for node in el.ancestors() {
        if stop.map(|s| s.id() == node.id()).unwrap_or(false) {
            return false;
        }
        let Some(ancestor) = ElementRef::wrap(node) else {
            continue;
        };
        if matches!(ancestor.value().name(), "body" | "html") {
            return false;
        }
        if is_chrome(ancestor) {
            return true;
        }
    }
    false
}

fn is_chrome(el: ElementRef<'_>) -> bool {
    let value = el.value();
    if CHROME_TAGS.contains(&value.name()) {
        return true;
    }

    let mut attrs = String::new();
    if let Some(id) = value.id() {
        attrs.push_str(id);
        attrs.push(' ');
    }
    for class in value.classes() {
        attrs.push_str(class);
        attrs.push(' ');
    }
    let attrs = attrs.to_lowercase();

    CHROME_HINTS.iter().any(|hint| attrs.contains(hint))
}

/// Visible text of an element with whitespace collapsed
fn visible_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();

    for node in el.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .map(|e| HIDDEN_TAGS.contains(&e.name()))
                .unwrap_or(false)
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
