use regex::Regex;
use scraper::{ElementRef, Selector};

/// Configuration for content scoring.
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    /// Weight added when a class/ID matches a positive pattern.
    pub positive_weight: f64,
    /// Weight added when a class/ID matches a negative pattern.
    pub negative_weight: f64,
    /// Cap on the text-length contribution to density.
    pub max_char_density: f64,
    /// Cap on the comma-count contribution to density.
    pub max_comma_density: f64,
    /// Characters of text per density point.
    pub chars_per_point: usize,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            positive_weight: 25.0,
            negative_weight: -25.0,
            max_char_density: 3.0,
            max_comma_density: 3.0,
            chars_per_point: 100,
        }
    }
}

/// Class/ID fragments that suggest an element holds main content.
const POSITIVE_PATTERNS: &str =
    r"(?i)(article|body|content|entry|hentry|h-entry|main|page|post|text|blog|story)";

/// Class/ID fragments that suggest chrome, navigation, or other boilerplate.
const NEGATIVE_PATTERNS: &str = r"(?i)(banner|breadcrumbs?|combx|comment|community|disqus|extra|foot|header|menu|nav|related|remark|rss|shoutbox|sidebar|share|social|sponsor|ad-break|agegate|pagination|pager|popup|promo|widget)";

/// Score breakdown for one element.
#[derive(Debug, Clone)]
pub struct ElementScore {
    /// Base score from the tag name.
    pub base: f64,
    /// Adjustment from class/ID patterns.
    pub class_weight: f64,
    /// Score from text length and comma count.
    pub density: f64,
    /// Ratio of link text to total text, 0.0 to 1.0.
    pub link_density: f64,
    /// Final combined score.
    pub total: f64,
}

/// Content-density scorer over parsed elements.
///
/// The pattern tables are compiled once per scorer, so scoring a document's
/// worth of candidates pays the regex cost a single time.
pub struct Scorer {
    config: ScoreConfig,
    positive: Regex,
    negative: Regex,
    anchors: Selector,
}

impl Scorer {
    pub fn new(config: ScoreConfig) -> Self {
        Self {
            config,
            positive: Regex::new(POSITIVE_PATTERNS).unwrap(),
            negative: Regex::new(NEGATIVE_PATTERNS).unwrap(),
            anchors: Selector::parse("a").unwrap(),
        }
    }

    /// Score an element by tag, class/ID hints, and text density, with the
    /// link-density penalty folded in.
    ///
    /// Link-heavy blocks are assumed to be navigation unless the element
    /// carries a positive content hint or a substantial amount of prose, in
    /// which case the penalty is halved.
    pub fn score(&self, element: &ElementRef<'_>) -> ElementScore {
        let text = collapsed_text(element);
        let base = base_tag_score(element.value().name());
        let class_weight = self.class_id_weight(element);
        let density = self.density(&text);
        let link_density = self.link_density(element, &text);

        let content_rich = text.chars().count() > 500;
        let penalty = if class_weight > 0.0 || content_rich {
            1.0 - link_density * 0.5
        } else {
            1.0 - link_density
        };

        let total = (base + class_weight + density) * penalty;

        ElementScore { base, class_weight, density, link_density, total }
    }

    /// Class/ID pattern weight. A positive match on either attribute wins
    /// over a negative one.
    fn class_id_weight(&self, element: &ElementRef<'_>) -> f64 {
        if let Some(id) = element.value().attr("id") {
            if self.positive.is_match(id) {
                return self.config.positive_weight;
            }
            if self.negative.is_match(id) {
                return self.config.negative_weight;
            }
        }

        if let Some(class) = element.value().attr("class") {
            for name in class.split_whitespace() {
                if self.positive.is_match(name) {
                    return self.config.positive_weight;
                }
                if self.negative.is_match(name) {
                    return self.config.negative_weight;
                }
            }
        }

        0.0
    }

    /// Density score from text length and comma count. Commas are a cheap
    /// prose signal that navigation labels rarely produce.
    fn density(&self, text: &str) -> f64 {
        let char_score =
            ((text.chars().count() / self.config.chars_per_point) as f64).min(self.config.max_char_density);
        let comma_score = (text.matches(',').count() as f64).min(self.config.max_comma_density);
        char_score + comma_score
    }

    /// Ratio of anchor text length to total text length.
    fn link_density(&self, element: &ElementRef<'_>, text: &str) -> f64 {
        let total = text.chars().count();
        if total == 0 {
            return 0.0;
        }

        let linked: usize = element
            .select(&self.anchors)
            .map(|a| collapsed_text(&a).chars().count())
            .sum();

        linked as f64 / total as f64
    }
}

/// Base score for a tag, by how likely that tag is to wrap main content.
pub fn base_tag_score(tag: &str) -> f64 {
    match tag {
        "article" | "main" => 10.0,
        "section" => 8.0,
        "div" => 5.0,
        "td" | "blockquote" | "pre" | "p" => 3.0,
        "form" | "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" | "header" | "footer" | "nav" | "aside" => -5.0,
        _ => 0.0,
    }
}

/// An element's text with every whitespace run collapsed to a single space.
pub fn collapsed_text(element: &ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}
