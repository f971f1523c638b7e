//! Stylesheet model and cascade resolution.
//!
//! A rendering surface exposes its rule sets as [`Stylesheet`] values; the
//! [`RuleSetResolver`] turns those into computed per-element declarations.
//! Resolution is an explicit capability ([`StyleResolver`]) rather than an
//! ambient lookup so tests can inject fixed declarations.

use scraper::{ElementRef, Html, Selector};

/// A single CSS property declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            important: false,
        }
    }
}

/// Pseudo-elements that can carry generated content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoElement {
    Before,
    After,
}

impl PseudoElement {
    /// Selector suffixes recognized for this pseudo-element, longest first
    fn suffixes(self) -> [&'static str; 2] {
        match self {
            PseudoElement::Before => ["::before", ":before"],
            PseudoElement::After => ["::after", ":after"],
        }
    }
}

/// One selector with its declaration block
#[derive(Debug, Clone)]
pub struct StyleRule {
    /// Base selector with any pseudo-element suffix stripped
    pub selector: String,
    pub specificity: (u32, u32, u32),
    pub pseudo: Option<PseudoElement>,
    pub declarations: Vec<Declaration>,
}

/// A rule set extracted from one `<style>` element or one linked sheet
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    /// Resolved absolute URL for linked sheets, `None` for inline blocks
    pub href: Option<String>,
    /// Media text carried by the owning element, if any
    pub media: Option<String>,
    pub rules: Vec<StyleRule>,
}

impl Stylesheet {
    /// Parse an inline rule set
    pub fn parse(css: &str) -> Self {
        let mut rules = Vec::new();
        parse_rules(&strip_comments(css), &mut rules);
        Self {
            href: None,
            media: None,
            rules,
        }
    }

    /// Parse a linked rule set, recording its resolved URL
    pub fn linked(href: impl Into<String>, css: &str) -> Self {
        Self {
            href: Some(href.into()),
            ..Self::parse(css)
        }
    }
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start..].find("*/") {
            Some(end) => rest = &rest[start + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Split rule text into `StyleRule`s. `@media` blocks are flattened (their
/// inner rules are treated as applicable); other at-rules are skipped.
fn parse_rules(css: &str, out: &mut Vec<StyleRule>) {
    let mut rest = css;
    while let Some(open) = rest.find('{') {
        let full_prelude = rest[..open].trim();
        // at-statements (@import, @charset) terminate at `;` without a block
        let prelude = match full_prelude.rfind(';') {
            Some(pos) => full_prelude[pos + 1..].trim(),
            None => full_prelude,
        }
        .to_string();
        let Some(close) = find_block_end(&rest[open..]) else {
            return;
        };
        let block = &rest[open + 1..open + close];
        rest = &rest[open + close + 1..];

        if let Some(stripped) = prelude.strip_prefix('@') {
            if stripped.trim_start().starts_with("media") {
                parse_rules(block, out);
            }
            continue;
        }
        if prelude.is_empty() {
            continue;
        }

        let declarations = parse_declarations(block);
        for selector_text in prelude.split(',') {
            let selector_text = selector_text.trim();
            if selector_text.is_empty() {
                continue;
            }
            let (base, pseudo) = split_pseudo(selector_text);
            out.push(StyleRule {
                specificity: specificity(selector_text),
                selector: base,
                pseudo,
                declarations: declarations.clone(),
            });
        }
    }
}

/// Index of the `}` closing the `{` at the start of `s`, honoring nesting
fn find_block_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a `prop: value; ...` declaration block (also used for `style=`
/// attributes). Properties are lowercased; `!important` is split off.
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    let mut decls = Vec::new();
    for item in block.split(';') {
        let Some((prop, value)) = item.split_once(':') else {
            continue;
        };
        let prop = prop.trim().to_ascii_lowercase();
        let mut value = value.trim().to_string();
        if prop.is_empty() || value.is_empty() {
            continue;
        }
        let mut important = false;
        if let Some(v) = value.to_ascii_lowercase().strip_suffix("!important") {
            important = true;
            value.truncate(v.trim_end().len());
        }
        if value.is_empty() {
            continue;
        }
        decls.push(Declaration {
            property: prop,
            value,
            important,
        });
    }
    decls
}

/// Strip a trailing pseudo-element from a selector unit
fn split_pseudo(selector: &str) -> (String, Option<PseudoElement>) {
    for pseudo in [PseudoElement::Before, PseudoElement::After] {
        for suffix in pseudo.suffixes() {
            if let Some(base) = selector.strip_suffix(suffix) {
                let base = base.trim_end();
                let base = if base.is_empty() { "*" } else { base };
                return (base.to_string(), Some(pseudo));
            }
        }
    }
    (selector.to_string(), None)
}

/// Selector specificity as (id, class/attribute/pseudo-class, type) counts
pub fn specificity(selector: &str) -> (u32, u32, u32) {
    let mut ids = 0u32;
    let mut classes = 0u32;
    let mut types = 0u32;

    let mut chars = selector.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '#' => {
                ids += 1;
                consume_ident(&mut chars);
            }
            '.' => {
                classes += 1;
                consume_ident(&mut chars);
            }
            '[' => {
                classes += 1;
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                }
            }
            ':' => {
                if chars.peek() == Some(&':') {
                    chars.next();
                    types += 1;
                } else {
                    classes += 1;
                }
                consume_ident(&mut chars);
                if chars.peek() == Some(&'(') {
                    let mut depth = 0usize;
                    for c in chars.by_ref() {
                        if c == '(' {
                            depth += 1;
                        } else if c == ')' {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                    }
                }
            }
            c if c.is_alphanumeric() || c == '_' || c == '-' => {
                types += 1;
                consume_ident(&mut chars);
            }
            _ => {}
        }
    }
    (ids, classes, types)
}

fn consume_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '_' || c == '-' {
            chars.next();
        } else {
            break;
        }
    }
}

/// Computed style of a pseudo-element: its literal content plus declarations
#[derive(Debug, Clone)]
pub struct PseudoStyle {
    /// Unquoted generated content string
    pub content: String,
    pub declarations: Vec<Declaration>,
}

/// Style-resolution capability.
///
/// `computed_style` must return the element's effective declarations in its
/// original document context; `pseudo_style` resolves generated content and
/// returns `None` for the `none`/empty sentinel.
pub trait StyleResolver {
    fn computed_style(&self, doc: &Html, element: ElementRef<'_>) -> Vec<Declaration>;

    fn pseudo_style(
        &self,
        doc: &Html,
        element: ElementRef<'_>,
        pseudo: PseudoElement,
    ) -> Option<PseudoStyle>;
}

/// Cascade over an ordered list of rule sets.
///
/// Application order for an element: inherited parent declarations, matching
/// rules by (specificity, source order), normal `style=` declarations, then
/// `!important` rule and `style=` declarations. Color values are normalized
/// to their canonical form.
#[derive(Debug, Clone, Default)]
pub struct RuleSetResolver {
    sheets: Vec<Stylesheet>,
}

impl RuleSetResolver {
    pub fn new(sheets: Vec<Stylesheet>) -> Self {
        Self { sheets }
    }

    pub fn sheets(&self) -> &[Stylesheet] {
        &self.sheets
    }

    /// Rules matching `element` for the given pseudo-element slot, sorted by
    /// ascending (specificity, source order)
    fn matching_rules(
        &self,
        doc: &Html,
        element: ElementRef<'_>,
        pseudo: Option<PseudoElement>,
    ) -> Vec<&StyleRule> {
        let mut matched: Vec<(usize, &StyleRule)> = Vec::new();
        let mut order = 0usize;
        for sheet in &self.sheets {
            for rule in &sheet.rules {
                if rule.pseudo == pseudo && selector_matches(doc, &rule.selector, element) {
                    matched.push((order, rule));
                }
                order += 1;
            }
        }
        matched.sort_by_key(|(order, rule)| (rule.specificity, *order));
        matched.into_iter().map(|(_, rule)| rule).collect()
    }
}

/// Whether `selector` matches `element` within `doc`. Selectors scraper
/// cannot parse (e.g. `:hover`) never match and are left to the rasterizer's
/// stylesheet linkage instead.
fn selector_matches(doc: &Html, selector: &str, element: ElementRef<'_>) -> bool {
    let Ok(parsed) = Selector::parse(selector) else {
        return false;
    };
    doc.select(&parsed).any(|m| m.id() == element.id())
}

/// Properties that flow from parent to child when not set directly
const INHERITED: &[&str] = &[
    "color",
    "font-family",
    "font-size",
    "font-style",
    "font-weight",
    "letter-spacing",
    "line-height",
    "text-align",
    "text-transform",
    "visibility",
    "white-space",
    "word-spacing",
];

fn is_inherited(property: &str) -> bool {
    INHERITED.contains(&property)
}

/// Set `decl` in `target`, replacing any earlier value for the property
fn apply(target: &mut Vec<Declaration>, decl: &Declaration) {
    match target.iter_mut().find(|d| d.property == decl.property) {
        Some(existing) => {
            existing.value = decl.value.clone();
            existing.important = decl.important;
        }
        None => target.push(decl.clone()),
    }
}

impl StyleResolver for RuleSetResolver {
    fn computed_style(&self, doc: &Html, element: ElementRef<'_>) -> Vec<Declaration> {
        let mut decls: Vec<Declaration> = Vec::new();

        // Inherited seed from the parent chain
        if let Some(parent) = element.parent().and_then(ElementRef::wrap) {
            for d in self.computed_style(doc, parent) {
                if is_inherited(&d.property) {
                    apply(
                        &mut decls,
                        &Declaration {
                            important: false,
                            ..d
                        },
                    );
                }
            }
        }

        let rules = self.matching_rules(doc, element, None);
        let inline = element
            .value()
            .attr("style")
            .map(parse_declarations)
            .unwrap_or_default();

        for rule in &rules {
            for d in rule.declarations.iter().filter(|d| !d.important) {
                apply(&mut decls, d);
            }
        }
        for d in inline.iter().filter(|d| !d.important) {
            apply(&mut decls, d);
        }
        for rule in &rules {
            for d in rule.declarations.iter().filter(|d| d.important) {
                apply(&mut decls, d);
            }
        }
        for d in inline.iter().filter(|d| d.important) {
            apply(&mut decls, d);
        }

        normalize_colors(&mut decls);
        decls
    }

    fn pseudo_style(
        &self,
        doc: &Html,
        element: ElementRef<'_>,
        pseudo: PseudoElement,
    ) -> Option<PseudoStyle> {
        let rules = self.matching_rules(doc, element, Some(pseudo));
        if rules.is_empty() {
            return None;
        }

        let mut decls: Vec<Declaration> = Vec::new();
        for rule in &rules {
            for d in rule.declarations.iter().filter(|d| !d.important) {
                apply(&mut decls, d);
            }
        }
        for rule in &rules {
            for d in rule.declarations.iter().filter(|d| d.important) {
                apply(&mut decls, d);
            }
        }
        normalize_colors(&mut decls);

        let raw = decls.iter().find(|d| d.property == "content")?.value.clone();
        let content = unquote_content(&raw)?;
        Some(PseudoStyle {
            content,
            declarations: decls,
        })
    }
}

/// Strip quotes from a computed `content` value. Returns `None` for the
/// `none`/`normal` sentinels and the truly empty value.
fn unquote_content(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == "none" || value == "normal" {
        return None;
    }
    let bytes = value.as_bytes();
    if value.len() >= 2 && (bytes[0] == b'"' || bytes[0] == b'\'') && bytes[value.len() - 1] == bytes[0] {
        return Some(value[1..value.len() - 1].to_string());
    }
    Some(value.to_string())
}

fn normalize_colors(decls: &mut [Declaration]) {
    for d in decls.iter_mut() {
        if d.property == "color" || d.property.ends_with("-color") {
            if let Some(canonical) = normalize_color(&d.value) {
                d.value = canonical;
            }
        }
    }
}

const NAMED_COLORS: &[(&str, [u8; 4])] = &[
    ("aqua", [0x00, 0xff, 0xff, 0xff]),
    ("black", [0x00, 0x00, 0x00, 0xff]),
    ("blue", [0x00, 0x00, 0xff, 0xff]),
    ("cyan", [0x00, 0xff, 0xff, 0xff]),
    ("fuchsia", [0xff, 0x00, 0xff, 0xff]),
    ("gray", [0x80, 0x80, 0x80, 0xff]),
    ("green", [0x00, 0x80, 0x00, 0xff]),
    ("grey", [0x80, 0x80, 0x80, 0xff]),
    ("lime", [0x00, 0xff, 0x00, 0xff]),
    ("magenta", [0xff, 0x00, 0xff, 0xff]),
    ("maroon", [0x80, 0x00, 0x00, 0xff]),
    ("navy", [0x00, 0x00, 0x80, 0xff]),
    ("olive", [0x80, 0x80, 0x00, 0xff]),
    ("orange", [0xff, 0xa5, 0x00, 0xff]),
    ("purple", [0x80, 0x00, 0x80, 0xff]),
    ("red", [0xff, 0x00, 0x00, 0xff]),
    ("silver", [0xc0, 0xc0, 0xc0, 0xff]),
    ("teal", [0x00, 0x80, 0x80, 0xff]),
    ("transparent", [0x00, 0x00, 0x00, 0x00]),
    ("white", [0xff, 0xff, 0xff, 0xff]),
    ("yellow", [0xff, 0xff, 0x00, 0xff]),
];

/// Parse a CSS color value into RGBA
pub fn parse_color(value: &str) -> Option<[u8; 4]> {
    let value = value.trim().to_ascii_lowercase();

    if let Some((_, rgba)) = NAMED_COLORS.iter().find(|(name, _)| *name == value) {
        return Some(*rgba);
    }

    if let Some(hex) = value.strip_prefix('#') {
        return match hex.len() {
            3 => {
                let c: Vec<u8> = hex
                    .chars()
                    .map(|c| c.to_digit(16).map(|d| (d * 17) as u8))
                    .collect::<Option<_>>()?;
                Some([c[0], c[1], c[2], 0xff])
            }
            6 | 8 => {
                let mut c = [0u8; 4];
                c[3] = 0xff;
                for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
                    c[i] = u8::from_str_radix(std::str::from_utf8(chunk).ok()?, 16).ok()?;
                }
                Some(c)
            }
            _ => None,
        };
    }

    let inner = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() < 3 {
        return None;
    }
    let channel = |s: &str| -> Option<u8> {
        if let Some(pct) = s.strip_suffix('%') {
            let v: f32 = pct.trim().parse().ok()?;
            Some((v / 100.0 * 255.0).round().clamp(0.0, 255.0) as u8)
        } else {
            let v: f32 = s.parse().ok()?;
            Some(v.round().clamp(0.0, 255.0) as u8)
        }
    };
    let r = channel(parts[0])?;
    let g = channel(parts[1])?;
    let b = channel(parts[2])?;
    let a = match parts.get(3) {
        Some(s) => {
            let v: f32 = s.parse().ok()?;
            (v * 255.0).round().clamp(0.0, 255.0) as u8
        }
        None => 0xff,
    };
    Some([r, g, b, a])
}

/// Canonical form of a color value: `#rrggbb` when opaque, `rgba(...)`
/// otherwise. `None` when the value is not a recognized color.
pub fn normalize_color(value: &str) -> Option<String> {
    let [r, g, b, a] = parse_color(value)?;
    if a == 0xff {
        Some(format!("#{r:02x}{g:02x}{b:02x}"))
    } else {
        let alpha = (a as f32 / 255.0 * 100.0).round() / 100.0;
        Some(format!("rgba({r}, {g}, {b}, {alpha})"))
    }
}
